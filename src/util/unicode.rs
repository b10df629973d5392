use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Display width in terminal cells. Control characters such as tabs and
/// newlines count as one cell so a stray one cannot break grid alignment.
pub fn display_width(s: &str) -> usize {
    s.graphemes(true).map(grapheme_width).sum()
}

/// Truncate a string to fit within `max_cells` terminal cells, appending `…` if truncated.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if max_cells == 0 {
        return String::new();
    }
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    let budget = max_cells - 1;
    let mut width = 0;
    let mut result = String::new();
    for grapheme in s.graphemes(true) {
        let gw = grapheme_width(grapheme);
        if width + gw > budget {
            break;
        }
        width += gw;
        result.push_str(grapheme);
    }
    result.push('\u{2026}');
    result
}

/// Truncate or right-pad with spaces to exactly `cells` terminal cells.
/// A wide character that would straddle the edge is replaced by padding.
pub fn fit_to_width(s: &str, cells: usize) -> String {
    let mut out = truncate_to_width(s, cells);
    let width = display_width(&out);
    out.extend(std::iter::repeat_n(' ', cells.saturating_sub(width)));
    out
}

fn grapheme_width(g: &str) -> usize {
    if g.chars().any(char::is_control) {
        return 1;
    }
    UnicodeWidthStr::width(g)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_of_mixed_scripts() {
        assert_eq!(display_width("hello"), 5);
        assert_eq!(display_width("你好"), 4);
        assert_eq!(display_width("🎉"), 2);
        assert_eq!(display_width("cafe\u{0301}"), 4);
        assert_eq!(display_width(""), 0);
    }

    #[test]
    fn control_chars_count_one_cell() {
        assert_eq!(display_width("a\tb"), 3);
        assert_eq!(display_width("a\nb"), 3);
    }

    #[test]
    fn truncate_ascii_and_wide() {
        assert_eq!(truncate_to_width("hello world", 8), "hello w\u{2026}");
        assert_eq!(truncate_to_width("hi", 10), "hi");
        assert_eq!(truncate_to_width("你好世界", 5), "你好\u{2026}");
        assert_eq!(truncate_to_width("hello", 1), "\u{2026}");
        assert_eq!(truncate_to_width("hello", 0), "");
    }

    #[test]
    fn fit_pads_and_truncates() {
        assert_eq!(fit_to_width("ab", 5), "ab   ");
        assert_eq!(fit_to_width("abcdef", 4), "abc\u{2026}");
        assert_eq!(fit_to_width("", 3), "   ");
        // "你…" is 3 cells, padded to 4
        assert_eq!(fit_to_width("你好世界", 4), "你\u{2026} ");
        assert_eq!(display_width(&fit_to_width("🎉🚀💫", 5)), 5);
    }
}
