/// Number of tag colors in the palette.
pub const TAG_COLOR_COUNT: u8 = 10;

/// Palette index for a tag, derived from its first character so the same
/// tag always renders in the same color. Uses the first UTF-16 code unit,
/// so indices agree with other clients reading the same store.
pub fn tag_color(tag: &str) -> u8 {
    let Some(first) = tag.chars().next() else {
        return 0;
    };
    let mut buf = [0u16; 2];
    let unit = first.encode_utf16(&mut buf)[0];
    (unit % TAG_COLOR_COUNT as u16) as u8
}

/// Split comma-separated tag input into labels. Entries are trimmed and
/// empty entries dropped; order and duplicates are kept.
pub fn parse_tag_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_follows_first_char() {
        // 'w' = 119
        assert_eq!(tag_color("work"), 9);
        assert_eq!(tag_color("weekend"), 9);
        // 'a' = 97
        assert_eq!(tag_color("admin"), 7);
        assert_eq!(tag_color(""), 0);
    }

    #[test]
    fn color_uses_utf16_unit_for_astral_chars() {
        // U+1F600 encodes as 0xD83D 0xDE00; 0xD83D = 55357
        assert_eq!(tag_color("\u{1F600}party"), 7);
    }

    #[test]
    fn tag_list_trims_and_keeps_duplicates() {
        assert_eq!(
            parse_tag_list(" home, work ,, home "),
            vec!["home", "work", "home"]
        );
        assert!(parse_tag_list("").is_empty());
        assert!(parse_tag_list(" , ").is_empty());
    }
}
