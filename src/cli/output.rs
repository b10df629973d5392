use chrono::NaiveDate;
use crossterm::style::{Color, Stylize};
use serde::Serialize;

use crate::model::tag::tag_color;
use crate::model::task::Task;
use crate::ops::calendar::{CalendarCell, MonthGrid};
use crate::ops::views::{TaskCounts, View, ViewResult};
use crate::util::unicode::fit_to_width;

/// Terminal colors for the tag palette, indexed by `tag_color`
const TAG_PALETTE: [Color; 10] = [
    Color::Red,
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
    Color::DarkRed,
    Color::DarkGreen,
    Color::DarkYellow,
    Color::DarkMagenta,
];

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Width of one calendar column, in terminal cells
const CELL_WIDTH: usize = 11;

/// Options carried from config into the formatters
#[derive(Debug, Clone)]
pub struct Style {
    pub color: bool,
    pub date_format: String,
}

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ViewJson<'a> {
    pub view: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<&'a Task>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<DayGroupJson<'a>>>,
}

#[derive(Serialize)]
pub struct DayGroupJson<'a> {
    pub date: NaiveDate,
    pub tasks: Vec<&'a Task>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarJson<'a> {
    pub month: String,
    pub leading_blanks: u32,
    pub days: Vec<CalendarDayJson<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<DayGroupJson<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDayJson<'a> {
    pub date: NaiveDate,
    pub previews: Vec<&'a str>,
    pub overflow: usize,
    pub is_today: bool,
}

#[derive(Serialize)]
pub struct StatsJson {
    pub completed: usize,
    pub active: usize,
    pub progress: f64,
}

#[derive(Serialize)]
pub struct DeletedJson {
    pub id: u64,
    pub deleted: bool,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn view_to_json<'a>(view: &View, result: ViewResult<'a>) -> ViewJson<'a> {
    match result {
        ViewResult::List(tasks) => ViewJson {
            view: view.to_string(),
            tasks: Some(tasks),
            groups: None,
        },
        ViewResult::Grouped(groups) => ViewJson {
            view: view.to_string(),
            tasks: None,
            groups: Some(
                groups
                    .into_iter()
                    .map(|(date, tasks)| DayGroupJson { date, tasks })
                    .collect(),
            ),
        },
    }
}

pub fn calendar_to_json<'a>(
    grid: MonthGrid<'a>,
    selected: Option<(NaiveDate, Vec<&'a Task>)>,
) -> CalendarJson<'a> {
    let month = grid.month();
    CalendarJson {
        month: format!("{:04}-{:02}", month.year(), month.month()),
        leading_blanks: month.leading_blanks(),
        days: grid
            .cells()
            .filter_map(|cell| match cell {
                CalendarCell::Blank => None,
                CalendarCell::Day(d) => Some(CalendarDayJson {
                    date: d.date,
                    previews: d.previews,
                    overflow: d.overflow,
                    is_today: d.is_today,
                }),
            })
            .collect(),
        selected: selected.map(|(date, tasks)| DayGroupJson { date, tasks }),
    }
}

pub fn stats_to_json(counts: &TaskCounts) -> StatsJson {
    StatsJson {
        completed: counts.completed,
        active: counts.active,
        progress: counts.progress(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn format_tag(tag: &str, style: &Style) -> String {
    let label = format!("#{}", tag);
    if style.color {
        let color = TAG_PALETTE[tag_color(tag) as usize % TAG_PALETTE.len()];
        label.with(color).to_string()
    } else {
        label
    }
}

/// Format a single task as a one-line summary
pub fn format_task_line(task: &Task, style: &Style) -> String {
    let check = if task.completed { 'x' } else { ' ' };
    let mut line = format!("[{}] {} {}", check, task.id, task.title);
    for tag in &task.tags {
        line.push(' ');
        line.push_str(&format_tag(tag, style));
    }
    if let Some(due) = task.due_date {
        line.push_str(&format!(" (due {})", due.format("%Y-%m-%d")));
    }
    line
}

/// Format a task with its description indented below it
pub fn format_task_block(task: &Task, style: &Style) -> Vec<String> {
    let mut lines = vec![format_task_line(task, style)];
    if let Some(desc) = &task.description {
        for line in desc.lines() {
            lines.push(format!("    {}", line));
        }
    }
    lines
}

pub fn format_day_heading(date: NaiveDate, style: &Style) -> String {
    date.format(&style.date_format).to_string()
}

/// Format any view: a header, then its tasks or its empty message
pub fn format_view(view: &View, result: &ViewResult<'_>, style: &Style) -> Vec<String> {
    let mut lines = vec![format!("== {} ==", view)];
    if result.is_empty() {
        lines.push(view.empty_message().to_string());
        return lines;
    }
    match result {
        ViewResult::List(tasks) => {
            for task in tasks {
                lines.extend(format_task_block(task, style));
            }
        }
        ViewResult::Grouped(groups) => {
            for (i, (date, tasks)) in groups.iter().enumerate() {
                if i > 0 {
                    lines.push(String::new());
                }
                lines.push(format_day_heading(*date, style));
                for task in tasks {
                    lines.extend(format_task_block(task, style));
                }
            }
        }
    }
    lines
}

/// Format a month grid, one block of lines per week
pub fn format_calendar(grid: MonthGrid<'_>) -> Vec<String> {
    let mut lines = vec![grid.month().to_string()];
    lines.push(join_row(WEEKDAYS.iter().map(|d| d.to_string())));

    for week in grid.weeks() {
        let height = week.iter().map(cell_height).max().unwrap_or(0);
        for row in 0..=height {
            lines.push(join_row(week.iter().map(|cell| cell_line(cell, row))));
        }
    }
    lines
}

/// Format the tasks of a selected calendar day
pub fn format_selected_day(date: NaiveDate, tasks: &[&Task], style: &Style) -> Vec<String> {
    let mut lines = vec![format!("Selected: {}", format_day_heading(date, style))];
    if tasks.is_empty() {
        lines.push(View::Day(date).empty_message().to_string());
    }
    for task in tasks {
        lines.extend(format_task_block(task, style));
    }
    lines
}

pub fn format_stats(counts: &TaskCounts) -> Vec<String> {
    vec![
        format!("completed: {}", counts.completed),
        format!("remaining: {}", counts.active),
        format!("progress:  {:.0}%", counts.progress() * 100.0),
    ]
}

fn cell_height(cell: &CalendarCell<'_>) -> usize {
    match cell {
        CalendarCell::Blank => 0,
        CalendarCell::Day(d) => d.previews.len() + usize::from(d.overflow > 0),
    }
}

fn cell_line(cell: &CalendarCell<'_>, row: usize) -> String {
    let CalendarCell::Day(d) = cell else {
        return String::new();
    };
    if row == 0 {
        let marker = if d.is_today { "*" } else { "" };
        return format!("{:>2}{}", d.date.format("%-d"), marker);
    }
    match d.previews.get(row - 1) {
        Some(title) => format!("\u{00b7} {}", title),
        None if row == d.previews.len() + 1 && d.overflow > 0 => {
            format!("+{} more", d.overflow)
        }
        None => String::new(),
    }
}

fn join_row(cells: impl Iterator<Item = String>) -> String {
    let row = cells
        .map(|c| fit_to_width(&c, CELL_WIDTH))
        .collect::<Vec<_>>()
        .join(" ");
    row.trim_end().to_string()
}
