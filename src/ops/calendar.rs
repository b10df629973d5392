use std::fmt;

use chrono::{Datelike, Months, NaiveDate};

use crate::model::task::Task;
use crate::ops::views::tasks_for_date;

/// Task titles shown inside one calendar day before "+N more".
pub const PREVIEW_LIMIT: usize = 3;

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    first: NaiveDate,
}

impl YearMonth {
    /// `month` is 1-based. Returns `None` for an invalid month.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| YearMonth { first })
    }

    /// The month `day` falls in.
    pub fn containing(day: NaiveDate) -> Self {
        YearMonth {
            first: day.with_day(1).unwrap_or(day),
        }
    }

    /// Parse `YYYY-MM`.
    pub fn parse(s: &str) -> Option<Self> {
        let (year, month) = s.trim().split_once('-')?;
        YearMonth::new(year.parse().ok()?, month.parse().ok()?)
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn days_in_month(&self) -> u32 {
        match self.first.checked_add_months(Months::new(1)) {
            Some(next) => (next - self.first).num_days() as u32,
            // December of the last representable year
            None => 31,
        }
    }

    /// Blank cells before the 1st. Weeks start on Sunday.
    pub fn leading_blanks(&self) -> u32 {
        self.first.weekday().num_days_from_sunday()
    }

    pub fn prev(&self) -> Self {
        self.first
            .checked_sub_months(Months::new(1))
            .map_or(*self, |first| YearMonth { first })
    }

    pub fn next(&self) -> Self {
        self.first
            .checked_add_months(Months::new(1))
            .map_or(*self, |first| YearMonth { first })
    }

    /// Day `day` (1-based) of this month, if it exists.
    pub fn day(&self, day: u32) -> Option<NaiveDate> {
        self.first.with_day(day)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first.format("%B %Y"))
    }
}

/// One square of the month grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarCell<'a> {
    /// Padding before the first of the month
    Blank,
    Day(DayCell<'a>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell<'a> {
    pub date: NaiveDate,
    /// Titles of the first tasks due that day, in store order
    pub previews: Vec<&'a str>,
    /// Tasks due that day beyond the previews
    pub overflow: usize,
    pub is_today: bool,
}

/// Calendar layout of one month over a store snapshot.
#[derive(Debug, Clone, Copy)]
pub struct MonthGrid<'a> {
    tasks: &'a [Task],
    month: YearMonth,
    today: Option<NaiveDate>,
}

/// Grid for `year`/`month` (1-based). `None` for an invalid month.
pub fn month_grid(tasks: &[Task], year: i32, month: u32) -> Option<MonthGrid<'_>> {
    YearMonth::new(year, month).map(|m| MonthGrid::new(tasks, m))
}

impl<'a> MonthGrid<'a> {
    pub fn new(tasks: &'a [Task], month: YearMonth) -> Self {
        MonthGrid {
            tasks,
            month,
            today: None,
        }
    }

    /// Flag the cell for `today` when it falls in this month.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn month(&self) -> YearMonth {
        self.month
    }

    /// Cells in reading order: leading blanks, then one per day. Each day's
    /// tasks are looked up only when its cell is reached.
    pub fn cells(self) -> impl Iterator<Item = CalendarCell<'a>> {
        let blanks = (0..self.month.leading_blanks()).map(|_| CalendarCell::Blank);
        let days = (1..=self.month.days_in_month())
            .filter_map(move |d| self.month.day(d))
            .map(move |date| CalendarCell::Day(self.day_cell(date)));
        blanks.chain(days)
    }

    /// Cells chunked into weeks of 7. The last week may be short.
    pub fn weeks(self) -> Vec<Vec<CalendarCell<'a>>> {
        let cells: Vec<_> = self.cells().collect();
        cells.chunks(7).map(<[_]>::to_vec).collect()
    }

    fn day_cell(&self, date: NaiveDate) -> DayCell<'a> {
        let due = tasks_for_date(self.tasks, date);
        let overflow = due.len().saturating_sub(PREVIEW_LIMIT);
        DayCell {
            date,
            previews: due
                .into_iter()
                .take(PREVIEW_LIMIT)
                .map(|t| t.title.as_str())
                .collect(),
            overflow,
            is_today: self.today == Some(date),
        }
    }
}
