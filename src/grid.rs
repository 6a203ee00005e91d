use crate::datekey;
use crate::lunar::{GregorianToLunar, LunarAnnotator};
use crate::model::Agenda;
use chrono::{Datelike, NaiveDate, Weekday};

/// Column headings, week starting on Sunday.
pub const WEEKDAY_HEADINGS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    None,
    Pending,
    Done,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub key: String,
    pub is_today: bool,
    pub is_weekend: bool,
    pub lunar_label: String,
    pub holiday_label: Option<&'static str>,
    pub todo_count: usize,
    pub unfinished_count: usize,
}

impl DayCell {
    pub fn display_label(&self) -> &str {
        self.holiday_label.unwrap_or(self.lunar_label.as_str())
    }

    pub fn badge(&self) -> Badge {
        if self.todo_count == 0 {
            Badge::None
        } else if self.unfinished_count > 0 {
            Badge::Pending
        } else {
            Badge::Done
        }
    }
}

/// `None` marks a leading padding cell.
pub type CalendarDayCell = Option<DayCell>;

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = shift_month(year, month, 1);
    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(start), Some(end)) => (end - start).num_days() as u32,
        _ => 0,
    }
}

/// Weekday of the 1st with Sunday as 0.
pub fn first_weekday_offset(year: i32, month: u32) -> u32 {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.weekday().num_days_from_sunday())
        .unwrap_or(0)
}

/// Moves `delta` months from `(year, month)`, carrying into the year.
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Day cells for a month: leading padding up to the weekday of the 1st,
/// then one cell per day. No trailing padding.
pub fn build<C: GregorianToLunar>(
    year: i32,
    month: u32,
    today: NaiveDate,
    agenda: &Agenda,
    annotator: &LunarAnnotator<C>,
) -> Vec<CalendarDayCell> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    let today_key = datekey::encode(today);
    let offset = first_weekday_offset(year, month) as usize;
    let mut cells: Vec<CalendarDayCell> = vec![None; offset];
    for date in first.iter_days().take(days_in_month(year, month) as usize) {
        let key = datekey::encode(date);
        let annotation = annotator.annotate(date);
        let todos = agenda.todos(&key);
        cells.push(Some(DayCell {
            date,
            is_today: key == today_key,
            is_weekend: is_weekend(date),
            lunar_label: annotation.lunar_label,
            holiday_label: annotation.holiday_label,
            todo_count: todos.len(),
            unfinished_count: todos.iter().filter(|t| !t.completed).count(),
            key,
        }));
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TodoId, TodoItem};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 12), 31);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 13), 0);
    }

    #[test]
    fn shifts_across_years() {
        assert_eq!(shift_month(2024, 1, -1), (2023, 12));
        assert_eq!(shift_month(2024, 12, 1), (2025, 1));
        assert_eq!(shift_month(2024, 5, 0), (2024, 5));
        assert_eq!(shift_month(2024, 3, -15), (2022, 12));
    }

    #[test]
    fn grid_length_is_offset_plus_days() {
        let agenda = Agenda::default();
        let annotator = LunarAnnotator::new();
        for (y, m) in [(2024, 5), (2024, 9), (2023, 10), (2026, 2), (2025, 6)] {
            let cells = build(y, m, ymd(2024, 1, 1), &agenda, &annotator);
            let offset = first_weekday_offset(y, m) as usize;
            assert_eq!(cells.len(), offset + days_in_month(y, m) as usize);
            assert!(cells[..offset].iter().all(Option::is_none));
            assert!(cells[offset..].iter().all(Option::is_some));
        }
    }

    #[test]
    fn may_2024_starts_on_wednesday() {
        let cells = build(
            2024,
            5,
            ymd(2024, 5, 4),
            &Agenda::default(),
            &LunarAnnotator::new(),
        );
        assert_eq!(first_weekday_offset(2024, 5), 3);
        let first = cells[3].as_ref().unwrap();
        assert_eq!(first.key, "2024-05-01");
        assert_eq!(first.display_label(), "Labour Day");
        assert!(!first.is_weekend);
        let saturday = cells[6].as_ref().unwrap();
        assert!(saturday.is_today);
        assert!(saturday.is_weekend);
        assert_eq!(saturday.display_label(), "Youth Day");
    }

    #[test]
    fn cells_carry_todo_badges() {
        let mut agenda = Agenda::default();
        agenda.push("2024-05-02", TodoItem::new(TodoId::Num(1), "a"));
        agenda.push("2024-05-02", TodoItem::new(TodoId::Num(2), "b"));
        let mut done = TodoItem::new(TodoId::Num(3), "c");
        done.completed = true;
        agenda.push("2024-05-03", done);

        let cells = build(2024, 5, ymd(2024, 1, 1), &agenda, &LunarAnnotator::new());
        let cell = |day: usize| cells[2 + day].as_ref().unwrap().clone();
        assert_eq!(cell(1).badge(), Badge::None);
        assert_eq!(cell(2).unfinished_count, 2);
        assert_eq!(cell(2).badge(), Badge::Pending);
        assert_eq!(cell(3).badge(), Badge::Done);
    }

    #[test]
    fn invalid_month_is_empty() {
        let cells = build(
            2024,
            0,
            ymd(2024, 1, 1),
            &Agenda::default(),
            &LunarAnnotator::new(),
        );
        assert!(cells.is_empty());
    }
}
