//! The month calendar of the diet page

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// A calendar grid always has six full weeks, so that its layout never reflows
pub const GRID_CELLS: usize = 42;

const MONTH_NAMES: [&str; 12] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

/// The month currently displayed by the calendar
///
/// It also retains a day of that month, which is kept (and clamped when needed) when navigating between months
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCursor {
    year: i32,
    /// 0-based: 0 is January
    month: u32,
    day: u32,
}

impl MonthCursor {
    /// Create a cursor on the first day of a month. `month` is 0-based.
    ///
    /// Returns `None` if `month` is not in `0..12` or the year is out of chrono's range
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month.checked_add(1)?, 1)?;
        Some(Self { year, month, day: 1 })
    }

    /// The month that contains `date`, retaining its day
    pub fn from_date(date: NaiveDate) -> Self {
        Self { year: date.year(), month: date.month0(), day: date.day() }
    }

    pub fn year(&self) -> i32 { self.year }
    pub fn month(&self) -> u32 { self.month }
    pub fn day(&self) -> u32 { self.day }

    /// The retained day, as a full date
    pub fn date(&self) -> NaiveDate {
        // Fields are only built from valid dates
        NaiveDate::from_ymd_opt(self.year, self.month + 1, self.day)
            .unwrap_or_else(|| self.first_day())
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn days_in_month(&self) -> u32 {
        days_in_month(self.year, self.month)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month0() == self.month
    }

    /// A short label, such as `Mar 2024`
    pub fn title(&self) -> String {
        let name = MONTH_NAMES.get(self.month as usize).unwrap_or(&"???");
        format!("{} {}", name, self.year)
    }
}


/// One cell of the calendar grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub day_number: u32,
    /// false for the filler days of the previous and next months
    pub in_current_month: bool,
    pub is_selected: bool,
    pub is_today: bool,
}

/// Number of days in a month (`month` is 0-based)
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month >= 11 { (year + 1, 1) } else { (year, month + 2) };
    match NaiveDate::from_ymd_opt(next_year, next_month, 1).and_then(|d| d.pred_opt()) {
        Some(last) => last.day(),
        None => 31,
    }
}

/// Compute the 42 cells of the month `cursor` points to.
///
/// The grid starts on the Sunday of the week that contains the 1st.
/// `selected` only highlights a cell of the displayed month; `today` is independent from the selection.
/// At the ends of the supported date range, the grid is shifted so that it still has 42 cells.
pub fn days_grid(cursor: &MonthCursor, selected: NaiveDate, today: NaiveDate) -> Vec<DayCell> {
    let first = cursor.first_day();
    let leading = first.weekday().num_days_from_sunday() as i64;

    let start = first.checked_sub_signed(Duration::days(leading)).unwrap_or(NaiveDate::MIN);
    let last_start = NaiveDate::MAX
        .checked_sub_signed(Duration::days(GRID_CELLS as i64 - 1))
        .unwrap_or(NaiveDate::MAX);
    let start = start.min(last_start);

    std::iter::successors(Some(start), |date| date.succ_opt())
        .take(GRID_CELLS)
        .map(|date| {
            let in_current_month = cursor.contains(date);
            DayCell {
                date,
                day_number: date.day(),
                in_current_month,
                is_selected: in_current_month && date == selected,
                is_today: date == today,
            }
        })
        .collect()
}

fn month_index(year: i32, month: u32) -> i64 {
    year as i64 * 12 + month as i64
}

/// Move the cursor by `delta` months (possibly negative).
///
/// The retained day is clamped to the last day of the destination month when it does not exist there (Jan 31 + 1 → Feb 28/29).
/// The destination saturates at the first and last months chrono can represent.
pub fn change_month(cursor: &MonthCursor, delta: i32) -> MonthCursor {
    let min = month_index(NaiveDate::MIN.year(), NaiveDate::MIN.month0());
    let max = month_index(NaiveDate::MAX.year(), NaiveDate::MAX.month0());
    let index = (month_index(cursor.year, cursor.month) + delta as i64).max(min).min(max);
    let year = index.div_euclid(12) as i32;
    let month = index.rem_euclid(12) as u32;
    let day = cursor.day.min(days_in_month(year, month));
    MonthCursor { year, month, day }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn grid_has_six_weeks() {
        let today = date("2024-03-15");
        for year in 2023..=2026 {
            for month in 0..12 {
                let cursor = MonthCursor::new(year, month).unwrap();
                let grid = days_grid(&cursor, today, today);
                assert_eq!(grid.len(), GRID_CELLS);
                let in_month = grid.iter().filter(|c| c.in_current_month).count() as u32;
                assert_eq!(in_month, cursor.days_in_month());
                assert!(grid.iter().filter(|c| c.is_selected).count() <= 1);
            }
        }
    }

    #[test]
    fn grid_layout() {
        // March 2024 starts on a Friday
        let cursor = MonthCursor::new(2024, 2).unwrap();
        let grid = days_grid(&cursor, date("2024-03-05"), date("2024-03-20"));

        assert_eq!(grid[0].date, date("2024-02-25"));
        assert!(grid[0].in_current_month == false);
        assert_eq!(grid[5].day_number, 1);
        assert!(grid[5].in_current_month);
        assert_eq!(grid[35].date, date("2024-03-31"));
        assert_eq!(grid[36].date, date("2024-04-01"));
        assert_eq!(grid[41].day_number, 6);

        let selected: Vec<_> = grid.iter().filter(|c| c.is_selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].date, date("2024-03-05"));

        let today: Vec<_> = grid.iter().filter(|c| c.is_today).collect();
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].date, date("2024-03-20"));
        assert!(today[0].is_selected == false);
    }

    #[test]
    fn february_starting_on_sunday() {
        // Feb 2015: 28 days, starts on a Sunday: no leading filler, 14 trailing
        let cursor = MonthCursor::new(2015, 1).unwrap();
        let grid = days_grid(&cursor, date("2000-01-01"), date("2000-01-01"));
        assert_eq!(grid.len(), GRID_CELLS);
        assert_eq!(grid[0].date, date("2015-02-01"));
        assert_eq!(grid.iter().filter(|c| c.in_current_month == false).count(), 14);
        assert!(grid.iter().all(|c| c.is_selected == false));
    }

    #[test]
    fn selection_outside_displayed_month() {
        // Feb 29 is a leading filler of the March 2024 grid, it must not be highlighted
        let cursor = MonthCursor::new(2024, 2).unwrap();
        let grid = days_grid(&cursor, date("2024-02-29"), date("2024-02-29"));
        assert!(grid.iter().all(|c| c.is_selected == false));
        assert!(grid.iter().any(|c| c.is_today));
    }

    #[test]
    fn month_navigation() {
        let dec = MonthCursor::new(2024, 11).unwrap();
        let jan = change_month(&dec, 1);
        assert_eq!((jan.year(), jan.month()), (2025, 0));

        let back = change_month(&jan, -1);
        assert_eq!((back.year(), back.month()), (2024, 11));

        let far = change_month(&dec, -25);
        assert_eq!((far.year(), far.month()), (2022, 10));
    }

    #[test]
    fn month_navigation_clamps_day() {
        let jan31 = MonthCursor::from_date(date("2024-01-31"));
        let feb = change_month(&jan31, 1);
        assert_eq!(feb.date(), date("2024-02-29"));

        let jan31 = MonthCursor::from_date(date("2023-01-31"));
        assert_eq!(change_month(&jan31, 1).date(), date("2023-02-28"));

        let round_trip = change_month(&change_month(&jan31, 1), -1);
        assert_eq!((round_trip.year(), round_trip.month()), (2023, 0));
    }

    #[test]
    fn far_navigation_keeps_a_full_grid() {
        let jan = MonthCursor::new(2024, 0).unwrap();
        let today = date("2024-01-15");

        let cursors = vec![
            change_month(&jan, i32::MAX),
            change_month(&jan, i32::MIN),
            MonthCursor::from_date(NaiveDate::MIN),
            MonthCursor::from_date(NaiveDate::MAX),
        ];
        for cursor in cursors {
            let grid = days_grid(&cursor, today, today);
            assert_eq!(grid.len(), GRID_CELLS);
            let in_month = grid.iter().filter(|c| c.in_current_month).count() as u32;
            assert_eq!(in_month, cursor.days_in_month());
        }

        let last = change_month(&jan, i32::MAX);
        assert_eq!((last.year(), last.month()), (NaiveDate::MAX.year(), NaiveDate::MAX.month0()));
        assert_eq!(change_month(&last, 1), last);
        let back = change_month(&last, -1);
        assert_eq!(change_month(&back, 1), last);
    }

    #[test]
    fn titles() {
        assert_eq!(MonthCursor::new(2024, 2).unwrap().title(), "Mar 2024");
        assert!(MonthCursor::new(2024, 12).is_none());
        assert_eq!(days_in_month(2024, 1), 29);
        assert_eq!(days_in_month(2023, 11), 31);
    }
}
