use std::collections::BTreeMap;

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::Serialize;

use crate::models::{FertilityWindow, PeriodRecord};

/// How a single calendar cell is painted. One mark per day.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum DayMark {
    Period,
    Ovulation,
    Fertile,
    PredictedNext,
    None,
}

impl DayMark {
    /// Tooltip text; unmarked days show their date instead.
    pub fn label(self) -> Option<&'static str> {
        match self {
            DayMark::Period => Some("Period day"),
            DayMark::Ovulation => Some("Ovulation day"),
            DayMark::Fertile => Some("Fertile day"),
            DayMark::PredictedNext => Some("Predicted next period"),
            DayMark::None => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub mark: DayMark,
    pub in_month: bool,
    pub is_today: bool,
}

/// A month laid out as Sunday-first weeks.
#[derive(Debug, Clone, Serialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub days: Vec<CalendarDay>,
}

impl MonthView {
    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarDay]> {
        self.days.chunks(7)
    }
}

/// First and last day of the month containing `month_ref`.
pub fn month_bounds(month_ref: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = month_ref - Duration::days(month_ref.day0() as i64);
    let last = first + Months::new(1) - Duration::days(1);
    (first, last)
}

/// Every date shown for the month: padded back to Sunday and forward to
/// Saturday so the grid is whole weeks.
pub fn month_grid(month_ref: NaiveDate) -> Vec<NaiveDate> {
    let (first, last) = month_bounds(month_ref);
    let lead = first.weekday().num_days_from_sunday() as i64;
    let trail = 6 - last.weekday().num_days_from_sunday() as i64;

    let start = first - Duration::days(lead);
    let end = last + Duration::days(trail);
    start.iter_days().take_while(|d| *d <= end).collect()
}

fn mark_day(
    date: NaiveDate,
    periods: &[PeriodRecord],
    window: Option<&FertilityWindow>,
    next_period: Option<NaiveDate>,
) -> DayMark {
    if periods.iter().any(|p| p.contains(date)) {
        DayMark::Period
    } else if window.is_some_and(|w| w.ovulation_date == date) {
        DayMark::Ovulation
    } else if window.is_some_and(|w| w.contains(date)) {
        DayMark::Fertile
    } else if next_period == Some(date) {
        DayMark::PredictedNext
    } else {
        DayMark::None
    }
}

/// Mark every grid day of the month containing `month_ref`.
///
/// Precedence is Period > Ovulation > Fertile > PredictedNext, so ovulation
/// day is never reported as merely fertile and a logged period day that
/// happens to be the predicted date stays `Period`.
pub fn annotate_month(
    month_ref: NaiveDate,
    periods: &[PeriodRecord],
    window: &FertilityWindow,
    next_period: NaiveDate,
) -> BTreeMap<NaiveDate, DayMark> {
    month_grid(month_ref)
        .into_iter()
        .map(|date| (date, mark_day(date, periods, Some(window), Some(next_period))))
        .collect()
}

/// Render-ready grid. Without a forecast only logged periods are marked.
pub fn month_view(
    month_ref: NaiveDate,
    periods: &[PeriodRecord],
    window: Option<&FertilityWindow>,
    next_period: Option<NaiveDate>,
    today: NaiveDate,
) -> MonthView {
    let days = month_grid(month_ref)
        .into_iter()
        .map(|date| CalendarDay {
            date,
            mark: mark_day(date, periods, window, next_period),
            in_month: date.month() == month_ref.month() && date.year() == month_ref.year(),
            is_today: date == today,
        })
        .collect();

    MonthView {
        year: month_ref.year(),
        month: month_ref.month(),
        days,
    }
}
