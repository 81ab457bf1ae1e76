use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::models::PeriodRecord;
use crate::prediction::{average_cycle_length, fertility_window, last_period_start};

pub const DEFAULT_WINDOW_DAYS: u32 = 60;

const PERIOD_LEVEL: f32 = 2.0;
const FERTILE_LEVEL: f32 = 1.5;
const OVULATION_LEVEL: f32 = 2.0;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub period: f32,
    pub fertility: f32,
}

/// Daily period/fertility levels centered on the latest period start.
#[derive(Debug, Clone, Serialize)]
pub struct CycleSeries {
    pub anchor: NaiveDate,
    pub cycle_length: i64,
    pub points: Vec<ChartPoint>,
}

pub fn cycle_series(periods: &[PeriodRecord], window_days: u32) -> Option<CycleSeries> {
    let anchor = last_period_start(periods)?;
    let cycle_length = average_cycle_length(periods);
    let fw = fertility_window(anchor, cycle_length);

    let half = Duration::days(i64::from(window_days / 2));
    let start = anchor - half;
    let end = anchor + half;

    let points = start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|date| {
            let period = if periods.iter().any(|p| p.contains(date)) {
                PERIOD_LEVEL
            } else {
                0.0
            };
            let fertility = if date == fw.ovulation_date {
                OVULATION_LEVEL
            } else if fw.contains(date) {
                FERTILE_LEVEL
            } else {
                0.0
            };
            ChartPoint {
                date,
                period,
                fertility,
            }
        })
        .collect();

    Some(CycleSeries {
        anchor,
        cycle_length,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn empty_history_has_no_series() {
        assert!(cycle_series(&[], DEFAULT_WINDOW_DAYS).is_none());
    }

    #[test]
    fn series_spans_window_around_latest_start() {
        let periods = vec![
            PeriodRecord::new(d("2024-01-29"), Some(d("2024-02-02"))),
            PeriodRecord::new(d("2024-01-01"), Some(d("2024-01-05"))),
        ];
        let series = cycle_series(&periods, 60).unwrap();
        assert_eq!(series.anchor, d("2024-01-29"));
        assert_eq!(series.cycle_length, 28);
        assert_eq!(series.points.len(), 61);
        assert_eq!(series.points[0].date, d("2023-12-30"));

        let at = |date: NaiveDate| series.points.iter().find(|p| p.date == date).unwrap();
        assert_eq!(at(d("2024-01-03")).period, 2.0);
        assert_eq!(at(d("2024-02-07")).fertility, 1.5);
        assert_eq!(at(d("2024-02-12")).fertility, 2.0);
        assert_eq!(at(d("2024-02-13")).fertility, 0.0);
    }
}
