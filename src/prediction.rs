use chrono::{Duration, NaiveDate};

use crate::models::{FertilityWindow, FlowLevel, PeriodRecord, PeriodStatus};

/// Cycle length assumed when history cannot support an average.
pub const DEFAULT_CYCLE_LENGTH: i64 = 28;
/// Inclusive bounds for a start-to-start gap to count as a real cycle.
pub const MIN_CYCLE_SAMPLE: i64 = 21;
pub const MAX_CYCLE_SAMPLE: i64 = 45;
/// Ovulation is placed this many days before the next period.
pub const LUTEAL_PHASE_DAYS: i64 = 14;
pub const FERTILE_DAYS_BEFORE_OVULATION: i64 = 5;

/// Average start-to-start cycle length over the logged history.
///
/// Input order does not matter. Gaps outside 21..=45 days (usually a missed
/// log) are dropped rather than capped. With fewer than two periods, or no
/// gap in range, this falls back to [`DEFAULT_CYCLE_LENGTH`].
pub fn average_cycle_length(periods: &[PeriodRecord]) -> i64 {
    if periods.len() < 2 {
        return DEFAULT_CYCLE_LENGTH;
    }

    let mut starts: Vec<NaiveDate> = periods.iter().map(|p| p.start_date).collect();
    starts.sort();

    let samples: Vec<i64> = starts
        .windows(2)
        .map(|w| (w[1] - w[0]).num_days())
        .filter(|days| (MIN_CYCLE_SAMPLE..=MAX_CYCLE_SAMPLE).contains(days))
        .collect();

    if samples.is_empty() {
        return DEFAULT_CYCLE_LENGTH;
    }

    mean(&samples).round() as i64
}

/// Fertile days for the cycle that began on `last_period_start`.
///
/// Ovulation is 14 days before the next expected period; the window is the
/// five days before it plus ovulation day. Cycle lengths under 14 are not
/// rejected here and put ovulation before the period start; stored
/// preferences are range-checked before they reach this point.
pub fn fertility_window(last_period_start: NaiveDate, average_cycle_length: i64) -> FertilityWindow {
    let ovulation_date = offset_days(
        last_period_start,
        average_cycle_length.saturating_sub(LUTEAL_PHASE_DAYS),
    );
    FertilityWindow {
        fertility_start: offset_days(ovulation_date, -FERTILE_DAYS_BEFORE_OVULATION),
        ovulation_date,
        fertility_end: ovulation_date,
    }
}

/// Expected start of the next period. Total for any cycle length.
pub fn predict_next_period(last_period_start: NaiveDate, average_cycle_length: i64) -> NaiveDate {
    offset_days(last_period_start, average_cycle_length)
}

/// `date + days`, clamped to the representable calendar instead of panicking.
pub fn offset_days(date: NaiveDate, days: i64) -> NaiveDate {
    Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .unwrap_or(if days < 0 {
            NaiveDate::MIN
        } else {
            NaiveDate::MAX
        })
}

/// Whether `date` falls inside any logged period.
pub fn period_status(date: NaiveDate, periods: &[PeriodRecord]) -> PeriodStatus {
    periods
        .iter()
        .find(|p| p.contains(date))
        .map(|p| PeriodStatus {
            is_on_period: true,
            flow_level: Some(p.flow_level.unwrap_or(FlowLevel::Medium)),
        })
        .unwrap_or(PeriodStatus {
            is_on_period: false,
            flow_level: None,
        })
}

/// Whole days from `today` until `next_period`, never negative.
pub fn days_until(today: NaiveDate, next_period: NaiveDate) -> i64 {
    (next_period - today).num_days().max(0)
}

/// Percentage of the cycle elapsed since `last_period_start`, capped at 100.
pub fn cycle_progress(today: NaiveDate, last_period_start: NaiveDate, cycle_length: i64) -> i64 {
    if cycle_length <= 0 {
        return 0;
    }
    let elapsed = (today - last_period_start).num_days() as f64;
    let pct = (elapsed / cycle_length as f64 * 100.0).round() as i64;
    pct.min(100)
}

/// Latest period start in the history, regardless of input order.
pub fn last_period_start(periods: &[PeriodRecord]) -> Option<NaiveDate> {
    periods.iter().map(|p| p.start_date).max()
}

fn mean(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<i64>() as f64 / values.len() as f64
}
