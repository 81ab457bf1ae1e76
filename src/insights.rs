//! Dashboard summary values derived from period history and profile.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{FertilityWindow, PeriodRecord, UserProfile};
use crate::phase::{classify_phase_default, PhaseInfo};
use crate::prediction::{
    average_cycle_length, cycle_progress, days_until, fertility_window, last_period_start,
    predict_next_period, DEFAULT_CYCLE_LENGTH,
};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Insights {
    pub average_cycle_length: i64,
    pub last_period_start: NaiveDate,
    pub next_period: NaiveDate,
    pub fertility: FertilityWindow,
    pub recorded_periods: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleOverview {
    pub insights: Insights,
    pub phase: PhaseInfo,
    pub days_until_next_period: i64,
    pub cycle_progress: i64,
}

/// A stored cycle-length preference wins over the computed average. With no
/// logged periods, the profile's last period start is used as the anchor.
pub fn compute_insights(
    periods: &[PeriodRecord],
    profile: Option<&UserProfile>,
) -> Option<Insights> {
    let preferred = profile.and_then(|p| p.average_cycle_length);

    let (anchor, cycle_length) = match last_period_start(periods) {
        Some(anchor) => (anchor, preferred.unwrap_or_else(|| average_cycle_length(periods))),
        None => {
            let anchor = profile.and_then(|p| p.last_period_start)?;
            (anchor, preferred.unwrap_or(DEFAULT_CYCLE_LENGTH))
        }
    };

    Some(Insights {
        average_cycle_length: cycle_length,
        last_period_start: anchor,
        next_period: predict_next_period(anchor, cycle_length),
        fertility: fertility_window(anchor, cycle_length),
        recorded_periods: periods.len(),
    })
}

pub fn overview(insights: &Insights, today: NaiveDate) -> CycleOverview {
    CycleOverview {
        phase: classify_phase_default(today, insights.last_period_start, &insights.fertility),
        days_until_next_period: days_until(today, insights.next_period),
        cycle_progress: cycle_progress(
            today,
            insights.last_period_start,
            insights.average_cycle_length,
        ),
        insights: insights.clone(),
    }
}
