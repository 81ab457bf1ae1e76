use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{FertilityWindow, DEFAULT_PERIOD_DAYS};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CyclePhase {
    Menstrual,
    Follicular,
    Fertile,
    Luteal,
}

impl CyclePhase {
    pub fn title(self) -> &'static str {
        match self {
            CyclePhase::Menstrual => "Menstrual Phase",
            CyclePhase::Follicular => "Follicular Phase",
            CyclePhase::Fertile => "Fertile Phase",
            CyclePhase::Luteal => "Luteal Phase",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CyclePhase::Menstrual => "Your period. Shedding of uterine lining.",
            CyclePhase::Follicular => "Follicles in ovaries develop. Estrogen levels rise.",
            CyclePhase::Fertile => {
                "Higher chance of getting pregnant. Fertility peaks around ovulation."
            }
            CyclePhase::Luteal => {
                "Progesterone rises to prepare for possible pregnancy. If no pregnancy occurs, hormones drop."
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PhaseInfo {
    pub phase: CyclePhase,
    pub description: &'static str,
}

impl From<CyclePhase> for PhaseInfo {
    fn from(phase: CyclePhase) -> Self {
        Self {
            phase,
            description: phase.description(),
        }
    }
}

/// Place `today` in the cycle that began on `last_period_start`.
///
/// Rules are checked in order and the first match wins, so a day that is both
/// menstrual and fertile (very short cycles) reports `Fertile`. Anything not
/// matched earlier, including days before `last_period_start`, is `Luteal`.
pub fn classify_phase(
    today: NaiveDate,
    last_period_start: NaiveDate,
    window: &FertilityWindow,
    menstrual_days: i64,
) -> PhaseInfo {
    let menstrual_end = last_period_start + Duration::days(menstrual_days);

    let phase = if window.contains(today) {
        CyclePhase::Fertile
    } else if today >= last_period_start && today <= menstrual_end {
        CyclePhase::Menstrual
    } else if today > menstrual_end && today < window.fertility_start {
        CyclePhase::Follicular
    } else {
        CyclePhase::Luteal
    };

    phase.into()
}

/// [`classify_phase`] with the default five-day menstrual span.
pub fn classify_phase_default(
    today: NaiveDate,
    last_period_start: NaiveDate,
    window: &FertilityWindow,
) -> PhaseInfo {
    classify_phase(today, last_period_start, window, DEFAULT_PERIOD_DAYS)
}
