use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a tracked user.
pub type UserId = Uuid;

/// Assumed period length when a record has no end date.
pub const DEFAULT_PERIOD_DAYS: i64 = 5;
/// Longest period a user may log in one entry.
pub const MAX_PERIOD_DAYS: i64 = 14;
/// Cycle length bounds accepted as a stored user preference.
pub const MIN_PREFERRED_CYCLE: i64 = 21;
pub const MAX_PREFERRED_CYCLE: i64 = 45;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlowLevel {
    Light,
    Medium,
    Heavy,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

/// One logged menstrual period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodRecord {
    pub id: Uuid,
    pub user_id: UserId,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub flow_level: Option<FlowLevel>,
    #[serde(default)]
    pub flow_intensity: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PeriodRecord {
    /// Bare record with only dates set. Handy for feeding the engine directly.
    pub fn new(start_date: NaiveDate, end_date: Option<NaiveDate>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            start_date,
            end_date,
            flow_level: None,
            flow_intensity: None,
            created_at: Utc::now(),
        }
    }

    /// Last day of the period, assuming [`DEFAULT_PERIOD_DAYS`] when open.
    pub fn effective_end(&self) -> NaiveDate {
        self.end_date
            .unwrap_or(self.start_date + Duration::days(DEFAULT_PERIOD_DAYS))
    }

    /// Inclusive on both ends.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.effective_end()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Symptom {
    pub id: Uuid,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub symptom_type: String,
    pub severity: Severity,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub average_cycle_length: Option<i64>,
    pub last_period_start: Option<NaiveDate>,
    #[serde(default)]
    pub pregnancy_mode: bool,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl UserProfile {
    /// Empty profile with no preferences set.
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            average_cycle_length: None,
            last_period_start: None,
            pregnancy_mode: false,
            due_date: None,
        }
    }
}

/// Derived fertile span for one cycle. Never persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FertilityWindow {
    pub fertility_start: NaiveDate,
    pub ovulation_date: NaiveDate,
    pub fertility_end: NaiveDate,
}

impl FertilityWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.fertility_start && date <= self.fertility_end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodStatus {
    pub is_on_period: bool,
    pub flow_level: Option<FlowLevel>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("end date {end} precedes start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    #[error("period of {0} days exceeds the 14-day limit")]
    PeriodTooLong(i64),
    #[error("symptom type is required")]
    EmptySymptomType,
    #[error("cycle length {0} is outside 21..=45 days")]
    CycleLengthOutOfRange(i64),
    #[error("due date {due} is before {today}")]
    DueDateInPast { due: NaiveDate, today: NaiveDate },
}

/// Period entry as submitted by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPeriod {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub flow_level: Option<FlowLevel>,
    pub flow_intensity: Option<String>,
}

impl NewPeriod {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let Some(end) = self.end_date else {
            return Ok(());
        };
        if end < self.start_date {
            return Err(ValidationError::EndBeforeStart {
                start: self.start_date,
                end,
            });
        }
        let days = (end - self.start_date).num_days();
        if days > MAX_PERIOD_DAYS {
            return Err(ValidationError::PeriodTooLong(days));
        }
        Ok(())
    }

    pub fn into_record(self, user_id: UserId) -> PeriodRecord {
        PeriodRecord {
            id: Uuid::new_v4(),
            user_id,
            start_date: self.start_date,
            end_date: self.end_date,
            flow_level: self.flow_level,
            flow_intensity: self.flow_intensity,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSymptom {
    pub date: NaiveDate,
    pub symptom_type: String,
    pub severity: Severity,
    pub notes: Option<String>,
}

impl NewSymptom {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.symptom_type.trim().is_empty() {
            return Err(ValidationError::EmptySymptomType);
        }
        Ok(())
    }

    pub fn into_record(self, user_id: UserId) -> Symptom {
        Symptom {
            id: Uuid::new_v4(),
            user_id,
            date: self.date,
            symptom_type: self.symptom_type.trim().to_lowercase(),
            severity: self.severity,
            notes: self.notes.filter(|n| !n.trim().is_empty()),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub average_cycle_length: Option<i64>,
    pub last_period_start: Option<NaiveDate>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.average_cycle_length {
            Some(len) if !(MIN_PREFERRED_CYCLE..=MAX_PREFERRED_CYCLE).contains(&len) => {
                Err(ValidationError::CycleLengthOutOfRange(len))
            }
            _ => Ok(()),
        }
    }
}

/// Everything one vault file holds.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    pub periods: Vec<PeriodRecord>,
    pub symptoms: Vec<Symptom>,
    pub profiles: Vec<UserProfile>,
}
