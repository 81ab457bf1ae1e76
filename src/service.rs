use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::calendar::{month_view, MonthView};
use crate::chart::{cycle_series, CycleSeries, DEFAULT_WINDOW_DAYS};
use crate::insights::{compute_insights, overview, CycleOverview, Insights};
use crate::models::{
    NewPeriod, NewSymptom, PeriodRecord, ProfileUpdate, Symptom, UserProfile, ValidationError,
};
use crate::pregnancy::{pregnancy_status, PregnancyStatus};
use crate::repository::CycleRepository;
use crate::session::Session;
use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("invalid month {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },
}

/// One calendar month plus the symptoms logged inside it.
#[derive(Debug, Clone, Serialize)]
pub struct MonthData {
    pub view: MonthView,
    pub symptoms: Vec<Symptom>,
    pub insights: Option<Insights>,
}

/// Glue between stored records and the prediction engine. Each call reads
/// fresh history, so results follow the data without caching.
pub struct Tracker<R> {
    repo: R,
    chart_window_days: u32,
}

impl<R: CycleRepository> Tracker<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            chart_window_days: DEFAULT_WINDOW_DAYS,
        }
    }

    pub fn with_chart_window(mut self, days: u32) -> Self {
        self.chart_window_days = days;
        self
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Store a period and move the profile's last period start to it.
    pub fn log_period(&self, session: &Session, entry: NewPeriod) -> Result<PeriodRecord, TrackerError> {
        if let Err(err) = entry.validate() {
            warn!(user = %session.user_id, error = %err, "period rejected");
            return Err(err.into());
        }

        let record = entry.into_record(session.user_id);
        self.repo.insert_period(record.clone())?;

        let mut profile = self.profile_or_default(session)?;
        profile.last_period_start = Some(record.start_date);
        self.repo.upsert_profile(profile)?;

        info!(user = %session.user_id, start = %record.start_date, "period logged");
        Ok(record)
    }

    pub fn log_symptom(&self, session: &Session, entry: NewSymptom) -> Result<Symptom, TrackerError> {
        if let Err(err) = entry.validate() {
            warn!(user = %session.user_id, error = %err, "symptom rejected");
            return Err(err.into());
        }
        let record = entry.into_record(session.user_id);
        self.repo.insert_symptom(record.clone())?;
        info!(user = %session.user_id, date = %record.date, kind = %record.symptom_type, "symptom logged");
        Ok(record)
    }

    /// Fields left `None` in `update` keep their stored value.
    pub fn update_profile(
        &self,
        session: &Session,
        update: ProfileUpdate,
    ) -> Result<UserProfile, TrackerError> {
        if let Err(err) = update.validate() {
            warn!(user = %session.user_id, error = %err, "profile update rejected");
            return Err(err.into());
        }
        let mut profile = self.profile_or_default(session)?;
        if update.average_cycle_length.is_some() {
            profile.average_cycle_length = update.average_cycle_length;
        }
        if update.last_period_start.is_some() {
            profile.last_period_start = update.last_period_start;
        }
        self.repo.upsert_profile(profile.clone())?;
        info!(user = %session.user_id, "profile updated");
        Ok(profile)
    }

    pub fn profile(&self, session: &Session) -> Result<Option<UserProfile>, TrackerError> {
        Ok(self.repo.fetch_profile(session.user_id)?)
    }

    pub fn periods(&self, session: &Session) -> Result<Vec<PeriodRecord>, TrackerError> {
        Ok(self.repo.fetch_periods(session.user_id)?)
    }

    pub fn insights(&self, session: &Session) -> Result<Option<Insights>, TrackerError> {
        let periods = self.repo.fetch_periods(session.user_id)?;
        let profile = self.repo.fetch_profile(session.user_id)?;
        let insights = compute_insights(&periods, profile.as_ref());
        debug!(
            user = %session.user_id,
            periods = periods.len(),
            cycle_length = ?insights.as_ref().map(|i| i.average_cycle_length),
            "insights computed"
        );
        Ok(insights)
    }

    pub fn overview(
        &self,
        session: &Session,
        today: NaiveDate,
    ) -> Result<Option<CycleOverview>, TrackerError> {
        Ok(self.insights(session)?.map(|i| overview(&i, today)))
    }

    pub fn month(
        &self,
        session: &Session,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> Result<MonthData, TrackerError> {
        let first =
            NaiveDate::from_ymd_opt(year, month, 1).ok_or(TrackerError::InvalidMonth { year, month })?;

        let periods = self.repo.fetch_periods(session.user_id)?;
        let profile = self.repo.fetch_profile(session.user_id)?;
        let insights = compute_insights(&periods, profile.as_ref());

        let view = month_view(
            first,
            &periods,
            insights.as_ref().map(|i| &i.fertility),
            insights.as_ref().map(|i| i.next_period),
            today,
        );

        let symptoms = self
            .repo
            .fetch_symptoms(session.user_id)?
            .into_iter()
            .filter(|s| view.days.iter().any(|d| d.in_month && d.date == s.date))
            .collect();

        debug!(user = %session.user_id, year, month, "month annotated");
        Ok(MonthData {
            view,
            symptoms,
            insights,
        })
    }

    /// Turn on pregnancy mode with the given due date. Past due dates are
    /// rejected; today itself is accepted.
    pub fn activate_pregnancy(
        &self,
        session: &Session,
        due_date: NaiveDate,
        today: NaiveDate,
    ) -> Result<PregnancyStatus, TrackerError> {
        if due_date < today {
            let err = ValidationError::DueDateInPast { due: due_date, today };
            warn!(user = %session.user_id, error = %err, "pregnancy mode rejected");
            return Err(err.into());
        }
        let mut profile = self.profile_or_default(session)?;
        profile.pregnancy_mode = true;
        profile.due_date = Some(due_date);
        self.repo.upsert_profile(profile)?;

        info!(user = %session.user_id, due = %due_date, "pregnancy mode activated");
        Ok(pregnancy_status(due_date, today))
    }

    /// `None` unless pregnancy mode is on with a due date recorded.
    pub fn pregnancy_status(
        &self,
        session: &Session,
        today: NaiveDate,
    ) -> Result<Option<PregnancyStatus>, TrackerError> {
        let profile = self.repo.fetch_profile(session.user_id)?;
        Ok(profile
            .filter(|p| p.pregnancy_mode)
            .and_then(|p| p.due_date)
            .map(|due| pregnancy_status(due, today)))
    }

    pub fn chart(&self, session: &Session) -> Result<Option<CycleSeries>, TrackerError> {
        let periods = self.repo.fetch_periods(session.user_id)?;
        Ok(cycle_series(&periods, self.chart_window_days))
    }

    fn profile_or_default(&self, session: &Session) -> Result<UserProfile, StorageError> {
        Ok(self
            .repo
            .fetch_profile(session.user_id)?
            .unwrap_or_else(|| UserProfile::new(session.user_id, session.email.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::DayMark;
    use crate::models::{FlowLevel, Severity};
    use crate::phase::CyclePhase;
    use crate::repository::MemoryRepository;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn period(start: &str, end: Option<&str>) -> NewPeriod {
        NewPeriod {
            start_date: d(start),
            end_date: end.map(d),
            flow_level: Some(FlowLevel::Medium),
            flow_intensity: None,
        }
    }

    fn tracker() -> (Tracker<MemoryRepository>, Session) {
        (
            Tracker::new(MemoryRepository::new()),
            Session::for_email("user@example.com"),
        )
    }

    #[test]
    fn logging_period_updates_profile() {
        let (t, s) = tracker();
        t.log_period(&s, period("2024-01-01", Some("2024-01-05"))).unwrap();
        let profile = t.profile(&s).unwrap().unwrap();
        assert_eq!(profile.last_period_start, Some(d("2024-01-01")));
        assert_eq!(profile.email, "user@example.com");
    }

    #[test]
    fn invalid_period_not_stored() {
        let (t, s) = tracker();
        let err = t.log_period(&s, period("2024-01-05", Some("2024-01-01")));
        assert!(matches!(err, Err(TrackerError::Validation(_))));
        assert!(t.periods(&s).unwrap().is_empty());
    }

    #[test]
    fn overview_follows_history() {
        let (t, s) = tracker();
        assert!(t.overview(&s, d("2024-01-03")).unwrap().is_none());

        t.log_period(&s, period("2024-01-01", Some("2024-01-05"))).unwrap();
        let ov = t.overview(&s, d("2024-01-03")).unwrap().unwrap();
        assert_eq!(ov.phase.phase, CyclePhase::Menstrual);
        assert_eq!(ov.insights.next_period, d("2024-01-29"));
    }

    #[test]
    fn profile_preference_drives_prediction() {
        let (t, s) = tracker();
        t.log_period(&s, period("2024-01-01", None)).unwrap();
        t.update_profile(
            &s,
            ProfileUpdate {
                average_cycle_length: Some(30),
                last_period_start: None,
            },
        )
        .unwrap();
        let ins = t.insights(&s).unwrap().unwrap();
        assert_eq!(ins.next_period, d("2024-01-31"));
        // last_period_start survives a partial update
        let profile = t.profile(&s).unwrap().unwrap();
        assert_eq!(profile.last_period_start, Some(d("2024-01-01")));
    }

    #[test]
    fn out_of_range_preference_rejected() {
        let (t, s) = tracker();
        let err = t.update_profile(
            &s,
            ProfileUpdate {
                average_cycle_length: Some(10),
                last_period_start: None,
            },
        );
        assert!(matches!(
            err,
            Err(TrackerError::Validation(ValidationError::CycleLengthOutOfRange(10)))
        ));
    }

    #[test]
    fn month_marks_and_symptoms() {
        let (t, s) = tracker();
        t.log_period(&s, period("2024-01-01", Some("2024-01-05"))).unwrap();
        t.log_symptom(
            &s,
            NewSymptom {
                date: d("2024-01-02"),
                symptom_type: "Cramps".into(),
                severity: Severity::Moderate,
                notes: None,
            },
        )
        .unwrap();
        t.log_symptom(
            &s,
            NewSymptom {
                date: d("2024-02-10"),
                symptom_type: "Headache".into(),
                severity: Severity::Mild,
                notes: None,
            },
        )
        .unwrap();

        let data = t.month(&s, 2024, 1, d("2024-01-15")).unwrap();
        let mark = |date: NaiveDate| data.view.days.iter().find(|c| c.date == date).unwrap().mark;
        assert_eq!(mark(d("2024-01-15")), DayMark::Ovulation);
        assert_eq!(mark(d("2024-01-12")), DayMark::Fertile);
        assert_eq!(mark(d("2024-01-29")), DayMark::PredictedNext);
        assert_eq!(data.symptoms.len(), 1);
        assert_eq!(data.symptoms[0].symptom_type, "cramps");
    }

    #[test]
    fn invalid_month_rejected() {
        let (t, s) = tracker();
        assert!(matches!(
            t.month(&s, 2024, 13, d("2024-01-01")),
            Err(TrackerError::InvalidMonth { .. })
        ));
    }

    #[test]
    fn pregnancy_mode_round_trip() {
        let (t, s) = tracker();
        assert!(t.pregnancy_status(&s, d("2024-05-19")).unwrap().is_none());

        let status = t
            .activate_pregnancy(&s, d("2024-10-06"), d("2024-05-19"))
            .unwrap();
        assert_eq!(status.current_week, 21);

        let profile = t.profile(&s).unwrap().unwrap();
        assert!(profile.pregnancy_mode);
        assert_eq!(profile.due_date, Some(d("2024-10-06")));

        let later = t.pregnancy_status(&s, d("2024-09-29")).unwrap().unwrap();
        assert_eq!(later.current_week, 40);
        assert_eq!(later.next_milestone.title, "Due Date");
    }

    #[test]
    fn past_due_date_rejected() {
        let (t, s) = tracker();
        let err = t.activate_pregnancy(&s, d("2024-05-18"), d("2024-05-19"));
        assert!(matches!(
            err,
            Err(TrackerError::Validation(ValidationError::DueDateInPast { .. }))
        ));
        assert!(t.profile(&s).unwrap().is_none());
        assert!(t.activate_pregnancy(&s, d("2024-05-19"), d("2024-05-19")).is_ok());
    }

    #[test]
    fn pregnancy_keeps_cycle_preferences() {
        let (t, s) = tracker();
        t.log_period(&s, period("2024-01-01", None)).unwrap();
        t.activate_pregnancy(&s, d("2024-10-06"), d("2024-02-01")).unwrap();
        let profile = t.profile(&s).unwrap().unwrap();
        assert_eq!(profile.last_period_start, Some(d("2024-01-01")));
    }

    #[test]
    fn users_do_not_see_each_other() {
        let (t, s) = tracker();
        let other = Session::for_email("other@example.com");
        t.log_period(&s, period("2024-01-01", None)).unwrap();
        assert!(t.insights(&other).unwrap().is_none());
        assert!(t.chart(&other).unwrap().is_none());
        assert!(t.chart(&s).unwrap().is_some());
    }
}
