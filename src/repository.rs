use std::sync::Mutex;

use crate::models::{AppData, PeriodRecord, Symptom, UserId, UserProfile};
use crate::storage::StorageError;

pub type RepoResult<T> = Result<T, StorageError>;

/// Fetch/insert access to a user's records. Implementations scope every
/// read to the given user.
pub trait CycleRepository {
    /// Periods ordered by start date ascending.
    fn fetch_periods(&self, user: UserId) -> RepoResult<Vec<PeriodRecord>>;
    fn insert_period(&self, period: PeriodRecord) -> RepoResult<()>;
    /// Symptoms ordered by date ascending.
    fn fetch_symptoms(&self, user: UserId) -> RepoResult<Vec<Symptom>>;
    fn insert_symptom(&self, symptom: Symptom) -> RepoResult<()>;
    fn fetch_profile(&self, user: UserId) -> RepoResult<Option<UserProfile>>;
    fn upsert_profile(&self, profile: UserProfile) -> RepoResult<()>;
}

pub(crate) fn periods_for(data: &AppData, user: UserId) -> Vec<PeriodRecord> {
    let mut periods: Vec<PeriodRecord> = data
        .periods
        .iter()
        .filter(|p| p.user_id == user)
        .cloned()
        .collect();
    periods.sort_by_key(|p| p.start_date);
    periods
}

pub(crate) fn symptoms_for(data: &AppData, user: UserId) -> Vec<Symptom> {
    let mut symptoms: Vec<Symptom> = data
        .symptoms
        .iter()
        .filter(|s| s.user_id == user)
        .cloned()
        .collect();
    symptoms.sort_by_key(|s| s.date);
    symptoms
}

pub(crate) fn upsert_profile_in(data: &mut AppData, profile: UserProfile) {
    match data.profiles.iter_mut().find(|p| p.id == profile.id) {
        Some(existing) => *existing = profile,
        None => data.profiles.push(profile),
    }
}

/// In-process store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    data: Mutex<AppData>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&AppData) -> T) -> RepoResult<T> {
        let data = self.data.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(f(&data))
    }

    fn write(&self, f: impl FnOnce(&mut AppData)) -> RepoResult<()> {
        let mut data = self.data.lock().map_err(|_| StorageError::Poisoned)?;
        f(&mut data);
        Ok(())
    }
}

impl CycleRepository for MemoryRepository {
    fn fetch_periods(&self, user: UserId) -> RepoResult<Vec<PeriodRecord>> {
        self.read(|d| periods_for(d, user))
    }

    fn insert_period(&self, period: PeriodRecord) -> RepoResult<()> {
        self.write(|d| d.periods.push(period))
    }

    fn fetch_symptoms(&self, user: UserId) -> RepoResult<Vec<Symptom>> {
        self.read(|d| symptoms_for(d, user))
    }

    fn insert_symptom(&self, symptom: Symptom) -> RepoResult<()> {
        self.write(|d| d.symptoms.push(symptom))
    }

    fn fetch_profile(&self, user: UserId) -> RepoResult<Option<UserProfile>> {
        self.read(|d| d.profiles.iter().find(|p| p.id == user).cloned())
    }

    fn upsert_profile(&self, profile: UserProfile) -> RepoResult<()> {
        self.write(|d| upsert_profile_in(d, profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn period(user: UserId, start: &str) -> PeriodRecord {
        let mut p = PeriodRecord::new(d(start), None);
        p.user_id = user;
        p
    }

    #[test]
    fn periods_scoped_and_sorted() {
        let repo = MemoryRepository::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        repo.insert_period(period(alice, "2024-02-01")).unwrap();
        repo.insert_period(period(bob, "2024-01-15")).unwrap();
        repo.insert_period(period(alice, "2024-01-01")).unwrap();

        let got = repo.fetch_periods(alice).unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].start_date, d("2024-01-01"));
        assert_eq!(got[1].start_date, d("2024-02-01"));
    }

    #[test]
    fn profile_upsert_replaces() {
        let repo = MemoryRepository::new();
        let id = Uuid::new_v4();
        let mut profile = UserProfile::new(id, "a@example.com");
        repo.upsert_profile(profile.clone()).unwrap();
        profile.average_cycle_length = Some(30);
        repo.upsert_profile(profile).unwrap();

        let stored = repo.fetch_profile(id).unwrap().unwrap();
        assert_eq!(stored.average_cycle_length, Some(30));
        assert!(repo.fetch_profile(Uuid::new_v4()).unwrap().is_none());
    }
}
