use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};

use crate::crypto::{self, Vault};
use crate::models::{AppData, PeriodRecord, Symptom, UserId, UserProfile};
use crate::repository::{periods_for, symptoms_for, upsert_profile_in, CycleRepository, RepoResult};

const APP_DIR: &str = "cyclecal";
const DATA_FILE: &str = "data.cyclecal";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("crypto error: {0}")]
    Crypto(#[from] crypto::CryptoError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("data directory not found")]
    NoDataDir,
    #[error("vault already exists at {0}")]
    AlreadyExists(PathBuf),
    #[error("vault is locked")]
    Locked,
    #[error("store lock poisoned")]
    Poisoned,
}

/// Path of the vault file under `data_dir`, or the platform data dir.
pub fn data_file_path(data_dir: Option<&Path>) -> Result<PathBuf, StorageError> {
    let base = match data_dir {
        Some(dir) => dir.to_path_buf(),
        None => dirs::data_local_dir().ok_or(StorageError::NoDataDir)?,
    };
    Ok(base.join(APP_DIR).join(DATA_FILE))
}

struct Unlocked {
    vault: Vault,
    data: AppData,
}

/// Passphrase-sealed local store. Every write re-seals the whole file.
pub struct EncryptedRepository {
    path: PathBuf,
    state: Mutex<Option<Unlocked>>,
}

impl EncryptedRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            state: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Start an empty vault. Refuses to overwrite an existing file.
    pub fn create(&self, passphrase: &str) -> Result<(), StorageError> {
        if self.exists() {
            return Err(StorageError::AlreadyExists(self.path.clone()));
        }
        let unlocked = Unlocked {
            vault: Vault::create(passphrase)?,
            data: AppData::default(),
        };
        self.persist(&unlocked.vault, &unlocked.data)?;
        *self.state.lock().map_err(|_| StorageError::Poisoned)? = Some(unlocked);
        info!(path = %self.path.display(), "vault created");
        Ok(())
    }

    pub fn unlock(&self, passphrase: &str) -> Result<(), StorageError> {
        let sealed = fs::read(&self.path)?;
        let (vault, plaintext) = Vault::unlock(passphrase, &sealed)?;
        let data: AppData = serde_json::from_slice(&plaintext)?;
        debug!(
            periods = data.periods.len(),
            symptoms = data.symptoms.len(),
            "vault unlocked"
        );
        *self.state.lock().map_err(|_| StorageError::Poisoned)? = Some(Unlocked { vault, data });
        Ok(())
    }

    /// Drop decrypted data and key material from memory.
    pub fn lock(&self) {
        if let Ok(mut state) = self.state.lock() {
            *state = None;
        }
        debug!("vault locked");
    }

    pub fn is_unlocked(&self) -> bool {
        self.state.lock().map(|s| s.is_some()).unwrap_or(false)
    }

    /// Pretty JSON of everything in the vault.
    pub fn export(&self) -> Result<String, StorageError> {
        self.read(|data| serde_json::to_string_pretty(data))?
            .map_err(StorageError::from)
    }

    /// Lock and delete the vault file permanently.
    pub fn wipe(&self) -> Result<(), StorageError> {
        self.lock();
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        info!(path = %self.path.display(), "vault wiped");
        Ok(())
    }

    fn persist(&self, vault: &Vault, data: &AppData) -> Result<(), StorageError> {
        let json = serde_json::to_vec(data)?;
        let sealed = vault.seal(&json)?;
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, sealed)?;
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&AppData) -> T) -> RepoResult<T> {
        let state = self.state.lock().map_err(|_| StorageError::Poisoned)?;
        let unlocked = state.as_ref().ok_or(StorageError::Locked)?;
        Ok(f(&unlocked.data))
    }

    /// Memory only changes once the sealed file is on disk.
    fn write(&self, f: impl FnOnce(&mut AppData)) -> RepoResult<()> {
        let mut state = self.state.lock().map_err(|_| StorageError::Poisoned)?;
        let unlocked = state.as_mut().ok_or(StorageError::Locked)?;
        let mut next = unlocked.data.clone();
        f(&mut next);
        self.persist(&unlocked.vault, &next)?;
        unlocked.data = next;
        Ok(())
    }
}

impl CycleRepository for EncryptedRepository {
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

    fn repo_in(dir: &tempfile::TempDir) -> EncryptedRepository {
        EncryptedRepository::new(data_file_path(Some(dir.path())).unwrap())
    }

    #[test]
    fn data_survives_lock_and_unlock() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_in(&dir);
        repo.create("hunter2").unwrap();
        assert!(repo.exists());

        let user = Uuid::new_v4();
        let mut p = PeriodRecord::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), None);
        p.user_id = user;
        repo.insert_period(p).unwrap();

        repo.lock();
        assert!(matches!(repo.fetch_periods(user), Err(StorageError::Locked)));

        let reopened = repo_in(&dir);
        reopened.unlock("hunter2").unwrap();
        assert_eq!(reopened.fetch_periods(user).unwrap().len(), 1);
    }

    #[test]
    fn wrong_passphrase_does_not_unlock() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_in(&dir);
        repo.create("right").unwrap();
        repo.lock();
        assert!(matches!(
            repo.unlock("wrong"),
            Err(StorageError::Crypto(crypto::CryptoError::Decryption))
        ));
        assert!(!repo.is_unlocked());
    }

    #[test]
    fn create_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_in(&dir);
        repo.create("pw").unwrap();
        assert!(matches!(
            repo.create("pw"),
            Err(StorageError::AlreadyExists(_))
        ));
    }

    #[test]
    fn failed_write_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_in(&dir);
        repo.create("pw").unwrap();

        // a plain file where the vault directory should be makes every save fail
        let vault_dir = repo.path().parent().unwrap().to_path_buf();
        fs::remove_dir_all(&vault_dir).unwrap();
        fs::write(&vault_dir, b"").unwrap();

        let user = Uuid::new_v4();
        let mut p = PeriodRecord::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), None);
        p.user_id = user;
        assert!(matches!(repo.insert_period(p), Err(StorageError::Io(_))));
        assert!(repo.fetch_periods(user).unwrap().is_empty());
        assert!(repo.fetch_profile(user).unwrap().is_none());
    }

    #[test]
    fn wipe_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_in(&dir);
        repo.create("pw").unwrap();
        let json = repo.export().unwrap();
        assert!(json.contains("periods"));
        repo.wipe().unwrap();
        assert!(!repo.exists());
        assert!(!repo.is_unlocked());
    }
}
