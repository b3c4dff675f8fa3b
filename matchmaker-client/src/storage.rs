use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::models::{Session, TrialRecord};

/// Trait for persisting the authenticated session.
///
/// No expiry checking happens client-side; an expired token is only
/// discovered when a request fails.
pub trait SessionStore: Send + Sync {
    fn save(&self, session: &Session) -> Result<()>;
    /// The stored session, or `None` when absent or unparsable.
    fn load(&self) -> Option<Session>;
    fn clear(&self) -> Result<()>;

    fn current_token(&self) -> Option<String> {
        self.load().map(|s| s.token)
    }

    fn is_authenticated(&self) -> bool {
        self.current_token().is_some()
    }
}

/// Trait for persisting the bookmarked-trial list.
///
/// The list keeps insertion order; key uniqueness is enforced by the
/// [`SavedTrials`](crate::saved_trials::SavedTrials) service, not here.
pub trait SavedTrialsStore: Send + Sync {
    /// The persisted list, or empty when absent or unparsable.
    fn load(&self) -> Vec<TrialRecord>;
    fn save(&self, trials: &[TrialRecord]) -> Result<()>;
}

/// In-memory implementation of SessionStore
#[derive(Default)]
pub struct InMemorySessionStore {
    session: RwLock<Option<Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn save(&self, session: &Session) -> Result<()> {
        *self.session.write().unwrap_or_else(|e| e.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn load(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn clear(&self) -> Result<()> {
        *self.session.write().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

/// In-memory implementation of SavedTrialsStore
#[derive(Default)]
pub struct InMemorySavedTrialsStore {
    trials: RwLock<Vec<TrialRecord>>,
}

impl InMemorySavedTrialsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SavedTrialsStore for InMemorySavedTrialsStore {
    fn load(&self) -> Vec<TrialRecord> {
        self.trials
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn save(&self, trials: &[TrialRecord]) -> Result<()> {
        *self.trials.write().unwrap_or_else(|e| e.into_inner()) = trials.to_vec();
        Ok(())
    }
}

const SESSION_FILE: &str = "session.json";
const SAVED_TRIALS_FILE: &str = "saved_trials_v1.json";

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let raw = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            // Malformed local data is treated as absent, not as an error
            debug!(path = %path.display(), error = %e, "discarding unparsable local data");
            None
        }
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let raw = serde_json::to_string_pretty(value)?;
    fs::write(path, raw)?;
    Ok(())
}

/// File-backed session store: `<data_dir>/session.json`
pub struct JsonFileSessionStore {
    path: PathBuf,
}

impl JsonFileSessionStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: data_dir.into().join(SESSION_FILE),
        }
    }
}

impl SessionStore for JsonFileSessionStore {
    fn save(&self, session: &Session) -> Result<()> {
        write_json(&self.path, session)
    }

    fn load(&self) -> Option<Session> {
        read_json(&self.path)
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// File-backed saved-trials store: `<data_dir>/saved_trials_v1.json`
pub struct JsonFileSavedTrialsStore {
    path: PathBuf,
}

impl JsonFileSavedTrialsStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: data_dir.into().join(SAVED_TRIALS_FILE),
        }
    }
}

impl SavedTrialsStore for JsonFileSavedTrialsStore {
    fn load(&self) -> Vec<TrialRecord> {
        read_json(&self.path).unwrap_or_default()
    }

    fn save(&self, trials: &[TrialRecord]) -> Result<()> {
        write_json(&self.path, &trials.to_vec())
    }
}
