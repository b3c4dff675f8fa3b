use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::models::TrialRecord;
use crate::storage::SavedTrialsStore;

/// Client-computed stable identity for a trial record.
///
/// The backend does not guarantee a primary key in every case, so the key
/// prefers the most stable identifier available: id, then URL, then title.
pub fn derived_key(trial: &TrialRecord) -> String {
    if let Some(id) = trial.id.as_deref().filter(|s| !s.is_empty()) {
        return id.to_string();
    }
    if let Some(url) = trial.url.as_deref().filter(|s| !s.is_empty()) {
        return url.to_string();
    }
    let title = if trial.title.is_empty() {
        "unknown"
    } else {
        trial.title.as_str()
    };
    format!("title:{title}")
}

/// Bookmarked-trial set over an injected store.
///
/// Entries keep insertion order; no two entries share a derived key. Every
/// mutation writes the full list through to the store immediately. Saved
/// records are never reconciled with server state, so staleness is accepted.
pub struct SavedTrials {
    store: Arc<dyn SavedTrialsStore>,
}

impl SavedTrials {
    pub fn new(store: Arc<dyn SavedTrialsStore>) -> Self {
        Self { store }
    }

    pub fn list(&self) -> Vec<TrialRecord> {
        self.store.load()
    }

    pub fn is_saved(&self, trial: &TrialRecord) -> bool {
        let key = derived_key(trial);
        self.store.load().iter().any(|t| derived_key(t) == key)
    }

    /// Insert or remove by derived key. Returns true when the trial is saved
    /// after the call.
    pub fn toggle(&self, trial: &TrialRecord) -> Result<bool> {
        let key = derived_key(trial);
        let mut trials = self.store.load();

        let now_saved = if trials.iter().any(|t| derived_key(t) == key) {
            trials.retain(|t| derived_key(t) != key);
            false
        } else {
            trials.push(trial.clone());
            true
        };

        debug!(%key, now_saved, "toggled saved trial");
        self.store.save(&trials)?;
        Ok(now_saved)
    }

    /// Explicit removal used by the saved-trials view. Returns true when an
    /// entry was actually removed.
    pub fn remove(&self, trial: &TrialRecord) -> Result<bool> {
        let key = derived_key(trial);
        let mut trials = self.store.load();
        let before = trials.len();
        trials.retain(|t| derived_key(t) != key);
        let removed = trials.len() != before;
        if removed {
            self.store.save(&trials)?;
        }
        Ok(removed)
    }
}
