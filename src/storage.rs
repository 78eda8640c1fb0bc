//! Persistence layer.
//!
//! Saves and loads the bot state to/from a JSON file. Writes go to a
//! temp file first and are moved into place with an atomic rename, so
//! the process can be killed between cycles without leaving a torn
//! state file behind.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::types::BotState;

/// Default state file path.
pub const DEFAULT_STATE_FILE: &str = "state.json";

/// Durable store for the whole [`BotState`].
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the state, never failing: a missing file bootstraps (and
    /// persists) a zero-valued state, and an unreadable or corrupt file
    /// is logged as a recoverable read error and replaced by a fresh
    /// state. Loading twice without an intervening save is idempotent.
    pub fn load(&self) -> BotState {
        match self.try_load() {
            Ok(Some(state)) => {
                info!(
                    path = %self.path.display(),
                    bets = state.bets.len(),
                    history = state.history_matches.len(),
                    daily = %state.daily,
                    "State loaded from disk"
                );
                state
            }
            Ok(None) => {
                info!(path = %self.path.display(), "No saved state found, starting fresh");
                let state = BotState::fresh();
                self.save(&state);
                state
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "State file unreadable — falling back to a fresh state"
                );
                BotState::fresh()
            }
        }
    }

    /// Load without the fallback. Returns `Ok(None)` when no file exists.
    pub fn try_load(&self) -> Result<Option<BotState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state from {}", self.path.display()))?;
        let state: BotState = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse state from {}", self.path.display()))?;
        Ok(Some(state))
    }

    /// Whole-state overwrite. Failures are logged and treated as
    /// recoverable — the in-memory state stays authoritative for the
    /// rest of the cycle.
    pub fn save(&self, state: &BotState) {
        if let Err(e) = self.try_save(state) {
            warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to save state — continuing with in-memory state"
            );
        }
    }

    /// Serialize and write via temp-file + rename, durable before
    /// returning.
    pub fn try_save(&self, state: &BotState) -> Result<()> {
        let json = serde_json::to_string_pretty(state).context("Failed to serialise state")?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)
            .with_context(|| format!("Failed to write state to {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to move state into {}", self.path.display()))?;

        debug!(path = %self.path.display(), bytes = json.len(), "State saved");
        Ok(())
    }

    /// Delete the state file (for testing or reset).
    pub fn delete(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("Failed to delete state file {}", self.path.display()))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BetRecord, Selection};
    use rust_decimal_macros::dec;

    fn temp_store() -> StateStore {
        let mut p = std::env::temp_dir();
        p.push(format!("tipster_test_state_{}.json", uuid::Uuid::new_v4()));
        StateStore::new(p)
    }

    #[test]
    fn test_load_bootstraps_and_persists_fresh_state() {
        let store = temp_store();
        let state = store.load();
        assert!(state.bets.is_empty());
        // First load wrote the file
        assert!(store.path().exists());
        store.delete().unwrap();
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let store = temp_store();
        let mut state = BotState::fresh();
        state.record_placement(BetRecord::placed("A v B", Selection::Home, 3.2, dec!(1)));
        store.save(&state);

        let loaded = store.load();
        assert_eq!(loaded.bets.len(), 1);
        assert_eq!(loaded.bets[0].match_id, "A v B");
        assert_eq!(loaded.daily.bets_placed, 1);
        store.delete().unwrap();
    }

    #[test]
    fn test_load_is_idempotent() {
        let store = temp_store();
        let first = store.load();
        let second = store.load();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        store.delete().unwrap();
    }

    #[test]
    fn test_corrupt_file_falls_back_to_fresh() {
        let store = temp_store();
        std::fs::write(store.path(), "{not json!").unwrap();
        let state = store.load();
        assert!(state.bets.is_empty());
        assert!(store.try_load().is_err());
        store.delete().unwrap();
    }

    #[test]
    fn test_try_load_nonexistent_is_none() {
        let store = StateStore::new("/tmp/tipster_nonexistent_state_12345.json");
        assert!(store.try_load().unwrap().is_none());
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let store = temp_store();
        store.save(&BotState::fresh());
        assert!(!store.path().with_extension("json.tmp").exists());
        store.delete().unwrap();
    }

    #[test]
    fn test_delete_nonexistent_ok() {
        let store = StateStore::new("/tmp/tipster_does_not_exist_xyz.json");
        assert!(store.delete().is_ok());
    }
}
