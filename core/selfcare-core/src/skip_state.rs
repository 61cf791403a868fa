//! Persisted deferral state for the reboot reminder.
//!
//! Reads and writes `~/.selfcare/uptime_skip_state.json`. The monitor
//! loop is the only writer; every mutation is persisted immediately so a
//! daemon restart resumes the escalation cycle where it left off.
//!
//! # Defensive Design
//!
//! Since the file may be missing on first run or left corrupt by a crash,
//! loading handles:
//! - Missing files (return empty state)
//! - Corrupt JSON (return empty state, log warning)
//!
//! # Atomic Writes
//!
//! Uses temp file + rename so a crash mid-write never leaves a partial
//! file behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::CoreError;

/// A deferral length the user can pick, ordered by strictly decreasing
/// magnitude. The menu narrows as the alert count grows and never
/// re-widens within an escalation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipDuration {
    Hours12,
    Hours10,
    Hours3,
    Minutes10,
}

impl SkipDuration {
    pub fn as_secs(self) -> u64 {
        match self {
            SkipDuration::Hours12 => 12 * 3600,
            SkipDuration::Hours10 => 10 * 3600,
            SkipDuration::Hours3 => 3 * 3600,
            SkipDuration::Minutes10 => 10 * 60,
        }
    }

    pub fn display_label(self) -> &'static str {
        match self {
            SkipDuration::Hours12 => "12 hours",
            SkipDuration::Hours10 => "10 hours",
            SkipDuration::Hours3 => "3 hours",
            SkipDuration::Minutes10 => "10 minutes",
        }
    }
}

/// The persisted aggregate driving escalation.
///
/// Invariant: `last_skip_time` and `last_skip_duration` are both set or
/// both unset. [`SkipState::record_skip`] and [`SkipState::reset`] are
/// the only mutators, which is what keeps the invariant.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SkipState {
    #[serde(default)]
    pub alert_count: u32,
    #[serde(default)]
    pub last_skip_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_skip_duration: Option<SkipDuration>,
}

impl SkipState {
    pub fn record_skip(&mut self, duration: SkipDuration, now: DateTime<Utc>) {
        self.alert_count += 1;
        self.last_skip_time = Some(now);
        self.last_skip_duration = Some(duration);
    }

    pub fn reset(&mut self) {
        *self = SkipState::default();
    }

    /// The instant at which the active skip window ends, if one is set.
    pub fn skip_window_end(&self) -> Option<DateTime<Utc>> {
        match (self.last_skip_time, self.last_skip_duration) {
            (Some(time), Some(duration)) => {
                Some(time + chrono::Duration::seconds(duration.as_secs() as i64))
            }
            _ => None,
        }
    }
}

/// File-backed store for [`SkipState`].
pub struct SkipStateStore {
    file_path: PathBuf,
}

impl SkipStateStore {
    pub fn new(file_path: &Path) -> Self {
        Self {
            file_path: file_path.to_path_buf(),
        }
    }

    /// Loads the persisted state, falling back to empty on a missing or
    /// corrupt file. Never fails.
    pub fn load(&self) -> SkipState {
        if !self.file_path.exists() {
            return SkipState::default();
        }

        let contents = match fs_err::read_to_string(&self.file_path) {
            Ok(contents) => contents,
            Err(err) => {
                warn!(error = %err, "Failed to read skip state; starting empty");
                return SkipState::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(state) => state,
            Err(err) => {
                warn!(error = %err, "Skip state file is corrupt; starting empty");
                SkipState::default()
            }
        }
    }

    /// Persists the state atomically (temp file + rename).
    pub fn save(&self, state: &SkipState) -> Result<(), CoreError> {
        if let Some(parent) = self.file_path.parent() {
            fs_err::create_dir_all(parent).map_err(|err| CoreError::WriteFailed {
                path: parent.to_path_buf(),
                source: err.into(),
            })?;
        }

        let json = serde_json::to_string_pretty(state)?;
        let parent = self
            .file_path
            .parent()
            .unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(parent).map_err(|err| CoreError::WriteFailed {
            path: self.file_path.clone(),
            source: err,
        })?;
        temp.write_all(json.as_bytes())
            .map_err(|err| CoreError::WriteFailed {
                path: self.file_path.clone(),
                source: err,
            })?;
        temp.persist(&self.file_path)
            .map_err(|err| CoreError::WriteFailed {
                path: self.file_path.clone(),
                source: err.error,
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> SkipStateStore {
        SkipStateStore::new(&dir.path().join("uptime_skip_state.json"))
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let state = store_in(&dir).load();
        assert_eq!(state, SkipState::default());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uptime_skip_state.json");
        fs_err::write(&path, "{not json").unwrap();
        let state = SkipStateStore::new(&path).load();
        assert_eq!(state, SkipState::default());
    }

    #[test]
    fn record_skip_persists_and_reloads_identically() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let now = Utc::now();

        let mut state = store.load();
        state.record_skip(SkipDuration::Hours3, now);
        assert_eq!(state.alert_count, 1);
        store.save(&state).unwrap();

        let reloaded = store.load();
        assert_eq!(reloaded, state);
    }

    #[test]
    fn reset_clears_all_fields() {
        let mut state = SkipState {
            alert_count: 7,
            last_skip_time: Some(Utc::now()),
            last_skip_duration: Some(SkipDuration::Minutes10),
        };
        state.reset();
        assert_eq!(state.alert_count, 0);
        assert!(state.last_skip_time.is_none());
        assert!(state.last_skip_duration.is_none());
    }

    #[test]
    fn skip_window_end_requires_both_fields() {
        let state = SkipState::default();
        assert!(state.skip_window_end().is_none());

        let now = Utc::now();
        let mut state = SkipState::default();
        state.record_skip(SkipDuration::Minutes10, now);
        assert_eq!(
            state.skip_window_end(),
            Some(now + chrono::Duration::seconds(600))
        );
    }
}
