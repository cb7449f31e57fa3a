//! Load, repair, and atomically save the session history file.
//!
//! # Defensive design
//!
//! The file may be missing, empty, or corrupt (crash mid-write, manual edits,
//! disk trouble). Load never fails: any unusable file is overwritten with a
//! freshly serialized empty history, so a broken file is never left in place.
//! A `currentSession` left open by a previous run is closed at load time and
//! appended to the closed list before anything else happens.
//!
//! # Atomic writes
//!
//! Saves go through a temp file in the target directory plus rename, so a
//! crash mid-write can never produce a half-written `sessions.json`.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use fs_err as fs;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{Result, TrackerError};
use crate::history::SessionHistory;

/// File name used when the caller does not supply a path.
pub const HISTORY_FILE_NAME: &str = "sessions.json";

/// Closed sessions older than this are pruned at startup.
pub const RETENTION_DAYS: i64 = 30;

/// Resolves the history file location: the caller-supplied path if given,
/// else `sessions.json` beside the running binary, else the system temp dir.
pub fn default_history_path(override_path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = override_path {
        return path;
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(HISTORY_FILE_NAME)))
        .unwrap_or_else(|| std::env::temp_dir().join(HISTORY_FILE_NAME))
}

/// Loads the history file, healing whatever it finds.
///
/// Missing, blank, or unparsable content resets to an empty history. A
/// session left open by a previous run is closed at `now`. Retention pruning
/// runs here and only here. Any repair is written back immediately; write
/// failures are logged and swallowed so startup always succeeds.
pub fn load_or_repair(path: &Path, now: DateTime<Utc>) -> SessionHistory {
    let (mut history, mut dirty) = match read_history(path) {
        Ok(Some(history)) => (history, false),
        Ok(None) => {
            debug!(path = %path.display(), "no usable history file, seeding empty history");
            (SessionHistory::empty(now), true)
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to load history, resetting to empty");
            (SessionHistory::empty(now), true)
        }
    };

    if history.current_session.is_some() {
        info!("closing session left open by a previous run");
        history.close_current(now);
        dirty = true;
    }

    if history.prune_older_than(now - Duration::days(RETENTION_DAYS)) > 0 {
        dirty = true;
    }

    if dirty {
        if let Err(err) = save(&mut history, path, now) {
            warn!(path = %path.display(), error = %err, "failed to rewrite history file");
        }
    }

    history
}

/// Serializes the full history and writes it atomically to `path`, creating
/// the parent directory if needed. Stamps `last_updated` with `now`.
pub fn save(history: &mut SessionHistory, path: &Path, now: DateTime<Utc>) -> Result<()> {
    history.last_updated = now;

    let content = serde_json::to_string_pretty(history)
        .map_err(|e| TrackerError::json("serialize history", e))?;

    let parent = path
        .parent()
        .ok_or_else(|| TrackerError::NoParentDir(path.to_path_buf()))?;
    fs::create_dir_all(parent)
        .map_err(|e| TrackerError::io(format!("create {}", parent.display()), e))?;

    let mut temp_file = NamedTempFile::new_in(parent)
        .map_err(|e| TrackerError::io("create temp history file", e))?;
    temp_file
        .write_all(content.as_bytes())
        .map_err(|e| TrackerError::io("write temp history file", e))?;
    temp_file
        .flush()
        .map_err(|e| TrackerError::io("flush temp history file", e))?;
    temp_file
        .persist(path)
        .map_err(|e| TrackerError::io(format!("persist {}", path.display()), e.error))?;

    Ok(())
}

/// Reads the file as-is. `Ok(None)` means missing or blank; parse and I/O
/// problems surface as errors for the caller to heal.
fn read_history(path: &Path) -> Result<Option<SessionHistory>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| TrackerError::io(format!("read {}", path.display()), e))?;
    if content.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| TrackerError::json(format!("parse {}", path.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Session;
    use tempfile::tempdir;

    fn closed_session(start: DateTime<Utc>, minutes: i64) -> Session {
        Session {
            game_name: "Hades".to_string(),
            game_id: 1145360,
            banner_url: Some("https://cdn.example/hades.jpg".to_string()),
            start_time: start,
            end_time: Some(start + Duration::minutes(minutes)),
        }
    }

    #[test]
    fn test_load_missing_file_seeds_valid_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("sessions.json");
        let now = Utc::now();

        let history = load_or_repair(&path, now);
        assert!(history.sessions.is_empty());
        assert!(history.current_session.is_none());

        // Self-healing: the file now exists and parses.
        let content = std::fs::read_to_string(&path).unwrap();
        serde_json::from_str::<SessionHistory>(&content).unwrap();
    }

    #[test]
    fn test_load_blank_file_resets() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("sessions.json");
        std::fs::write(&path, "   \n\t").unwrap();

        let history = load_or_repair(&path, Utc::now());
        assert!(history.sessions.is_empty());

        let content = std::fs::read_to_string(&path).unwrap();
        serde_json::from_str::<SessionHistory>(&content).unwrap();
    }

    #[test]
    fn test_load_corrupt_json_resets() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("sessions.json");
        std::fs::write(&path, "{not json").unwrap();

        let history = load_or_repair(&path, Utc::now());
        assert!(history.sessions.is_empty());

        let content = std::fs::read_to_string(&path).unwrap();
        serde_json::from_str::<SessionHistory>(&content).unwrap();
    }

    #[test]
    fn test_load_closes_session_left_open_by_crash() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("sessions.json");
        let start = Utc::now() - Duration::hours(2);

        let mut history = SessionHistory::empty(start);
        history.open_session(Session {
            game_name: "Factorio".to_string(),
            game_id: 427520,
            banner_url: None,
            start_time: start,
            end_time: None,
        });
        save(&mut history, &path, start).unwrap();

        let load_time = Utc::now();
        let repaired = load_or_repair(&path, load_time);
        assert!(repaired.current_session.is_none());
        assert_eq!(repaired.sessions.len(), 1);
        assert_eq!(repaired.sessions[0].end_time, Some(load_time));
        assert_eq!(repaired.last_played.as_ref().unwrap().game_name, "Factorio");

        // The repair was persisted, not just held in memory.
        let reloaded = load_or_repair(&path, Utc::now());
        assert_eq!(reloaded.sessions.len(), 1);
    }

    #[test]
    fn test_load_prunes_sessions_past_retention() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("sessions.json");
        let now = Utc::now();

        let mut history = SessionHistory::empty(now);
        history.sessions.push(closed_session(now - Duration::days(45), 60));
        history.sessions.push(closed_session(now - Duration::days(3), 60));
        save(&mut history, &path, now).unwrap();

        let loaded = load_or_repair(&path, now);
        assert_eq!(loaded.sessions.len(), 1);
        assert!(loaded.sessions[0].start_time >= now - Duration::days(RETENTION_DAYS));
    }

    #[test]
    fn test_round_trip_preserves_all_fields_but_last_updated() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("sessions.json");
        let now = Utc::now();

        let mut history = SessionHistory::empty(now - Duration::hours(1));
        history.sessions.push(closed_session(now - Duration::days(1), 85));
        history.last_played = Some(crate::types::LastPlayed {
            game_name: "Hades".to_string(),
            game_id: 1145360,
            banner_url: None,
            timestamp: now - Duration::days(1),
        });
        let mut saved = history.clone();
        save(&mut saved, &path, now).unwrap();

        let loaded = load_or_repair(&path, now);
        assert_eq!(loaded.version, history.version);
        assert_eq!(loaded.sessions, history.sessions);
        assert_eq!(loaded.current_session, history.current_session);
        assert_eq!(loaded.last_played, history.last_played);
        assert_eq!(loaded.last_updated, now);
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested").join("dir").join("sessions.json");

        let mut history = SessionHistory::empty(Utc::now());
        save(&mut history, &path, Utc::now()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_default_path_prefers_override() {
        let custom = PathBuf::from("/tmp/custom/sessions.json");
        assert_eq!(default_history_path(Some(custom.clone())), custom);
    }

    #[test]
    fn test_default_path_ends_with_history_file_name() {
        let path = default_history_path(None);
        assert_eq!(path.file_name().unwrap(), HISTORY_FILE_NAME);
    }
}
