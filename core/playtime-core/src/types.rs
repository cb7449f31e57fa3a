//! Core data types shared by the tracker, persistence, and stats layers.
//!
//! On-disk field names are camelCase (`gameName`, `startTime`, ...) to match
//! the established `sessions.json` format; timestamps serialize as RFC 3339.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One gaming session. The session is open while `end_time` is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub game_name: String,
    pub game_id: u64,
    /// Cosmetic artwork URL. `None` means "no banner yet", never an empty string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }

    /// Whole minutes between start and end (or `now` while open), never negative.
    pub fn duration_minutes(&self, now: DateTime<Utc>) -> i64 {
        let end = self.end_time.unwrap_or(now);
        end.signed_duration_since(self.start_time).num_minutes().max(0)
    }

    /// Seconds since the session opened.
    pub fn age_seconds(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.start_time).num_seconds()
    }
}

/// Snapshot of the most recently closed session, retained across restarts so
/// clients can show "last played" even when nothing is running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastPlayed {
    pub game_name: String,
    pub game_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// One poll observation pushed into the tracker.
///
/// The host fills in the signal fields (`in_game`, identity, banner) before
/// each tick; the tracker writes the derived display fields back onto the same
/// sample every tick, whether or not a transition occurred.
#[derive(Debug, Clone, Default)]
pub struct PollSample {
    // Signal inputs
    pub in_game: bool,
    pub game_id: u64,
    pub game_name: String,
    pub banner_url: Option<String>,

    // Derived outputs
    pub current_session_minutes: Option<i64>,
    pub current_session_start: Option<DateTime<Utc>>,
    pub last_played: Option<LastPlayed>,
    pub recent_stats: RecentStats,
}

/// Trailing-window aggregates over closed sessions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RecentStats {
    pub session_count: usize,
    pub average_minutes: f64,
    pub total_hours: f64,
}

/// Read-side view of the open session, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentSessionInfo {
    pub game_name: String,
    pub game_id: u64,
    pub banner_url: Option<String>,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i64,
}
