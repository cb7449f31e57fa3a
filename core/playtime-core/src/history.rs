//! The durable session aggregate: closed history, the optional open session,
//! and last-played metadata.
//!
//! Invariants:
//! - `sessions` holds closed sessions only, in insertion order.
//! - `current_session` is the single open session, if any.
//!
//! All mutation goes through the tracker's lock; this type has no
//! synchronization of its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{LastPlayed, Session};

/// Schema tag written into every history file.
pub const HISTORY_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionHistory {
    pub version: String,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_session: Option<Session>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_played: Option<LastPlayed>,
}

impl SessionHistory {
    pub fn empty(now: DateTime<Utc>) -> Self {
        SessionHistory {
            version: HISTORY_VERSION.to_string(),
            last_updated: now,
            sessions: Vec::new(),
            current_session: None,
            last_played: None,
        }
    }

    /// Installs `session` as the open session.
    pub fn open_session(&mut self, session: Session) {
        debug_assert!(self.current_session.is_none(), "two open sessions");
        debug_assert!(session.is_active());
        self.current_session = Some(session);
    }

    /// Closes the open session at `now`: sets its end time, appends it to the
    /// closed list, and refreshes the last-played snapshot. Returns false when
    /// no session was open.
    pub fn close_current(&mut self, now: DateTime<Utc>) -> bool {
        let Some(mut session) = self.current_session.take() else {
            return false;
        };
        // Clock skew guard: end must never precede start.
        session.end_time = Some(now.max(session.start_time));
        self.last_played = Some(LastPlayed {
            game_name: session.game_name.clone(),
            game_id: session.game_id,
            banner_url: session.banner_url.clone(),
            timestamp: session.end_time.unwrap_or(now),
        });
        self.sessions.push(session);
        true
    }

    /// Drops closed sessions that started before `cutoff`. Returns how many
    /// were removed. Called once at startup for retention.
    pub fn prune_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.start_time >= cutoff);
        before - self.sessions.len()
    }
}
