//! The debounced session state machine and its locked facade.
//!
//! The underlying foreground-game signal flickers around alt-tab and
//! window-focus events: brief false "not in game" readings and false identity
//! changes. Two guards absorb that noise: a start is accepted only after the
//! signal holds for [`DEBOUNCE_SECS`], and a stop or identity switch is
//! accepted only once the open session is at least [`MIN_SESSION_SECS`] old.
//! The asymmetry biases toward under-reporting boundary noise rather than
//! fabricating spurious short sessions.
//!
//! States, conceptually: Idle (no session, no candidate), PendingStart (a
//! candidate game is waiting out the debounce), Active (one open session,
//! held in the history's `current_session`).

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::history::SessionHistory;
use crate::persist;
use crate::stats::{recent_stats, DEFAULT_STATS_WINDOW_DAYS};
use crate::types::{CurrentSessionInfo, PollSample, RecentStats, Session};

/// A session younger than this is never closed by a "game stopped" sample.
pub const MIN_SESSION_SECS: i64 = 30;

/// A candidate start must hold continuously for this long before a session opens.
pub const DEBOUNCE_SECS: i64 = 10;

/// Coarse opportunistic flush interval; losing the last few seconds of an
/// open session on a crash is recoverable via the startup repair path.
pub const PERIODIC_SAVE_SECS: i64 = 60;

/// Candidate game observed while waiting out the start debounce.
#[derive(Debug, Clone)]
struct PendingStart {
    game_id: u64,
    game_name: String,
    banner_url: Option<String>,
    first_seen: DateTime<Utc>,
}

impl PendingStart {
    fn from_sample(sample: &PollSample, now: DateTime<Utc>) -> Self {
        PendingStart {
            game_id: sample.game_id,
            game_name: sample.game_name.clone(),
            banner_url: normalize_banner(sample.banner_url.as_deref()),
            first_seen: now,
        }
    }
}

struct TrackerInner {
    history: SessionHistory,
    pending: Option<PendingStart>,
    path: PathBuf,
    last_save: DateTime<Utc>,
}

/// The tracker facade. One coarse lock serializes every tick, read, and the
/// shutdown flush; the polling host is the only expected caller.
pub struct SessionTracker {
    inner: Mutex<TrackerInner>,
}

impl SessionTracker {
    /// Loads (and repairs) the history from the default location.
    pub fn new() -> Self {
        Self::load_at(None, Utc::now())
    }

    /// Loads (and repairs) the history from `path`.
    pub fn with_path(path: PathBuf) -> Self {
        Self::load_at(Some(path), Utc::now())
    }

    /// Deterministic constructor: resolves the path and runs load/repair
    /// against the supplied clock.
    pub fn load_at(path: Option<PathBuf>, now: DateTime<Utc>) -> Self {
        let path = persist::default_history_path(path);
        let history = persist::load_or_repair(&path, now);
        SessionTracker {
            inner: Mutex::new(TrackerInner {
                history,
                pending: None,
                path,
                last_save: now,
            }),
        }
    }

    /// Consumes one poll sample and writes the derived display fields back
    /// onto it. Never fails; storage trouble is logged and absorbed.
    pub fn update(&self, sample: &mut PollSample) {
        self.update_at(sample, Utc::now());
    }

    /// Deterministic variant of [`update`](Self::update) for hosts (and
    /// tests) that manage their own clock.
    pub fn update_at(&self, sample: &mut PollSample, now: DateTime<Utc>) {
        let mut inner = self.lock();
        let changed = inner.step(sample, now);
        inner.write_derived(sample, now);
        if changed || now.signed_duration_since(inner.last_save).num_seconds() >= PERIODIC_SAVE_SECS
        {
            inner.flush(now);
        }
    }

    /// Trailing-window aggregates over the closed history.
    pub fn recent_stats(&self, days_back: i64) -> RecentStats {
        self.recent_stats_at(days_back, Utc::now())
    }

    pub fn recent_stats_at(&self, days_back: i64, now: DateTime<Utc>) -> RecentStats {
        recent_stats(&self.lock().history, days_back, now)
    }

    /// Snapshot of the open session, if any.
    pub fn current_session_info(&self) -> Option<CurrentSessionInfo> {
        self.current_session_info_at(Utc::now())
    }

    pub fn current_session_info_at(&self, now: DateTime<Utc>) -> Option<CurrentSessionInfo> {
        let inner = self.lock();
        inner
            .history
            .current_session
            .as_ref()
            .map(|session| CurrentSessionInfo {
                game_name: session.game_name.clone(),
                game_id: session.game_id,
                banner_url: session.banner_url.clone(),
                start_time: session.start_time,
                duration_minutes: session.duration_minutes(now),
            })
    }

    /// Force-closes any open session and flushes. An explicit shutdown is not
    /// a glitch, so the minimum-duration guard does not apply here.
    pub fn shutdown(&self) {
        self.shutdown_at(Utc::now());
    }

    pub fn shutdown_at(&self, now: DateTime<Utc>) {
        let mut inner = self.lock();
        inner.pending = None;
        if inner.history.close_current(now) {
            info!("closed open session on shutdown");
        }
        inner.flush(now);
    }

    /// The resolved history file location.
    pub fn history_path(&self) -> PathBuf {
        self.lock().path.clone()
    }

    fn lock(&self) -> MutexGuard<'_, TrackerInner> {
        // A panicked tick must not take the host down with it.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackerInner {
    /// Evaluates one transition. Returns true when a session opened or
    /// closed, i.e. when the history must be flushed promptly.
    fn step(&mut self, sample: &PollSample, now: DateTime<Utc>) -> bool {
        if self.history.current_session.is_some() {
            self.step_active(sample, now)
        } else {
            self.step_idle_or_pending(sample, now)
        }
    }

    fn step_active(&mut self, sample: &PollSample, now: DateTime<Utc>) -> bool {
        let Some(session) = self.history.current_session.as_mut() else {
            return false;
        };
        let age = session.age_seconds(now);
        let same_identity =
            sample.game_id == session.game_id && sample.game_name == session.game_name;

        // Identity switch is checked before the stop branch.
        if sample.in_game && !same_identity {
            if age < MIN_SESSION_SECS {
                debug!(
                    game = %session.game_name,
                    age_secs = age,
                    "ignoring identity flip on young session"
                );
                return false;
            }
            info!(from = %session.game_name, to = %sample.game_name, "switching sessions");
            self.history.close_current(now);
            self.history.open_session(Session {
                game_name: sample.game_name.clone(),
                game_id: sample.game_id,
                banner_url: normalize_banner(sample.banner_url.as_deref()),
                start_time: now,
                end_time: None,
            });
            return true;
        }

        if !sample.in_game {
            if age < MIN_SESSION_SECS {
                debug!(
                    game = %session.game_name,
                    age_secs = age,
                    "ignoring stop signal on young session"
                );
                return false;
            }
            info!(game = %session.game_name, minutes = session.duration_minutes(now), "session ended");
            self.history.close_current(now);
            return true;
        }

        // Same game still running. The banner can be transiently empty during
        // alt-tab; only a non-empty value may replace the stored one.
        if let Some(banner) = normalize_banner(sample.banner_url.as_deref()) {
            session.banner_url = Some(banner);
        }
        false
    }

    fn step_idle_or_pending(&mut self, sample: &PollSample, now: DateTime<Utc>) -> bool {
        match self.pending.take() {
            None => {
                if sample.in_game && !sample.game_name.is_empty() {
                    debug!(game = %sample.game_name, "candidate start observed");
                    self.pending = Some(PendingStart::from_sample(sample, now));
                }
                false
            }
            Some(pending) if !sample.in_game => {
                debug!(game = %pending.game_name, "candidate start cancelled before debounce");
                false
            }
            Some(pending)
                if pending.game_id != sample.game_id || pending.game_name != sample.game_name =>
            {
                // A different game restarts the debounce window.
                debug!(from = %pending.game_name, to = %sample.game_name, "candidate identity changed");
                self.pending = Some(PendingStart::from_sample(sample, now));
                false
            }
            Some(pending) => {
                if now.signed_duration_since(pending.first_seen).num_seconds() < DEBOUNCE_SECS {
                    self.pending = Some(pending);
                    return false;
                }
                info!(game = %pending.game_name, "session started");
                // The session starts when the game was first seen, not when
                // the debounce elapsed.
                self.history.open_session(Session {
                    game_name: pending.game_name,
                    game_id: pending.game_id,
                    banner_url: pending.banner_url,
                    start_time: pending.first_seen,
                    end_time: None,
                });
                true
            }
        }
    }

    /// Writes the derived display fields onto the sample. Runs every tick,
    /// transition or not.
    fn write_derived(&self, sample: &mut PollSample, now: DateTime<Utc>) {
        match &self.history.current_session {
            Some(session) => {
                sample.current_session_minutes = Some(session.duration_minutes(now));
                sample.current_session_start = Some(session.start_time);
            }
            None => {
                sample.current_session_minutes = None;
                sample.current_session_start = None;
            }
        }
        sample.last_played = self.history.last_played.clone();
        sample.recent_stats = recent_stats(&self.history, DEFAULT_STATS_WINDOW_DAYS, now);
    }

    fn flush(&mut self, now: DateTime<Utc>) {
        if let Err(err) = persist::save(&mut self.history, &self.path, now) {
            warn!(path = %self.path.display(), error = %err, "failed to save session history");
        }
        // Advances even on failure so a dead disk is retried once per
        // interval, not on every tick.
        self.last_save = now;
    }
}

fn normalize_banner(banner: Option<&str>) -> Option<String> {
    banner
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string)
}
