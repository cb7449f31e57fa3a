//! # playtime-core
//!
//! Turns a noisy, periodically sampled "is the user in a foreground game"
//! signal into clean, durable session records: when a session started, when
//! it ended, and aggregate statistics over time.
//!
//! ## Design principles
//!
//! - **Synchronous**: no async runtime; the host drives polling on its own
//!   cadence and pushes one [`PollSample`] per tick.
//! - **Graceful degradation**: a missing, empty, or corrupt history file is
//!   healed in place; storage trouble is logged, never surfaced to the host.
//! - **Debounced**: brief foreground/background flickers around alt-tab are
//!   absorbed instead of fragmenting one real session into many.
//! - **Single writer**: one coarse lock serializes every tick; at most one
//!   session is open at any time.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use playtime_core::{PollSample, SessionTracker};
//!
//! let tracker = SessionTracker::new();
//! let mut sample = PollSample { in_game: true, game_id: 1145360, game_name: "Hades".into(), ..Default::default() };
//! tracker.update(&mut sample); // derived fields written back onto `sample`
//! let stats = tracker.recent_stats(7);
//! tracker.shutdown();
//! ```

pub mod error;
pub mod history;
pub mod persist;
pub mod stats;
pub mod tracker;
pub mod types;

pub use error::{Result, TrackerError};
pub use history::{SessionHistory, HISTORY_VERSION};
pub use persist::{default_history_path, HISTORY_FILE_NAME, RETENTION_DAYS};
pub use stats::{recent_stats, DEFAULT_STATS_WINDOW_DAYS};
pub use tracker::{SessionTracker, DEBOUNCE_SECS, MIN_SESSION_SECS, PERIODIC_SAVE_SECS};
pub use types::{CurrentSessionInfo, LastPlayed, PollSample, RecentStats, Session};
