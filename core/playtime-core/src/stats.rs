//! Read-side aggregation over the session history.

use chrono::{DateTime, Duration, Utc};

use crate::history::SessionHistory;
use crate::types::RecentStats;

/// Trailing look-back window used for the per-tick display stats.
pub const DEFAULT_STATS_WINDOW_DAYS: i64 = 7;

/// Aggregates closed sessions that started within the last `days_back` days.
///
/// Open sessions are excluded. Returns zeroed stats when nothing matches.
/// Pure function of the history; no side effects.
pub fn recent_stats(history: &SessionHistory, days_back: i64, now: DateTime<Utc>) -> RecentStats {
    let cutoff = now - Duration::days(days_back);

    let mut count = 0usize;
    let mut total_minutes = 0i64;
    for session in &history.sessions {
        if session.end_time.is_none() || session.start_time < cutoff {
            continue;
        }
        count += 1;
        total_minutes += session.duration_minutes(now);
    }

    if count == 0 {
        return RecentStats::default();
    }

    RecentStats {
        session_count: count,
        average_minutes: total_minutes as f64 / count as f64,
        total_hours: total_minutes as f64 / 60.0,
    }
}
