//! Debug utility for inspecting the stored session history.
//!
//! Usage: `history-check [path/to/sessions.json]`

use std::path::PathBuf;

use chrono::Utc;
use tracing_subscriber::EnvFilter;

use playtime_core::{default_history_path, persist, recent_stats, DEFAULT_STATS_WINDOW_DAYS};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let override_path = std::env::args().nth(1).map(PathBuf::from);
    let path = default_history_path(override_path);
    let now = Utc::now();

    println!("History file: {}", path.display());
    println!();

    let history = persist::load_or_repair(&path, now);

    println!("── Sessions ({}) ─────────────────────────────────────────", history.sessions.len());
    if history.sessions.is_empty() {
        println!("  (no closed sessions)");
    }
    for session in &history.sessions {
        println!(
            "  {} │ {:>4} min │ {}",
            session.start_time.format("%Y-%m-%d %H:%M"),
            session.duration_minutes(now),
            session.game_name
        );
    }
    println!();

    println!("── Current Session ───────────────────────────────────────");
    match &history.current_session {
        Some(session) => println!(
            "  {} since {} ({} min)",
            session.game_name,
            session.start_time.format("%H:%M:%S"),
            session.duration_minutes(now)
        ),
        None => println!("  (none)"),
    }
    println!();

    println!("── Last Played ───────────────────────────────────────────");
    match &history.last_played {
        Some(last) => println!(
            "  {} at {}",
            last.game_name,
            last.timestamp.format("%Y-%m-%d %H:%M")
        ),
        None => println!("  (none)"),
    }
    println!();

    let stats = recent_stats(&history, DEFAULT_STATS_WINDOW_DAYS, now);
    println!("── Last {} Days ───────────────────────────────────────────", DEFAULT_STATS_WINDOW_DAYS);
    println!("  {} sessions", stats.session_count);
    println!("  {:.1} min average", stats.average_minutes);
    println!("  {:.1} hours total", stats.total_hours);
}
