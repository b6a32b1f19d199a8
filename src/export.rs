//! End-of-session summary notes.
//!
//! Renders a finished session's stats as a markdown note in the configured
//! summaries folder, one file per session.

use crate::session::SessionStats;
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Write the session summary note. Returns the path written.
pub fn write_summary(dir: impl AsRef<Path>, stats: &SessionStats) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create summaries directory {:?}", dir))?;

    let path = dir.join(format!("{}.md", stats.session_id));
    let body = render_summary(stats);

    fs::write(&path, body).with_context(|| format!("Failed to write summary {:?}", path))?;

    info!("Session summary written to {:?}", path);

    Ok(path)
}

fn render_summary(stats: &SessionStats) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Live Assist Session: {}", stats.session_id);
    let _ = writeln!(out);
    let _ = writeln!(out, "- Ended: {}", stats.ended_at.to_rfc3339());
    let _ = writeln!(
        out,
        "- Duration: {}m {}s",
        stats.duration_seconds / 60,
        stats.duration_seconds % 60
    );
    let _ = writeln!(out, "- Words spoken: {}", stats.word_count);
    let _ = writeln!(out, "- Average pace: {} wpm", stats.average_pace);

    if !stats.pace_history.is_empty() {
        let samples: Vec<String> = stats.pace_history.iter().map(|w| w.to_string()).collect();
        let _ = writeln!(out, "- Pace samples: {}", samples.join(", "));
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Transcript");
    let _ = writeln!(out);
    if stats.transcript.is_empty() {
        let _ = writeln!(out, "_No speech captured._");
    } else {
        let _ = writeln!(out, "{}", stats.transcript);
    }

    out
}
