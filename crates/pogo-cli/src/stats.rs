//! Summary of what the store has accumulated so far.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::NaiveDate;
use pogo_core::{StampedFriend, Team};
use pogo_store::RecordStore;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct StoreStats {
    pub total: usize,
    /// Every team is listed, including those with no rows.
    pub by_team: BTreeMap<&'static str, usize>,
    pub first_added: Option<NaiveDate>,
    pub last_added: Option<NaiveDate>,
}

pub(crate) fn compute_stats(rows: &[StampedFriend]) -> StoreStats {
    let mut by_team: BTreeMap<&'static str, usize> =
        Team::ALL.iter().map(|t| (t.as_str(), 0)).collect();
    for row in rows {
        *by_team.entry(row.record.team.as_str()).or_default() += 1;
    }

    StoreStats {
        total: rows.len(),
        by_team,
        first_added: rows.iter().map(|r| r.date_added).min(),
        last_added: rows.iter().map(|r| r.date_added).max(),
    }
}

pub(crate) fn render_text(stats: &StoreStats) -> String {
    let mut out = format!("Pokemon Go Friends: {} in total\n", stats.total);
    for (team, count) in &stats.by_team {
        let _ = writeln!(out, "  {team:<9} {count}");
    }
    if let (Some(first), Some(last)) = (stats.first_added, stats.last_added) {
        let _ = writeln!(out, "  added between {first} and {last}");
    }
    out
}

/// Reads the store and prints its summary as text or JSON.
pub(crate) fn print_stats(store: &dyn RecordStore, json: bool) -> anyhow::Result<()> {
    let rows = store.load_all()?;
    let stats = compute_stats(&rows);
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print!("{}", render_text(&stats));
    }
    Ok(())
}
