//! Aggregate identity counts across event logs.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
struct Row {
    identity: String,
}

/// `events_*.csv` files in `log_dir`, sorted by name.
pub fn event_logs(log_dir: &Path) -> Result<Vec<PathBuf>> {
    if !log_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(log_dir)
        .with_context(|| format!("listing {}", log_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("events_") && n.ends_with(".csv"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Frames per identity over all `files`, most frequent first
/// (ties ordered by identity).
pub fn identity_counts(files: &[PathBuf]) -> Result<Vec<(String, u64)>> {
    let mut counts: HashMap<String, u64> = HashMap::new();

    for path in files {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("opening {}", path.display()))?;
        for row in reader.deserialize::<Row>() {
            let row = row.with_context(|| format!("reading {}", path.display()))?;
            *counts.entry(row.identity).or_default() += 1;
        }
    }

    let mut counts: Vec<(String, u64)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(counts)
}
