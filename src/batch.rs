//! Batch evaluation of request files
//!
//! Walks a directory for `*.json` mix-design requests, designs each one and
//! optionally saves the results to the history table.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use rusqlite::Connection;
use walkdir::WalkDir;

use crate::calculator;
use crate::db;
use crate::models::{MixDesignRequest, MixOutcome};

/// Find all request files below `dir`, in path order
pub fn find_request_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")))
        .collect();
    files.sort();
    files
}

fn load_request(path: &Path) -> Result<MixDesignRequest> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Design every request under `dir`. With a connection, each designed mix is
/// saved to history.
pub fn run_batch(conn: Option<&Connection>, dir: &Path) -> Result<BatchStats> {
    let mut stats = BatchStats::default();

    info!("Scanning {} for request files", dir.display());
    let files = find_request_files(dir);
    info!("Found {} request files", files.len());

    for path in &files {
        let request = match load_request(path) {
            Ok(request) => request,
            Err(e) => {
                warn!("{:#}", e);
                stats.unreadable += 1;
                continue;
            }
        };

        match calculator::design(&request) {
            Ok(result) => {
                println!(
                    "  {}: {} W/B {:.3}, cement {:.0}, water {:.0}, sand {:.0}, stone {:.0}",
                    path.display(),
                    result.strength_grade,
                    result.wcr,
                    result.proportions.cement,
                    result.proportions.water,
                    result.proportions.sand,
                    result.proportions.stone
                );
                if let Some(conn) = conn {
                    let form = serde_json::to_value(&request)?;
                    db::insert_entry(conn, &form, &MixOutcome::Standard(result))?;
                }
                stats.designed += 1;
            }
            Err(e) => {
                println!("  {}: rejected, {}", path.display(), e);
                stats.rejected += 1;
            }
        }
    }

    Ok(stats)
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub designed: usize,
    pub rejected: usize,
    pub unreadable: usize,
}

impl std::fmt::Display for BatchStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Designed {} mixes. Rejected: {}, Unreadable: {}",
            self.designed, self.rejected, self.unreadable
        )
    }
}
