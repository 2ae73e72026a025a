//! Persisted run document and terminal summary.

use crate::tree::{TreeNode, build_site_tree};
use chrono::{SecondsFormat, Utc};
use gossamer_crawler::resolve::same_authority;
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use url::Url;

/// The exported document: target, full ordered result list, optional site
/// tree and result count.
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub target: String,
    pub results: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree: Option<TreeNode>,
    pub count: usize,
    pub generated_at: String,
}

impl ScanReport {
    pub fn new(seed: &Url, results: Vec<String>, include_tree: bool) -> Self {
        let tree = include_tree.then(|| build_site_tree(seed, &results));
        Self {
            target: seed.to_string(),
            count: results.len(),
            tree,
            results,
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    pub fn save_json(&self, path: &Path) -> std::io::Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

/// Closing terminal summary: discovery counts split by authority.
pub fn generate_summary(seed: &Url, results: &[String]) -> String {
    let internal = results
        .iter()
        .filter(|address| {
            Url::parse(address)
                .map(|u| same_authority(&u, seed))
                .unwrap_or(false)
        })
        .count();
    let external = results.len() - internal;

    let mut summary = String::new();
    summary.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    summary.push_str("# Summary:\n");
    summary.push_str(&format!("  Internal links: {internal}\n"));
    summary.push_str(&format!("  External links: {external}\n"));
    summary.push_str(&format!("  Total discovered: {}\n", results.len()));
    summary
}
