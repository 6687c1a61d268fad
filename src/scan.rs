//! Scan pipeline orchestration.
//!
//! One scan is a synchronous, single-threaded pass: discover → extract →
//! resolve → tag → score (+ git and test adjustments) → classify concerns →
//! generate reports. Each stage completes before the next begins, and the
//! result is assembled atomically at the end — a failed scan exposes no
//! partial snapshot. A rescan is a fresh run whose result replaces the
//! previous one wholesale.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::collections::BTreeSet;
use std::path::Path;

use crate::models::{ScanMetadata, ScanResult};
use crate::{concerns, discover, extract, git, report, resolve, score, tags};

/// Scan `root` and produce the immutable snapshot.
///
/// Pure with respect to process state: everything the pipeline needs lives
/// in local values, so independent projects can be scanned without
/// interference. `project_id` defaults to a hash of the resolved root path.
///
/// # Errors
///
/// Fails distinctly when the root is missing versus not a directory. An
/// existing but empty (or entirely ignored) tree is not an error — it
/// yields a snapshot with zero nodes and a neutral health score.
pub fn scan_project(root: &Path, project_id: Option<&str>) -> Result<ScanResult> {
    if !root.exists() {
        bail!("project root does not exist: {}", root.display());
    }
    if !root.is_dir() {
        bail!("project root is not a directory: {}", root.display());
    }
    let root = root
        .canonicalize()
        .with_context(|| format!("failed to resolve project root: {}", root.display()))?;

    let project_id = match project_id {
        Some(id) => id.to_string(),
        None => discover::short_hash(&root.to_string_lossy()),
    };
    let project_name = root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| root.display().to_string());

    let (mut nodes, contents) = discover::discover(&root, &project_id);
    extract::extract(&mut nodes, &contents);
    let edges = resolve::resolve(&mut nodes);
    tags::derive_tags(&mut nodes);
    score::score_nodes(&mut nodes);
    if let Some(counts) = git::recent_change_counts(&root) {
        score::apply_git_adjustment(&mut nodes, &counts);
    }
    score::apply_test_adjustment(&mut nodes);
    concerns::classify(&mut nodes, &contents);

    let health_score = score::health_score(&nodes);
    report::write_summaries(&mut nodes, &edges);

    let groups = report::group_by_top_level(&nodes);
    let concern_clusters = report::concern_clusters(&nodes);
    let critical_files = report::critical_files(&nodes);
    let agent_context = report::agent_context(&critical_files, &nodes);

    let languages: Vec<String> = nodes
        .iter()
        .map(|n| n.language.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let total_binding_points = nodes.iter().map(|n| n.binding_points.len()).sum();

    let metadata = ScanMetadata {
        project_root: root.to_string_lossy().to_string(),
        project_name,
        project_id,
        scanned_at: Utc::now(),
        total_files: nodes.len(),
        total_edges: edges.len(),
        total_binding_points,
        languages,
        health_score,
    };

    Ok(ScanResult {
        metadata,
        nodes,
        edges,
        groups,
        concern_clusters,
        critical_files,
        agent_context,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_root_fails_distinctly() {
        let err = scan_project(Path::new("/nonexistent/cartographer-test"), None).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_file_root_fails_distinctly() {
        let tmp = tempfile::TempDir::new().unwrap();
        let file = tmp.path().join("plain.py");
        std::fs::write(&file, "x = 1").unwrap();
        let err = scan_project(&file, None).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }
}
