//! Core data models used throughout Cartographer.
//!
//! These types form the immutable scan snapshot: the per-file nodes, the
//! directed dependency edges between them, and the aggregate result handed
//! to the HTTP server, the chat context builder, and the CLI.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Coarse complexity classification derived from line count alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

/// Semantic tag derived from the binding-point categories found in a file.
///
/// Many language-specific categories collapse onto the same tag (a Swift
/// `protocol`, a Rust `trait`, and a TypeScript `interface` all become
/// [`Tag::Interface`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tag {
    Interface,
    EventDriven,
    ApiEndpoint,
    ApiConsumer,
    DataModel,
    ConfigDependent,
    StateManagement,
    Decorated,
    UnsafeCode,
    Concurrent,
    Test,
}

impl Tag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Interface => "interface",
            Tag::EventDriven => "event-driven",
            Tag::ApiEndpoint => "api-endpoint",
            Tag::ApiConsumer => "api-consumer",
            Tag::DataModel => "data-model",
            Tag::ConfigDependent => "config-dependent",
            Tag::StateManagement => "state-management",
            Tag::Decorated => "decorated",
            Tag::UnsafeCode => "unsafe-code",
            Tag::Concurrent => "concurrent",
            Tag::Test => "test",
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One regex match inside a file: what matched, which pattern category
/// produced it, and the 1-based source line.
#[derive(Debug, Clone, Serialize)]
pub struct BindingPoint {
    pub name: String,
    pub category: String,
    pub line: usize,
}

/// One source file discovered in the project tree.
///
/// Created with zero-valued derived fields during discovery, then filled in
/// by each pipeline stage. Never mutated after the scan completes.
#[derive(Debug, Clone, Serialize)]
pub struct FileNode {
    /// Stable id: truncated SHA-256 of `<project_id>:<relative path>`.
    pub id: String,
    /// Path relative to the project root, with `/` separators.
    pub path: String,
    pub absolute_path: String,
    pub name: String,
    pub extension: String,
    pub language: String,
    pub size_bytes: u64,
    pub line_count: usize,
    pub last_modified: DateTime<Utc>,
    /// Commits touching this file in the recent history window; zero when
    /// the project is not a git repository.
    pub git_changes: usize,
    /// Raw import identifiers as written in source, unresolved.
    pub imports: Vec<String>,
    pub binding_points: Vec<BindingPoint>,
    pub tags: BTreeSet<Tag>,
    pub concerns: Vec<String>,
    pub risk_score: f64,
    pub fan_in: usize,
    pub fan_out: usize,
    pub complexity: Complexity,
    pub has_tests: bool,
    /// Generated natural-language explanation of why this file is (or is
    /// not) risky to modify.
    pub summary: String,
}

/// Directed dependency edge produced by import resolution.
///
/// Edges are best-effort: unresolved imports produce none, and path-variant
/// collisions can occasionally point at the wrong file. Multiple import
/// statements between the same pair produce multiple edges.
#[derive(Debug, Clone, Serialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub edge_type: String,
    /// The import string as written in source.
    pub label: String,
}

/// Scan-level metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ScanMetadata {
    pub project_root: String,
    pub project_name: String,
    pub project_id: String,
    pub scanned_at: DateTime<Utc>,
    pub total_files: usize,
    pub total_edges: usize,
    pub total_binding_points: usize,
    /// Sorted list of languages detected in the tree.
    pub languages: Vec<String>,
    pub health_score: u32,
}

/// Entry in the ranked critical-files shortlist.
#[derive(Debug, Clone, Serialize)]
pub struct CriticalFile {
    pub file: String,
    pub risk_score: f64,
    pub fan_in: usize,
    pub tags: BTreeSet<Tag>,
    pub binding_points: usize,
}

/// A file listed under a concern cluster.
#[derive(Debug, Clone, Serialize)]
pub struct ConcernMember {
    pub id: String,
    pub name: String,
    pub risk: f64,
}

/// The immutable snapshot produced by one scan pass.
///
/// Consumed read-only by every collaborator until the next rescan, which
/// replaces it wholesale.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub metadata: ScanMetadata,
    pub nodes: Vec<FileNode>,
    pub edges: Vec<Edge>,
    /// File ids grouped by top-level path segment; files directly at the
    /// root go under `"."`.
    pub groups: BTreeMap<String, Vec<String>>,
    pub concern_clusters: BTreeMap<String, Vec<ConcernMember>>,
    pub critical_files: Vec<CriticalFile>,
    /// Plain-text risk map intended for a human or AI agent to read before
    /// editing the project.
    pub agent_context: String,
}
