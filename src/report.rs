//! Report generation: natural-language summaries, directory groups, concern
//! clusters, the critical-files shortlist, and the agent-context document.
//!
//! Everything here is pure formatting over already-computed node and edge
//! data. The agent-context layout is a hand-off artifact read by humans and
//! coding agents, so its structure should be treated as a stable format.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::{ConcernMember, CriticalFile, Edge, FileNode, Tag};

/// Risk-tier thresholds for the summary headline.
const TIER_CRITICAL: f64 = 75.0;
const TIER_IMPORTANT: f64 = 50.0;
const TIER_MODERATE: f64 = 25.0;

/// Fan-in above which the cascade warning is used.
const WIDE_FAN_IN: usize = 5;
/// Maximum dependent names listed in the "these may break" sentence.
const MAX_LISTED_DEPENDENTS: usize = 8;

/// Minimum risk score for the critical-files shortlist.
const CRITICAL_MIN_RISK: f64 = 15.0;
/// Shortlist cap.
const CRITICAL_CAP: usize = 20;
/// How many critical and safe entries the agent context lists.
const CONTEXT_LIST_CAP: usize = 10;
/// Risk below which a file counts as safe to modify.
const SAFE_MAX_RISK: f64 = 15.0;

/// One fixed explanation sentence per recognized tag. `decorated` and
/// `test` carry no sentence on purpose.
fn tag_explanation(tag: Tag) -> Option<&'static str> {
    let text = match tag {
        Tag::Interface => "Defines a contract other files must follow. Changes break implementers.",
        Tag::EventDriven => "Sends/receives events. Changes silently break listeners.",
        Tag::ApiEndpoint => "Handles API requests. Route/response changes affect all clients.",
        Tag::ApiConsumer => "Makes network calls. URL/payload changes cause failures.",
        Tag::DataModel => "Defines data storage. Schema changes can corrupt data.",
        Tag::ConfigDependent => "Reads env vars/config. Missing values = runtime crashes.",
        Tag::StateManagement => "Manages app state. Changes ripple through UI.",
        Tag::UnsafeCode => "Contains unsafe/low-level code. Memory safety risks.",
        Tag::Concurrent => "Uses concurrency. Race conditions easy to introduce.",
        Tag::Decorated | Tag::Test => return None,
    };
    Some(text)
}

/// Render one node's summary from the fully-scored node/edge data.
fn node_summary(node: &FileNode, edges: &[Edge], names_by_id: &HashMap<&str, &str>) -> String {
    let mut lines = Vec::new();

    let headline = if node.risk_score >= TIER_CRITICAL {
        format!(
            "⚠️ **{}** is critical. Treat changes with extreme care.",
            node.name
        )
    } else if node.risk_score >= TIER_IMPORTANT {
        format!(
            "🟡 **{}** is important — several parts of your project rely on it.",
            node.name
        )
    } else if node.risk_score >= TIER_MODERATE {
        format!(
            "🟢 **{}** has moderate connections. Fairly safe but check linked files.",
            node.name
        )
    } else {
        format!("✅ **{}** is isolated. Low risk to modify.", node.name)
    };
    lines.push(headline);

    if node.fan_in > WIDE_FAN_IN {
        lines.push(format!(
            "**{} other files depend on this.** Changes cascade widely.",
            node.fan_in
        ));
    } else if node.fan_in == 1 {
        lines.push("1 file depends on this.".to_string());
    } else if node.fan_in > 0 {
        lines.push(format!("{} files depend on this.", node.fan_in));
    }

    for tag in &node.tags {
        if let Some(explanation) = tag_explanation(*tag) {
            lines.push(format!("**{}** — {}", tag, explanation));
        }
    }

    let dependents: Vec<&str> = edges
        .iter()
        .filter(|e| e.target == node.id)
        .filter_map(|e| names_by_id.get(e.source.as_str()).copied())
        .take(MAX_LISTED_DEPENDENTS)
        .collect();
    if !dependents.is_empty() {
        lines.push(format!(
            "**If you change this, these may break:** {}",
            dependents.join(", ")
        ));
    }

    lines.join("\n\n")
}

/// Fill in every node's summary string.
pub fn write_summaries(nodes: &mut [FileNode], edges: &[Edge]) {
    let summaries: Vec<String> = {
        let names_by_id: HashMap<&str, &str> = nodes
            .iter()
            .map(|n| (n.id.as_str(), n.name.as_str()))
            .collect();
        nodes
            .iter()
            .map(|n| node_summary(n, edges, &names_by_id))
            .collect()
    };
    for (node, summary) in nodes.iter_mut().zip(summaries) {
        node.summary = summary;
    }
}

/// Group node ids by top-level path segment; root-level files go under `"."`.
pub fn group_by_top_level(nodes: &[FileNode]) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for node in nodes {
        let group = match node.path.split_once('/') {
            Some((top, _)) => top.to_string(),
            None => ".".to_string(),
        };
        groups.entry(group).or_default().push(node.id.clone());
    }
    groups
}

/// Index files by the concern labels they carry.
pub fn concern_clusters(nodes: &[FileNode]) -> BTreeMap<String, Vec<ConcernMember>> {
    let mut clusters: BTreeMap<String, Vec<ConcernMember>> = BTreeMap::new();
    for node in nodes {
        for concern in &node.concerns {
            clusters.entry(concern.clone()).or_default().push(ConcernMember {
                id: node.id.clone(),
                name: node.name.clone(),
                risk: node.risk_score,
            });
        }
    }
    clusters
}

/// Ranked critical-files shortlist: risk descending, top 20, risk > 15.
pub fn critical_files(nodes: &[FileNode]) -> Vec<CriticalFile> {
    let mut ranked: Vec<&FileNode> = nodes.iter().collect();
    ranked.sort_by(|a, b| {
        b.risk_score
            .partial_cmp(&a.risk_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
        .into_iter()
        .take(CRITICAL_CAP)
        .filter(|n| n.risk_score > CRITICAL_MIN_RISK)
        .map(|n| CriticalFile {
            file: n.path.clone(),
            risk_score: n.risk_score,
            fan_in: n.fan_in,
            tags: n.tags.clone(),
            binding_points: n.binding_points.len(),
        })
        .collect()
}

fn join_tags(tags: &BTreeSet<Tag>) -> String {
    tags.iter()
        .map(Tag::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render the agent-context document: the plain-text risk map handed to a
/// human or coding agent before it edits the project.
pub fn agent_context(critical: &[CriticalFile], nodes: &[FileNode]) -> String {
    let mut lines = vec![
        "# ⚠️ CODEBASE RISK MAP — READ BEFORE MODIFYING".to_string(),
        String::new(),
        "## 🔴 Critical Files (DO NOT modify without review)".to_string(),
        String::new(),
    ];

    for cf in critical.iter().take(CONTEXT_LIST_CAP) {
        lines.push(format!(
            "- **{}** — Risk: {}/100 | Dependents: {} | {}",
            cf.file,
            cf.risk_score,
            cf.fan_in,
            join_tags(&cf.tags)
        ));
    }

    lines.push(String::new());
    lines.push("## 🟡 Binding Points".to_string());
    lines.push(String::new());

    for node in nodes {
        if node.binding_points.len() > 1 {
            let categories: BTreeSet<&str> = node
                .binding_points
                .iter()
                .map(|bp| bp.category.as_str())
                .collect();
            lines.push(format!(
                "- `{}`: {}",
                node.path,
                categories.into_iter().collect::<Vec<_>>().join(", ")
            ));
        }
    }

    lines.push(String::new());
    lines.push("## 🟢 Safe to Modify".to_string());
    lines.push(String::new());

    let mut by_risk: Vec<&FileNode> = nodes.iter().collect();
    by_risk.sort_by(|a, b| {
        a.risk_score
            .partial_cmp(&b.risk_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for node in by_risk.into_iter().take(CONTEXT_LIST_CAP) {
        if node.risk_score < SAFE_MAX_RISK {
            lines.push(format!("- `{}` (risk: {})", node.path, node.risk_score));
        }
    }

    lines.join("\n")
}
