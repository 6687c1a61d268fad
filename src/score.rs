//! Risk scoring: per-file risk in [0, 100] and the aggregate health score.
//!
//! Each term of the per-file score is normalized against the maximum
//! observed value in the current scan, so scores are relative to this
//! project rather than absolute. The weights are fixed heuristics; they
//! define the observable behavior under test and are not configurable.

use std::collections::HashMap;

use crate::models::{FileNode, Tag};

/// Weight applied to the fan-in share.
pub const W_FAN_IN: f64 = 35.0;
/// Weight applied to the fan-out share.
pub const W_FAN_OUT: f64 = 15.0;
/// Weight applied to binding-point density, saturating at
/// [`BINDING_SATURATION`] binding points.
pub const W_BINDINGS: f64 = 25.0;
/// Weight applied to the line-count share.
pub const W_LINES: f64 = 10.0;
/// Weight applied to the risky-tag overlap fraction.
pub const W_RISKY_TAGS: f64 = 15.0;
/// Binding-point count at which the density term saturates.
pub const BINDING_SATURATION: f64 = 10.0;
/// Maximum points the recent-change adjustment can add.
pub const W_GIT_CHANGES: f64 = 10.0;
/// Points subtracted from test files.
pub const TEST_DISCOUNT: f64 = 20.0;

/// Tags whose presence contributes to the risky-tag overlap term.
pub const RISKY_TAGS: [Tag; 4] = [
    Tag::ApiEndpoint,
    Tag::DataModel,
    Tag::UnsafeCode,
    Tag::EventDriven,
];

/// Health-score coefficients.
const HEALTH_AVG_WEIGHT: f64 = 0.4;
const HEALTH_UNTESTED_CRITICAL_WEIGHT: f64 = 30.0;
const HEALTH_TESTED_WEIGHT: f64 = 20.0;
/// Risk score at or above which an untested file drags the health score.
const CRITICAL_RISK_THRESHOLD: f64 = 50.0;

/// Filename fragments that mark a file as a test.
const TEST_NAME_FRAGMENTS: &[&str] = &[
    "test_", "_test.", ".test.", "spec.", "_spec.", "Test.", "Tests.",
];
/// Path segments that mark a file as living in a test directory.
const TEST_DIR_NAMES: &[&str] = &["tests", "test", "__tests__", "spec"];

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Compute the base risk score for every node.
pub fn score_nodes(nodes: &mut [FileNode]) {
    let max_fan_in = nodes.iter().map(|n| n.fan_in).max().unwrap_or(1).max(1) as f64;
    let max_fan_out = nodes.iter().map(|n| n.fan_out).max().unwrap_or(1).max(1) as f64;
    let max_lines = nodes.iter().map(|n| n.line_count).max().unwrap_or(1).max(1) as f64;

    for node in nodes.iter_mut() {
        let risky_overlap = node
            .tags
            .iter()
            .copied()
            .filter(|tag| RISKY_TAGS.contains(tag))
            .count() as f64;
        let score = (node.fan_in as f64 / max_fan_in) * W_FAN_IN
            + (node.fan_out as f64 / max_fan_out) * W_FAN_OUT
            + (node.binding_points.len() as f64 / BINDING_SATURATION).min(1.0) * W_BINDINGS
            + (node.line_count as f64 / max_lines) * W_LINES
            + (risky_overlap / RISKY_TAGS.len() as f64) * W_RISKY_TAGS;
        node.risk_score = round1(score.min(100.0));
    }
}

/// Fold recent version-control change counts into the scores.
///
/// `counts` maps repository-relative paths to touch counts over the history
/// window; it covers every path git reported, not only discovered nodes, and
/// the normalization maximum is taken over the whole map.
pub fn apply_git_adjustment(nodes: &mut [FileNode], counts: &HashMap<String, usize>) {
    let max_count = counts.values().copied().max().unwrap_or(1).max(1) as f64;
    for node in nodes.iter_mut() {
        node.git_changes = counts.get(&node.path).copied().unwrap_or(0);
        if node.git_changes > 0 {
            let bumped =
                node.risk_score + (node.git_changes as f64 / max_count) * W_GIT_CHANGES;
            node.risk_score = round1(bumped.min(100.0));
        }
    }
}

/// True when the filename or any path segment follows a test convention.
pub fn is_test_file(node: &FileNode) -> bool {
    TEST_NAME_FRAGMENTS.iter().any(|f| node.name.contains(f))
        || node
            .path
            .split('/')
            .any(|segment| TEST_DIR_NAMES.contains(&segment))
}

/// Tag test files and discount their risk. Runs after the git adjustment.
pub fn apply_test_adjustment(nodes: &mut [FileNode]) {
    for node in nodes.iter_mut() {
        node.has_tests = is_test_file(node);
        if node.has_tests {
            node.tags.insert(Tag::Test);
            node.risk_score = (node.risk_score - TEST_DISCOUNT).max(0.0);
        }
    }
}

/// Aggregate project health in [0, 100]. An empty node set yields the
/// neutral value 100.
pub fn health_score(nodes: &[FileNode]) -> u32 {
    let total = nodes.len().max(1) as f64;
    let tested = nodes.iter().filter(|n| n.has_tests).count() as f64;
    let critical_untested = nodes
        .iter()
        .filter(|n| n.risk_score >= CRITICAL_RISK_THRESHOLD && !n.has_tests)
        .count() as f64;
    let average = nodes.iter().map(|n| n.risk_score).sum::<f64>() / total;

    let health = 100.0 - average * HEALTH_AVG_WEIGHT
        - (critical_untested / total) * HEALTH_UNTESTED_CRITICAL_WEIGHT
        + (tested / total) * HEALTH_TESTED_WEIGHT;
    health.round().clamp(0.0, 100.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BindingPoint, Complexity};
    use chrono::Utc;

    fn node(path: &str) -> FileNode {
        let name = path.rsplit('/').next().unwrap().to_string();
        FileNode {
            id: format!("id:{}", path),
            path: path.to_string(),
            absolute_path: format!("/tmp/{}", path),
            name,
            extension: ".py".to_string(),
            language: "python".to_string(),
            size_bytes: 0,
            line_count: 1,
            last_modified: Utc::now(),
            git_changes: 0,
            imports: Vec::new(),
            binding_points: Vec::new(),
            tags: Default::default(),
            concerns: Vec::new(),
            risk_score: 0.0,
            fan_in: 0,
            fan_out: 0,
            complexity: Complexity::Low,
            has_tests: false,
            summary: String::new(),
        }
    }

    fn with_bindings(mut n: FileNode, count: usize) -> FileNode {
        n.binding_points = (0..count)
            .map(|i| BindingPoint {
                name: format!("b{}", i),
                category: "decorators".to_string(),
                line: i + 1,
            })
            .collect();
        n
    }

    #[test]
    fn test_weighted_sum_against_hand_computed_fixture() {
        let mut a = with_bindings(node("a.py"), 2);
        a.fan_in = 1;
        a.line_count = 100;
        a.tags.insert(Tag::ApiEndpoint);
        a.tags.insert(Tag::DataModel);

        let mut b = node("b.py");
        b.fan_out = 1;
        b.line_count = 50;

        let mut nodes = vec![a, b];
        score_nodes(&mut nodes);

        // a: 1/1*35 + 0 + (2/10)*25 + 100/100*10 + (2/4)*15 = 57.5
        assert_eq!(nodes[0].risk_score, 57.5);
        // b: 0 + 1/1*15 + 0 + 50/100*10 + 0 = 20.0
        assert_eq!(nodes[1].risk_score, 20.0);
    }

    #[test]
    fn test_binding_density_saturates() {
        let mut nodes = vec![with_bindings(node("a.py"), 40)];
        score_nodes(&mut nodes);
        // Alone in the scan: lines share 10, bindings capped at 25.
        assert_eq!(nodes[0].risk_score, 35.0);
    }

    #[test]
    fn test_scores_stay_in_bounds() {
        let mut a = with_bindings(node("a.py"), 50);
        a.fan_in = 9;
        a.fan_out = 9;
        a.line_count = 900;
        for tag in RISKY_TAGS {
            a.tags.insert(tag);
        }
        let mut nodes = vec![a];
        score_nodes(&mut nodes);
        assert!(nodes[0].risk_score <= 100.0);
        assert!(nodes[0].risk_score >= 0.0);
    }

    #[test]
    fn test_git_adjustment_is_capped_and_clamped() {
        let mut a = with_bindings(node("a.py"), 50);
        a.fan_in = 1;
        a.line_count = 100;
        for tag in RISKY_TAGS {
            a.tags.insert(tag);
        }
        let mut nodes = vec![a];
        score_nodes(&mut nodes);
        assert_eq!(nodes[0].risk_score, 85.0);

        let counts = HashMap::from([("a.py".to_string(), 30usize)]);
        apply_git_adjustment(&mut nodes, &counts);
        // 85 + 30/30*10 = 95
        assert_eq!(nodes[0].risk_score, 95.0);

        // A second application would exceed 100 and must clamp.
        apply_git_adjustment(&mut nodes, &counts);
        assert_eq!(nodes[0].risk_score, 100.0);
    }

    #[test]
    fn test_untouched_files_get_zero_adjustment() {
        let mut nodes = vec![node("a.py")];
        score_nodes(&mut nodes);
        let before = nodes[0].risk_score;
        let counts = HashMap::from([("other.py".to_string(), 12usize)]);
        apply_git_adjustment(&mut nodes, &counts);
        assert_eq!(nodes[0].git_changes, 0);
        assert_eq!(nodes[0].risk_score, before);
    }

    #[test]
    fn test_test_detection_conventions() {
        for path in [
            "utils_test.py",
            "test_utils.py",
            "app.test.js",
            "order_spec.rb",
            "CartTests.swift",
            "tests/helper.py",
            "src/__tests__/app.js",
        ] {
            assert!(is_test_file(&node(path)), "{} should be a test", path);
        }
        for path in ["contest.py", "protest.js", "src/attestation.rs"] {
            assert!(!is_test_file(&node(path)), "{} should not be a test", path);
        }
    }

    #[test]
    fn test_adjustment_discounts_and_floors() {
        let mut low = node("test_low.py");
        low.risk_score = 12.0;
        let mut high = node("test_high.py");
        high.risk_score = 55.0;
        let mut plain = node("app.py");
        plain.risk_score = 55.0;

        let mut nodes = vec![low, high, plain];
        apply_test_adjustment(&mut nodes);

        assert_eq!(nodes[0].risk_score, 0.0); // floored
        assert_eq!(nodes[1].risk_score, 35.0);
        assert!(nodes[0].tags.contains(&Tag::Test));
        assert!(nodes[1].has_tests);
        assert_eq!(nodes[2].risk_score, 55.0);
        assert!(!nodes[2].has_tests);
    }

    #[test]
    fn test_health_neutral_on_empty_project() {
        assert_eq!(health_score(&[]), 100);
    }

    #[test]
    fn test_health_rewards_tests_and_punishes_untested_critical() {
        let mut risky = node("core.py");
        risky.risk_score = 80.0;
        let mut tested = node("test_core.py");
        tested.risk_score = 10.0;
        tested.has_tests = true;

        // avg = 45, untested critical = 1/2, tested = 1/2
        // 100 - 18 - 15 + 10 = 77
        assert_eq!(health_score(&[risky.clone(), tested.clone()]), 77);

        // Without the test file: 100 - 32 - 30 + 0 = 38
        assert_eq!(health_score(&[risky]), 38);
    }

    #[test]
    fn test_health_clamps_to_bounds() {
        let mut nodes = Vec::new();
        for i in 0..10 {
            let mut n = node(&format!("f{}.py", i));
            n.risk_score = 100.0;
            nodes.push(n);
        }
        // 100 - 40 - 30 + 0 = 30; still in range, now force below zero
        assert_eq!(health_score(&nodes), 30);

        // All tested, zero risk: 100 - 0 - 0 + 20 = 120 → clamped to 100.
        for n in nodes.iter_mut() {
            n.risk_score = 0.0;
            n.has_tests = true;
        }
        assert_eq!(health_score(&nodes), 100);
    }
}
