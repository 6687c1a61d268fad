//! Semantic tag derivation from binding-point categories.
//!
//! A fixed many-to-one table: language-specific categories collapse onto a
//! small shared tag vocabulary, so a Swift `protocol` and a Rust `trait`
//! both read as `interface` downstream. Purely derived and idempotent.

use crate::models::{FileNode, Tag};

/// Map a binding-point category to its semantic tag, if any.
pub fn tag_for_category(category: &str) -> Option<Tag> {
    let tag = match category {
        "protocols" | "interfaces" | "traits" => Tag::Interface,
        "delegates" | "event_emitters" | "signals" | "combine" => Tag::EventDriven,
        "api_endpoints" | "api_routes" | "http_handlers" | "routes" | "spring_endpoints" => {
            Tag::ApiEndpoint
        }
        "api_calls" => Tag::ApiConsumer,
        "db_models" | "core_data" => Tag::DataModel,
        "env_vars" => Tag::ConfigDependent,
        "hooks" | "context" | "swiftui_env" | "providers" => Tag::StateManagement,
        "decorators" | "annotations" => Tag::Decorated,
        "unsafe" | "ffi" => Tag::UnsafeCode,
        "goroutines" | "coroutines" => Tag::Concurrent,
        _ => return None,
    };
    Some(tag)
}

/// Derive every node's tag set from its binding-point categories.
pub fn derive_tags(nodes: &mut [FileNode]) {
    for node in nodes.iter_mut() {
        node.tags = node
            .binding_points
            .iter()
            .filter_map(|bp| tag_for_category(&bp.category))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BindingPoint, Complexity};
    use chrono::Utc;

    fn node_with_categories(categories: &[&str]) -> FileNode {
        FileNode {
            id: "f".to_string(),
            path: "f.py".to_string(),
            absolute_path: "/tmp/f.py".to_string(),
            name: "f.py".to_string(),
            extension: ".py".to_string(),
            language: "python".to_string(),
            size_bytes: 0,
            line_count: 1,
            last_modified: Utc::now(),
            git_changes: 0,
            imports: Vec::new(),
            binding_points: categories
                .iter()
                .map(|c| BindingPoint {
                    name: "x".to_string(),
                    category: c.to_string(),
                    line: 1,
                })
                .collect(),
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

    #[test]
    fn test_categories_collapse_to_one_tag() {
        let mut nodes = vec![node_with_categories(&["protocols", "traits", "interfaces"])];
        derive_tags(&mut nodes);
        assert_eq!(nodes[0].tags.len(), 1);
        assert!(nodes[0].tags.contains(&Tag::Interface));
    }

    #[test]
    fn test_unmapped_categories_produce_no_tags() {
        let mut nodes = vec![node_with_categories(&["imports", "exports", "userdefaults"])];
        derive_tags(&mut nodes);
        assert!(nodes[0].tags.is_empty());
    }

    #[test]
    fn test_mixed_categories() {
        let mut nodes = vec![node_with_categories(&["api_routes", "env_vars", "hooks"])];
        derive_tags(&mut nodes);
        let tags = &nodes[0].tags;
        assert!(tags.contains(&Tag::ApiEndpoint));
        assert!(tags.contains(&Tag::ConfigDependent));
        assert!(tags.contains(&Tag::StateManagement));
        assert_eq!(tags.len(), 3);
    }

    #[test]
    fn test_derivation_is_idempotent() {
        let mut nodes = vec![node_with_categories(&["goroutines", "http_handlers"])];
        derive_tags(&mut nodes);
        let first = nodes[0].tags.clone();
        derive_tags(&mut nodes);
        assert_eq!(nodes[0].tags, first);
    }
}
