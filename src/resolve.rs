//! Import resolution: turn raw import strings into directed edges.
//!
//! Every discovered file registers several path-shape variants (relative
//! path, extension-stripped path, bare stem, dotted form, `./`/`../`
//! prefixed forms, and the last two segments joined by `/` and `.`) in one
//! lookup table. Each raw import string is then tried as-is, slash-form,
//! and dot-form against that table.
//!
//! Resolution is best-effort. Unresolved imports are dropped without
//! diagnostics, and when two files register the same variant (duplicate
//! filenames in different directories) the first-registered file wins —
//! a known ambiguity that can occasionally produce a wrong edge.

use std::collections::HashMap;

use crate::models::{Edge, FileNode};

/// Resolve every node's raw imports against the node set, producing edges
/// and accumulating fan-in/fan-out counts per edge (not per unique pair).
/// Self-references are discarded after resolution.
pub fn resolve(nodes: &mut [FileNode]) -> Vec<Edge> {
    let mut lookup: HashMap<String, usize> = HashMap::new();
    for (index, node) in nodes.iter().enumerate() {
        for variant in path_variants(&node.path) {
            lookup.entry(variant).or_insert(index);
        }
    }

    let mut edges = Vec::new();
    for source in 0..nodes.len() {
        let imports = nodes[source].imports.clone();
        for import in imports {
            let Some(target) = resolve_import(&lookup, &import) else {
                continue;
            };
            if target == source {
                continue;
            }
            edges.push(Edge {
                source: nodes[source].id.clone(),
                target: nodes[target].id.clone(),
                edge_type: "import".to_string(),
                label: import,
            });
            nodes[target].fan_in += 1;
            nodes[source].fan_out += 1;
        }
    }
    edges
}

/// All lookup keys a file answers to.
fn path_variants(relative: &str) -> Vec<String> {
    let no_ext = strip_extension(relative);
    let stem = no_ext
        .rsplit('/')
        .next()
        .unwrap_or(no_ext.as_str())
        .to_string();

    let mut variants = vec![
        relative.to_string(),
        no_ext.clone(),
        stem,
        no_ext.replace('/', "."),
        format!("./{}", no_ext),
        format!("../{}", no_ext),
    ];

    let parts: Vec<&str> = no_ext.split('/').collect();
    if parts.len() >= 2 {
        let tail = &parts[parts.len() - 2..];
        variants.push(tail.join("/"));
        variants.push(tail.join("."));
    }
    variants
}

/// Strip the final extension from the last path segment, leaving dot-less
/// segments untouched.
fn strip_extension(relative: &str) -> String {
    let segment_start = relative.rfind('/').map_or(0, |pos| pos + 1);
    match relative.rfind('.') {
        Some(pos) if pos > segment_start => relative[..pos].to_string(),
        _ => relative.to_string(),
    }
}

/// Try the import string as written, then slash-form, then dot-form.
fn resolve_import(lookup: &HashMap<String, usize>, import: &str) -> Option<usize> {
    if let Some(&index) = lookup.get(import) {
        return Some(index);
    }
    let stripped = import.trim_start_matches(['.', '/']);
    lookup
        .get(&stripped.replace('.', "/"))
        .or_else(|| lookup.get(&stripped.replace('/', ".")))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Complexity;
    use chrono::Utc;

    fn node(path: &str, imports: &[&str]) -> FileNode {
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
            imports: imports.iter().map(|s| s.to_string()).collect(),
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

    #[test]
    fn test_sibling_import_by_stem() {
        let mut nodes = vec![node("a.py", &["b"]), node("b.py", &[])];
        let edges = resolve(&mut nodes);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source, "id:a.py");
        assert_eq!(edges[0].target, "id:b.py");
        assert_eq!(edges[0].label, "b");
        assert_eq!(nodes[0].fan_out, 1);
        assert_eq!(nodes[1].fan_in, 1);
    }

    #[test]
    fn test_dotted_import_resolves_to_nested_path() {
        let mut nodes = vec![node("main.py", &["pkg.module"]), node("pkg/module.py", &[])];
        let edges = resolve(&mut nodes);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target, "id:pkg/module.py");
    }

    #[test]
    fn test_relative_prefixes_resolve() {
        let mut nodes = vec![
            node("src/app.js", &["./util", "../shared/api"]),
            node("src/util.js", &[]),
            node("shared/api.js", &[]),
        ];
        let edges = resolve(&mut nodes);
        let targets: Vec<&str> = edges.iter().map(|e| e.target.as_str()).collect();
        // "./util" strips to "util" and hits the bare stem variant;
        // "../shared/api" matches the registered "../" variant directly.
        assert!(targets.contains(&"id:src/util.js"));
        assert!(targets.contains(&"id:shared/api.js"));
    }

    #[test]
    fn test_duplicate_filenames_first_registered_wins() {
        let mut nodes = vec![
            node("importer.py", &["util"]),
            node("alpha/util.py", &[]),
            node("beta/util.py", &[]),
        ];
        let edges = resolve(&mut nodes);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target, "id:alpha/util.py");
        assert_eq!(nodes[1].fan_in, 1);
        assert_eq!(nodes[2].fan_in, 0);
    }

    #[test]
    fn test_self_reference_produces_no_edge() {
        let mut nodes = vec![node("solo.py", &["solo"])];
        let edges = resolve(&mut nodes);
        assert!(edges.is_empty());
        assert_eq!(nodes[0].fan_in, 0);
        assert_eq!(nodes[0].fan_out, 0);
    }

    #[test]
    fn test_unresolved_imports_dropped_silently() {
        let mut nodes = vec![node("a.py", &["numpy", "requests"])];
        let edges = resolve(&mut nodes);
        assert!(edges.is_empty());
    }

    #[test]
    fn test_repeated_imports_accumulate_per_edge() {
        let mut nodes = vec![node("a.py", &["b", "b"]), node("b.py", &[])];
        let edges = resolve(&mut nodes);
        assert_eq!(edges.len(), 2);
        assert_eq!(nodes[0].fan_out, 2);
        assert_eq!(nodes[1].fan_in, 2);
    }

    #[test]
    fn test_fan_counts_sum_to_edge_count() {
        let mut nodes = vec![
            node("a.py", &["b", "c"]),
            node("b.py", &["c"]),
            node("c.py", &[]),
        ];
        let edges = resolve(&mut nodes);
        let fan_in: usize = nodes.iter().map(|n| n.fan_in).sum();
        let fan_out: usize = nodes.iter().map(|n| n.fan_out).sum();
        assert_eq!(fan_in, edges.len());
        assert_eq!(fan_out, edges.len());
    }

    #[test]
    fn test_multi_dot_name_strips_only_last_extension() {
        assert_eq!(strip_extension("a/b.test.py"), "a/b.test");
        assert_eq!(strip_extension("a/noext"), "a/noext");
        assert_eq!(strip_extension("top.py"), "top");
    }
}
