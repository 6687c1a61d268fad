//! Binding-point extraction: run each language's pattern table over file
//! contents, line by line.
//!
//! Matching is per-line on purpose — a pattern cannot match across a line
//! break. Matches in the `imports` category are additionally collected as
//! raw import strings in order of first appearance, duplicates included.

use std::collections::HashMap;

use crate::languages::{self, IMPORT_CATEGORY};
use crate::models::{BindingPoint, Complexity, FileNode};

/// Line-count thresholds for the coarse complexity hint.
const COMPLEXITY_HIGH_LINES: usize = 300;
const COMPLEXITY_MEDIUM_LINES: usize = 100;

/// Populate every node's binding points, raw imports, and complexity hint.
pub fn extract(nodes: &mut [FileNode], contents: &HashMap<String, String>) {
    for node in nodes.iter_mut() {
        if let Some(content) = contents.get(&node.id) {
            extract_node(node, content);
        }
        node.complexity = complexity_for_lines(node.line_count);
    }
}

fn extract_node(node: &mut FileNode, content: &str) {
    let patterns = languages::compiled_patterns(&node.language);
    for (category, re) in &patterns {
        for (index, line) in content.lines().enumerate() {
            for caps in re.captures_iter(line) {
                let name = if caps.len() > 1 {
                    // Alternation patterns: take the first non-empty group.
                    (1..caps.len())
                        .filter_map(|i| caps.get(i))
                        .map(|m| m.as_str())
                        .find(|s| !s.is_empty())
                } else {
                    caps.get(0).map(|m| m.as_str()).filter(|s| !s.is_empty())
                };
                let Some(name) = name else { continue };

                node.binding_points.push(BindingPoint {
                    name: name.to_string(),
                    category: category.to_string(),
                    line: index + 1,
                });
                if *category == IMPORT_CATEGORY {
                    node.imports.push(name.to_string());
                }
            }
        }
    }
}

/// Pure function of line count; independent of extraction results.
pub fn complexity_for_lines(line_count: usize) -> Complexity {
    if line_count > COMPLEXITY_HIGH_LINES {
        Complexity::High
    } else if line_count > COMPLEXITY_MEDIUM_LINES {
        Complexity::Medium
    } else {
        Complexity::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn node(language: &str, content_lines: usize) -> FileNode {
        FileNode {
            id: "f1".to_string(),
            path: "src/app.py".to_string(),
            absolute_path: "/tmp/src/app.py".to_string(),
            name: "app.py".to_string(),
            extension: ".py".to_string(),
            language: language.to_string(),
            size_bytes: 0,
            line_count: content_lines,
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

    fn run(language: &str, content: &str) -> FileNode {
        let mut n = node(language, content.matches('\n').count() + 1);
        let contents = HashMap::from([("f1".to_string(), content.to_string())]);
        let mut nodes = vec![n.clone()];
        extract(&mut nodes, &contents);
        n = nodes.into_iter().next().unwrap();
        n
    }

    #[test]
    fn test_python_imports_and_decorators() {
        let n = run("python", "import json\nfrom os.path import join\n\n@app.get('/x')\ndef f():\n    pass\n");
        assert_eq!(n.imports, vec!["json", "os.path"]);

        let decorator: Vec<_> = n
            .binding_points
            .iter()
            .filter(|bp| bp.category == "decorators")
            .collect();
        assert_eq!(decorator.len(), 1);
        assert_eq!(decorator[0].name, "app");
        assert_eq!(decorator[0].line, 4);

        let endpoints: Vec<_> = n
            .binding_points
            .iter()
            .filter(|bp| bp.category == "api_endpoints")
            .collect();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].name, "/x");
    }

    #[test]
    fn test_first_nonempty_group_wins() {
        // `import X from` fills group 1, `require(Y)` fills group 2.
        let n = run(
            "javascript",
            "import fs from 'fs'\nconst x = require('./util')\n",
        );
        assert_eq!(n.imports, vec!["fs", "./util"]);
    }

    #[test]
    fn test_line_numbers_are_one_based() {
        let n = run("rust", "mod a;\nuse std::fmt;\n");
        let import = n
            .binding_points
            .iter()
            .find(|bp| bp.category == "imports")
            .unwrap();
        assert_eq!(import.line, 2);
        assert_eq!(import.name, "std::fmt");
    }

    #[test]
    fn test_pattern_cannot_match_across_lines() {
        // The `from` part lands on the next line, so no import is found.
        let n = run("javascript", "import fs\nfrom 'fs'\n");
        assert!(n.imports.is_empty());
    }

    #[test]
    fn test_duplicate_imports_preserved_in_order() {
        let n = run("python", "import a\nimport b\nimport a\n");
        assert_eq!(n.imports, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_language_without_table_produces_nothing() {
        let n = run("objc", "#import <Foundation/Foundation.h>\n");
        assert!(n.binding_points.is_empty());
        assert!(n.imports.is_empty());
    }

    #[test]
    fn test_complexity_thresholds() {
        assert_eq!(complexity_for_lines(100), Complexity::Low);
        assert_eq!(complexity_for_lines(101), Complexity::Medium);
        assert_eq!(complexity_for_lines(300), Complexity::Medium);
        assert_eq!(complexity_for_lines(301), Complexity::High);
    }
}
