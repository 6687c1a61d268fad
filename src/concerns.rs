//! Topical concern classification by keyword density.
//!
//! Each concern bucket carries a keyword list. A keyword scores 3 when it
//! appears in the filename, else 2 when it appears in the relative path,
//! else 2 when it exactly matches a binding-point name, else 1 when it
//! appears anywhere in the file content; a bucket whose keywords total at
//! least [`CONCERN_THRESHOLD`] is assigned. All matching is lowercase.
//!
//! This is a relevance filter, not exact classification — a file that
//! merely mentions "config" once in a comment stays below threshold.

use std::collections::{HashMap, HashSet};

use crate::models::FileNode;

const SCORE_NAME: u32 = 3;
const SCORE_PATH: u32 = 2;
const SCORE_BINDING: u32 = 2;
const SCORE_CONTENT: u32 = 1;
/// Minimum total keyword score for a concern label to be assigned.
pub const CONCERN_THRESHOLD: u32 = 3;

/// Concern buckets and their keywords.
const CONCERN_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "authentication",
        &[
            "auth", "login", "logout", "token", "jwt", "session", "password", "oauth", "signin",
            "signup", "credential",
        ],
    ),
    (
        "database",
        &[
            "database", "db", "model", "schema", "migration", "query", "sql", "core_data",
            "realm", "sqlite", "mongo",
        ],
    ),
    (
        "networking",
        &[
            "api", "http", "fetch", "request", "url", "endpoint", "rest", "graphql", "socket",
            "network",
        ],
    ),
    (
        "ui / views",
        &[
            "view", "screen", "component", "widget", "layout", "page", "ui", "button", "form",
            "modal", "navigation",
        ],
    ),
    (
        "state management",
        &[
            "state", "store", "redux", "context", "provider", "viewmodel", "observable",
            "published", "combine", "bloc",
        ],
    ),
    (
        "configuration",
        &["config", "env", "environment", "settings", "constants", "keys", "secret"],
    ),
    (
        "payments",
        &[
            "payment", "stripe", "billing", "subscription", "purchase", "storekit", "iap",
            "checkout",
        ],
    ),
    ("testing", &["test", "spec", "mock", "stub", "fixture", "assert"]),
    (
        "security",
        &["security", "encrypt", "decrypt", "keychain", "hash", "ssl", "cert"],
    ),
    (
        "notifications",
        &["notification", "push", "alert", "apns", "fcm", "messaging"],
    ),
    (
        "analytics",
        &["analytics", "tracking", "event", "metric", "log", "telemetry", "firebase"],
    ),
];

/// Assign concern labels to every node.
pub fn classify(nodes: &mut [FileNode], contents: &HashMap<String, String>) {
    for node in nodes.iter_mut() {
        let content_lower = contents
            .get(&node.id)
            .map(|c| c.to_lowercase())
            .unwrap_or_default();
        let name_lower = node.name.to_lowercase();
        let path_lower = node.path.to_lowercase();
        let binding_names: HashSet<String> = node
            .binding_points
            .iter()
            .map(|bp| bp.name.to_lowercase())
            .collect();

        node.concerns = CONCERN_KEYWORDS
            .iter()
            .filter(|(_, keywords)| {
                let score: u32 = keywords
                    .iter()
                    .map(|kw| {
                        if name_lower.contains(kw) {
                            SCORE_NAME
                        } else if path_lower.contains(kw) {
                            SCORE_PATH
                        } else if binding_names.contains(*kw) {
                            SCORE_BINDING
                        } else if content_lower.contains(kw) {
                            SCORE_CONTENT
                        } else {
                            0
                        }
                    })
                    .sum();
                score >= CONCERN_THRESHOLD
            })
            .map(|(label, _)| label.to_string())
            .collect();
    }
}
