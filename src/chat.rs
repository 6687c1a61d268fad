//! Chat collaborator: prompt-context building and DeepSeek completions.
//!
//! The context builder is a pure function over a scan snapshot — it selects
//! up to ten relevant files for a query (explicit mentions first, then
//! concern matches, then path/name word hits) and truncates the assembled
//! text to a fixed character budget. The HTTP call itself is a single
//! request with a per-request timeout; model-specific prompt shaping
//! follows the upstream guidance for each DeepSeek model family.

use anyhow::{bail, Result};
use regex::Regex;
use std::collections::HashSet;
use std::time::Duration;

use crate::config::ChatConfig;
use crate::models::{ScanResult, Tag};
use crate::registry::ChatMessage;

const DEEPSEEK_API_URL: &str = "https://api.deepseek.com/chat/completions";
/// Model that prefers an empty system prompt and a task-formatted message.
pub const REASONER_MODEL: &str = "deepseek-reasoner";

/// Character budget for the assembled context (~8K tokens).
pub const MAX_CONTEXT_CHARS: usize = 32_000;
/// At most this many per-file detail blocks per query.
const MAX_CONTEXT_FILES: usize = 10;
/// Files pulled in per matching concern cluster.
const FILES_PER_CONCERN: usize = 3;
/// Trailing chat history messages forwarded with each request.
const MAX_HISTORY_MESSAGES: usize = 10;
const MAX_COMPLETION_TOKENS: u32 = 2000;

const REASONER_TEMPERATURE: f64 = 0.6;
const CHAT_TEMPERATURE: f64 = 0.7;

/// Patterns that pull explicit file references out of a query, e.g.
/// "in auth.py", "`src/api.ts`", or a bare "Header.tsx".
const FILE_MENTION_PATTERNS: &[&str] = &[
    r"in\s+([a-zA-Z0-9_/.-]+\.[a-z]+)",
    r"`([a-zA-Z0-9_/.-]+\.[a-z]+)`",
    r"file\s+([a-zA-Z0-9_/.-]+\.[a-z]+)",
    r"([a-zA-Z0-9_/-]+\.(?:py|ts|tsx|js|jsx|java|go|rs|cpp|c|h))\b",
];

/// Assemble the bounded prompt context for one query.
pub fn build_context(scan: &ScanResult, query: &str, include_files: &[String]) -> String {
    let meta = &scan.metadata;
    let mut parts = vec![format!(
        "PROJECT: {}\nHEALTH: {}/100\nLANGUAGES: {}\nTOTAL FILES: {}",
        meta.project_name,
        meta.health_score,
        meta.languages.join(", "),
        meta.total_files
    )];

    if !scan.agent_context.is_empty() {
        parts.push(scan.agent_context.clone());
    }

    let query_lower = query.to_lowercase();

    let mut mentioned: Vec<String> = Vec::new();
    for pattern in FILE_MENTION_PATTERNS {
        if let Ok(re) = Regex::new(pattern) {
            for caps in re.captures_iter(&query_lower) {
                if let Some(m) = caps.get(1) {
                    let text = m.as_str().to_string();
                    if !mentioned.contains(&text) {
                        mentioned.push(text);
                    }
                }
            }
        }
    }

    // Explicitly mentioned files go first.
    let mut relevant: Vec<String> = Vec::new();
    for file_ref in &mentioned {
        if let Some(node) = scan
            .nodes
            .iter()
            .find(|n| n.path.to_lowercase().contains(file_ref.as_str()))
        {
            relevant.insert(0, node.id.clone());
        }
    }

    // Concern clusters named in the query.
    for (concern, members) in &scan.concern_clusters {
        if query_lower.contains(concern.as_str()) {
            relevant.extend(members.iter().take(FILES_PER_CONCERN).map(|m| m.id.clone()));
        }
    }

    // Any query word appearing in a path or file name.
    for node in &scan.nodes {
        let path_lower = node.path.to_lowercase();
        let name_lower = node.name.to_lowercase();
        for word in query_lower.split_whitespace() {
            if word.len() > 2 && (path_lower.contains(word) || name_lower.contains(word)) {
                relevant.push(node.id.clone());
                break;
            }
        }
    }

    relevant.extend(include_files.iter().cloned());

    let mut seen = HashSet::new();
    let selected: Vec<String> = relevant
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .take(MAX_CONTEXT_FILES)
        .collect();

    for id in &selected {
        if let Some(node) = scan.nodes.iter().find(|n| n.id == *id) {
            let tags = node
                .tags
                .iter()
                .map(Tag::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            let explanation = if node.summary.is_empty() {
                "No explanation available."
            } else {
                node.summary.as_str()
            };
            parts.push(format!(
                "\nFILE: {}\nRISK: {}/100\nTAGS: {}\nCONCERNS: {}\nEXPLANATION: {}",
                node.path,
                node.risk_score,
                tags,
                node.concerns.join(", "),
                explanation
            ));
        }
    }

    truncate_chars(parts.join("\n\n"), MAX_CONTEXT_CHARS)
}

/// Truncate on a character (not byte) boundary.
fn truncate_chars(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text,
    }
}

/// Model-specific prompt shaping: `(system, user message, temperature)`.
///
/// The reasoner model performs better with no system prompt, so the context
/// is embedded in a task-formatted user message instead.
pub fn build_prompt(model: &str, message: &str, context: &str) -> (String, String, f64) {
    if model == REASONER_MODEL {
        let user = format!(
            "Task: {}\n\nCodebase Context:\n{}\n\nOutput Format:\n\
             1. Analysis (explain the issue/requirement)\n\
             2. Code changes (show as code diffs with file paths like `// File: path/to/file.ext`)\n\
             3. Testing plan (how to verify the changes)\n\n\
             Use markdown code blocks with file paths for all code suggestions.",
            message, context
        );
        (String::new(), user, REASONER_TEMPERATURE)
    } else {
        let system = format!(
            "You are a senior software architect analyzing a codebase and proposing code changes.\n\n\
             Codebase Context:\n{}\n\n\
             When proposing code changes:\n\
             1. Use markdown code blocks with file paths: ```lang\n// File: path/to/file.ext\ncode here\n```\n\
             2. Show clear before/after diffs when modifying existing code\n\
             3. Reference specific files, risk scores, and patterns from the context\n\
             4. Be concise but actionable\n\
             5. Include file paths in every code block for easy copying\n\n\
             Example format:\n\
             ```typescript\n// File: src/components/Header.tsx\ninterface HeaderProps {{\n  showSearch: boolean;  // <- ADD THIS LINE\n}}\n```",
            context
        );
        (system, message.to_string(), CHAT_TEMPERATURE)
    }
}

/// Call the DeepSeek chat completions API.
///
/// Sends the shaped system/user messages plus the trailing chat history and
/// returns the assistant's reply text.
pub async fn chat_completion(
    config: &ChatConfig,
    model: &str,
    message: &str,
    context: &str,
    history: &[ChatMessage],
) -> Result<String> {
    let Some(api_key) = config.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
        bail!(
            "DEEPSEEK_API_KEY not set. Configure it via the settings endpoint or the environment."
        );
    };

    let (system_content, user_message, temperature) = build_prompt(model, message, context);

    let mut messages: Vec<serde_json::Value> = Vec::new();
    if !system_content.is_empty() {
        messages.push(serde_json::json!({ "role": "system", "content": system_content }));
    }
    let tail_start = history.len().saturating_sub(MAX_HISTORY_MESSAGES);
    for entry in &history[tail_start..] {
        messages.push(serde_json::json!({ "role": entry.role, "content": entry.content }));
    }
    messages.push(serde_json::json!({ "role": "user", "content": user_message }));

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let body = serde_json::json!({
        "model": model,
        "messages": messages,
        "temperature": temperature,
        "max_tokens": MAX_COMPLETION_TOKENS,
    });

    let response = client
        .post(DEEPSEEK_API_URL)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        bail!("DeepSeek API error {}: {}", status, body_text.trim());
    }

    let json: serde_json::Value = response.json().await?;
    json["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid DeepSeek response: missing message content"))
}
