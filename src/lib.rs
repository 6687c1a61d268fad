//! # Cartographer
//!
//! Codebase risk cartography: scan a local source tree, extract lightweight
//! structural signals with per-language pattern tables, build an
//! import-based dependency graph, and score how disruptive changing each
//! file is likely to be — so a developer (or an AI coding agent) knows what
//! is safe to touch.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────┐   ┌─────────┐   ┌──────┐   ┌───────┐
//! │ Discover │──▶│ Extract │──▶│ Resolve │──▶│ Tag  │──▶│ Score │
//! └──────────┘   └─────────┘   └─────────┘   └──────┘   └───┬───┘
//!                                                           │
//!                             ┌──────────┐   ┌──────────┐   │
//!                             │  Report  │◀──│ Concerns │◀──┘
//!                             └────┬─────┘   └──────────┘
//!                                  ▼
//!                     ┌──────────┐   ┌──────────┐
//!                     │   CLI    │   │   HTTP   │
//!                     │ (carto)  │   │ (axum)   │
//!                     └──────────┘   └──────────┘
//! ```
//!
//! One scan is a synchronous pipeline pass producing an immutable
//! [`models::ScanResult`]; a rescan rebuilds it from scratch. The HTTP
//! layer and the chat collaborator only ever consume finished snapshots.
//!
//! ## Quick Start
//!
//! ```bash
//! carto scan ~/code/myapp            # summary + health score
//! carto context ~/code/myapp         # plain-text risk map for agents
//! carto serve ~/code/myapp           # dashboard + agent HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Snapshot data types |
//! | [`languages`] | Extension→language and pattern tables |
//! | [`discover`] | Directory walk and file-node creation |
//! | [`extract`] | Line-by-line binding-point extraction |
//! | [`resolve`] | Import resolution into dependency edges |
//! | [`tags`] | Category→semantic-tag derivation |
//! | [`score`] | Risk and health scoring |
//! | [`git`] | Recent-change counts from git history |
//! | [`concerns`] | Keyword-based concern classification |
//! | [`report`] | Summaries, clusters, and the agent context |
//! | [`scan`] | Pipeline orchestration |
//! | [`registry`] | Multi-project service state |
//! | [`config`] | Chat settings persistence |
//! | [`chat`] | Prompt-context building and DeepSeek client |
//! | [`server`] | JSON/text HTTP API |

pub mod chat;
pub mod concerns;
pub mod config;
pub mod discover;
pub mod extract;
pub mod git;
pub mod languages;
pub mod models;
pub mod registry;
pub mod report;
pub mod resolve;
pub mod scan;
pub mod score;
pub mod server;
pub mod tags;
