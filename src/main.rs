//! # Cartographer CLI (`carto`)
//!
//! The `carto` binary scans a source tree, reports which files are risky to
//! modify, and can serve the results to the browser dashboard and to AI
//! coding agents over HTTP.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `carto scan <root>` | One-shot scan; prints a summary (or `--json` for the full snapshot) |
//! | `carto context <root>` | Print the plain-text agent-context risk map |
//! | `carto serve [root]` | Start the HTTP API, optionally preloading a project |
//!
//! ## Examples
//!
//! ```bash
//! # Summarize a project
//! carto scan ~/code/myapp
//!
//! # Dump the full snapshot as JSON
//! carto scan ~/code/myapp --json > snapshot.json
//!
//! # Write the risk map for an agent to read before editing
//! carto scan ~/code/myapp --context-out CODEBASE_AGENT_CONTEXT.md
//!
//! # Serve the dashboard API on a custom port
//! carto serve ~/code/myapp --port 3100
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cartographer::models::ScanResult;
use cartographer::registry::ProjectRegistry;
use cartographer::{config, registry, scan, server};

/// Cartographer — scan a codebase and map which files are safe or
/// dangerous to change.
#[derive(Parser)]
#[command(
    name = "carto",
    about = "Cartographer — codebase risk maps for developers and AI coding agents",
    version,
    long_about = "Cartographer scans a source tree with per-language pattern tables, builds an \
    import-based dependency graph, scores each file's modification risk, and produces reports \
    for humans, a browser dashboard, and AI coding agents."
)]
struct Cli {
    /// Path to the chat settings file (TOML).
    ///
    /// Defaults to `~/.cartographer.toml`. Stores the chat API key and
    /// model selection between runs.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Scan a project tree and print a summary.
    Scan {
        /// Project root directory.
        root: PathBuf,

        /// Print the full snapshot as JSON instead of a summary.
        #[arg(long)]
        json: bool,

        /// Also write the agent-context document to this path.
        #[arg(long)]
        context_out: Option<PathBuf>,
    },

    /// Print the agent-context document for a project tree.
    ///
    /// This is the plain-text risk map an AI coding agent should read
    /// before editing the project.
    Context {
        /// Project root directory.
        root: PathBuf,
    },

    /// Start the dashboard/agent HTTP API.
    Serve {
        /// Project to load and scan before serving.
        root: Option<PathBuf>,

        /// Port to bind on 127.0.0.1.
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let history_path = config::default_history_path();

    match cli.command {
        Commands::Scan {
            root,
            json,
            context_out,
        } => {
            let result = scan::scan_project(&root, None)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_summary(&result);
            }
            if let Some(path) = context_out {
                std::fs::write(&path, &result.agent_context)?;
                println!("Agent context written to {}", path.display());
            }
        }
        Commands::Context { root } => {
            let result = scan::scan_project(&root, None)?;
            println!("{}", result.agent_context);
        }
        Commands::Serve { root, port } => {
            let chat_config = config::load_config(&config_path)?;
            if chat_config.api_key.is_some() {
                println!("Chat API key loaded.");
            }

            let mut projects = ProjectRegistry::new();
            if let Some(root) = root {
                let loaded_root = {
                    let project = projects.load_project(&root)?;
                    print_summary(&project.scan);
                    project.root.clone()
                };
                let _ = registry::add_recent_project(&history_path, &loaded_root);
            } else {
                println!("No project loaded — open one from the dashboard.");
            }

            let bind_addr = format!("127.0.0.1:{}", port);
            server::run_server(&bind_addr, projects, chat_config, config_path, history_path)
                .await?;
        }
    }

    Ok(())
}

fn print_summary(result: &ScanResult) {
    let meta = &result.metadata;
    println!("Cartographer — Scan Summary");
    println!("===========================");
    println!();
    println!("  Project:   {}", meta.project_name);
    println!("  Files:     {}", meta.total_files);
    println!("  Edges:     {}", meta.total_edges);
    println!("  Bindings:  {}", meta.total_binding_points);
    println!("  Health:    {}/100", meta.health_score);
    println!("  Languages: {}", meta.languages.join(", "));
    println!();
}
