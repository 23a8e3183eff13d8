//! Reverie MCP Server - Association Graphs for AI Memories
//!
//! An MCP (Model Context Protocol) server that maintains a weighted
//! association graph over memories owned by the calling agent.
//!
//! Core Features:
//! - Dream consolidation cycle (semantic discovery, temporal discovery,
//!   co-activation reinforcement, decay pruning)
//! - Co-activation tracking: memories used together grow stronger links
//! - On-demand graph building by embedding similarity or timeline proximity
//! - Full audit log of every consolidation run

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

use reverie_core::{DreamOptions, Dreamer, Storage, StorageError};

use reverie_mcp::protocol::stdio;
use reverie_mcp::server::McpServer;

/// Parse command-line arguments and return the optional data directory path.
/// Returns `None` for the path if no `--data-dir` was specified.
/// Exits the process if `--help` or `--version` is requested.
fn parse_args() -> Option<PathBuf> {
    let args: Vec<String> = std::env::args().collect();
    let mut data_dir: Option<PathBuf> = None;
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                println!("Reverie MCP Server v{}", env!("CARGO_PKG_VERSION"));
                println!();
                println!("Association graph server for AI memories using the Model Context Protocol.");
                println!();
                println!("USAGE:");
                println!("    reverie-mcp [OPTIONS]");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help              Print help information");
                println!("    -V, --version           Print version information");
                println!("    --data-dir <PATH>       Custom data directory");
                println!();
                println!("ENVIRONMENT:");
                println!("    RUST_LOG                       Log level filter (e.g., debug, info, warn, error)");
                println!("    REVERIE_DREAM_INTERVAL_HOURS   Hours between automatic dream cycles (default: 6, 0 disables)");
                println!();
                println!("EXAMPLES:");
                println!("    reverie-mcp");
                println!("    reverie-mcp --data-dir /custom/path");
                println!("    RUST_LOG=debug reverie-mcp");
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("reverie-mcp {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--data-dir" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --data-dir requires a path argument");
                    eprintln!("Usage: reverie-mcp --data-dir <PATH>");
                    std::process::exit(1);
                }
                data_dir = Some(PathBuf::from(&args[i]));
            }
            arg if arg.starts_with("--data-dir=") => {
                // Safe: we just verified the prefix exists with starts_with
                let path = arg.strip_prefix("--data-dir=").unwrap_or("");
                if path.is_empty() {
                    eprintln!("error: --data-dir requires a path argument");
                    eprintln!("Usage: reverie-mcp --data-dir <PATH>");
                    std::process::exit(1);
                }
                data_dir = Some(PathBuf::from(path));
            }
            arg => {
                eprintln!("error: unknown argument '{}'", arg);
                eprintln!("Usage: reverie-mcp [OPTIONS]");
                eprintln!("Try 'reverie-mcp --help' for more information.");
                std::process::exit(1);
            }
        }
        i += 1;
    }

    data_dir
}

/// Resolve the database path from an optional custom data directory
fn resolve_db_path(data_dir: Option<PathBuf>) -> Result<Option<PathBuf>, io::Error> {
    match data_dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir)?;
            Ok(Some(dir.join("reverie.db")))
        }
        None => Ok(None),
    }
}

#[tokio::main]
async fn main() {
    // Parse CLI arguments first (before logging init, so --help/--version work cleanly)
    let data_dir = parse_args();

    // Initialize logging to stderr (stdout is for JSON-RPC)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();

    info!("Reverie MCP Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let db_path = match resolve_db_path(data_dir) {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to prepare data directory: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize storage with optional custom database location
    let storage = match Storage::new(db_path) {
        Ok(s) => {
            info!("Storage initialized successfully");
            Arc::new(s)
        }
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            std::process::exit(1);
        }
    };

    let dreamer = Arc::new(Dreamer::new(storage.clone()));

    // Spawn periodic dreaming so the graph keeps consolidating even when no
    // client ever calls the dream tool. Runs on startup (if stale) and then
    // every N hours. Configurable via REVERIE_DREAM_INTERVAL_HOURS env var.
    {
        let storage_clone = storage.clone();
        let dreamer_clone = dreamer.clone();
        tokio::spawn(async move {
            let interval_hours: u64 = std::env::var("REVERIE_DREAM_INTERVAL_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(6);

            if interval_hours == 0 {
                info!("Periodic dreaming disabled (REVERIE_DREAM_INTERVAL_HOURS=0)");
                return;
            }

            // Small delay so we don't block server startup / stdio handshake
            tokio::time::sleep(std::time::Duration::from_secs(2)).await;

            loop {
                // Check whether a dream cycle is actually due
                let should_run = match storage_clone.last_completed_run() {
                    Ok(Some(run)) => {
                        let completed = run.completed_at.unwrap_or(run.started_at);
                        let elapsed = chrono::Utc::now() - completed;
                        let stale = elapsed > chrono::Duration::hours(interval_hours as i64);
                        if !stale {
                            info!(
                                last_dream = %completed,
                                "Skipping periodic dream (last cycle was < {} hours ago)",
                                interval_hours
                            );
                        }
                        stale
                    }
                    Ok(None) => {
                        info!("No previous dream cycle found, running the first one");
                        true
                    }
                    Err(e) => {
                        warn!("Could not read dream history: {}, running anyway", e);
                        true
                    }
                };

                if should_run {
                    match dreamer_clone.run(&DreamOptions::default()) {
                        Ok(log) => {
                            info!(
                                run_id = log.id,
                                connections_created = log.connections_created,
                                connections_strengthened = log.connections_strengthened,
                                connections_pruned = log.connections_pruned,
                                "Periodic dream cycle complete"
                            );
                        }
                        Err(StorageError::DreamInProgress) => {
                            info!("Skipping periodic dream (a cycle is already running)");
                        }
                        Err(e) => {
                            warn!("Periodic dream cycle failed: {}", e);
                        }
                    }
                }

                // Sleep until next check
                tokio::time::sleep(std::time::Duration::from_secs(interval_hours * 3600)).await;
            }
        });
    }

    // Create MCP server
    let server = McpServer::new(storage, dreamer);

    info!("Starting MCP server on stdio...");

    if let Err(e) = stdio::serve(server).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Reverie MCP Server shutting down");
}
