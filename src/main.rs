/// Main entry point for the Wellness Tracker MCP server
///
/// This file sets up logging, parses command line arguments, reads the
/// environment configuration and starts the MCP server. The server listens
/// for JSON-RPC requests over stdin/stdout following the MCP protocol.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use wellness_tracker_mcp::{Config, UserId, WellnessTrackerServer};

/// Get the default database path with robust fallback strategy
fn get_default_database_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    // Try various locations in order of preference
    let potential_paths = [
        dirs::home_dir().map(|p| p.join(".wellness_tracker")),
        dirs::data_dir().map(|p| p.join("wellness_tracker")),
        dirs::config_dir().map(|p| p.join("wellness_tracker")),
        // Current working directory (last resort)
        std::env::current_dir().ok().map(|p| p.join(".wellness_tracker")),
    ];

    for dir in potential_paths.iter().flatten() {
        if std::fs::create_dir_all(dir).is_err() {
            continue;
        }
        // Make sure the directory is actually writable
        let test_file = dir.join(".test_write");
        if std::fs::write(&test_file, "test").is_ok() {
            let _ = std::fs::remove_file(&test_file);
            return Ok(dir.join("wellness.db"));
        }
    }

    let temp_dir = std::env::temp_dir().join("wellness_tracker");
    std::fs::create_dir_all(&temp_dir)?;
    let db_path = temp_dir.join("wellness.db");

    tracing::warn!("Using temporary directory for database: {}", db_path.display());
    Ok(db_path)
}

/// Command line arguments for the Wellness Tracker MCP server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    /// If not provided, uses a default location in the user's home directory
    #[arg(long)]
    database: Option<PathBuf>,

    /// User whose data the server reads and writes
    #[arg(long, default_value = "default")]
    user: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("wellness_tracker_mcp={}", log_level))
        .with_writer(std::io::stderr) // stdout carries JSON-RPC
        .init();

    info!("Starting Wellness Tracker MCP server");

    let config = Config::from_env()?;
    info!("Loaded configuration: {:?}", config);

    let db_path = match args.database {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            path
        }
        None => get_default_database_path()?,
    };

    info!("Using database at: {}", db_path.display());

    let server = WellnessTrackerServer::new(db_path, config, UserId::new(args.user)).await?;
    server.run().await?;

    info!("Wellness Tracker MCP server shutdown complete");
    Ok(())
}
