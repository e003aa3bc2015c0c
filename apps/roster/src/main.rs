//! # Roster - Student Registry
//!
//! The main binary for the Roster student record registry.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for record operations
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │              apps/roster (THE BINARY)         │
//! │                                               │
//! │   ┌─────────────┐        ┌─────────────┐      │
//! │   │    CLI      │        │  HTTP API   │      │
//! │   │   (clap)    │        │   (axum)    │      │
//! │   └──────┬──────┘        └──────┬──────┘      │
//! │          └───────────┬──────────┘             │
//! │                      ▼                        │
//! │              ┌───────────────┐                │
//! │              │  roster-core  │                │
//! │              │  (THE LOGIC)  │                │
//! │              └───────────────┘                │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! roster server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! roster add -n "Aarav Sharma" -a 20 -g A -e aarav@university.edu -p 92 --course Physics
//! roster list --grade A --sort performance --desc
//! roster import -i students.csv
//! ```

use clap::Parser;
use roster::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing; log_format "json" enables machine-parseable output.
    init_tracing(&config.log_format);

    // Display startup banner
    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli, config).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(log_format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "roster=info,roster_core=info,tower_http=debug".into());

    match log_format {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Print the Roster startup banner.
fn print_banner() {
    println!(
        r#"
  ┏━┓┏━┓┏━┓╺┳╸┏━╸┏━┓
  ┣┳┛┃ ┃┗━┓ ┃ ┣╸ ┣┳┛
  ╹┗╸┗━┛┗━┛ ╹ ┗━╸╹┗╸

  Student Registry v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
