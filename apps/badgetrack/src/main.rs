//! # Badgetrack Server
//!
//! ## Usage
//!
//! ```bash
//! # Create the super-admin account
//! BADGETRACK_SUPER_ADMIN_PASSWORD=... badgetrack init --name "Jane Doe"
//!
//! # Start the HTTP server
//! badgetrack serve --host 0.0.0.0 --port 8080
//!
//! # Inspect the database
//! badgetrack status
//! badgetrack users --role teacher
//! ```

use badgetrack::cli;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // BADGETRACK_LOG_FORMAT=json enables machine-parseable output.
    let log_format =
        std::env::var("BADGETRACK_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "badgetrack=info,badgetrack_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_banner() {
    println!(
        r#"
  ┏┓ ┏━┓╺┳┓┏━╸┏━╸╺┳╸┏━┓┏━┓┏━╸╻┏
  ┣┻┓┣━┫ ┃┃┃╺┓┣╸  ┃ ┣┳┛┣━┫┃  ┣┻┓
  ┗━┛╹ ╹╺┻┛┗━┛┗━╸ ╹ ╹┗╸╹ ╹┗━╸╹ ╹

  Badge Tracker v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
