//! # Regraft
//!
//! Command-line front end for regraft-core.
//!
//! ## Usage
//!
//! ```bash
//! # Print every embedding of a pattern
//! regraft match -p pattern.json -H host.json --all
//!
//! # Run one rule activation and write the rewritten host
//! regraft apply -r rule.json -H host.json -c engine.toml -o out.json
//!
//! # Validate a rule document
//! regraft check -r rule.json
//! ```

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // REGRAFT_LOG_FORMAT=json switches to machine-parseable logs.
    let log_format = std::env::var("REGRAFT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let cli = cli::Cli::parse();

    let default_filter = if cli.verbose {
        "regraft=debug,regraft_core=debug"
    } else {
        "regraft=info,regraft_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Logs go to stderr so stdout stays a clean document stream.
    match log_format.as_str() {
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

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
