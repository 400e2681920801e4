//! # Regraft CLI Module
//!
//! ## Available Commands
//!
//! - `match` - Print the embeddings of a pattern in a host graph
//! - `apply` - Run one rule activation and emit the rewritten host
//! - `check` - Validate a rule document

mod commands;

use clap::{Parser, Subcommand};
use regraft_core::{Mode, RegraftError};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Regraft - pattern matching and rewriting over hierarchical port graphs
#[derive(Parser, Debug)]
#[command(name = "regraft")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress human-readable summaries
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print matches of a pattern in a host graph
    Match {
        /// Pattern document (JSON)
        #[arg(short, long)]
        pattern: PathBuf,

        /// Host graph document (JSON)
        #[arg(short = 'H', long)]
        host: PathBuf,

        /// Enumerate every match instead of stopping at the first
        #[arg(short, long)]
        all: bool,
    },

    /// Apply a rule to a host graph
    Apply {
        /// Rule document (JSON)
        #[arg(short, long)]
        rule: PathBuf,

        /// Host graph document (JSON)
        #[arg(short = 'H', long)]
        host: PathBuf,

        /// Engine configuration overlay (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed for find_any selection
        #[arg(long)]
        seed: Option<u64>,

        /// Parameter override, `name=value` (repeatable)
        #[arg(long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,

        /// Write the rewritten host here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Mode override (find_first, find_any, find_all, stepped)
        #[arg(short, long)]
        mode: Option<Mode>,

        /// Only report whether the pattern matches
        #[arg(long)]
        match_only: bool,

        /// Number of replacement passes
        #[arg(long)]
        repeat: Option<u32>,

        /// Repeat until nothing matches
        #[arg(long)]
        fixpoint: bool,
    },

    /// Validate a rule document
    Check {
        /// Rule document (JSON)
        #[arg(short, long)]
        rule: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), RegraftError> {
    let json_mode = cli.json_mode;
    let quiet = cli.quiet;

    match cli.command {
        Commands::Match { pattern, host, all } => cmd_match(&pattern, &host, all, json_mode),
        Commands::Apply {
            rule,
            host,
            config,
            seed,
            params,
            output,
            mode,
            match_only,
            repeat,
            fixpoint,
        } => {
            let flags = ApplyFlags {
                seed,
                mode,
                match_only,
                repeat,
                fixpoint,
            };
            cmd_apply(
                &rule,
                &host,
                config.as_deref(),
                &params,
                output.as_deref(),
                flags,
                json_mode,
                quiet,
            )
        }
        Commands::Check { rule } => cmd_check(&rule, json_mode),
    }
}
