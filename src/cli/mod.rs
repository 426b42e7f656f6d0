//! CLI module - command-line interface for meguru.
//!
//! Individual-feature CRUD is out of scope (spec §1 Non-goals); the
//! surface here is limited to the two operator commands supplementing the
//! distilled spec (§4.6): a bulk stale-source refresh sweep and a task
//! history listing. Both are thin consumers of services already built for
//! the HTTP API.

mod commands;

use clap::{Parser, Subcommand};

pub use commands::{cmd_refresh_stale, cmd_task_status};

/// meguru - danmaku aggregation & orchestration engine
#[derive(Parser)]
#[command(name = "meguru")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server
    #[command(alias = "-d", alias = "--daemon")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Refresh every source whose incremental-refresh failure count is
    /// below the configured threshold
    Refresh {
        /// Failure-count threshold (sources at or above it are skipped)
        #[arg(long, default_value_t = crate::constants::refresh::DEFAULT_STALE_FAILURE_THRESHOLD)]
        failure_threshold: i32,
    },

    /// Print the task history table
    #[command(alias = "tasks")]
    TaskStatus {
        /// Maximum number of rows to print
        #[arg(default_value = "20")]
        limit: usize,
    },
}
