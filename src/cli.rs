use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Usage dashboard: turns gateway usage records into chart data
#[derive(Parser)]
#[command(name = "dashboard", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind (defaults to DASHBOARD_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Compute the charts for a saved `/api/data` response
    Render {
        /// JSON file holding the response envelope or a bare record array
        #[arg(short, long)]
        input: PathBuf,
        /// hour, day, week or month
        #[arg(short, long)]
        granularity: Option<String>,
        /// Query window start (Unix seconds), enables the RPM/TPM cards
        #[arg(long)]
        start: Option<i64>,
        #[arg(long)]
        end: Option<i64>,
        #[arg(long)]
        pretty: bool,
    },

    /// Fetch usage from the backend and compute the charts
    Fetch {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        start: Option<i64>,
        #[arg(long)]
        end: Option<i64>,
        #[arg(short, long)]
        granularity: Option<String>,
        /// Use the caller's own usage endpoint
        #[arg(long)]
        self_only: bool,
        #[arg(long)]
        pretty: bool,
    },
}
