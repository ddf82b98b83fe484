//! HTTP service scaffold.
//!
//! # Architecture Overview
//!
//! ```text
//!   config.toml ──▶ ConfigStore (ArcSwap snapshot) ──▶ HttpServer (GET /health)
//!        │                 ▲           │
//!        │ notify          │ reload    │ zap.level
//!        ▼                 │           ▼
//!   ConfigWatcher ─────────┘    LogLevelController ──▶ tracing SeverityGate
//!                                                          │
//!                                            stdout / rotated file
//! ```

use clap::Parser;

use scaffolding::cli::Cli;
use scaffolding::lifecycle::startup;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = startup::run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
