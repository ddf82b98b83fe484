//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "scaffolding", version, about = "HTTP service with hot-reloaded configuration")]
pub struct Cli {
    /// The config file path
    #[arg(short = 'c', long = "conf", default_value = "./config.toml")]
    pub conf: PathBuf,
}
