use std::path::PathBuf;

use clap::Parser;

/// Vigil AI Gateway
#[derive(Debug, Parser)]
#[command(name = "vigil", about = "Enterprise AI gateway with budgets, fallback, and audit")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "vigil.toml", env = "VIGIL_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "VIGIL_LISTEN")]
    pub listen: Option<std::net::SocketAddr>,
}
