//! Fuzz/trace protocol harness: drives [`jam_stf::Stf::apply`] from a
//! length-prefixed framing over a Unix-domain socket (§6's external-harness
//! boundary — not part of the core STF).

mod protocol;
mod session;

use clap::Parser;
use jam_stf::config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "jam-stf-harness", about = "Unix-socket fuzz/trace harness for the jam-stf STF")]
struct Args {
    /// Path of the Unix-domain socket to listen on.
    #[arg(long, default_value = "/tmp/jam-stf-harness.sock")]
    socket: PathBuf,

    /// Protocol parameter preset, loaded from a `.toml` or `.json` file.
    /// Defaults to the small `Config::tiny()` preset used by test vectors.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed a deterministic validator keyset for `Initialize` instead of
    /// the all-zero keys used when no seed is given.
    #[arg(long)]
    seed: Option<u64>,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, session::HarnessError> {
    let Some(path) = path else {
        return Ok(Config::tiny());
    };
    let text = std::fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Config::from_json_str(&text).map_err(session::HarnessError::Config),
        _ => Config::from_toml_str(&text).map_err(session::HarnessError::Config),
    }
}

#[tokio::main]
async fn main() -> Result<(), session::HarnessError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let cfg = load_config(args.config.as_ref())?;
    session::serve(&args.socket, cfg, args.seed).await
}
