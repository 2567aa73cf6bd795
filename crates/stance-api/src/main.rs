//! Stance profile server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered under
//! `STANCE_*` environment variables, opens the SQLite store, and serves the
//! profile API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use clap::Parser;
use stance_api::{AppState, ServerConfig};
use stance_identity::{DEFAULT_BASE_URL, IdentityToolkitConfig, IdentityToolkitVerifier};
use stance_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Stance profile server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 4000)?
    .set_default("store_path", "stance.db")?
    .set_default("identity_base_url", DEFAULT_BASE_URL)?
    .set_default("identity_timeout_secs", 10)?
    .set_default("cors_allow_origin", "*")?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("STANCE"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig (is identity_api_key set?)")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let verifier = IdentityToolkitVerifier::new(IdentityToolkitConfig {
    base_url: server_cfg.identity_base_url.clone(),
    api_key:  server_cfg.identity_api_key.clone(),
    timeout:  Duration::from_secs(server_cfg.identity_timeout_secs),
  })
  .context("failed to build identity verifier")?;

  let state = AppState {
    store:    Arc::new(store),
    verifier: Arc::new(verifier),
  };

  let cors = stance_api::cors_layer(&server_cfg.cors_allow_origin)
    .with_context(|| format!("invalid cors_allow_origin {:?}", server_cfg.cors_allow_origin))?;

  let app = stance_api::app(state, cors);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
