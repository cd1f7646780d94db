//! promo-server binary.
//!
//! ```text
//! promo-server [--config config.toml]    serve the API
//! promo-server --hash-password           print a hash for auth_password_hash
//! ```

use std::{io::BufRead as _, path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use promo_server::{ServerConfig, auth::OperatorAuth};
use promo_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Promotions reward-request server")]
struct Cli {
  /// TOML configuration file; `PROMO_*` environment variables win over it.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Read a password from stdin, print its argon2 hash and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  if cli.hash_password {
    return print_password_hash();
  }

  let cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;
  let auth = cfg
    .operator_auth()
    .map_err(|e| anyhow::anyhow!("auth_password_hash is not a valid argon2 hash: {e}"))?;

  let store_path = cfg.resolved_store_path();
  if let Some(parent) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let app = promo_server::router(Arc::new(store), Arc::new(auth));
  let address = cfg.address();
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  tracing::info!(store = %store_path.display(), operator = %cfg.auth_username, "listening on http://{address}");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;
  tracing::info!("server stopped");

  Ok(())
}

fn print_password_hash() -> anyhow::Result<()> {
  eprint!("Password: ");
  let mut line = String::new();
  std::io::stdin().lock().read_line(&mut line)?;
  let password = line.trim_end_matches(['\n', '\r']);
  if password.is_empty() {
    anyhow::bail!("refusing to hash an empty password");
  }
  let hash = OperatorAuth::hash_password(password)
    .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
  println!("{hash}");
  Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      tracing::error!(error = %e, "cannot listen for Ctrl+C");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
      Ok(mut sigterm) => {
        sigterm.recv().await;
      }
      Err(e) => {
        tracing::error!(error = %e, "cannot listen for SIGTERM");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
    _ = terminate => tracing::info!("received SIGTERM, shutting down"),
  }
}
