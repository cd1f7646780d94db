//! HTTP server for the promotions service.
//!
//! Combines the public and operator routers from [`promo_api`], guards the
//! operator routes with Basic auth and adds request tracing plus a `/health`
//! endpoint.

pub mod auth;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use argon2::password_hash;
use axum::{Json, Router, middleware, routing::get};
use promo_core::store::PromoStore;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use auth::{OperatorAuth, require_operator};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `PROMO_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  pub auth_username:      String,
  pub auth_password_hash: String,
}

impl ServerConfig {
  /// Layer `PROMO_*` environment variables over the TOML file at `path`.
  /// A missing file is not an error.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("PROMO"))
      .build()?
      .try_deserialize()
  }

  pub fn operator_auth(&self) -> Result<OperatorAuth, password_hash::Error> {
    OperatorAuth::new(&self.auth_username, &self.auth_password_hash)
  }

  /// `store_path` with a leading `~/` expanded against `$HOME`.
  pub fn resolved_store_path(&self) -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    match (self.store_path.strip_prefix("~"), home) {
      (Ok(rest), Some(home)) => home.join(rest),
      _ => self.store_path.clone(),
    }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S>(store: Arc<S>, auth: Arc<OperatorAuth>) -> Router
where
  S: PromoStore + 'static,
{
  let admin = promo_api::admin_router(Arc::clone(&store))
    .route_layer(middleware::from_fn_with_state(auth, require_operator));

  Router::new()
    .route("/health", get(health))
    .merge(promo_api::public_router(store))
    .merge(admin)
    .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

// ─── Tests ────────────────────────────────────────────────────────────────────
