//! Handlers for `/rewards` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/rewards` | |
//! | `GET`    | `/rewards/:id` | 404 if not found |
//! | `POST`   | `/rewards` | admin; body: `{"type":"item","quantity":1,"itemId":"item-001"}` |
//! | `PUT`    | `/rewards/:id` | admin; replaces every field |
//! | `DELETE` | `/rewards/:id` | admin; returns the deleted reward |

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use promo_core::{
  reward::{NewReward, Reward},
  store::PromoStore,
};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

/// A malformed id cannot name a stored reward.
fn reward_id(raw: &str) -> Result<Uuid, ApiError> {
  Uuid::parse_str(raw)
    .map_err(|_| promo_core::Error::RewardNotFound(raw.to_owned()).into())
}

/// `GET /rewards`
pub async fn list<S: PromoStore>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<Reward>>, ApiError> {
  Ok(Json(state.catalog.rewards().await?))
}

/// `GET /rewards/:id`
pub async fn get_one<S: PromoStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Reward>, ApiError> {
  Ok(Json(state.catalog.reward(reward_id(&id)?).await?))
}

/// `POST /rewards`
pub async fn create<S: PromoStore>(
  State(state): State<ApiState<S>>,
  body: Result<Json<NewReward>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(body) = body?;
  let reward = state.catalog.create_reward(body).await?;
  Ok((StatusCode::CREATED, Json(reward)))
}

/// `PUT /rewards/:id`
pub async fn update<S: PromoStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
  body: Result<Json<NewReward>, JsonRejection>,
) -> Result<Json<Reward>, ApiError> {
  let Json(body) = body?;
  Ok(Json(state.catalog.update_reward(reward_id(&id)?, body).await?))
}

/// `DELETE /rewards/:id`
pub async fn delete<S: PromoStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Reward>, ApiError> {
  Ok(Json(state.catalog.delete_reward(reward_id(&id)?).await?))
}
