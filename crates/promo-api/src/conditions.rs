//! Handlers for `/conditions` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/conditions` | |
//! | `GET`    | `/conditions/:id` | 404 if not found |
//! | `POST`   | `/conditions` | admin; body: `{"category":"attendance","subType":"total_days","target":"3"}` |
//! | `PUT`    | `/conditions/:id` | admin; replaces every field |
//! | `DELETE` | `/conditions/:id` | admin; returns the deleted condition |

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use promo_core::{
  condition::{Condition, ConditionSubType, EventCategory, NewCondition},
  store::PromoStore,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConditionBody {
  pub category:    EventCategory,
  pub sub_type:    ConditionSubType,
  #[validate(length(min = 1, max = 100, message = "target must be 1-100 characters"))]
  pub target:      Option<String>,
  #[validate(length(max = 500, message = "description is limited to 500 characters"))]
  pub description: Option<String>,
}

impl From<ConditionBody> for NewCondition {
  fn from(body: ConditionBody) -> Self {
    NewCondition {
      category:    body.category,
      sub_type:    body.sub_type,
      target:      body.target,
      description: body.description,
    }
  }
}

fn condition_id(raw: &str) -> Result<Uuid, ApiError> {
  Uuid::parse_str(raw)
    .map_err(|_| promo_core::Error::ConditionNotFound(raw.to_owned()).into())
}

/// `GET /conditions`
pub async fn list<S: PromoStore>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<Condition>>, ApiError> {
  Ok(Json(state.catalog.conditions().await?))
}

/// `GET /conditions/:id`
pub async fn get_one<S: PromoStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Condition>, ApiError> {
  Ok(Json(state.catalog.condition(condition_id(&id)?).await?))
}

/// `POST /conditions`
pub async fn create<S: PromoStore>(
  State(state): State<ApiState<S>>,
  body: Result<Json<ConditionBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(body) = body?;
  body.validate()?;
  let condition = state.catalog.create_condition(body.into()).await?;
  Ok((StatusCode::CREATED, Json(condition)))
}

/// `PUT /conditions/:id`
pub async fn update<S: PromoStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
  body: Result<Json<ConditionBody>, JsonRejection>,
) -> Result<Json<Condition>, ApiError> {
  let Json(body) = body?;
  body.validate()?;
  let id = condition_id(&id)?;
  Ok(Json(state.catalog.update_condition(id, body.into()).await?))
}

/// `DELETE /conditions/:id`
pub async fn delete<S: PromoStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Condition>, ApiError> {
  Ok(Json(state.catalog.delete_condition(condition_id(&id)?).await?))
}
