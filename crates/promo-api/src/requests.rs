//! Handlers for `/user-event-rewards` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `POST`  | `/user-event-rewards` | 201; 409 on a repeat claim |
//! | `GET`   | `/user-event-rewards/user/:userId` | |
//! | `GET`   | `/user-event-rewards/user/:userId/event/:eventId` | |
//! | `GET`   | `/user-event-rewards/:id` | 404 if not found |
//! | `GET`   | `/user-event-rewards` | admin; `?status=&eventId=` |
//! | `PATCH` | `/user-event-rewards/:id/status` | admin; `success` records a delivery |

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use promo_core::{
  orchestrator::CreateRequest,
  request::{DeliveryType, RequestQuery, RewardRequest, RewardStatus, TriggerType},
  store::PromoStore,
};
use serde::Deserialize;
use validator::Validate;

use crate::{ApiState, error::ApiError};

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  #[validate(length(min = 1, message = "userId must not be empty"))]
  pub user_id:       String,
  #[validate(length(min = 1, message = "eventId must not be empty"))]
  pub event_id:      String,
  pub trigger:       TriggerType,
  pub delivery_type: DeliveryType,
  pub requested_at:  Option<DateTime<Utc>>,
}

/// `POST /user-event-rewards`
pub async fn create<S: PromoStore>(
  State(state): State<ApiState<S>>,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(body) = body?;
  body.validate()?;

  let request = state
    .requests
    .create(CreateRequest {
      user_id:       body.user_id,
      event_id:      body.event_id,
      trigger:       body.trigger,
      delivery_type: body.delivery_type,
      requested_at:  body.requested_at,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(request)))
}

// ─── Reads ────────────────────────────────────────────────────────────────────

/// `GET /user-event-rewards/user/:userId`
pub async fn list_for_user<S: PromoStore>(
  State(state): State<ApiState<S>>,
  Path(user_id): Path<String>,
) -> Result<Json<Vec<RewardRequest>>, ApiError> {
  let requests = state.requests.list(&RequestQuery::for_user(user_id)).await?;
  Ok(Json(requests))
}

/// `GET /user-event-rewards/user/:userId/event/:eventId`
pub async fn list_for_user_event<S: PromoStore>(
  State(state): State<ApiState<S>>,
  Path((user_id, event_id)): Path<(String, String)>,
) -> Result<Json<Vec<RewardRequest>>, ApiError> {
  let query = RequestQuery::for_user_and_event(user_id, event_id);
  Ok(Json(state.requests.list(&query).await?))
}

/// `GET /user-event-rewards/:id`
pub async fn get_one<S: PromoStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
) -> Result<Json<RewardRequest>, ApiError> {
  Ok(Json(state.requests.get(&id).await?))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  pub status:   Option<RewardStatus>,
  pub event_id: Option<String>,
}

/// `GET /user-event-rewards[?status=...][&eventId=...]`
pub async fn list<S: PromoStore>(
  State(state): State<ApiState<S>>,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<RewardRequest>>, ApiError> {
  let Query(params) = params?;
  let query = RequestQuery {
    user_id:  None,
    event_id: params.event_id.filter(|e| !e.is_empty()),
    status:   params.status,
  };
  Ok(Json(state.requests.list(&query).await?))
}

// ─── Status ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct StatusBody {
  pub status: RewardStatus,
  #[validate(length(max = 500, message = "reason is limited to 500 characters"))]
  pub reason: Option<String>,
}

/// `PATCH /user-event-rewards/:id/status`, body: `{"status":"success"}`
pub async fn update_status<S: PromoStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
  body: Result<Json<StatusBody>, JsonRejection>,
) -> Result<Json<RewardRequest>, ApiError> {
  let Json(body) = body?;
  body.validate()?;
  let updated = state.requests.update_status(&id, body.status, body.reason).await?;
  Ok(Json(updated))
}
