//! Handlers for `/user-event-reward-history` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/user-event-reward-history/user/:userId` | |
//! | `GET`  | `/user-event-reward-history/user/:userId/event/:eventId` | |
//! | `GET`  | `/user-event-reward-history` | admin; `?eventId=&startDate=&endDate=` |
//! | `GET`  | `/user-event-reward-history/:id` | admin; 404 if not found |
//! | `POST` | `/user-event-reward-history` | admin; manual grant |
//!
//! The admin list applies one filter: the date range when both bounds are
//! given, else `eventId`, else nothing.

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
  history::{DeliveryRecord, HistoryQuery, NewDeliveryRecord},
  store::PromoStore,
};
use serde::Deserialize;
use validator::Validate;

use crate::{ApiState, error::ApiError};

// ─── Public reads ─────────────────────────────────────────────────────────────

/// `GET /user-event-reward-history/user/:userId`
pub async fn list_for_user<S: PromoStore>(
  State(state): State<ApiState<S>>,
  Path(user_id): Path<String>,
) -> Result<Json<Vec<DeliveryRecord>>, ApiError> {
  Ok(Json(state.requests.history(&HistoryQuery::for_user(user_id)).await?))
}

/// `GET /user-event-reward-history/user/:userId/event/:eventId`
pub async fn list_for_user_event<S: PromoStore>(
  State(state): State<ApiState<S>>,
  Path((user_id, event_id)): Path<(String, String)>,
) -> Result<Json<Vec<DeliveryRecord>>, ApiError> {
  let query = HistoryQuery {
    user_id: Some(user_id),
    event_id: Some(event_id),
    ..HistoryQuery::default()
  };
  Ok(Json(state.requests.history(&query).await?))
}

// ─── Admin ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  pub event_id:   Option<String>,
  pub start_date: Option<DateTime<Utc>>,
  pub end_date:   Option<DateTime<Utc>>,
}

impl ListParams {
  fn into_query(self) -> HistoryQuery {
    match (self.start_date, self.end_date, self.event_id) {
      (Some(from), Some(to), _) => HistoryQuery::between(from, to),
      (_, _, Some(event_id)) if !event_id.is_empty() => HistoryQuery {
        event_id: Some(event_id),
        ..HistoryQuery::default()
      },
      _ => HistoryQuery::default(),
    }
  }
}

/// `GET /user-event-reward-history[?eventId=...][&startDate=...&endDate=...]`
pub async fn list<S: PromoStore>(
  State(state): State<ApiState<S>>,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<DeliveryRecord>>, ApiError> {
  let Query(params) = params?;
  Ok(Json(state.requests.history(&params.into_query()).await?))
}

/// `GET /user-event-reward-history/:id`
pub async fn get_one<S: PromoStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
) -> Result<Json<DeliveryRecord>, ApiError> {
  Ok(Json(state.requests.delivery(&id).await?))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  #[validate(length(min = 1, message = "userId must not be empty"))]
  pub user_id:      String,
  #[validate(length(min = 1, message = "eventId must not be empty"))]
  pub event_id:     String,
  #[validate(length(min = 1, message = "rewardId must not be empty"))]
  pub reward_id:    String,
  #[validate(range(min = 1, message = "quantity must be at least 1"))]
  pub quantity:     u32,
  pub item_id:      Option<String>,
  pub requested_at: Option<DateTime<Utc>>,
  pub delivered_at: Option<DateTime<Utc>>,
}

/// `POST /user-event-reward-history`
///
/// Missing timestamps default to the time the grant is recorded.
pub async fn create<S: PromoStore>(
  State(state): State<ApiState<S>>,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(body) = body?;
  body.validate()?;

  let now = Utc::now();
  let record = state
    .requests
    .record_delivery(NewDeliveryRecord {
      user_id:      body.user_id,
      event_id:     body.event_id,
      reward_id:    body.reward_id,
      quantity:     body.quantity,
      item_id:      body.item_id,
      requested_at: body.requested_at.unwrap_or(now),
      delivered_at: body.delivered_at.unwrap_or(now),
    })
    .await?;
  Ok((StatusCode::CREATED, Json(record)))
}
