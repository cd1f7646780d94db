//! Handlers for `/events` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/events` | |
//! | `GET`    | `/events/:eventId` | 404 if not found, active or not |
//! | `POST`   | `/events` | admin; 409 if `eventId` is taken |
//! | `PUT`    | `/events/:eventId` | admin; same body as `POST`, `eventId` must match |
//! | `PATCH`  | `/events/:eventId` | admin; only the fields present change |
//! | `DELETE` | `/events/:eventId` | admin; returns the deleted event |
//! | `PATCH`  | `/events/:eventId/activate` | admin |
//! | `PATCH`  | `/events/:eventId/deactivate` | admin |
//!
//! Events are created switched off unless `isActive` says otherwise.

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use promo_core::{
  condition::EventCategory,
  event::{Event, EventPatch, NewEvent},
  request::{DeliveryType, TriggerType},
  store::PromoStore,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  #[validate(length(min = 1, max = 100, message = "eventId must be 1-100 characters"))]
  pub event_id:      String,
  #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
  pub title:         String,
  pub category:      EventCategory,
  #[serde(default)]
  pub trigger:       TriggerType,
  #[serde(default)]
  pub delivery_type: DeliveryType,
  pub start_at:      DateTime<Utc>,
  pub end_at:        DateTime<Utc>,
  #[serde(default)]
  pub is_active:     bool,
  #[serde(default)]
  pub condition_ids: Vec<Uuid>,
  #[serde(default)]
  pub reward_ids:    Vec<Uuid>,
}

impl From<CreateBody> for NewEvent {
  fn from(body: CreateBody) -> Self {
    NewEvent {
      event_id:      body.event_id,
      title:         body.title,
      category:      body.category,
      trigger:       body.trigger,
      delivery_type: body.delivery_type,
      start_at:      body.start_at,
      end_at:        body.end_at,
      is_active:     body.is_active,
      condition_ids: body.condition_ids,
      reward_ids:    body.reward_ids,
    }
  }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PatchBody {
  #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
  pub title:         Option<String>,
  pub category:      Option<EventCategory>,
  pub trigger:       Option<TriggerType>,
  pub delivery_type: Option<DeliveryType>,
  pub start_at:      Option<DateTime<Utc>>,
  pub end_at:        Option<DateTime<Utc>>,
  pub is_active:     Option<bool>,
  pub condition_ids: Option<Vec<Uuid>>,
  pub reward_ids:    Option<Vec<Uuid>>,
}

impl From<PatchBody> for EventPatch {
  fn from(body: PatchBody) -> Self {
    EventPatch {
      title:         body.title,
      category:      body.category,
      trigger:       body.trigger,
      delivery_type: body.delivery_type,
      start_at:      body.start_at,
      end_at:        body.end_at,
      is_active:     body.is_active,
      condition_ids: body.condition_ids,
      reward_ids:    body.reward_ids,
    }
  }
}

/// `GET /events`
pub async fn list<S: PromoStore>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<Event>>, ApiError> {
  Ok(Json(state.catalog.events().await?))
}

/// `GET /events/:eventId`
pub async fn get_one<S: PromoStore>(
  State(state): State<ApiState<S>>,
  Path(event_id): Path<String>,
) -> Result<Json<Event>, ApiError> {
  Ok(Json(state.catalog.event(&event_id).await?))
}

/// `POST /events`
pub async fn create<S: PromoStore>(
  State(state): State<ApiState<S>>,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(body) = body?;
  body.validate()?;
  let event = state.catalog.create_event(body.into()).await?;
  Ok((StatusCode::CREATED, Json(event)))
}

/// `PUT /events/:eventId`
pub async fn replace<S: PromoStore>(
  State(state): State<ApiState<S>>,
  Path(event_id): Path<String>,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<Json<Event>, ApiError> {
  let Json(body) = body?;
  body.validate()?;
  Ok(Json(state.catalog.replace_event(&event_id, body.into()).await?))
}

/// `PATCH /events/:eventId`
pub async fn patch<S: PromoStore>(
  State(state): State<ApiState<S>>,
  Path(event_id): Path<String>,
  body: Result<Json<PatchBody>, JsonRejection>,
) -> Result<Json<Event>, ApiError> {
  let Json(body) = body?;
  body.validate()?;
  Ok(Json(state.catalog.patch_event(&event_id, body.into()).await?))
}

/// `DELETE /events/:eventId`
pub async fn delete<S: PromoStore>(
  State(state): State<ApiState<S>>,
  Path(event_id): Path<String>,
) -> Result<Json<Event>, ApiError> {
  Ok(Json(state.catalog.delete_event(&event_id).await?))
}

/// `PATCH /events/:eventId/activate`
pub async fn activate<S: PromoStore>(
  State(state): State<ApiState<S>>,
  Path(event_id): Path<String>,
) -> Result<Json<Event>, ApiError> {
  Ok(Json(state.catalog.set_event_active(&event_id, true).await?))
}

/// `PATCH /events/:eventId/deactivate`
pub async fn deactivate<S: PromoStore>(
  State(state): State<ApiState<S>>,
  Path(event_id): Path<String>,
) -> Result<Json<Event>, ApiError> {
  Ok(Json(state.catalog.set_event_active(&event_id, false).await?))
}
