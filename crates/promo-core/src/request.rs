//! Reward requests: the ledger entries tracked through
//! `pending → success | failed`.
//!
//! At most one request exists per `(user_id, event_id)` pair. The storage
//! backend enforces this with a uniqueness constraint and reports a losing
//! insert as [`Insertion::Duplicate`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::reward::RewardSnapshot;

// ─── Enums ───────────────────────────────────────────────────────────────────

/// How a claim was initiated.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::AsRefStr,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TriggerType {
  #[default]
  Manual,
  Auto,
}

/// How the reward reaches the user once approved.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::AsRefStr,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeliveryType {
  Immediate,
  #[default]
  ManualClaim,
  Scheduled,
}

/// Processing status of a request. Any status may move to any other; only
/// entering [`RewardStatus::Success`] has a side effect.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::AsRefStr,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RewardStatus {
  /// Accepted, not yet paid out.
  #[default]
  Pending,
  /// Paid out; a delivery record exists.
  Success,
  /// Rejected or delivery failed; `reason` says why.
  Failed,
}

// ─── RewardRequest ───────────────────────────────────────────────────────────

/// A user's claim against one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardRequest {
  pub id:              Uuid,
  pub user_id:         String,
  pub event_id:        String,
  pub trigger:         TriggerType,
  pub delivery_type:   DeliveryType,
  pub reward_snapshot: RewardSnapshot,
  pub status:          RewardStatus,
  pub requested_at:    DateTime<Utc>,
  pub reason:          Option<String>,
  /// Last time the request was marked successful.
  pub processed_at:    Option<DateTime<Utc>>,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

/// Input to [`crate::store::PromoStore::insert_request`].
/// `id`, `status` and the store timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewRewardRequest {
  pub user_id:         String,
  pub event_id:        String,
  pub trigger:         TriggerType,
  pub delivery_type:   DeliveryType,
  pub reward_snapshot: RewardSnapshot,
  pub requested_at:    DateTime<Utc>,
}

/// Outcome of a conditional insert.
#[derive(Debug, Clone)]
pub enum Insertion<T> {
  Inserted(T),
  /// A uniqueness constraint rejected the row; nothing was written.
  Duplicate,
}

// ─── Query type ──────────────────────────────────────────────────────────────

/// Filters for [`crate::store::PromoStore::list_requests`]. Every filter
/// that is set must match; results are newest first.
#[derive(Debug, Clone, Default)]
pub struct RequestQuery {
  pub user_id:  Option<String>,
  pub event_id: Option<String>,
  pub status:   Option<RewardStatus>,
}

impl RequestQuery {
  pub fn for_user(user_id: impl Into<String>) -> Self {
    Self { user_id: Some(user_id.into()), ..Self::default() }
  }

  pub fn for_user_and_event(
    user_id: impl Into<String>,
    event_id: impl Into<String>,
  ) -> Self {
    Self {
      user_id: Some(user_id.into()),
      event_id: Some(event_id.into()),
      ..Self::default()
    }
  }
}
