//! Delivery history: the append-only record of paid-out rewards.
//!
//! Entries are denormalised copies, not references: `reward_id` holds the id
//! of the originating [`crate::request::RewardRequest`], and the quantity and
//! item come from that request's snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRecord {
  pub id:           Uuid,
  pub user_id:      String,
  pub event_id:     String,
  /// Id of the reward request this delivery fulfils.
  pub reward_id:    String,
  pub quantity:     u32,
  pub item_id:      Option<String>,
  pub requested_at: DateTime<Utc>,
  pub delivered_at: DateTime<Utc>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

/// Input to [`crate::store::PromoStore::append_delivery`].
#[derive(Debug, Clone)]
pub struct NewDeliveryRecord {
  pub user_id:      String,
  pub event_id:     String,
  pub reward_id:    String,
  pub quantity:     u32,
  pub item_id:      Option<String>,
  pub requested_at: DateTime<Utc>,
  pub delivered_at: DateTime<Utc>,
}

/// Filters for [`crate::store::PromoStore::list_deliveries`]. Every filter
/// that is set must match; the date bounds are inclusive and apply to
/// `delivered_at`. Results are sorted by `delivered_at`, newest first.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
  pub user_id:          Option<String>,
  pub event_id:         Option<String>,
  pub reward_id:        Option<String>,
  pub delivered_after:  Option<DateTime<Utc>>,
  pub delivered_before: Option<DateTime<Utc>>,
}

impl HistoryQuery {
  pub fn for_user(user_id: impl Into<String>) -> Self {
    Self { user_id: Some(user_id.into()), ..Self::default() }
  }

  pub fn for_request(request_id: Uuid) -> Self {
    Self { reward_id: Some(request_id.to_string()), ..Self::default() }
  }

  pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
    Self {
      delivered_after: Some(from),
      delivered_before: Some(to),
      ..Self::default()
    }
  }
}
