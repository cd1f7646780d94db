//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed microsecond
//! precision and a `Z` suffix, so comparing the text compares the instants.
//! Enums are stored as their snake_case names. UUIDs are stored as hyphenated
//! lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use promo_core::{
  condition::Condition,
  event::Event,
  history::DeliveryRecord,
  request::RewardRequest,
  reward::{Reward, RewardSnapshot},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// Cut `dt` down to what a column holds. Records handed back from a write
/// pass their timestamps through this so they match a later read.
pub fn truncate_dt(dt: DateTime<Utc>) -> DateTime<Utc> { dt.trunc_subsecs(6) }

/// The store clock, truncated to what a column can hold.
pub fn now() -> DateTime<Utc> { truncate_dt(Utc::now()) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

/// Parse a snake_case enum column via its `FromStr` impl.
pub fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::UnknownValue { column, value: s.to_owned() })
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_ids(ids: &[Uuid]) -> Result<String> {
  Ok(serde_json::to_string(ids)?)
}

pub fn decode_ids(s: &str) -> Result<Vec<Uuid>> {
  Ok(serde_json::from_str(s)?)
}

pub fn encode_snapshot(snapshot: &RewardSnapshot) -> Result<String> {
  Ok(serde_json::to_string(snapshot)?)
}

pub fn decode_snapshot(s: &str) -> Result<RewardSnapshot> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const REWARD_COLUMNS: &str =
  "reward_id, reward_type, quantity, item_id, description, created_at, updated_at";

/// Raw values read directly from a `rewards` row.
pub struct RawReward {
  pub reward_id:   String,
  pub reward_type: String,
  pub quantity:    u32,
  pub item_id:     Option<String>,
  pub description: Option<String>,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawReward {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      reward_id:   row.get(0)?,
      reward_type: row.get(1)?,
      quantity:    row.get(2)?,
      item_id:     row.get(3)?,
      description: row.get(4)?,
      created_at:  row.get(5)?,
      updated_at:  row.get(6)?,
    })
  }

  pub fn into_reward(self) -> Result<Reward> {
    Ok(Reward {
      id:          decode_uuid(&self.reward_id)?,
      reward_type: decode_enum("reward_type", &self.reward_type)?,
      quantity:    self.quantity,
      item_id:     self.item_id,
      description: self.description,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

pub const CONDITION_COLUMNS: &str =
  "condition_id, category, sub_type, target, description, created_at, updated_at";

/// Raw values read directly from a `conditions` row.
pub struct RawCondition {
  pub condition_id: String,
  pub category:     String,
  pub sub_type:     String,
  pub target:       Option<String>,
  pub description:  Option<String>,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawCondition {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      condition_id: row.get(0)?,
      category:     row.get(1)?,
      sub_type:     row.get(2)?,
      target:       row.get(3)?,
      description:  row.get(4)?,
      created_at:   row.get(5)?,
      updated_at:   row.get(6)?,
    })
  }

  pub fn into_condition(self) -> Result<Condition> {
    Ok(Condition {
      id:          decode_uuid(&self.condition_id)?,
      category:    decode_enum("category", &self.category)?,
      sub_type:    decode_enum("sub_type", &self.sub_type)?,
      target:      self.target,
      description: self.description,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

pub const EVENT_COLUMNS: &str = "event_id, title, category, trigger_type, \
   delivery_type, start_at, end_at, is_active, condition_ids, reward_ids, \
   created_at, updated_at";

/// Raw values read directly from an `events` row.
pub struct RawEvent {
  pub event_id:      String,
  pub title:         String,
  pub category:      String,
  pub trigger_type:  String,
  pub delivery_type: String,
  pub start_at:      String,
  pub end_at:        String,
  pub is_active:     bool,
  pub condition_ids: String,
  pub reward_ids:    String,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawEvent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:      row.get(0)?,
      title:         row.get(1)?,
      category:      row.get(2)?,
      trigger_type:  row.get(3)?,
      delivery_type: row.get(4)?,
      start_at:      row.get(5)?,
      end_at:        row.get(6)?,
      is_active:     row.get(7)?,
      condition_ids: row.get(8)?,
      reward_ids:    row.get(9)?,
      created_at:    row.get(10)?,
      updated_at:    row.get(11)?,
    })
  }

  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      event_id:      self.event_id,
      title:         self.title,
      category:      decode_enum("category", &self.category)?,
      trigger:       decode_enum("trigger_type", &self.trigger_type)?,
      delivery_type: decode_enum("delivery_type", &self.delivery_type)?,
      start_at:      decode_dt(&self.start_at)?,
      end_at:        decode_dt(&self.end_at)?,
      is_active:     self.is_active,
      condition_ids: decode_ids(&self.condition_ids)?,
      reward_ids:    decode_ids(&self.reward_ids)?,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

pub const REQUEST_COLUMNS: &str = "request_id, user_id, event_id, trigger_type, \
   delivery_type, reward_snapshot, status, requested_at, reason, processed_at, \
   created_at, updated_at";

/// Raw values read directly from a `reward_requests` row.
pub struct RawRequest {
  pub request_id:      String,
  pub user_id:         String,
  pub event_id:        String,
  pub trigger_type:    String,
  pub delivery_type:   String,
  pub reward_snapshot: String,
  pub status:          String,
  pub requested_at:    String,
  pub reason:          Option<String>,
  pub processed_at:    Option<String>,
  pub created_at:      String,
  pub updated_at:      String,
}

impl RawRequest {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      request_id:      row.get(0)?,
      user_id:         row.get(1)?,
      event_id:        row.get(2)?,
      trigger_type:    row.get(3)?,
      delivery_type:   row.get(4)?,
      reward_snapshot: row.get(5)?,
      status:          row.get(6)?,
      requested_at:    row.get(7)?,
      reason:          row.get(8)?,
      processed_at:    row.get(9)?,
      created_at:      row.get(10)?,
      updated_at:      row.get(11)?,
    })
  }

  pub fn into_request(self) -> Result<RewardRequest> {
    Ok(RewardRequest {
      id:              decode_uuid(&self.request_id)?,
      user_id:         self.user_id,
      event_id:        self.event_id,
      trigger:         decode_enum("trigger_type", &self.trigger_type)?,
      delivery_type:   decode_enum("delivery_type", &self.delivery_type)?,
      reward_snapshot: decode_snapshot(&self.reward_snapshot)?,
      status:          decode_enum("status", &self.status)?,
      requested_at:    decode_dt(&self.requested_at)?,
      reason:          self.reason,
      processed_at:    self.processed_at.as_deref().map(decode_dt).transpose()?,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }
}

pub const DELIVERY_COLUMNS: &str = "delivery_id, user_id, event_id, reward_id, \
   quantity, item_id, requested_at, delivered_at, created_at, updated_at";

/// Raw values read directly from a `delivery_history` row.
pub struct RawDelivery {
  pub delivery_id:  String,
  pub user_id:      String,
  pub event_id:     String,
  pub reward_id:    String,
  pub quantity:     u32,
  pub item_id:      Option<String>,
  pub requested_at: String,
  pub delivered_at: String,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawDelivery {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      delivery_id:  row.get(0)?,
      user_id:      row.get(1)?,
      event_id:     row.get(2)?,
      reward_id:    row.get(3)?,
      quantity:     row.get(4)?,
      item_id:      row.get(5)?,
      requested_at: row.get(6)?,
      delivered_at: row.get(7)?,
      created_at:   row.get(8)?,
      updated_at:   row.get(9)?,
    })
  }

  pub fn into_delivery(self) -> Result<DeliveryRecord> {
    Ok(DeliveryRecord {
      id:           decode_uuid(&self.delivery_id)?,
      user_id:      self.user_id,
      event_id:     self.event_id,
      reward_id:    self.reward_id,
      quantity:     self.quantity,
      item_id:      self.item_id,
      requested_at: decode_dt(&self.requested_at)?,
      delivered_at: decode_dt(&self.delivered_at)?,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}
