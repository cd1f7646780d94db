//! Promotional events: time-bounded campaigns that point at rewards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  condition::EventCategory,
  request::{DeliveryType, TriggerType},
};

/// An event definition, keyed by its caller-chosen `event_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
  pub event_id:      String,
  pub title:         String,
  pub category:      EventCategory,
  pub trigger:       TriggerType,
  pub delivery_type: DeliveryType,
  pub start_at:      DateTime<Utc>,
  pub end_at:        DateTime<Utc>,
  pub is_active:     bool,
  pub condition_ids: Vec<Uuid>,
  /// Ordered; the request workflow only ever snapshots the first entry.
  pub reward_ids:    Vec<Uuid>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl Event {
  /// Whether `now` falls inside `[start_at, end_at]`.
  pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
    now >= self.start_at && now <= self.end_at
  }

  /// The reward a request against this event is paid out from.
  pub fn primary_reward_id(&self) -> Option<Uuid> {
    self.reward_ids.first().copied()
  }
}

/// Input to [`crate::store::PromoStore::insert_event`] and
/// [`crate::store::PromoStore::update_event`].
#[derive(Debug, Clone)]
pub struct NewEvent {
  pub event_id:      String,
  pub title:         String,
  pub category:      EventCategory,
  pub trigger:       TriggerType,
  pub delivery_type: DeliveryType,
  pub start_at:      DateTime<Utc>,
  pub end_at:        DateTime<Utc>,
  pub is_active:     bool,
  pub condition_ids: Vec<Uuid>,
  pub reward_ids:    Vec<Uuid>,
}

impl NewEvent {
  /// An inactive, manually-claimed attendance event with nothing attached
  /// yet. Events stay unclaimable until switched on.
  pub fn new(
    event_id: impl Into<String>,
    title: impl Into<String>,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
  ) -> Self {
    Self {
      event_id: event_id.into(),
      title: title.into(),
      category: EventCategory::default(),
      trigger: TriggerType::default(),
      delivery_type: DeliveryType::default(),
      start_at,
      end_at,
      is_active: false,
      condition_ids: Vec::new(),
      reward_ids: Vec::new(),
    }
  }

  pub fn with_rewards(mut self, reward_ids: impl IntoIterator<Item = Uuid>) -> Self {
    self.reward_ids = reward_ids.into_iter().collect();
    self
  }

  pub fn with_conditions(mut self, condition_ids: impl IntoIterator<Item = Uuid>) -> Self {
    self.condition_ids = condition_ids.into_iter().collect();
    self
  }

  pub fn with_category(mut self, category: EventCategory) -> Self {
    self.category = category;
    self
  }

  pub fn active(mut self) -> Self {
    self.is_active = true;
    self
  }

  /// Shape checks that need no catalog access.
  pub fn validate(&self) -> Result<()> {
    if self.event_id.trim().is_empty() {
      return Err(Error::Invalid("eventId must not be empty".into()));
    }
    if self.title.trim().is_empty() {
      return Err(Error::Invalid("title must not be empty".into()));
    }
    if self.start_at > self.end_at {
      return Err(Error::Invalid("startAt must not be after endAt".into()));
    }
    Ok(())
  }
}

/// A partial edit of an event. Absent fields keep their stored value; the
/// `event_id` itself cannot be changed.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
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

impl EventPatch {
  /// The full replacement this patch amounts to when laid over `event`.
  pub fn apply_to(self, event: Event) -> NewEvent {
    NewEvent {
      event_id:      event.event_id,
      title:         self.title.unwrap_or(event.title),
      category:      self.category.unwrap_or(event.category),
      trigger:       self.trigger.unwrap_or(event.trigger),
      delivery_type: self.delivery_type.unwrap_or(event.delivery_type),
      start_at:      self.start_at.unwrap_or(event.start_at),
      end_at:        self.end_at.unwrap_or(event.end_at),
      is_active:     self.is_active.unwrap_or(event.is_active),
      condition_ids: self.condition_ids.unwrap_or(event.condition_ids),
      reward_ids:    self.reward_ids.unwrap_or(event.reward_ids),
    }
  }
}
