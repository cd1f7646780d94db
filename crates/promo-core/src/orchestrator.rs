//! The reward request workflow.
//!
//! [`RequestOrchestrator::create`] runs, in order and stopping at the first
//! failure:
//!
//! 1. duplicate check on `(user_id, event_id)`
//! 2. active event lookup
//! 3. the event must list at least one reward
//! 4. `now` must fall inside the event window
//! 5. snapshot of the event's first reward
//! 6. conditional insert of a `pending` request
//!
//! Step 1 only exists so callers see a conflict before any catalog error.
//! Step 6 is what actually guarantees uniqueness: a concurrent request that
//! slipped past step 1 comes back as [`Insertion::Duplicate`] and is reported
//! as the same conflict.
//!
//! [`RequestOrchestrator::update_status`] writes the new status. When it is
//! [`RewardStatus::Success`] the status change and a delivery record built
//! from the request's snapshot are written together through
//! [`PromoStore::complete_request`]. Repeating a success update appends
//! again.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  history::{DeliveryRecord, HistoryQuery, NewDeliveryRecord},
  request::{
    DeliveryType, Insertion, NewRewardRequest, RequestQuery, RewardRequest,
    RewardStatus, TriggerType,
  },
  reward::RewardSnapshot,
  store::PromoStore,
};

/// A user's claim as submitted by the caller.
#[derive(Debug, Clone)]
pub struct CreateRequest {
  pub user_id:       String,
  pub event_id:      String,
  pub trigger:       TriggerType,
  pub delivery_type: DeliveryType,
  /// When the user clicked "claim"; defaults to the processing time.
  pub requested_at:  Option<DateTime<Utc>>,
}

impl CreateRequest {
  pub fn new(user_id: impl Into<String>, event_id: impl Into<String>) -> Self {
    Self {
      user_id:       user_id.into(),
      event_id:      event_id.into(),
      trigger:       TriggerType::Manual,
      delivery_type: DeliveryType::ManualClaim,
      requested_at:  None,
    }
  }

  fn conflict(&self) -> Error {
    Error::AlreadyRequested {
      user_id:  self.user_id.clone(),
      event_id: self.event_id.clone(),
    }
  }
}

/// Coordinates the catalogs, the request ledger and the delivery history.
///
/// Cloning is cheap; the store is reference-counted.
pub struct RequestOrchestrator<S> {
  store: Arc<S>,
}

impl<S> Clone for RequestOrchestrator<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: PromoStore> RequestOrchestrator<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  // ── Create ────────────────────────────────────────────────────────────

  /// Validate and record a claim, checking the event window against the
  /// current time.
  pub async fn create(&self, input: CreateRequest) -> Result<RewardRequest> {
    self.create_as_of(input, Utc::now()).await
  }

  /// [`RequestOrchestrator::create`] with an explicit notion of "now".
  pub async fn create_as_of(
    &self,
    input: CreateRequest,
    now: DateTime<Utc>,
  ) -> Result<RewardRequest> {
    let existing = self
      .store
      .find_request(&input.user_id, &input.event_id)
      .await
      .map_err(Error::store)?;
    if existing.is_some() {
      warn!(user_id = %input.user_id, event_id = %input.event_id, "duplicate reward request");
      return Err(input.conflict());
    }

    let event = self
      .store
      .find_active_event(&input.event_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::EventUnavailable(input.event_id.clone()))?;

    let Some(reward_id) = event.primary_reward_id() else {
      return Err(Error::NoRewardConfigured(event.event_id));
    };

    if !event.is_open_at(now) {
      return Err(Error::OutsideWindow {
        event_id: event.event_id,
        start_at: event.start_at,
        end_at:   event.end_at,
      });
    }

    // TODO: events carry a list of rewards but only the first is paid out;
    // multi-reward payout needs a snapshot per reward.
    let reward = self
      .store
      .get_reward(reward_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::RewardUnavailable(event.event_id.clone()))?;

    let new_request = NewRewardRequest {
      user_id:         input.user_id.clone(),
      event_id:        input.event_id.clone(),
      trigger:         input.trigger,
      delivery_type:   input.delivery_type,
      reward_snapshot: RewardSnapshot::from(&reward),
      requested_at:    input.requested_at.unwrap_or(now),
    };

    match self.store.insert_request(new_request).await.map_err(Error::store)? {
      Insertion::Inserted(request) => {
        info!(
          request_id = %request.id,
          user_id = %request.user_id,
          event_id = %request.event_id,
          "reward request created"
        );
        Ok(request)
      }
      Insertion::Duplicate => {
        warn!(
          user_id = %input.user_id,
          event_id = %input.event_id,
          "reward request rejected by uniqueness constraint"
        );
        Err(input.conflict())
      }
    }
  }

  // ── Status ────────────────────────────────────────────────────────────

  /// Set a request's status, appending a delivery record when the new
  /// status is [`RewardStatus::Success`].
  pub async fn update_status(
    &self,
    id: &str,
    status: RewardStatus,
    reason: Option<String>,
  ) -> Result<RewardRequest> {
    let request_id = parse_request_id(id)?;
    let before = self
      .store
      .get_request(request_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::RequestNotFound(id.to_owned()))?;

    let updated = if status == RewardStatus::Success {
      let delivery = delivery_for(&before, Utc::now());
      let (updated, record) = self
        .store
        .complete_request(request_id, reason, delivery)
        .await
        .map_err(Error::store)?
        .ok_or_else(|| Error::RequestNotFound(id.to_owned()))?;
      info!(
        request_id = %request_id,
        delivery_id = %record.id,
        "reward delivery recorded"
      );
      updated
    } else {
      self
        .store
        .update_request_status(request_id, status, reason)
        .await
        .map_err(Error::store)?
        .ok_or_else(|| Error::RequestNotFound(id.to_owned()))?
    };

    info!(
      request_id = %request_id,
      from = %before.status,
      to = %status,
      "reward request status changed"
    );

    Ok(updated)
  }

  // ── Request reads ─────────────────────────────────────────────────────

  /// Fetch one request. A malformed id is reported as not found.
  pub async fn get(&self, id: &str) -> Result<RewardRequest> {
    let request_id = parse_request_id(id)?;
    self
      .store
      .get_request(request_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::RequestNotFound(id.to_owned()))
  }

  pub async fn list(&self, query: &RequestQuery) -> Result<Vec<RewardRequest>> {
    self.store.list_requests(query).await.map_err(Error::store)
  }

  // ── Delivery history ──────────────────────────────────────────────────

  /// Append a delivery record supplied by an operator.
  pub async fn record_delivery(
    &self,
    input: NewDeliveryRecord,
  ) -> Result<DeliveryRecord> {
    if input.user_id.trim().is_empty() || input.event_id.trim().is_empty() {
      return Err(Error::Invalid("userId and eventId must not be empty".into()));
    }
    if input.quantity < 1 {
      return Err(Error::Invalid("quantity must be at least 1".into()));
    }
    self.store.append_delivery(input).await.map_err(Error::store)
  }

  pub async fn delivery(&self, id: &str) -> Result<DeliveryRecord> {
    let delivery_id =
      Uuid::parse_str(id).map_err(|_| Error::DeliveryNotFound(id.to_owned()))?;
    self
      .store
      .get_delivery(delivery_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::DeliveryNotFound(id.to_owned()))
  }

  pub async fn history(&self, query: &HistoryQuery) -> Result<Vec<DeliveryRecord>> {
    self.store.list_deliveries(query).await.map_err(Error::store)
  }
}

/// The history entry for a successful request, paid from its snapshot.
fn delivery_for(request: &RewardRequest, now: DateTime<Utc>) -> NewDeliveryRecord {
  let snapshot = &request.reward_snapshot;
  NewDeliveryRecord {
    user_id:      request.user_id.clone(),
    event_id:     request.event_id.clone(),
    reward_id:    request.id.to_string(),
    quantity:     snapshot.quantity,
    item_id:      snapshot.item_id.clone(),
    requested_at: now,
    delivered_at: now,
  }
}

fn parse_request_id(id: &str) -> Result<Uuid> {
  Uuid::parse_str(id).map_err(|_| Error::RequestNotFound(id.to_owned()))
}
