//! The `PromoStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `promo-store-sqlite`).
//! [`crate::orchestrator::RequestOrchestrator`] and [`crate::catalog::Catalog`]
//! depend on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  condition::{Condition, NewCondition},
  event::{Event, NewEvent},
  history::{DeliveryRecord, HistoryQuery, NewDeliveryRecord},
  request::{Insertion, NewRewardRequest, RequestQuery, RewardRequest, RewardStatus},
  reward::{NewReward, Reward},
};

/// Abstraction over a promotions store backend.
///
/// Timestamps (`created_at`, `updated_at`, `processed_at`) and ids are
/// assigned by the store. Caller-supplied instants are kept at the store's
/// precision, and the returned record carries exactly what a later read
/// will. Lookups return `Ok(None)` for a missing row; errors are reserved
/// for backend failures.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait PromoStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reward catalog ────────────────────────────────────────────────────

  fn insert_reward(
    &self,
    input: NewReward,
  ) -> impl Future<Output = Result<Reward, Self::Error>> + Send + '_;

  fn get_reward(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Reward>, Self::Error>> + Send + '_;

  fn list_rewards(
    &self,
  ) -> impl Future<Output = Result<Vec<Reward>, Self::Error>> + Send + '_;

  /// Replace every editable field of a reward. Snapshots already taken from
  /// it are unaffected.
  fn update_reward(
    &self,
    id: Uuid,
    input: NewReward,
  ) -> impl Future<Output = Result<Option<Reward>, Self::Error>> + Send + '_;

  /// Remove a reward and return it.
  fn delete_reward(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Reward>, Self::Error>> + Send + '_;

  // ── Condition catalog ─────────────────────────────────────────────────

  fn insert_condition(
    &self,
    input: NewCondition,
  ) -> impl Future<Output = Result<Condition, Self::Error>> + Send + '_;

  fn get_condition(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Condition>, Self::Error>> + Send + '_;

  fn list_conditions(
    &self,
  ) -> impl Future<Output = Result<Vec<Condition>, Self::Error>> + Send + '_;

  fn update_condition(
    &self,
    id: Uuid,
    input: NewCondition,
  ) -> impl Future<Output = Result<Option<Condition>, Self::Error>> + Send + '_;

  /// Remove a condition and return it. Events that listed it keep the id.
  fn delete_condition(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Condition>, Self::Error>> + Send + '_;

  // ── Event catalog ─────────────────────────────────────────────────────

  /// Returns [`Insertion::Duplicate`] if `event_id` is already taken.
  fn insert_event(
    &self,
    input: NewEvent,
  ) -> impl Future<Output = Result<Insertion<Event>, Self::Error>> + Send + '_;

  fn get_event<'a>(
    &'a self,
    event_id: &'a str,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + 'a;

  /// Like [`PromoStore::get_event`] but only matches events with
  /// `is_active = true`.
  fn find_active_event<'a>(
    &'a self,
    event_id: &'a str,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + 'a;

  fn list_events(
    &self,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + '_;

  /// Replace every editable field of the event named `event_id`.
  /// `input.event_id` is ignored.
  fn update_event<'a>(
    &'a self,
    event_id: &'a str,
    input: NewEvent,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + 'a;

  /// Remove an event and return it. Requests against it are kept.
  fn delete_event<'a>(
    &'a self,
    event_id: &'a str,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + 'a;

  fn set_event_active<'a>(
    &'a self,
    event_id: &'a str,
    active: bool,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + 'a;

  // ── Request ledger ────────────────────────────────────────────────────

  fn find_request<'a>(
    &'a self,
    user_id: &'a str,
    event_id: &'a str,
  ) -> impl Future<Output = Result<Option<RewardRequest>, Self::Error>> + Send + 'a;

  /// Insert a `pending` request.
  ///
  /// Returns [`Insertion::Duplicate`] when a request for the same
  /// `(user_id, event_id)` already exists. This must be decided by the
  /// backend atomically with the write.
  fn insert_request(
    &self,
    input: NewRewardRequest,
  ) -> impl Future<Output = Result<Insertion<RewardRequest>, Self::Error>> + Send + '_;

  fn get_request(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<RewardRequest>, Self::Error>> + Send + '_;

  /// Overwrite the status. `reason: None` keeps the stored reason. Setting
  /// [`RewardStatus::Success`] also stamps `processed_at`.
  fn update_request_status(
    &self,
    id: Uuid,
    status: RewardStatus,
    reason: Option<String>,
  ) -> impl Future<Output = Result<Option<RewardRequest>, Self::Error>> + Send + '_;

  /// Set the request to [`RewardStatus::Success`] and append `delivery` as
  /// one atomic write. Either both land or neither does.
  fn complete_request(
    &self,
    id: Uuid,
    reason: Option<String>,
    delivery: NewDeliveryRecord,
  ) -> impl Future<
    Output = Result<Option<(RewardRequest, DeliveryRecord)>, Self::Error>,
  > + Send
  + '_;

  /// Newest first.
  fn list_requests<'a>(
    &'a self,
    query: &'a RequestQuery,
  ) -> impl Future<Output = Result<Vec<RewardRequest>, Self::Error>> + Send + 'a;

  // ── Delivery history (append-only) ────────────────────────────────────

  fn append_delivery(
    &self,
    input: NewDeliveryRecord,
  ) -> impl Future<Output = Result<DeliveryRecord, Self::Error>> + Send + '_;

  fn get_delivery(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<DeliveryRecord>, Self::Error>> + Send + '_;

  /// Sorted by `delivered_at`, newest first.
  fn list_deliveries<'a>(
    &'a self,
    query: &'a HistoryQuery,
  ) -> impl Future<Output = Result<Vec<DeliveryRecord>, Self::Error>> + Send + 'a;
}
