//! Error types for `promo-core`.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("event not found: {0}")]
  EventNotFound(String),

  /// The event is missing or switched off; callers cannot tell which.
  #[error("event {0} not found or not active")]
  EventUnavailable(String),

  #[error("reward not found: {0}")]
  RewardNotFound(String),

  #[error("condition not found: {0}")]
  ConditionNotFound(String),

  #[error("reward request not found: {0}")]
  RequestNotFound(String),

  #[error("delivery record not found: {0}")]
  DeliveryNotFound(String),

  #[error("reward for event {event_id} already requested by user {user_id}")]
  AlreadyRequested { user_id: String, event_id: String },

  #[error("event {0} already exists")]
  EventExists(String),

  #[error("event {0} has no rewards configured")]
  NoRewardConfigured(String),

  #[error("event {event_id} is not running (open {start_at} to {end_at})")]
  OutsideWindow {
    event_id: String,
    start_at: DateTime<Utc>,
    end_at:   DateTime<Utc>,
  },

  #[error("event {0} has no valid reward")]
  RewardUnavailable(String),

  #[error("invalid input: {0}")]
  Invalid(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Coarse classification used by transports to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  Conflict,
  Validation,
  Internal,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::EventNotFound(_)
      | Self::EventUnavailable(_)
      | Self::RewardNotFound(_)
      | Self::ConditionNotFound(_)
      | Self::RequestNotFound(_)
      | Self::DeliveryNotFound(_) => ErrorKind::NotFound,
      Self::AlreadyRequested { .. } | Self::EventExists(_) => {
        ErrorKind::Conflict
      }
      Self::NoRewardConfigured(_)
      | Self::OutsideWindow { .. }
      | Self::RewardUnavailable(_)
      | Self::Invalid(_) => ErrorKind::Validation,
      Self::Store(_) => ErrorKind::Internal,
    }
  }

  /// Box a backend error.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
