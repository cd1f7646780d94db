//! Eligibility conditions that events point at.
//!
//! Conditions are descriptive catalog entries. The request workflow does not
//! evaluate them; event creation only checks that every referenced condition
//! exists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// The kind of campaign an event or condition belongs to.
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
pub enum EventCategory {
  #[default]
  Attendance,
  Invite,
  Quest,
}

/// What a condition measures within its category.
#[derive(
  Debug,
  Clone,
  Copy,
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
pub enum ConditionSubType {
  TotalDays,
  ConsecutiveDays,
  InviteCount,
  QuestClear,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
  pub id:          Uuid,
  pub category:    EventCategory,
  pub sub_type:    ConditionSubType,
  /// Threshold or subject of the condition, e.g. `"3"` days or an item id.
  pub target:      Option<String>,
  pub description: Option<String>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

impl Condition {
  /// The target as a number when it is one.
  pub fn numeric_target(&self) -> Option<i64> {
    self.target.as_deref().and_then(|t| t.trim().parse().ok())
  }
}

/// Input to [`crate::store::PromoStore::insert_condition`] and
/// [`crate::store::PromoStore::update_condition`].
#[derive(Debug, Clone)]
pub struct NewCondition {
  pub category:    EventCategory,
  pub sub_type:    ConditionSubType,
  pub target:      Option<String>,
  pub description: Option<String>,
}

impl NewCondition {
  pub fn new(category: EventCategory, sub_type: ConditionSubType) -> Self {
    Self { category, sub_type, target: None, description: None }
  }

  pub fn with_target(mut self, target: impl Into<String>) -> Self {
    self.target = Some(target.into());
    self
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  pub fn validate(&self) -> Result<()> {
    if self.target.as_deref().is_some_and(|t| t.trim().is_empty()) {
      return Err(Error::Invalid("condition target must not be blank".into()));
    }
    Ok(())
  }
}
