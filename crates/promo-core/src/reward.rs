//! Reward definitions and the snapshot copied onto a request.
//!
//! A [`Reward`] is mutable catalog data. A [`RewardSnapshot`] is taken once,
//! when a user requests the reward, and never changes afterwards, so later
//! edits to the catalog do not rewrite what a user was promised.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// What kind of thing a reward grants.
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
pub enum RewardType {
  /// An in-game item; requires an `item_id`.
  Item,
  /// In-game currency.
  Meso,
  Point,
}

/// A grantable reward, as stored in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
  pub id:          Uuid,
  #[serde(rename = "type")]
  pub reward_type: RewardType,
  pub quantity:    u32,
  pub item_id:     Option<String>,
  pub description: Option<String>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Input to [`crate::store::PromoStore::insert_reward`] and
/// [`crate::store::PromoStore::update_reward`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReward {
  #[serde(rename = "type")]
  pub reward_type: RewardType,
  pub quantity:    u32,
  pub item_id:     Option<String>,
  pub description: Option<String>,
}

impl NewReward {
  pub fn new(reward_type: RewardType, quantity: u32) -> Self {
    Self { reward_type, quantity, item_id: None, description: None }
  }

  pub fn with_item(mut self, item_id: impl Into<String>) -> Self {
    self.item_id = Some(item_id.into());
    self
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  /// Quantity must be at least one; item rewards must name their item.
  pub fn validate(&self) -> Result<()> {
    if self.quantity < 1 {
      return Err(Error::Invalid("reward quantity must be at least 1".into()));
    }
    let has_item = self.item_id.as_deref().is_some_and(|i| !i.trim().is_empty());
    if self.reward_type == RewardType::Item && !has_item {
      return Err(Error::Invalid("item rewards require an itemId".into()));
    }
    Ok(())
  }
}

/// The reward fields frozen onto a request at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardSnapshot {
  #[serde(rename = "type")]
  pub reward_type: RewardType,
  pub quantity:    u32,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub item_id:     Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

impl From<&Reward> for RewardSnapshot {
  fn from(reward: &Reward) -> Self {
    Self {
      reward_type: reward.reward_type,
      quantity:    reward.quantity,
      item_id:     reward.item_id.clone(),
      description: reward.description.clone(),
    }
  }
}
