//! Operator-facing management of the reward and event catalogs.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::{
  Error, Result,
  condition::{Condition, NewCondition},
  event::{Event, EventPatch, NewEvent},
  request::Insertion,
  reward::{NewReward, Reward},
  store::PromoStore,
};

pub struct Catalog<S> {
  store: Arc<S>,
}

impl<S> Clone for Catalog<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: PromoStore> Catalog<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  // ── Rewards ───────────────────────────────────────────────────────────

  pub async fn create_reward(&self, input: NewReward) -> Result<Reward> {
    input.validate()?;
    let reward = self.store.insert_reward(input).await.map_err(Error::store)?;
    info!(reward_id = %reward.id, reward_type = %reward.reward_type, "reward created");
    Ok(reward)
  }

  pub async fn update_reward(&self, id: Uuid, input: NewReward) -> Result<Reward> {
    input.validate()?;
    self
      .store
      .update_reward(id, input)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::RewardNotFound(id.to_string()))
  }

  pub async fn delete_reward(&self, id: Uuid) -> Result<Reward> {
    self
      .store
      .delete_reward(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::RewardNotFound(id.to_string()))
  }

  pub async fn reward(&self, id: Uuid) -> Result<Reward> {
    self
      .store
      .get_reward(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::RewardNotFound(id.to_string()))
  }

  pub async fn rewards(&self) -> Result<Vec<Reward>> {
    self.store.list_rewards().await.map_err(Error::store)
  }

  // ── Conditions ────────────────────────────────────────────────────────

  pub async fn create_condition(&self, input: NewCondition) -> Result<Condition> {
    input.validate()?;
    let condition = self.store.insert_condition(input).await.map_err(Error::store)?;
    info!(condition_id = %condition.id, category = %condition.category, "condition created");
    Ok(condition)
  }

  pub async fn update_condition(&self, id: Uuid, input: NewCondition) -> Result<Condition> {
    input.validate()?;
    self
      .store
      .update_condition(id, input)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::ConditionNotFound(id.to_string()))
  }

  pub async fn delete_condition(&self, id: Uuid) -> Result<Condition> {
    self
      .store
      .delete_condition(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::ConditionNotFound(id.to_string()))
  }

  pub async fn condition(&self, id: Uuid) -> Result<Condition> {
    self
      .store
      .get_condition(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::ConditionNotFound(id.to_string()))
  }

  pub async fn conditions(&self) -> Result<Vec<Condition>> {
    self.store.list_conditions().await.map_err(Error::store)
  }

  // ── Events ────────────────────────────────────────────────────────────

  /// Shape checks, then every listed condition and reward must already
  /// exist in the catalog.
  async fn check_event(&self, input: &NewEvent) -> Result<()> {
    input.validate()?;
    for &condition_id in &input.condition_ids {
      if self.store.get_condition(condition_id).await.map_err(Error::store)?.is_none() {
        return Err(Error::Invalid(format!("unknown condition id {condition_id}")));
      }
    }
    for &reward_id in &input.reward_ids {
      if self.store.get_reward(reward_id).await.map_err(Error::store)?.is_none() {
        return Err(Error::Invalid(format!("unknown reward id {reward_id}")));
      }
    }
    Ok(())
  }

  pub async fn create_event(&self, input: NewEvent) -> Result<Event> {
    self.check_event(&input).await?;

    let event_id = input.event_id.clone();
    match self.store.insert_event(input).await.map_err(Error::store)? {
      Insertion::Inserted(event) => {
        info!(event_id = %event.event_id, "event created");
        Ok(event)
      }
      Insertion::Duplicate => Err(Error::EventExists(event_id)),
    }
  }

  pub async fn event(&self, event_id: &str) -> Result<Event> {
    self
      .store
      .get_event(event_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::EventNotFound(event_id.to_owned()))
  }

  pub async fn events(&self) -> Result<Vec<Event>> {
    self.store.list_events().await.map_err(Error::store)
  }

  /// Replace an event wholesale. The body may not rename the event.
  pub async fn replace_event(&self, event_id: &str, input: NewEvent) -> Result<Event> {
    if input.event_id != event_id {
      return Err(Error::Invalid(format!(
        "eventId {} does not match {event_id}",
        input.event_id
      )));
    }
    self.check_event(&input).await?;
    let event = self
      .store
      .update_event(event_id, input)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::EventNotFound(event_id.to_owned()))?;
    info!(event_id = %event.event_id, "event replaced");
    Ok(event)
  }

  /// Overlay `patch` on the stored event, then check the result as a whole,
  /// so a patch cannot leave `start_at` after `end_at`.
  pub async fn patch_event(&self, event_id: &str, patch: EventPatch) -> Result<Event> {
    let current = self.event(event_id).await?;
    let merged = patch.apply_to(current);
    self.check_event(&merged).await?;
    let event = self
      .store
      .update_event(event_id, merged)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::EventNotFound(event_id.to_owned()))?;
    info!(event_id = %event.event_id, "event updated");
    Ok(event)
  }

  pub async fn delete_event(&self, event_id: &str) -> Result<Event> {
    let event = self
      .store
      .delete_event(event_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::EventNotFound(event_id.to_owned()))?;
    info!(event_id = %event.event_id, "event deleted");
    Ok(event)
  }

  pub async fn set_event_active(&self, event_id: &str, active: bool) -> Result<Event> {
    let event = self
      .store
      .set_event_active(event_id, active)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::EventNotFound(event_id.to_owned()))?;
    info!(event_id = %event.event_id, active, "event activation changed");
    Ok(event)
  }
}
