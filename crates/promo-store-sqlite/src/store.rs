//! [`SqliteStore`]: the SQLite implementation of [`PromoStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use promo_core::{
  condition::{Condition, NewCondition},
  event::{Event, NewEvent},
  history::{DeliveryRecord, HistoryQuery, NewDeliveryRecord},
  request::{Insertion, NewRewardRequest, RequestQuery, RewardRequest, RewardStatus},
  reward::{NewReward, Reward},
  store::PromoStore,
};

use crate::{
  Result,
  encode::{
    CONDITION_COLUMNS, DELIVERY_COLUMNS, EVENT_COLUMNS, RawCondition, RawDelivery,
    RawEvent, RawRequest, RawReward, REQUEST_COLUMNS, REWARD_COLUMNS, encode_dt,
    encode_ids, encode_snapshot, encode_uuid, now, truncate_dt,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A promotions store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn fetch_reward(&self, id_str: String) -> Result<Option<Reward>> {
    let raw: Option<RawReward> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {REWARD_COLUMNS} FROM rewards WHERE reward_id = ?1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawReward::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawReward::into_reward).transpose()
  }

  async fn fetch_condition(&self, id_str: String) -> Result<Option<Condition>> {
    let raw: Option<RawCondition> = self
      .conn
      .call(move |conn| {
        let sql =
          format!("SELECT {CONDITION_COLUMNS} FROM conditions WHERE condition_id = ?1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawCondition::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCondition::into_condition).transpose()
  }

  async fn fetch_event(
    &self,
    event_id: String,
    active_only: bool,
  ) -> Result<Option<Event>> {
    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {EVENT_COLUMNS} FROM events
           WHERE event_id = ?1 AND (?2 = 0 OR is_active = 1)"
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![event_id, active_only], RawEvent::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }

  async fn fetch_request(&self, id_str: String) -> Result<Option<RewardRequest>> {
    let raw: Option<RawRequest> = self
      .conn
      .call(move |conn| {
        let sql =
          format!("SELECT {REQUEST_COLUMNS} FROM reward_requests WHERE request_id = ?1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawRequest::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRequest::into_request).transpose()
  }
}

/// Whether a failed write was rejected by a UNIQUE or PRIMARY KEY constraint.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
  match err {
    rusqlite::Error::SqliteFailure(e, _) => matches!(
      e.extended_code,
      rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    ),
    _ => false,
  }
}

/// Status write shared by plain updates and completions. `?4` marks a
/// success, which stamps `processed_at`; a null `?3` keeps the old reason.
const SET_STATUS: &str = "UPDATE reward_requests
   SET status       = ?2,
       reason       = COALESCE(?3, reason),
       processed_at = CASE WHEN ?4 THEN ?5 ELSE processed_at END,
       updated_at   = ?5
   WHERE request_id = ?1";

fn delivery_record(input: NewDeliveryRecord, at: DateTime<Utc>) -> DeliveryRecord {
  DeliveryRecord {
    id:           Uuid::new_v4(),
    user_id:      input.user_id,
    event_id:     input.event_id,
    reward_id:    input.reward_id,
    quantity:     input.quantity,
    item_id:      input.item_id,
    requested_at: truncate_dt(input.requested_at),
    delivered_at: truncate_dt(input.delivered_at),
    created_at:   at,
    updated_at:   at,
  }
}

fn insert_delivery(
  conn: &rusqlite::Connection,
  record: &DeliveryRecord,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO delivery_history (
       delivery_id, user_id, event_id, reward_id, quantity, item_id,
       requested_at, delivered_at, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    rusqlite::params![
      encode_uuid(record.id),
      record.user_id,
      record.event_id,
      record.reward_id,
      record.quantity,
      record.item_id,
      encode_dt(record.requested_at),
      encode_dt(record.delivered_at),
      encode_dt(record.created_at),
      encode_dt(record.updated_at),
    ],
  )?;
  Ok(())
}

// ─── PromoStore impl ─────────────────────────────────────────────────────────

impl PromoStore for SqliteStore {
  type Error = crate::Error;

  // ── Rewards ───────────────────────────────────────────────────────────────

  async fn insert_reward(&self, input: NewReward) -> Result<Reward> {
    let at = now();
    let reward = Reward {
      id:          Uuid::new_v4(),
      reward_type: input.reward_type,
      quantity:    input.quantity,
      item_id:     input.item_id,
      description: input.description,
      created_at:  at,
      updated_at:  at,
    };

    let id_str      = encode_uuid(reward.id);
    let type_str    = reward.reward_type.as_ref().to_owned();
    let quantity    = reward.quantity;
    let item_id     = reward.item_id.clone();
    let description = reward.description.clone();
    let at_str      = encode_dt(at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO rewards (
             reward_id, reward_type, quantity, item_id, description,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          rusqlite::params![id_str, type_str, quantity, item_id, description, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(reward)
  }

  async fn get_reward(&self, id: Uuid) -> Result<Option<Reward>> {
    self.fetch_reward(encode_uuid(id)).await
  }

  async fn list_rewards(&self) -> Result<Vec<Reward>> {
    let raws: Vec<RawReward> = self
      .conn
      .call(|conn| {
        let sql = format!(
          "SELECT {REWARD_COLUMNS} FROM rewards ORDER BY created_at DESC, rowid DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawReward::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReward::into_reward).collect()
  }

  async fn update_reward(&self, id: Uuid, input: NewReward) -> Result<Option<Reward>> {
    let id_str      = encode_uuid(id);
    let type_str    = input.reward_type.as_ref().to_owned();
    let at_str      = encode_dt(now());
    let lookup      = id_str.clone();

    let changed = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE rewards
           SET reward_type = ?2, quantity = ?3, item_id = ?4, description = ?5,
               updated_at = ?6
           WHERE reward_id = ?1",
          rusqlite::params![
            id_str,
            type_str,
            input.quantity,
            input.item_id,
            input.description,
            at_str,
          ],
        )?;
        Ok(n)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.fetch_reward(lookup).await
  }

  async fn delete_reward(&self, id: Uuid) -> Result<Option<Reward>> {
    let id_str = encode_uuid(id);
    let Some(reward) = self.fetch_reward(id_str.clone()).await? else {
      return Ok(None);
    };

    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM rewards WHERE reward_id = ?1", rusqlite::params![
          id_str
        ])?;
        Ok(())
      })
      .await?;

    Ok(Some(reward))
  }

  // ── Conditions ────────────────────────────────────────────────────────────

  async fn insert_condition(&self, input: NewCondition) -> Result<Condition> {
    let at = now();
    let condition = Condition {
      id:          Uuid::new_v4(),
      category:    input.category,
      sub_type:    input.sub_type,
      target:      input.target,
      description: input.description,
      created_at:  at,
      updated_at:  at,
    };

    let id_str       = encode_uuid(condition.id);
    let category_str = condition.category.as_ref().to_owned();
    let sub_type_str = condition.sub_type.as_ref().to_owned();
    let target       = condition.target.clone();
    let description  = condition.description.clone();
    let at_str       = encode_dt(at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO conditions (
             condition_id, category, sub_type, target, description,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          rusqlite::params![id_str, category_str, sub_type_str, target, description, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(condition)
  }

  async fn get_condition(&self, id: Uuid) -> Result<Option<Condition>> {
    self.fetch_condition(encode_uuid(id)).await
  }

  async fn list_conditions(&self) -> Result<Vec<Condition>> {
    let raws: Vec<RawCondition> = self
      .conn
      .call(|conn| {
        let sql = format!(
          "SELECT {CONDITION_COLUMNS} FROM conditions ORDER BY created_at DESC, rowid DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawCondition::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCondition::into_condition).collect()
  }

  async fn update_condition(
    &self,
    id: Uuid,
    input: NewCondition,
  ) -> Result<Option<Condition>> {
    let id_str       = encode_uuid(id);
    let category_str = input.category.as_ref().to_owned();
    let sub_type_str = input.sub_type.as_ref().to_owned();
    let at_str       = encode_dt(now());
    let lookup       = id_str.clone();

    let changed = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE conditions
           SET category = ?2, sub_type = ?3, target = ?4, description = ?5,
               updated_at = ?6
           WHERE condition_id = ?1",
          rusqlite::params![
            id_str,
            category_str,
            sub_type_str,
            input.target,
            input.description,
            at_str,
          ],
        )?;
        Ok(n)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.fetch_condition(lookup).await
  }

  async fn delete_condition(&self, id: Uuid) -> Result<Option<Condition>> {
    let id_str = encode_uuid(id);
    let Some(condition) = self.fetch_condition(id_str.clone()).await? else {
      return Ok(None);
    };

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM conditions WHERE condition_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(Some(condition))
  }

  // ── Events ────────────────────────────────────────────────────────────────

  async fn insert_event(&self, input: NewEvent) -> Result<Insertion<Event>> {
    let at = now();
    let event = Event {
      event_id:      input.event_id,
      title:         input.title,
      category:      input.category,
      trigger:       input.trigger,
      delivery_type: input.delivery_type,
      start_at:      truncate_dt(input.start_at),
      end_at:        truncate_dt(input.end_at),
      is_active:     input.is_active,
      condition_ids: input.condition_ids,
      reward_ids:    input.reward_ids,
      created_at:    at,
      updated_at:    at,
    };

    let event_id      = event.event_id.clone();
    let title         = event.title.clone();
    let category_str  = event.category.as_ref().to_owned();
    let trigger_str   = event.trigger.as_ref().to_owned();
    let delivery_str  = event.delivery_type.as_ref().to_owned();
    let start_str     = encode_dt(event.start_at);
    let end_str       = encode_dt(event.end_at);
    let is_active     = event.is_active;
    let condition_ids = encode_ids(&event.condition_ids)?;
    let reward_ids    = encode_ids(&event.reward_ids)?;
    let at_str        = encode_dt(at);

    let inserted = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "INSERT INTO events (
             event_id, title, category, trigger_type, delivery_type, start_at,
             end_at, is_active, condition_ids, reward_ids, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
          rusqlite::params![
            event_id,
            title,
            category_str,
            trigger_str,
            delivery_str,
            start_str,
            end_str,
            is_active,
            condition_ids,
            reward_ids,
            at_str,
          ],
        );
        match result {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    Ok(if inserted { Insertion::Inserted(event) } else { Insertion::Duplicate })
  }

  async fn get_event<'a>(&'a self, event_id: &'a str) -> Result<Option<Event>> {
    self.fetch_event(event_id.to_owned(), false).await
  }

  async fn find_active_event<'a>(&'a self, event_id: &'a str) -> Result<Option<Event>> {
    self.fetch_event(event_id.to_owned(), true).await
  }

  async fn list_events(&self) -> Result<Vec<Event>> {
    let raws: Vec<RawEvent> = self
      .conn
      .call(|conn| {
        let sql = format!(
          "SELECT {EVENT_COLUMNS} FROM events ORDER BY start_at DESC, rowid DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  async fn update_event<'a>(
    &'a self,
    event_id: &'a str,
    input: NewEvent,
  ) -> Result<Option<Event>> {
    let id            = event_id.to_owned();
    let category_str  = input.category.as_ref().to_owned();
    let trigger_str   = input.trigger.as_ref().to_owned();
    let delivery_str  = input.delivery_type.as_ref().to_owned();
    let start_str     = encode_dt(input.start_at);
    let end_str       = encode_dt(input.end_at);
    let condition_ids = encode_ids(&input.condition_ids)?;
    let reward_ids    = encode_ids(&input.reward_ids)?;
    let at_str        = encode_dt(now());

    let changed = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE events
           SET title = ?2, category = ?3, trigger_type = ?4, delivery_type = ?5,
               start_at = ?6, end_at = ?7, is_active = ?8, condition_ids = ?9,
               reward_ids = ?10, updated_at = ?11
           WHERE event_id = ?1",
          rusqlite::params![
            id,
            input.title,
            category_str,
            trigger_str,
            delivery_str,
            start_str,
            end_str,
            input.is_active,
            condition_ids,
            reward_ids,
            at_str,
          ],
        )?;
        Ok(n)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.fetch_event(event_id.to_owned(), false).await
  }

  async fn delete_event<'a>(&'a self, event_id: &'a str) -> Result<Option<Event>> {
    let Some(event) = self.fetch_event(event_id.to_owned(), false).await? else {
      return Ok(None);
    };

    let id = event_id.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM events WHERE event_id = ?1", rusqlite::params![id])?;
        Ok(())
      })
      .await?;

    Ok(Some(event))
  }

  async fn set_event_active<'a>(
    &'a self,
    event_id: &'a str,
    active: bool,
  ) -> Result<Option<Event>> {
    let id      = event_id.to_owned();
    let at_str  = encode_dt(now());

    let changed = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE events SET is_active = ?2, updated_at = ?3 WHERE event_id = ?1",
          rusqlite::params![id, active, at_str],
        )?;
        Ok(n)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.fetch_event(event_id.to_owned(), false).await
  }

  // ── Requests ──────────────────────────────────────────────────────────────

  async fn find_request<'a>(
    &'a self,
    user_id: &'a str,
    event_id: &'a str,
  ) -> Result<Option<RewardRequest>> {
    let user_id  = user_id.to_owned();
    let event_id = event_id.to_owned();

    let raw: Option<RawRequest> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {REQUEST_COLUMNS} FROM reward_requests
           WHERE user_id = ?1 AND event_id = ?2"
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![user_id, event_id], RawRequest::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRequest::into_request).transpose()
  }

  async fn insert_request(
    &self,
    input: NewRewardRequest,
  ) -> Result<Insertion<RewardRequest>> {
    let at = now();
    let request = RewardRequest {
      id:              Uuid::new_v4(),
      user_id:         input.user_id,
      event_id:        input.event_id,
      trigger:         input.trigger,
      delivery_type:   input.delivery_type,
      reward_snapshot: input.reward_snapshot,
      status:          RewardStatus::Pending,
      requested_at:    truncate_dt(input.requested_at),
      reason:          None,
      processed_at:    None,
      created_at:      at,
      updated_at:      at,
    };

    let id_str        = encode_uuid(request.id);
    let user_id       = request.user_id.clone();
    let event_id      = request.event_id.clone();
    let trigger_str   = request.trigger.as_ref().to_owned();
    let delivery_str  = request.delivery_type.as_ref().to_owned();
    let snapshot      = encode_snapshot(&request.reward_snapshot)?;
    let status_str    = request.status.as_ref().to_owned();
    let requested_str = encode_dt(request.requested_at);
    let at_str        = encode_dt(at);

    let inserted = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "INSERT INTO reward_requests (
             request_id, user_id, event_id, trigger_type, delivery_type,
             reward_snapshot, status, requested_at, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
          rusqlite::params![
            id_str,
            user_id,
            event_id,
            trigger_str,
            delivery_str,
            snapshot,
            status_str,
            requested_str,
            at_str,
          ],
        );
        match result {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    Ok(if inserted { Insertion::Inserted(request) } else { Insertion::Duplicate })
  }

  async fn get_request(&self, id: Uuid) -> Result<Option<RewardRequest>> {
    self.fetch_request(encode_uuid(id)).await
  }

  async fn update_request_status(
    &self,
    id: Uuid,
    status: RewardStatus,
    reason: Option<String>,
  ) -> Result<Option<RewardRequest>> {
    let id_str     = encode_uuid(id);
    let status_str = status.as_ref().to_owned();
    let success    = status == RewardStatus::Success;
    let at_str     = encode_dt(now());
    let lookup     = id_str.clone();

    let changed = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          SET_STATUS,
          rusqlite::params![id_str, status_str, reason, success, at_str],
        )?;
        Ok(n)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.fetch_request(lookup).await
  }

  async fn complete_request(
    &self,
    id: Uuid,
    reason: Option<String>,
    delivery: NewDeliveryRecord,
  ) -> Result<Option<(RewardRequest, DeliveryRecord)>> {
    let at         = now();
    let record     = delivery_record(delivery, at);
    let row        = record.clone();
    let id_str     = encode_uuid(id);
    let status_str = RewardStatus::Success.as_ref().to_owned();
    let at_str     = encode_dt(at);
    let lookup     = id_str.clone();

    let changed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let n = tx.execute(
          SET_STATUS,
          rusqlite::params![id_str, status_str, reason, true, at_str],
        )?;
        // Dropping an uncommitted transaction rolls it back.
        if n == 0 {
          return Ok(0);
        }
        insert_delivery(&tx, &row)?;
        tx.commit()?;
        Ok(n)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    Ok(self.fetch_request(lookup).await?.map(|request| (request, record)))
  }

  async fn list_requests<'a>(
    &'a self,
    query: &'a RequestQuery,
  ) -> Result<Vec<RewardRequest>> {
    let user_id    = query.user_id.clone();
    let event_id   = query.event_id.clone();
    let status_str = query.status.map(|s| s.as_ref().to_owned());

    let raws: Vec<RawRequest> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {REQUEST_COLUMNS} FROM reward_requests
           WHERE (?1 IS NULL OR user_id = ?1)
             AND (?2 IS NULL OR event_id = ?2)
             AND (?3 IS NULL OR status = ?3)
           ORDER BY created_at DESC, rowid DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![user_id, event_id, status_str],
            RawRequest::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRequest::into_request).collect()
  }

  // ── Delivery history ──────────────────────────────────────────────────────

  async fn append_delivery(&self, input: NewDeliveryRecord) -> Result<DeliveryRecord> {
    let record = delivery_record(input, now());
    let row = record.clone();

    self
      .conn
      .call(move |conn| {
        insert_delivery(conn, &row)?;
        Ok(())
      })
      .await?;

    Ok(record)
  }

  async fn get_delivery(&self, id: Uuid) -> Result<Option<DeliveryRecord>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawDelivery> = self
      .conn
      .call(move |conn| {
        let sql =
          format!("SELECT {DELIVERY_COLUMNS} FROM delivery_history WHERE delivery_id = ?1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawDelivery::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDelivery::into_delivery).transpose()
  }

  async fn list_deliveries<'a>(
    &'a self,
    query: &'a HistoryQuery,
  ) -> Result<Vec<DeliveryRecord>> {
    let user_id   = query.user_id.clone();
    let event_id  = query.event_id.clone();
    let reward_id = query.reward_id.clone();
    let after     = query.delivered_after.map(encode_dt);
    let before    = query.delivered_before.map(encode_dt);

    let raws: Vec<RawDelivery> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {DELIVERY_COLUMNS} FROM delivery_history
           WHERE (?1 IS NULL OR user_id = ?1)
             AND (?2 IS NULL OR event_id = ?2)
             AND (?3 IS NULL OR reward_id = ?3)
             AND (?4 IS NULL OR delivered_at >= ?4)
             AND (?5 IS NULL OR delivered_at <= ?5)
           ORDER BY delivered_at DESC, rowid DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![user_id, event_id, reward_id, after, before],
            RawDelivery::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDelivery::into_delivery).collect()
  }
}
