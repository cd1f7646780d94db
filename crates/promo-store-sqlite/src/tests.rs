//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, TimeZone as _, Utc};
use promo_core::{
  condition::{ConditionSubType, EventCategory, NewCondition},
  event::NewEvent,
  history::{HistoryQuery, NewDeliveryRecord},
  request::{
    DeliveryType, Insertion, NewRewardRequest, RequestQuery, RewardStatus,
    TriggerType,
  },
  reward::{NewReward, RewardSnapshot, RewardType},
  store::PromoStore,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn snapshot(quantity: u32) -> RewardSnapshot {
  RewardSnapshot {
    reward_type: RewardType::Item,
    quantity,
    item_id: Some("item-001".into()),
    description: None,
  }
}

fn new_request(user_id: &str, event_id: &str) -> NewRewardRequest {
  NewRewardRequest {
    user_id:         user_id.into(),
    event_id:        event_id.into(),
    trigger:         TriggerType::Manual,
    delivery_type:   DeliveryType::ManualClaim,
    reward_snapshot: snapshot(1),
    requested_at:    Utc::now(),
  }
}

async fn inserted(s: &SqliteStore, user_id: &str, event_id: &str) -> Uuid {
  match s.insert_request(new_request(user_id, event_id)).await.unwrap() {
    Insertion::Inserted(r) => r.id,
    Insertion::Duplicate => panic!("unexpected duplicate"),
  }
}

fn delivery(user_id: &str, delivered_at: chrono::DateTime<Utc>) -> NewDeliveryRecord {
  NewDeliveryRecord {
    user_id: user_id.into(),
    event_id: "event-001".into(),
    reward_id: Uuid::new_v4().to_string(),
    quantity: 1,
    item_id: None,
    requested_at: delivered_at,
    delivered_at,
  }
}

// ─── Rewards ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_reward() {
  let s = store().await;

  let reward = s
    .insert_reward(NewReward::new(RewardType::Item, 3).with_item("item-001"))
    .await
    .unwrap();

  let fetched = s.get_reward(reward.id).await.unwrap().unwrap();
  assert_eq!(fetched.reward_type, RewardType::Item);
  assert_eq!(fetched.quantity, 3);
  assert_eq!(fetched.item_id.as_deref(), Some("item-001"));
  assert_eq!(fetched.created_at, reward.created_at);
}

#[tokio::test]
async fn get_reward_missing_returns_none() {
  let s = store().await;
  assert!(s.get_reward(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn update_reward_replaces_fields() {
  let s = store().await;
  let reward = s.insert_reward(NewReward::new(RewardType::Meso, 100)).await.unwrap();

  let updated = s
    .update_reward(reward.id, NewReward::new(RewardType::Point, 5).with_description("bonus"))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.reward_type, RewardType::Point);
  assert_eq!(updated.quantity, 5);
  assert_eq!(updated.description.as_deref(), Some("bonus"));
  assert!(updated.updated_at >= reward.updated_at);

  let missing = s
    .update_reward(Uuid::new_v4(), NewReward::new(RewardType::Meso, 1))
    .await
    .unwrap();
  assert!(missing.is_none());
}

#[tokio::test]
async fn delete_reward_returns_removed_row() {
  let s = store().await;
  let reward = s.insert_reward(NewReward::new(RewardType::Meso, 100)).await.unwrap();

  let removed = s.delete_reward(reward.id).await.unwrap().unwrap();
  assert_eq!(removed.id, reward.id);
  assert!(s.get_reward(reward.id).await.unwrap().is_none());
  assert!(s.delete_reward(reward.id).await.unwrap().is_none());
}

#[tokio::test]
async fn list_rewards_newest_first() {
  let s = store().await;
  let a = s.insert_reward(NewReward::new(RewardType::Meso, 1)).await.unwrap();
  let b = s.insert_reward(NewReward::new(RewardType::Meso, 2)).await.unwrap();

  let ids: Vec<_> = s.list_rewards().await.unwrap().into_iter().map(|r| r.id).collect();
  assert_eq!(ids, vec![b.id, a.id]);
}

// ─── Conditions ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn condition_roundtrip_and_delete() {
  let s = store().await;
  let condition = s
    .insert_condition(
      NewCondition::new(EventCategory::Attendance, ConditionSubType::TotalDays)
        .with_target("3")
        .with_description("three days in total"),
    )
    .await
    .unwrap();

  let fetched = s.get_condition(condition.id).await.unwrap().unwrap();
  assert_eq!(fetched.sub_type, ConditionSubType::TotalDays);
  assert_eq!(fetched.target.as_deref(), Some("3"));
  assert_eq!(fetched.created_at, condition.created_at);

  let quest = NewCondition::new(EventCategory::Quest, ConditionSubType::QuestClear);
  let updated = s.update_condition(condition.id, quest.clone()).await.unwrap().unwrap();
  assert_eq!(updated.category, EventCategory::Quest);
  assert!(updated.target.is_none());
  assert!(s.update_condition(Uuid::new_v4(), quest).await.unwrap().is_none());

  assert_eq!(s.list_conditions().await.unwrap().len(), 1);
  assert!(s.delete_condition(condition.id).await.unwrap().is_some());
  assert!(s.get_condition(condition.id).await.unwrap().is_none());
  assert!(s.delete_condition(condition.id).await.unwrap().is_none());
}

// ─── Events ──────────────────────────────────────────────────────────────────

fn january(event_id: &str) -> NewEvent {
  NewEvent::new(
    event_id,
    "January attendance",
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
    Utc.with_ymd_and_hms(2025, 1, 31, 23, 59, 59).unwrap(),
  )
}

#[tokio::test]
async fn insert_event_keeps_reward_order() {
  let s = store().await;
  let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

  let Insertion::Inserted(_) =
    s.insert_event(january("event-001").with_rewards([b, a])).await.unwrap()
  else {
    panic!("expected insert");
  };

  let event = s.get_event("event-001").await.unwrap().unwrap();
  assert_eq!(event.reward_ids, vec![b, a]);
  assert_eq!(event.start_at, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
  assert_eq!(event.category, EventCategory::Attendance);
  assert!(!event.is_active);
}

#[tokio::test]
async fn duplicate_event_id_is_reported() {
  let s = store().await;
  s.insert_event(january("event-001")).await.unwrap();

  let second = s.insert_event(january("event-001")).await.unwrap();
  assert!(matches!(second, Insertion::Duplicate));
  assert_eq!(s.list_events().await.unwrap().len(), 1);
}

#[tokio::test]
async fn find_active_event_skips_inactive() {
  let s = store().await;
  s.insert_event(january("event-001")).await.unwrap();

  assert!(s.get_event("event-001").await.unwrap().is_some());
  assert!(s.find_active_event("event-001").await.unwrap().is_none());

  let reactivated = s.set_event_active("event-001", true).await.unwrap().unwrap();
  assert!(reactivated.is_active);
  assert!(s.find_active_event("event-001").await.unwrap().is_some());
}

#[tokio::test]
async fn update_event_replaces_fields_but_not_the_key() {
  let s = store().await;
  s.insert_event(january("event-001").active()).await.unwrap();
  let condition = s
    .insert_condition(NewCondition::new(EventCategory::Invite, ConditionSubType::InviteCount))
    .await
    .unwrap();

  let mut input = january("ignored").with_conditions([condition.id]);
  input.title = "Invite drive".into();
  input.category = EventCategory::Invite;
  let updated = s.update_event("event-001", input).await.unwrap().unwrap();

  assert_eq!(updated.event_id, "event-001");
  assert_eq!(updated.title, "Invite drive");
  assert_eq!(updated.category, EventCategory::Invite);
  assert_eq!(updated.condition_ids, vec![condition.id]);
  assert!(!updated.is_active);
  assert!(s.get_event("ignored").await.unwrap().is_none());
  assert!(s.update_event("nope", january("nope")).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_event_returns_removed_row() {
  let s = store().await;
  s.insert_event(january("event-001")).await.unwrap();

  let removed = s.delete_event("event-001").await.unwrap().unwrap();
  assert_eq!(removed.event_id, "event-001");
  assert!(s.get_event("event-001").await.unwrap().is_none());
  assert!(s.delete_event("event-001").await.unwrap().is_none());
}

#[tokio::test]
async fn event_window_is_stored_at_column_precision() {
  let s = store().await;
  let mut input = january("event-001");
  input.end_at += Duration::nanoseconds(999_999_999);

  let Insertion::Inserted(event) = s.insert_event(input).await.unwrap() else {
    panic!("expected insert");
  };
  let fetched = s.get_event("event-001").await.unwrap().unwrap();
  assert_eq!(event.end_at, fetched.end_at);
}

#[tokio::test]
async fn set_event_active_missing_returns_none() {
  let s = store().await;
  assert!(s.set_event_active("nope", false).await.unwrap().is_none());
}

// ─── Requests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_request_starts_pending() {
  let s = store().await;
  let id = inserted(&s, "user-001", "event-001").await;

  let request = s.get_request(id).await.unwrap().unwrap();
  assert_eq!(request.status, RewardStatus::Pending);
  assert_eq!(request.reward_snapshot, snapshot(1));
  assert!(request.reason.is_none());
  assert!(request.processed_at.is_none());
}

#[tokio::test]
async fn second_request_for_same_pair_is_duplicate() {
  let s = store().await;
  inserted(&s, "user-001", "event-001").await;

  let again = s.insert_request(new_request("user-001", "event-001")).await.unwrap();
  assert!(matches!(again, Insertion::Duplicate));

  // A different user or event is unaffected.
  inserted(&s, "user-002", "event-001").await;
  inserted(&s, "user-001", "event-002").await;
  assert_eq!(s.list_requests(&RequestQuery::default()).await.unwrap().len(), 3);
}

#[tokio::test]
async fn find_request_by_pair() {
  let s = store().await;
  let id = inserted(&s, "user-001", "event-001").await;

  let found = s.find_request("user-001", "event-001").await.unwrap().unwrap();
  assert_eq!(found.id, id);
  assert!(s.find_request("user-001", "event-002").await.unwrap().is_none());
}

#[tokio::test]
async fn snapshot_survives_reward_update() {
  let s = store().await;
  let reward = s
    .insert_reward(NewReward::new(RewardType::Item, 1).with_item("item-001"))
    .await
    .unwrap();

  let mut input = new_request("user-001", "event-001");
  input.reward_snapshot = RewardSnapshot::from(&reward);
  let Insertion::Inserted(request) = s.insert_request(input).await.unwrap() else {
    panic!("expected insert");
  };

  s.update_reward(reward.id, NewReward::new(RewardType::Item, 99).with_item("item-001"))
    .await
    .unwrap();

  let request = s.get_request(request.id).await.unwrap().unwrap();
  assert_eq!(request.reward_snapshot.quantity, 1);
}

#[tokio::test]
async fn status_update_sets_processed_at_on_success() {
  let s = store().await;
  let id = inserted(&s, "user-001", "event-001").await;

  let failed = s
    .update_request_status(id, RewardStatus::Failed, Some("inventory full".into()))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(failed.status, RewardStatus::Failed);
  assert_eq!(failed.reason.as_deref(), Some("inventory full"));
  assert!(failed.processed_at.is_none());

  let done = s
    .update_request_status(id, RewardStatus::Success, None)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(done.status, RewardStatus::Success);
  // No reason supplied: the stored one is kept.
  assert_eq!(done.reason.as_deref(), Some("inventory full"));
  assert!(done.processed_at.is_some());
}

#[tokio::test]
async fn requested_at_is_returned_as_stored() {
  let s = store().await;
  let mut input = new_request("user-001", "event-001");
  input.requested_at = Utc.with_ymd_and_hms(2025, 1, 15, 1, 2, 3).unwrap()
    + Duration::nanoseconds(123_456_789);

  let Insertion::Inserted(created) = s.insert_request(input).await.unwrap() else {
    panic!("expected insert");
  };
  let fetched = s.get_request(created.id).await.unwrap().unwrap();
  assert_eq!(created.requested_at, fetched.requested_at);
  assert_eq!(created.created_at, fetched.created_at);
}

#[tokio::test]
async fn complete_request_writes_status_and_delivery_together() {
  let s = store().await;
  let id = inserted(&s, "user-001", "event-001").await;
  let at = Utc::now();

  let (request, record) = s
    .complete_request(id, Some("granted".into()), NewDeliveryRecord {
      reward_id: id.to_string(),
      ..delivery("user-001", at)
    })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(request.status, RewardStatus::Success);
  assert_eq!(request.reason.as_deref(), Some("granted"));
  assert!(request.processed_at.is_some());

  let fetched = s.get_delivery(record.id).await.unwrap().unwrap();
  assert_eq!(fetched.reward_id, id.to_string());
  assert_eq!(fetched.delivered_at, record.delivered_at);
}

#[tokio::test]
async fn complete_request_for_missing_request_writes_nothing() {
  let s = store().await;
  let result = s
    .complete_request(Uuid::new_v4(), None, delivery("user-001", Utc::now()))
    .await
    .unwrap();
  assert!(result.is_none());
  assert!(s.list_deliveries(&HistoryQuery::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn status_update_missing_returns_none() {
  let s = store().await;
  let result = s
    .update_request_status(Uuid::new_v4(), RewardStatus::Success, None)
    .await
    .unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn list_requests_filters_and_orders() {
  let s = store().await;
  let first = inserted(&s, "user-001", "event-001").await;
  let second = inserted(&s, "user-001", "event-002").await;
  let _other = inserted(&s, "user-002", "event-001").await;
  s.update_request_status(second, RewardStatus::Success, None).await.unwrap();

  let mine = s.list_requests(&RequestQuery::for_user("user-001")).await.unwrap();
  let ids: Vec<_> = mine.iter().map(|r| r.id).collect();
  assert_eq!(ids, vec![second, first]);

  let pair = s
    .list_requests(&RequestQuery::for_user_and_event("user-001", "event-001"))
    .await
    .unwrap();
  assert_eq!(pair.len(), 1);
  assert_eq!(pair[0].id, first);

  let succeeded = s
    .list_requests(&RequestQuery {
      status: Some(RewardStatus::Success),
      ..RequestQuery::default()
    })
    .await
    .unwrap();
  assert_eq!(succeeded.len(), 1);
  assert_eq!(succeeded[0].id, second);
}

// ─── Delivery history ────────────────────────────────────────────────────────

#[tokio::test]
async fn append_and_get_delivery() {
  let s = store().await;
  let at = Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap();

  let record = s.append_delivery(delivery("user-001", at)).await.unwrap();
  let fetched = s.get_delivery(record.id).await.unwrap().unwrap();
  assert_eq!(fetched.user_id, "user-001");
  assert_eq!(fetched.delivered_at, at);
  assert_eq!(fetched.reward_id, record.reward_id);

  assert!(s.get_delivery(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_deliveries_newest_delivery_first() {
  let s = store().await;
  let base = Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap();

  // Inserted out of order on purpose.
  let middle = s.append_delivery(delivery("user-001", base)).await.unwrap();
  let oldest = s.append_delivery(delivery("user-001", base - Duration::days(3))).await.unwrap();
  let newest = s.append_delivery(delivery("user-001", base + Duration::days(3))).await.unwrap();

  let ids: Vec<_> = s
    .list_deliveries(&HistoryQuery::for_user("user-001"))
    .await
    .unwrap()
    .into_iter()
    .map(|d| d.id)
    .collect();
  assert_eq!(ids, vec![newest.id, middle.id, oldest.id]);
}

#[tokio::test]
async fn list_deliveries_date_bounds_are_inclusive() {
  let s = store().await;
  let base = Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap();

  s.append_delivery(delivery("user-001", base - Duration::days(1))).await.unwrap();
  let inside = s.append_delivery(delivery("user-001", base)).await.unwrap();
  s.append_delivery(delivery("user-002", base + Duration::days(1))).await.unwrap();

  let exact = s
    .list_deliveries(&HistoryQuery::between(base, base))
    .await
    .unwrap();
  assert_eq!(exact.len(), 1);
  assert_eq!(exact[0].id, inside.id);

  let wide = s
    .list_deliveries(&HistoryQuery::between(base - Duration::days(1), base + Duration::days(1)))
    .await
    .unwrap();
  assert_eq!(wide.len(), 3);

  let other_user = s
    .list_deliveries(&HistoryQuery { user_id: Some("user-002".into()), ..HistoryQuery::default() })
    .await
    .unwrap();
  assert_eq!(other_user.len(), 1);
}

#[tokio::test]
async fn reopened_file_store_keeps_data() {
  let dir = std::env::temp_dir().join(format!("promo-store-{}", Uuid::new_v4()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("promo.db");

  let id = {
    let s = SqliteStore::open(&path).await.unwrap();
    inserted(&s, "user-001", "event-001").await
  };

  let s = SqliteStore::open(&path).await.unwrap();
  assert!(s.get_request(id).await.unwrap().is_some());
  drop(s);
  let _ = std::fs::remove_dir_all(&dir);
}
