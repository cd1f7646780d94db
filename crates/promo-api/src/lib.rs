//! JSON REST API for the promotions service.
//!
//! Exposes axum [`Router`]s backed by any [`promo_core::store::PromoStore`].
//! Routes are split in two: [`public_router`] is what end users call,
//! [`admin_router`] is for operators. Authentication and transport concerns
//! are the caller's responsibility; the server guards the admin router
//! before merging.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = promo_api::public_router(store.clone())
//!   .merge(promo_api::admin_router(store).route_layer(guard));
//! ```

pub mod conditions;
pub mod error;
pub mod events;
pub mod history;
pub mod requests;
pub mod rewards;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch, post, put},
};
use promo_core::{
  catalog::Catalog, orchestrator::RequestOrchestrator, store::PromoStore,
};

pub use error::ApiError;

/// Shared handler state. Both halves share one store.
pub struct ApiState<S> {
  pub catalog:  Catalog<S>,
  pub requests: RequestOrchestrator<S>,
}

impl<S: PromoStore> ApiState<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self {
      catalog:  Catalog::new(Arc::clone(&store)),
      requests: RequestOrchestrator::new(store),
    }
  }
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { catalog: self.catalog.clone(), requests: self.requests.clone() }
  }
}

/// Routes open to end users: claiming rewards and reading one's own
/// requests, history and the catalog.
pub fn public_router<S>(store: Arc<S>) -> Router<()>
where
  S: PromoStore + 'static,
{
  Router::new()
    // Reward requests
    .route("/user-event-rewards", post(requests::create::<S>))
    .route("/user-event-rewards/user/{user_id}", get(requests::list_for_user::<S>))
    .route(
      "/user-event-rewards/user/{user_id}/event/{event_id}",
      get(requests::list_for_user_event::<S>),
    )
    .route("/user-event-rewards/{id}", get(requests::get_one::<S>))
    // Delivery history
    .route(
      "/user-event-reward-history/user/{user_id}",
      get(history::list_for_user::<S>),
    )
    .route(
      "/user-event-reward-history/user/{user_id}/event/{event_id}",
      get(history::list_for_user_event::<S>),
    )
    // Catalog
    .route("/rewards", get(rewards::list::<S>))
    .route("/rewards/{id}", get(rewards::get_one::<S>))
    .route("/conditions", get(conditions::list::<S>))
    .route("/conditions/{id}", get(conditions::get_one::<S>))
    .route("/events", get(events::list::<S>))
    .route("/events/{event_id}", get(events::get_one::<S>))
    .with_state(ApiState::new(store))
}

/// Operator routes: status changes, unfiltered listings, manual grants and
/// catalog edits.
pub fn admin_router<S>(store: Arc<S>) -> Router<()>
where
  S: PromoStore + 'static,
{
  Router::new()
    // Reward requests
    .route("/user-event-rewards", get(requests::list::<S>))
    .route("/user-event-rewards/{id}/status", patch(requests::update_status::<S>))
    // Delivery history
    .route(
      "/user-event-reward-history",
      get(history::list::<S>).post(history::create::<S>),
    )
    .route("/user-event-reward-history/{id}", get(history::get_one::<S>))
    // Catalog
    .route("/rewards", post(rewards::create::<S>))
    .route(
      "/rewards/{id}",
      put(rewards::update::<S>).delete(rewards::delete::<S>),
    )
    .route("/conditions", post(conditions::create::<S>))
    .route(
      "/conditions/{id}",
      put(conditions::update::<S>).delete(conditions::delete::<S>),
    )
    .route("/events", post(events::create::<S>))
    .route(
      "/events/{event_id}",
      put(events::replace::<S>)
        .patch(events::patch::<S>)
        .delete(events::delete::<S>),
    )
    .route("/events/{event_id}/activate", patch(events::activate::<S>))
    .route("/events/{event_id}/deactivate", patch(events::deactivate::<S>))
    .with_state(ApiState::new(store))
}

/// Both routers merged with no guard in front of the admin routes.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: PromoStore + 'static,
{
  public_router(Arc::clone(&store)).merge(admin_router(store))
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use promo_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;

  async fn app() -> Router {
    let store = SqliteStore::open_in_memory().await.expect("in-memory store");
    api_router(Arc::new(store))
  }

  async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(json) => {
        builder = builder.header("content-type", "application/json");
        Body::from(json.to_string())
      }
      None => Body::empty(),
    };
    let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  /// A reward plus an event that is open right now.
  async fn seed(app: &Router) -> String {
    let (status, reward) = call(
      app,
      "POST",
      "/rewards",
      Some(json!({ "type": "item", "quantity": 1, "itemId": "item-001" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let reward_id = reward["id"].as_str().unwrap().to_owned();

    let now = chrono::Utc::now();
    let (status, _) = call(
      app,
      "POST",
      "/events",
      Some(json!({
        "eventId": "event-001",
        "title": "Attendance",
        "category": "attendance",
        "startAt": now - chrono::Duration::days(1),
        "endAt": now + chrono::Duration::days(1),
        "isActive": true,
        "rewardIds": [reward_id],
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    reward_id
  }

  fn claim(user_id: &str) -> Value {
    json!({
      "userId": user_id,
      "eventId": "event-001",
      "trigger": "manual",
      "deliveryType": "manual_claim",
    })
  }

  #[tokio::test]
  async fn claim_then_conflict() {
    let app = app().await;
    seed(&app).await;

    let (status, body) = call(&app, "POST", "/user-event-rewards", Some(claim("user-001"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["rewardSnapshot"]["type"], "item");
    assert_eq!(body["rewardSnapshot"]["itemId"], "item-001");

    let (status, body) = call(&app, "POST", "/user-event-rewards", Some(claim("user-001"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
    assert!(body["timestamp"].is_string());
  }

  #[tokio::test]
  async fn claim_for_unknown_event_is_404() {
    let app = app().await;
    let (status, body) = call(&app, "POST", "/user-event-rewards", Some(claim("user-001"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "RESOURCE_NOT_FOUND");
  }

  #[tokio::test]
  async fn malformed_claims_are_invalid_requests() {
    let app = app().await;

    let mut bad_enum = claim("user-001");
    bad_enum["trigger"] = json!("whenever");
    let (status, body) = call(&app, "POST", "/user-event-rewards", Some(bad_enum)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");

    let (status, body) = call(&app, "POST", "/user-event-rewards", Some(claim(""))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");
  }

  #[tokio::test]
  async fn success_status_writes_history() {
    let app = app().await;
    seed(&app).await;
    let (_, request) = call(&app, "POST", "/user-event-rewards", Some(claim("user-001"))).await;
    let id = request["id"].as_str().unwrap();

    let (status, body) = call(
      &app,
      "PATCH",
      &format!("/user-event-rewards/{id}/status"),
      Some(json!({ "status": "success" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert!(body["processedAt"].is_string());

    let (status, history) =
      call(&app, "GET", "/user-event-reward-history/user/user-001/event/event-001", None).await;
    assert_eq!(status, StatusCode::OK);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["rewardId"], id);
    assert_eq!(history[0]["quantity"], 1);

    let record_id = history[0]["id"].as_str().unwrap();
    let (status, _) =
      call(&app, "GET", &format!("/user-event-reward-history/{record_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
  }

  #[tokio::test]
  async fn unknown_status_value_is_rejected() {
    let app = app().await;
    seed(&app).await;
    let (_, request) = call(&app, "POST", "/user-event-rewards", Some(claim("user-001"))).await;
    let id = request["id"].as_str().unwrap();

    let (status, _) = call(
      &app,
      "PATCH",
      &format!("/user-event-rewards/{id}/status"),
      Some(json!({ "status": "shipped" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, "GET", "/user-event-rewards?status=shipped", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn malformed_ids_are_404() {
    let app = app().await;
    for uri in ["/user-event-rewards/nope", "/user-event-reward-history/nope", "/rewards/nope"] {
      let (status, body) = call(&app, "GET", uri, None).await;
      assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
      assert_eq!(body["code"], "RESOURCE_NOT_FOUND");
    }
  }

  #[tokio::test]
  async fn admin_listing_filters_by_status() {
    let app = app().await;
    seed(&app).await;
    call(&app, "POST", "/user-event-rewards", Some(claim("user-001"))).await;
    let (_, second) = call(&app, "POST", "/user-event-rewards", Some(claim("user-002"))).await;
    let id = second["id"].as_str().unwrap();
    call(
      &app,
      "PATCH",
      &format!("/user-event-rewards/{id}/status"),
      Some(json!({ "status": "failed", "reason": "inventory full" })),
    )
    .await;

    let (_, all) = call(&app, "GET", "/user-event-rewards", None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, failed) = call(&app, "GET", "/user-event-rewards?status=failed&eventId=event-001", None).await;
    let failed = failed.as_array().unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0]["reason"], "inventory full");

    let (_, mine) = call(&app, "GET", "/user-event-rewards/user/user-001", None).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn manual_grant_defaults_timestamps() {
    let app = app().await;
    let (status, body) = call(
      &app,
      "POST",
      "/user-event-reward-history",
      Some(json!({
        "userId": "user-001",
        "eventId": "event-001",
        "rewardId": "reward-abc123",
        "quantity": 10,
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["deliveredAt"].is_string());
    assert_eq!(body["requestedAt"], body["deliveredAt"]);

    let (status, _) = call(
      &app,
      "POST",
      "/user-event-reward-history",
      Some(json!({ "userId": "user-001", "eventId": "event-001", "rewardId": "r", "quantity": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn history_date_range_filter() {
    let app = app().await;
    for (reward_id, at) in [("a", "2025-01-05T00:00:00Z"), ("b", "2025-02-05T00:00:00Z")] {
      call(
        &app,
        "POST",
        "/user-event-reward-history",
        Some(json!({
          "userId": "user-001",
          "eventId": "event-001",
          "rewardId": reward_id,
          "quantity": 1,
          "deliveredAt": at,
        })),
      )
      .await;
    }

    let (status, january) = call(
      &app,
      "GET",
      "/user-event-reward-history?startDate=2025-01-01T00:00:00Z&endDate=2025-01-31T23:59:59Z",
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let january = january.as_array().unwrap();
    assert_eq!(january.len(), 1);
    assert_eq!(january[0]["rewardId"], "a");

    let (status, _) =
      call(&app, "GET", "/user-event-reward-history?startDate=yesterday&endDate=today", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn catalog_lifecycle() {
    let app = app().await;
    let reward_id = seed(&app).await;

    let (status, updated) = call(
      &app,
      "PUT",
      &format!("/rewards/{reward_id}"),
      Some(json!({ "type": "item", "quantity": 99, "itemId": "item-001" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["quantity"], 99);

    let (status, _) = call(
      &app,
      "POST",
      "/rewards",
      Some(json!({ "type": "item", "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, event) = call(&app, "PATCH", "/events/event-001/deactivate", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(event["isActive"], false);

    let (status, _) = call(&app, "POST", "/user-event-rewards", Some(claim("user-001"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, event) = call(&app, "GET", "/events/event-001", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(event["rewardIds"][0], reward_id.as_str());

    let (status, deleted) = call(&app, "DELETE", &format!("/rewards/{reward_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["id"], reward_id.as_str());
    let (status, _) = call(&app, "GET", &format!("/rewards/{reward_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn duplicate_event_is_409() {
    let app = app().await;
    seed(&app).await;
    let (status, body) = call(
      &app,
      "POST",
      "/events",
      Some(json!({
        "eventId": "event-001",
        "title": "Again",
        "category": "attendance",
        "startAt": "2025-01-01T00:00:00Z",
        "endAt": "2025-01-31T00:00:00Z",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
  }

  #[tokio::test]
  async fn events_start_inactive_unless_asked() {
    let app = app().await;
    let (status, event) = call(
      &app,
      "POST",
      "/events",
      Some(json!({
        "eventId": "event-quiet",
        "title": "Quiet",
        "category": "quest",
        "startAt": "2025-01-01T00:00:00Z",
        "endAt": "2025-01-31T00:00:00Z",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(event["isActive"], false);
    assert_eq!(event["category"], "quest");
    assert_eq!(event["conditionIds"], json!([]));

    let (status, _) = call(
      &app,
      "POST",
      "/events",
      Some(json!({
        "eventId": "event-nocat",
        "title": "No category",
        "startAt": "2025-01-01T00:00:00Z",
        "endAt": "2025-01-31T00:00:00Z",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn event_edit_routes() {
    let app = app().await;
    let reward_id = seed(&app).await;

    let (status, patched) = call(
      &app,
      "PATCH",
      "/events/event-001",
      Some(json!({ "title": "Renamed", "category": "invite" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["title"], "Renamed");
    assert_eq!(patched["category"], "invite");
    assert_eq!(patched["isActive"], true);
    assert_eq!(patched["rewardIds"][0], reward_id.as_str());

    let (status, body) = call(
      &app,
      "PATCH",
      "/events/event-001",
      Some(json!({ "startAt": "2999-01-01T00:00:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");

    let (status, replaced) = call(
      &app,
      "PUT",
      "/events/event-001",
      Some(json!({
        "eventId": "event-001",
        "title": "Replaced",
        "category": "attendance",
        "startAt": "2025-01-01T00:00:00Z",
        "endAt": "2025-01-31T00:00:00Z",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replaced["title"], "Replaced");
    assert_eq!(replaced["isActive"], false);
    assert_eq!(replaced["rewardIds"], json!([]));

    let (status, _) = call(
      &app,
      "PUT",
      "/events/event-001",
      Some(json!({
        "eventId": "event-999",
        "title": "Renamed key",
        "category": "attendance",
        "startAt": "2025-01-01T00:00:00Z",
        "endAt": "2025-01-31T00:00:00Z",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, deleted) = call(&app, "DELETE", "/events/event-001", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["eventId"], "event-001");
    let (status, _) = call(&app, "GET", "/events/event-001", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, "PATCH", "/events/event-001", Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn conditions_lifecycle() {
    let app = app().await;

    let (status, condition) = call(
      &app,
      "POST",
      "/conditions",
      Some(json!({ "category": "attendance", "subType": "total_days", "target": "3" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(condition["subType"], "total_days");
    let condition_id = condition["id"].as_str().unwrap().to_owned();

    let (status, _) = call(
      &app,
      "POST",
      "/conditions",
      Some(json!({ "category": "attendance", "subType": "forever" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, event) = call(
      &app,
      "POST",
      "/events",
      Some(json!({
        "eventId": "event-streak",
        "title": "Streak",
        "category": "attendance",
        "startAt": "2025-01-01T00:00:00Z",
        "endAt": "2025-01-31T00:00:00Z",
        "conditionIds": [condition_id],
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(event["conditionIds"][0], condition_id.as_str());

    let unknown = uuid::Uuid::new_v4();
    let (status, _) = call(
      &app,
      "POST",
      "/events",
      Some(json!({
        "eventId": "event-ghost",
        "title": "Ghost",
        "category": "attendance",
        "startAt": "2025-01-01T00:00:00Z",
        "endAt": "2025-01-31T00:00:00Z",
        "conditionIds": [unknown],
      })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = call(
      &app,
      "PUT",
      &format!("/conditions/{condition_id}"),
      Some(json!({ "category": "attendance", "subType": "consecutive_days", "target": "7" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["target"], "7");

    let (status, list) = call(&app, "GET", "/conditions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = call(&app, "DELETE", &format!("/conditions/{condition_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(&app, "GET", &format!("/conditions/{condition_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "RESOURCE_NOT_FOUND");
    let (status, _) = call(&app, "GET", "/conditions/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn claim_response_matches_later_read() {
    let app = app().await;
    seed(&app).await;

    let mut body = claim("user-001");
    body["requestedAt"] = json!("2025-01-15T01:02:03.123456789Z");
    let (status, created) = call(&app, "POST", "/user-event-rewards", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);

    let id = created["id"].as_str().unwrap();
    let (status, fetched) = call(&app, "GET", &format!("/user-event-rewards/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["requestedAt"], fetched["requestedAt"]);
  }
}
