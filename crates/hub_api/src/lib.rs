//! Highway Hub API Library
//!
//! This library provides the HTTP API over the charging station store.

mod auth;
mod error;
mod queue;
mod slots;
mod station;

pub use error::ErrorResponse;

use axum::{
    Router,
    routing::{delete, get, post},
};
use hub_engine::SharedStore;
use tower_http::trace::TraceLayer;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Create the application router with all endpoints
pub fn create_app(store: SharedStore) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/login", post(auth::login))
        .route("/station/config", get(station::get_station_config))
        .route("/station/status", get(station::get_station_status))
        .route("/station/metrics", get(station::get_station_metrics))
        .route("/notifications", get(station::list_notifications))
        .route("/queue", post(queue::enqueue_truck))
        .route("/queue/{truck_id}", delete(queue::dequeue_truck))
        .route("/slots/{slot_id}/assign", post(slots::assign_slot))
        .route("/slots/{slot_id}/start", post(slots::start_charging))
        .route("/slots/{slot_id}/end", post(slots::end_charging))
        .route("/slots/{slot_id}/payment", post(slots::process_payment))
        .route("/simulation/arrival", post(station::simulate_arrival))
        .route("/simulation/reset", post(station::reset_station))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::TimeDelta;
    use hub_core::{
        BookingStatus, ManualClock, ScriptedTelemetry, SlotStatus, StationConfig,
        StationMetrics, StationSnapshot, StationStore,
    };
    use tower::util::ServiceExt;

    pub fn create_test_app() -> Router {
        Router::new().route("/health", get(health_check))
    }

    fn test_store() -> (SharedStore, ManualClock) {
        let clock = ManualClock::default();
        let store = StationStore::new(
            StationConfig::default(),
            ScriptedTelemetry::new(50.0, vec![2.5]),
            clock.clone(),
        )
        .expect("Could not create station store");
        (hub_engine::shared(store), clock)
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method(method)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method(method)
            .body(Body::empty())
            .unwrap()
    }

    async fn read_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_integration_full_session() {
        let (store, clock) = test_store();
        let app = create_app(store.clone());

        // Truck arrives
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/queue",
                serde_json::json!({ "plate": "A2-123", "driver": "Dawit" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let enqueued = read_json(response).await;
        let truck_id = enqueued["truck"]["id"].as_str().unwrap().to_string();

        // Operator assigns slot 3
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/slots/3/assign",
                serde_json::json!({ "truckId": truck_id }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let assigned = read_json(response).await;
        assert_eq!(assigned["slot"]["status"], "reserved");

        // The reservation turns into a charging session after the delay
        clock.advance(TimeDelta::seconds(2));
        assert_eq!(store.lock().run_due_tasks(), 1);
        while store.lock().slot(3).unwrap().status == SlotStatus::Charging {
            store.lock().advance_simulation();
        }

        let response = app
            .clone()
            .oneshot(empty_request("POST", "/slots/3/payment"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let payment = read_json(response).await;
        assert_eq!(payment["receipt"]["total"], 14.5);
        assert_eq!(payment["receipt"]["energyKwh"], 50.0);

        let response = app
            .clone()
            .oneshot(empty_request("GET", "/station/status"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let status: StationSnapshot = serde_json::from_slice(&body).unwrap();
        assert_eq!(status.total_revenue, 14.5);
        assert_eq!(status.total_energy_dispensed, 50.0);
        assert_eq!(status.bookings[0].status, BookingStatus::Completed);
        assert!(status.slots.iter().all(|slot| slot.is_available()));

        let response = app
            .oneshot(empty_request("GET", "/station/metrics"))
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let metrics: StationMetrics = serde_json::from_slice(&body).unwrap();
        assert_eq!(metrics.completed_sessions, 1);
        assert_eq!(metrics.average_revenue_per_session, 14.5);
        assert_eq!(metrics.utilization_percent, 0);
    }

    #[tokio::test]
    async fn test_integration_dequeue_then_assign() {
        let (store, _) = test_store();
        let app = create_app(store);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/queue",
                serde_json::json!({ "plate": "A2-124", "driver": "Henok" }),
            ))
            .await
            .unwrap();
        let enqueued = read_json(response).await;
        let truck_id = enqueued["truck"]["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(empty_request("DELETE", &format!("/queue/{}", truck_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(json_request(
                "POST",
                "/slots/1/assign",
                serde_json::json!({ "truckId": truck_id }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
