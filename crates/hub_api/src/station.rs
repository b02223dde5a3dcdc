use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use hub_core::{Notification, StationConfig, StationMetrics, StationSnapshot};
use hub_engine::SharedStore;

/// Get current station configuration
pub async fn get_station_config(State(store): State<SharedStore>) -> Json<StationConfig> {
    tracing::info!("Getting station configuration");
    let config = store.lock().config().clone();
    Json(config)
}

/// Get the full station state: slots, queue, bookings, notifications and counters
pub async fn get_station_status(State(store): State<SharedStore>) -> Json<StationSnapshot> {
    tracing::info!("Getting station status");
    let snapshot = store.lock().snapshot();
    Json(snapshot)
}

/// Get the derived dashboard values
pub async fn get_station_metrics(State(store): State<SharedStore>) -> Json<StationMetrics> {
    let metrics = store.lock().metrics();
    Json(metrics)
}

/// Get the notification feed, newest first
pub async fn list_notifications(State(store): State<SharedStore>) -> Json<Vec<Notification>> {
    let notifications = store.lock().notifications().iter().cloned().collect();
    Json(notifications)
}

/// Generate a truck arrival as the simulation would
pub async fn simulate_arrival(State(store): State<SharedStore>) -> impl IntoResponse {
    let truck = store.lock().simulate_arrival();
    tracing::info!("Manual arrival simulated for truck {}", truck.plate);
    (StatusCode::CREATED, Json(truck))
}

/// Return the station to its start-up state
pub async fn reset_station(State(store): State<SharedStore>) -> StatusCode {
    store.lock().reset();
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::Request,
        routing::{get, post},
    };
    use hub_core::{ManualClock, SeededTelemetry, StationStore, Truck};
    use tower::util::ServiceExt;

    /// Create the application router with station endpoints
    pub fn create_app(store: SharedStore) -> Router {
        Router::new()
            .route("/station/config", get(get_station_config))
            .route("/station/status", get(get_station_status))
            .route("/station/metrics", get(get_station_metrics))
            .route("/notifications", get(list_notifications))
            .route("/simulation/arrival", post(simulate_arrival))
            .route("/simulation/reset", post(reset_station))
            .with_state(store)
    }

    fn test_store() -> SharedStore {
        let config = StationConfig {
            station_name: "TEST_STATION".into(),
            slot_count: 4,
            ..StationConfig::default()
        };
        let telemetry = SeededTelemetry::with_seed(&config, 1);
        let store = StationStore::new(config, telemetry, ManualClock::default())
            .expect("Could not create station store");
        hub_engine::shared(store)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(app: Router, uri: &str) -> T {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_config_endpoint() {
        let app = create_app(test_store());
        let config: StationConfig = get_json(app, "/station/config").await;
        assert_eq!(config.station_name, "TEST_STATION");
        assert_eq!(config.slot_count, 4);
    }

    #[tokio::test]
    async fn test_station_status_endpoint_empty() {
        let app = create_app(test_store());
        let status: StationSnapshot = get_json(app, "/station/status").await;
        assert_eq!(status.slots.len(), 4);
        assert!(status.queue.is_empty());
        assert!(status.bookings.is_empty());
        assert_eq!(status.total_revenue, 0.0);
    }

    #[tokio::test]
    async fn test_station_status_endpoint_with_queue() {
        let store = test_store();
        {
            let mut guard = store.lock();
            let truck = Truck::new("A2-111", "Dawit", guard.now());
            guard.enqueue_truck(truck.clone());
            guard.assign_slot(truck.id, 2).unwrap();
            let now = guard.now();
            guard.enqueue_truck(Truck::new("A2-112", "Tsion", now));
        }
        let app = create_app(store);

        let status: StationSnapshot = get_json(app.clone(), "/station/status").await;
        assert_eq!(status.queue.len(), 1);
        assert_eq!(status.queue[0].plate, "A2-112");
        assert_eq!(status.slots[1].truck.as_ref().unwrap().plate, "A2-111");
        assert_eq!(status.pending_tasks.len(), 1);

        let metrics: StationMetrics = get_json(app.clone(), "/station/metrics").await;
        assert_eq!(metrics.utilization_percent, 25);
        assert_eq!(metrics.queue_length, 1);

        let notifications: Vec<Notification> = get_json(app, "/notifications").await;
        assert_eq!(notifications.len(), 3);
        assert!(notifications[0].message.contains("A2-112"));
    }

    #[tokio::test]
    async fn test_simulate_arrival_and_reset() {
        let store = test_store();
        let app = create_app(store.clone());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/simulation/arrival")
                    .method("POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let truck: Truck = serde_json::from_slice(&body).unwrap();
        assert!(truck.plate.starts_with("A2-"));
        assert_eq!(store.lock().queue().len(), 1);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/simulation/reset")
                    .method("POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(store.lock().queue().is_empty());
        assert!(store.lock().pending_tasks().is_empty());
    }
}
