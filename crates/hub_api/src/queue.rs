use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use hub_core::Truck;
use hub_engine::SharedStore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{error_response, station_error_to_response};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueTruckRequest {
    pub plate: String,
    pub driver: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueTruckResponse {
    pub truck: Truck,
    pub booking_id: Uuid,
}

/// Register a truck at the gate and put it in the queue
pub async fn enqueue_truck(
    State(store): State<SharedStore>,
    Json(payload): Json<EnqueueTruckRequest>,
) -> impl IntoResponse {
    let plate = payload.plate.trim();
    let driver = payload.driver.trim();
    if plate.is_empty() || driver.is_empty() {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Plate and driver are required",
        )
        .into_response();
    }

    let mut state = store.lock();
    let truck = Truck::new(plate, driver, state.now());
    let booking_id = state.enqueue_truck(truck.clone());
    (
        StatusCode::CREATED,
        Json(EnqueueTruckResponse { truck, booking_id }),
    )
        .into_response()
}

/// Remove a waiting truck from the queue
pub async fn dequeue_truck(
    State(store): State<SharedStore>,
    Path(truck_id): Path<Uuid>,
) -> impl IntoResponse {
    let mut state = store.lock();
    match state.dequeue_truck(truck_id) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => station_error_to_response(error).into_response(),
    }
}
