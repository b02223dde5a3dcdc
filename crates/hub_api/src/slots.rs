use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use hub_core::{Receipt, Slot, SlotId, StationError, StationStore};
use hub_engine::SharedStore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::station_error_to_response;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignSlotRequest {
    pub truck_id: Uuid,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotResponse {
    pub slot: Slot,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub receipt: Receipt,
}

/// Run `operation` against the store and answer with the slot as it ends up.
fn slot_operation(
    store: &SharedStore,
    slot_id: SlotId,
    operation: impl FnOnce(&mut StationStore) -> Result<(), StationError>,
) -> axum::response::Response {
    let mut state = store.lock();
    let result = operation(&mut *state).and_then(|()| state.slot(slot_id).cloned());
    match result {
        Ok(slot) => (StatusCode::OK, Json(SlotResponse { slot })).into_response(),
        Err(error) => station_error_to_response(error).into_response(),
    }
}

/// Assign a queued truck to a slot
pub async fn assign_slot(
    State(store): State<SharedStore>,
    Path(slot_id): Path<SlotId>,
    Json(payload): Json<AssignSlotRequest>,
) -> impl IntoResponse {
    slot_operation(&store, slot_id, |state| {
        state.assign_slot(payload.truck_id, slot_id)
    })
}

/// Start charging on a reserved slot
pub async fn start_charging(
    State(store): State<SharedStore>,
    Path(slot_id): Path<SlotId>,
) -> impl IntoResponse {
    slot_operation(&store, slot_id, |state| {
        state.start_charging(slot_id).map(|_| ())
    })
}

/// End the charging session, the slot then waits for payment
pub async fn end_charging(
    State(store): State<SharedStore>,
    Path(slot_id): Path<SlotId>,
) -> impl IntoResponse {
    slot_operation(&store, slot_id, |state| state.end_charging(slot_id))
}

/// Settle the session on a slot and release it
pub async fn process_payment(
    State(store): State<SharedStore>,
    Path(slot_id): Path<SlotId>,
) -> impl IntoResponse {
    let mut state = store.lock();
    match state.process_payment(slot_id) {
        Ok(receipt) => (StatusCode::OK, Json(PaymentResponse { receipt })).into_response(),
        Err(error) => station_error_to_response(error).into_response(),
    }
}
