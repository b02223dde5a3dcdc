use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Charging bay number, 1-based.
pub type SlotId = u32;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SlotStatus {
    Available,
    Reserved,
    Charging,
    Payment,
    /// Kept for manual maintenance marking; no transition leads here.
    Faulty,
}

impl SlotStatus {
    pub const ALL: [SlotStatus; 5] = [
        SlotStatus::Available,
        SlotStatus::Reserved,
        SlotStatus::Charging,
        SlotStatus::Payment,
        SlotStatus::Faulty,
    ];
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SlotStatus::Available => "available",
            SlotStatus::Reserved => "reserved",
            SlotStatus::Charging => "charging",
            SlotStatus::Payment => "payment",
            SlotStatus::Faulty => "faulty",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Truck {
    pub id: uuid::Uuid,
    pub plate: String,
    pub driver: String,
    pub arrival_time: DateTime<Utc>,
}

impl Truck {
    pub fn new(plate: impl Into<String>, driver: impl Into<String>, arrival_time: DateTime<Utc>) -> Self {
        Truck {
            id: uuid::Uuid::new_v4(),
            plate: plate.into(),
            driver: driver.into(),
            arrival_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: SlotId,
    pub status: SlotStatus,
    pub truck: Option<Truck>,
    /// kWh delivered in the current session
    pub energy_used: f64,
    pub session_start: Option<DateTime<Utc>>,
    /// kWh the current session stops at
    pub target_energy: f64,
}

impl Slot {
    pub(crate) fn new(id: SlotId) -> Self {
        Slot {
            id,
            status: SlotStatus::Available,
            truck: None,
            energy_used: 0.0,
            session_start: None,
            target_energy: 0.0,
        }
    }

    /// Put the slot back into its idle state, dropping the truck and session data.
    pub(crate) fn release(&mut self) {
        *self = Slot::new(self.id);
    }

    pub fn is_available(&self) -> bool {
        self.status == SlotStatus::Available
    }

    pub fn holds_truck(&self, truck_id: uuid::Uuid) -> bool {
        self.truck.as_ref().is_some_and(|truck| truck.id == truck_id)
    }

    /// Whether the available/occupied invariant holds for this slot.
    ///
    /// An available slot has no truck and no session data, any other
    /// status always carries a truck.
    pub fn is_consistent(&self) -> bool {
        if self.is_available() {
            self.truck.is_none()
                && self.energy_used == 0.0
                && self.target_energy == 0.0
                && self.session_start.is_none()
        } else {
            self.truck.is_some()
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum BookingStatus {
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: uuid::Uuid,
    pub truck: Truck,
    pub slot_id: Option<SlotId>,
    pub status: BookingStatus,
}

impl Booking {
    pub(crate) fn new(truck: Truck) -> Self {
        Booking {
            id: uuid::Uuid::new_v4(),
            truck,
            slot_id: None,
            status: BookingStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Active
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: uuid::Uuid,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
}

/// Billing summary returned once a session has been paid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub slot_id: SlotId,
    pub truck: Truck,
    pub energy_kwh: f64,
    pub energy_cost: f64,
    pub idle_fee: f64,
    pub total: f64,
}
