mod allocator;
mod clock;
mod config;
mod metrics;
mod models;
mod notifications;
mod scheduler;
mod telemetry;

pub use crate::clock::*;
pub use crate::config::*;
pub use crate::metrics::*;
pub use crate::models::*;
pub use crate::notifications::NotificationLog;
pub use crate::scheduler::{DeferredAction, DeferredTask};
pub use crate::telemetry::*;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scheduler::Scheduler;

#[derive(Error, Debug, PartialEq)]
pub enum StationError {
    #[error("Truck {truck_id} is not waiting in the queue")]
    TruckNotQueued { truck_id: uuid::Uuid },
    #[error("Slot {slot_id} does not exist")]
    SlotNotFound { slot_id: SlotId },
    #[error("Slot {slot_id} cannot {action} while {status}")]
    InvalidTransition {
        slot_id: SlotId,
        status: SlotStatus,
        action: &'static str,
    },
}

/// Point-in-time copy of everything the store holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationSnapshot {
    pub station_name: String,
    pub slots: Vec<Slot>,
    pub queue: Vec<Truck>,
    pub bookings: Vec<Booking>,
    pub notifications: Vec<Notification>,
    pub total_revenue: f64,
    pub total_energy_dispensed: f64,
    pub completed_sessions: u64,
    pub pending_tasks: Vec<DeferredTask>,
}

/// The station state machine.
///
/// Owns the slots, the waiting queue, bookings, the notification feed and
/// the revenue counters. Every operation is synchronous and either applies
/// a full transition or returns an error leaving the state untouched.
pub struct StationStore {
    config: StationConfig,
    slots: Vec<Slot>,
    queue: Vec<Truck>,
    bookings: Vec<Booking>,
    notifications: NotificationLog,
    total_revenue: f64,
    total_energy_dispensed: f64,
    completed_sessions: u64,
    scheduler: Scheduler,
    telemetry: Box<dyn Telemetry>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for StationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StationStore")
            .field("station_name", &self.config.station_name)
            .field("slots", &self.slots)
            .field("queue", &self.queue)
            .field("total_revenue", &self.total_revenue)
            .finish_non_exhaustive()
    }
}

fn delay(ms: u64) -> TimeDelta {
    TimeDelta::milliseconds(ms as i64)
}

fn plate_of(slot: &Slot) -> String {
    slot.truck
        .as_ref()
        .map(|truck| truck.plate.clone())
        .unwrap_or_default()
}

fn initial_slots(count: u32) -> Vec<Slot> {
    (1..=count).map(Slot::new).collect()
}

impl StationStore {
    /// Build a store over `config`, rejecting it when it does not validate.
    pub fn new(
        config: StationConfig,
        telemetry: impl Telemetry + 'static,
        clock: impl Clock + 'static,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(StationStore {
            slots: initial_slots(config.slot_count),
            queue: Vec::new(),
            bookings: Vec::new(),
            notifications: NotificationLog::new(config.notification_capacity),
            total_revenue: 0.0,
            total_energy_dispensed: 0.0,
            completed_sessions: 0,
            scheduler: Scheduler::default(),
            telemetry: Box::new(telemetry),
            clock: Arc::new(clock),
            config,
        })
    }

    /// Store with seeded mock telemetry and the system clock.
    pub fn from_config(config: StationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let telemetry = SeededTelemetry::new(&config);
        Self::new(config, telemetry, SystemClock)
    }

    /// Return to the freshly started state: every slot available, empty
    /// queue, bookings and notifications, zero counters, nothing scheduled.
    pub fn reset(&mut self) {
        tracing::info!("Resetting station {}", self.config.station_name);
        self.slots = initial_slots(self.config.slot_count);
        self.queue.clear();
        self.bookings.clear();
        self.notifications.clear();
        self.total_revenue = 0.0;
        self.total_energy_dispensed = 0.0;
        self.completed_sessions = 0;
        self.scheduler.clear();
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, slot_id: SlotId) -> Result<&Slot, StationError> {
        self.slot_index(slot_id).map(|idx| &self.slots[idx])
    }

    pub fn queue(&self) -> &[Truck] {
        &self.queue
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    /// Most recent booking made for `truck_id`.
    pub fn booking_for(&self, truck_id: uuid::Uuid) -> Option<&Booking> {
        self.bookings.iter().rev().find(|b| b.truck.id == truck_id)
    }

    pub fn notifications(&self) -> &NotificationLog {
        &self.notifications
    }

    pub fn total_revenue(&self) -> f64 {
        self.total_revenue
    }

    pub fn total_energy_dispensed(&self) -> f64 {
        self.total_energy_dispensed
    }

    pub fn completed_sessions(&self) -> u64 {
        self.completed_sessions
    }

    pub fn pending_tasks(&self) -> &[DeferredTask] {
        self.scheduler.pending()
    }

    pub fn snapshot(&self) -> StationSnapshot {
        StationSnapshot {
            station_name: self.config.station_name.clone(),
            slots: self.slots.clone(),
            queue: self.queue.clone(),
            bookings: self.bookings.clone(),
            notifications: self.notifications.iter().cloned().collect(),
            total_revenue: self.total_revenue,
            total_energy_dispensed: self.total_energy_dispensed,
            completed_sessions: self.completed_sessions,
            pending_tasks: self.scheduler.pending().to_vec(),
        }
    }

    pub fn metrics(&self) -> StationMetrics {
        StationMetrics::from_snapshot(&self.snapshot(), self.clock.now())
    }

    fn slot_index(&self, slot_id: SlotId) -> Result<usize, StationError> {
        self.slots
            .iter()
            .position(|slot| slot.id == slot_id)
            .ok_or(StationError::SlotNotFound { slot_id })
    }

    /// Index of `slot_id`, provided it is currently in `expected` status.
    fn slot_in(
        &self,
        slot_id: SlotId,
        expected: SlotStatus,
        action: &'static str,
    ) -> Result<usize, StationError> {
        let idx = self.slot_index(slot_id)?;
        let status = self.slots[idx].status;
        if status != expected {
            return Err(StationError::InvalidTransition {
                slot_id,
                status,
                action,
            });
        }
        Ok(idx)
    }

    fn is_queued(&self, truck_id: uuid::Uuid) -> bool {
        self.queue.iter().any(|truck| truck.id == truck_id)
    }

    fn take_from_queue(&mut self, truck_id: uuid::Uuid) -> Option<Truck> {
        let pos = self.queue.iter().position(|truck| truck.id == truck_id)?;
        Some(self.queue.remove(pos))
    }

    /// Add a notification to the feed, newest first.
    pub fn push_notification(
        &mut self,
        message: impl Into<String>,
        severity: Severity,
    ) -> uuid::Uuid {
        let now = self.clock.now();
        self.notifications.push(message, severity, now).id
    }

    /// Put a truck at the back of the queue and open an active booking for it.
    ///
    /// Returns the booking id.
    pub fn enqueue_truck(&mut self, truck: Truck) -> uuid::Uuid {
        tracing::info!("Truck {} joined the queue", truck.plate);
        let booking = Booking::new(truck.clone());
        let booking_id = booking.id;
        self.push_notification(
            format!("Truck {} arrived and joined queue", truck.plate),
            Severity::Info,
        );
        self.queue.push(truck);
        self.bookings.push(booking);
        booking_id
    }

    /// Remove a waiting truck. Its active booking is cancelled and any
    /// pending auto-assignment for it is dropped.
    pub fn dequeue_truck(&mut self, truck_id: uuid::Uuid) -> Result<Truck, StationError> {
        let Some(truck) = self.take_from_queue(truck_id) else {
            return Err(StationError::TruckNotQueued { truck_id });
        };
        tracing::info!("Truck {} left the queue", truck.plate);

        self.bookings
            .iter_mut()
            .filter(|b| b.is_active() && b.truck.id == truck_id)
            .for_each(|b| b.status = BookingStatus::Cancelled);
        self.scheduler.cancel_for_truck(truck_id);
        Ok(truck)
    }

    /// Move a queued truck onto an available slot, reserving it.
    ///
    /// Charging starts automatically once the promote delay has elapsed
    /// and [`StationStore::run_due_tasks`] is called.
    pub fn assign_slot(&mut self, truck_id: uuid::Uuid, slot_id: SlotId) -> Result<(), StationError> {
        if !self.is_queued(truck_id) {
            return Err(StationError::TruckNotQueued { truck_id });
        }
        let idx = self.slot_in(slot_id, SlotStatus::Available, "assign a truck")?;
        let Some(truck) = self.take_from_queue(truck_id) else {
            return Err(StationError::TruckNotQueued { truck_id });
        };
        tracing::info!("Assigning truck {} to slot {}", truck.plate, slot_id);

        let plate = truck.plate.clone();
        let slot = &mut self.slots[idx];
        slot.status = SlotStatus::Reserved;
        slot.truck = Some(truck);

        self.bookings
            .iter_mut()
            .filter(|b| b.is_active() && b.truck.id == truck_id)
            .for_each(|b| b.slot_id = Some(slot_id));

        self.push_notification(
            format!("Truck {plate} assigned to Slot #{slot_id}"),
            Severity::Success,
        );

        // A pending auto-assignment for this truck is now pointless
        self.scheduler.cancel_for_truck(truck_id);
        let due = self.clock.now() + delay(self.config.simulation.promote_delay_ms);
        self.scheduler
            .schedule(due, DeferredAction::PromoteToCharging { slot_id, truck_id });
        Ok(())
    }

    /// Start a charging session on a reserved slot.
    ///
    /// Returns the target energy drawn for the session.
    pub fn start_charging(&mut self, slot_id: SlotId) -> Result<f64, StationError> {
        let idx = self.slot_in(slot_id, SlotStatus::Reserved, "start charging")?;
        let target_energy = self.telemetry.target_energy();
        let now = self.clock.now();

        let slot = &mut self.slots[idx];
        slot.status = SlotStatus::Charging;
        slot.energy_used = 0.0;
        slot.session_start = Some(now);
        slot.target_energy = target_energy;
        let plate = plate_of(slot);

        tracing::info!(
            "Charging started on slot {} for truck {}, target {:.1} kWh",
            slot_id,
            plate,
            target_energy
        );
        self.push_notification(
            format!("Charging started for Truck {plate} at Slot #{slot_id}"),
            Severity::Success,
        );
        Ok(target_energy)
    }

    /// Stop a charging session. Energy and truck stay on the slot for billing.
    pub fn end_charging(&mut self, slot_id: SlotId) -> Result<(), StationError> {
        let idx = self.slot_in(slot_id, SlotStatus::Charging, "end charging")?;
        let slot = &mut self.slots[idx];
        slot.status = SlotStatus::Payment;
        let plate = plate_of(slot);

        tracing::info!(
            "Charging ended on slot {} after {:.1} kWh",
            slot_id,
            slot.energy_used
        );
        self.push_notification(
            format!("Charging completed for Truck {plate}, payment required"),
            Severity::Warning,
        );
        Ok(())
    }

    /// Bill the session on a slot awaiting payment and free the slot.
    pub fn process_payment(&mut self, slot_id: SlotId) -> Result<Receipt, StationError> {
        let idx = self.slot_in(slot_id, SlotStatus::Payment, "process payment")?;
        let slot = &self.slots[idx];
        let Some(truck) = slot.truck.clone() else {
            return Err(StationError::InvalidTransition {
                slot_id,
                status: slot.status,
                action: "process payment",
            });
        };

        let energy = slot.energy_used;
        let pricing = self.config.pricing;
        let receipt = Receipt {
            slot_id,
            truck,
            energy_kwh: energy,
            energy_cost: pricing.energy_cost(energy),
            idle_fee: pricing.idle_fee,
            total: pricing.total(energy),
        };
        tracing::info!(
            "Payment of {:.2} received for slot {} ({:.1} kWh)",
            receipt.total,
            slot_id,
            energy
        );

        self.total_revenue += receipt.total;
        self.total_energy_dispensed += energy;
        self.completed_sessions += 1;

        let truck_id = receipt.truck.id;
        self.bookings
            .iter_mut()
            .filter(|b| b.is_active() && b.truck.id == truck_id)
            .for_each(|b| b.status = BookingStatus::Completed);

        self.slots[idx].release();

        self.push_notification(
            format!(
                "Payment received from Truck {}, Slot #{slot_id} now available",
                receipt.truck.plate
            ),
            Severity::Success,
        );
        Ok(receipt)
    }

    /// One progress tick: every charging slot receives an energy increment,
    /// clamped to its target. Slots reaching their target move to payment.
    ///
    /// Returns the ids of the slots that finished on this tick.
    pub fn advance_simulation(&mut self) -> Vec<SlotId> {
        let mut finished = Vec::new();
        for idx in 0..self.slots.len() {
            if self.slots[idx].status != SlotStatus::Charging {
                continue;
            }
            let increment = self.telemetry.energy_increment();
            let slot = &mut self.slots[idx];
            slot.energy_used = (slot.energy_used + increment).min(slot.target_energy);
            tracing::debug!(
                "Slot {} at {:.1}/{:.1} kWh",
                slot.id,
                slot.energy_used,
                slot.target_energy
            );

            let slot_id = slot.id;
            if slot.energy_used >= slot.target_energy && self.end_charging(slot_id).is_ok() {
                finished.push(slot_id);
            }
        }
        finished
    }

    /// Generate a truck at the gate and queue it. The truck is auto-assigned
    /// to the first available slot once the auto-assign delay has elapsed,
    /// otherwise it waits for manual assignment.
    pub fn simulate_arrival(&mut self) -> Truck {
        let now = self.clock.now();
        let driver = self.telemetry.driver_name();
        let plate = self.telemetry.plate();
        let truck = Truck::new(plate, driver, now);

        self.enqueue_truck(truck.clone());
        let due = now + delay(self.config.simulation.auto_assign_delay_ms);
        self.scheduler
            .schedule(due, DeferredAction::AutoAssign { truck_id: truck.id });
        truck
    }

    /// Drop every pending deferred action for `truck_id`.
    pub fn cancel_pending_for(&mut self, truck_id: uuid::Uuid) -> usize {
        self.scheduler.cancel_for_truck(truck_id)
    }

    /// Apply the deferred actions whose due time has passed.
    ///
    /// Each action is re-validated against the current state first; stale
    /// ones are discarded. Returns the number of actions applied.
    pub fn run_due_tasks(&mut self) -> usize {
        let now = self.clock.now();
        let mut applied = 0;
        for task in self.scheduler.take_due(now) {
            match self.apply_deferred(&task.action) {
                Ok(()) => applied += 1,
                Err(error) => {
                    tracing::warn!("Dropping stale deferred task {}: {}", task.id, error)
                }
            }
        }
        applied
    }

    fn apply_deferred(&mut self, action: &DeferredAction) -> Result<(), StationError> {
        match *action {
            DeferredAction::PromoteToCharging { slot_id, truck_id } => {
                let slot = self.slot(slot_id)?;
                if slot.status != SlotStatus::Reserved || !slot.holds_truck(truck_id) {
                    return Err(StationError::InvalidTransition {
                        slot_id,
                        status: slot.status,
                        action: "start charging",
                    });
                }
                self.start_charging(slot_id).map(|_| ())
            }
            DeferredAction::AutoAssign { truck_id } => {
                if !self.is_queued(truck_id) {
                    return Err(StationError::TruckNotQueued { truck_id });
                }
                match allocator::first_available(&self.slots) {
                    Some(slot_id) => self.assign_slot(truck_id, slot_id),
                    None => {
                        tracing::info!("No slot available, truck {} stays queued", truck_id);
                        Ok(())
                    }
                }
            }
        }
    }
}
