use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::StationSnapshot;
use crate::models::{BookingStatus, Slot, SlotStatus};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub available: usize,
    pub reserved: usize,
    pub charging: usize,
    pub payment: usize,
    pub faulty: usize,
}

impl StatusCounts {
    fn from_slots(slots: &[Slot]) -> Self {
        let mut counts = StatusCounts::default();
        for slot in slots {
            match slot.status {
                SlotStatus::Available => counts.available += 1,
                SlotStatus::Reserved => counts.reserved += 1,
                SlotStatus::Charging => counts.charging += 1,
                SlotStatus::Payment => counts.payment += 1,
                SlotStatus::Faulty => counts.faulty += 1,
            }
        }
        counts
    }

    pub fn get(&self, status: SlotStatus) -> usize {
        match status {
            SlotStatus::Available => self.available,
            SlotStatus::Reserved => self.reserved,
            SlotStatus::Charging => self.charging,
            SlotStatus::Payment => self.payment,
            SlotStatus::Faulty => self.faulty,
        }
    }
}

/// Display values derived from a station snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StationMetrics {
    pub total_slots: usize,
    pub status_counts: StatusCounts,
    pub queue_length: usize,
    /// Active bookings that already have a slot
    pub active_bookings: usize,
    /// Share of slots not available, in [0, 1]
    pub utilization: f64,
    pub utilization_percent: u32,
    /// Mean elapsed minutes across charging slots, 0 when none charge
    pub average_charging_minutes: f64,
    pub total_revenue: f64,
    pub total_energy_dispensed: f64,
    pub completed_sessions: u64,
    pub average_revenue_per_session: f64,
}

impl StationMetrics {
    pub fn from_snapshot(snapshot: &StationSnapshot, now: DateTime<Utc>) -> Self {
        let total_slots = snapshot.slots.len();
        let status_counts = StatusCounts::from_slots(&snapshot.slots);
        let utilization = utilization(&snapshot.slots);

        let active_bookings = snapshot
            .bookings
            .iter()
            .filter(|b| b.status == BookingStatus::Active && b.slot_id.is_some())
            .count();

        let average_revenue_per_session = if snapshot.completed_sessions == 0 {
            0.0
        } else {
            snapshot.total_revenue / snapshot.completed_sessions as f64
        };

        StationMetrics {
            total_slots,
            status_counts,
            queue_length: snapshot.queue.len(),
            active_bookings,
            utilization,
            utilization_percent: (utilization * 100.0).round() as u32,
            average_charging_minutes: average_charging_minutes(&snapshot.slots, now),
            total_revenue: snapshot.total_revenue,
            total_energy_dispensed: snapshot.total_energy_dispensed,
            completed_sessions: snapshot.completed_sessions,
            average_revenue_per_session,
        }
    }
}

/// Fraction of slots that are not available.
pub fn utilization(slots: &[Slot]) -> f64 {
    if slots.is_empty() {
        return 0.0;
    }
    let busy = slots.iter().filter(|s| !s.is_available()).count();
    busy as f64 / slots.len() as f64
}

pub fn average_charging_minutes(slots: &[Slot], now: DateTime<Utc>) -> f64 {
    let elapsed: Vec<f64> = slots
        .iter()
        .filter(|s| s.status == SlotStatus::Charging)
        .filter_map(|s| s.session_start)
        .map(|start| (now - start).num_milliseconds() as f64 / 60_000.0)
        .collect();
    if elapsed.is_empty() {
        return 0.0;
    }
    elapsed.iter().sum::<f64>() / elapsed.len() as f64
}
