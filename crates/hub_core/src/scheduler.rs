//! Deferred station actions.
//!
//! Reservations auto-start charging a short while after assignment, and
//! simulated arrivals are auto-assigned a short while after joining the
//! queue. Each pending action is tied to the truck it concerns so it can be
//! cancelled, and the store re-validates it before applying it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::SlotId;

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "kind")]
pub enum DeferredAction {
    PromoteToCharging {
        slot_id: SlotId,
        truck_id: uuid::Uuid,
    },
    AutoAssign {
        truck_id: uuid::Uuid,
    },
}

impl DeferredAction {
    pub fn truck_id(&self) -> uuid::Uuid {
        match self {
            DeferredAction::PromoteToCharging { truck_id, .. } => *truck_id,
            DeferredAction::AutoAssign { truck_id } => *truck_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeferredTask {
    pub id: uuid::Uuid,
    pub due: DateTime<Utc>,
    pub action: DeferredAction,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scheduler {
    tasks: Vec<DeferredTask>,
}

impl Scheduler {
    pub fn schedule(&mut self, due: DateTime<Utc>, action: DeferredAction) -> uuid::Uuid {
        let id = uuid::Uuid::new_v4();
        self.tasks.push(DeferredTask { id, due, action });
        id
    }

    /// Remove and return every task due at or before `now`, earliest first.
    ///
    /// Tasks sharing a due time keep their scheduling order.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<DeferredTask> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|task| task.due <= now);
        self.tasks = pending;
        due.sort_by_key(|task| task.due);
        due
    }

    /// Drop every pending task concerning `truck_id`. Returns how many were dropped.
    pub fn cancel_for_truck(&mut self, truck_id: uuid::Uuid) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.action.truck_id() != truck_id);
        before - self.tasks.len()
    }

    pub fn pending(&self) -> &[DeferredTask] {
        &self.tasks
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_take_due_in_order() {
        let now = Utc::now();
        let first = uuid::Uuid::new_v4();
        let second = uuid::Uuid::new_v4();
        let later = uuid::Uuid::new_v4();

        let mut scheduler = Scheduler::default();
        scheduler.schedule(
            now + TimeDelta::seconds(2),
            DeferredAction::AutoAssign { truck_id: second },
        );
        scheduler.schedule(
            now + TimeDelta::seconds(1),
            DeferredAction::AutoAssign { truck_id: first },
        );
        scheduler.schedule(
            now + TimeDelta::seconds(10),
            DeferredAction::AutoAssign { truck_id: later },
        );

        assert!(scheduler.take_due(now).is_empty());

        let due = scheduler.take_due(now + TimeDelta::seconds(5));
        let trucks: Vec<_> = due.iter().map(|t| t.action.truck_id()).collect();
        assert_eq!(trucks, vec![first, second]);
        assert_eq!(scheduler.pending().len(), 1);
    }

    #[test]
    fn test_cancel_for_truck() {
        let now = Utc::now();
        let truck_id = uuid::Uuid::new_v4();
        let other = uuid::Uuid::new_v4();

        let mut scheduler = Scheduler::default();
        scheduler.schedule(now, DeferredAction::AutoAssign { truck_id });
        scheduler.schedule(
            now,
            DeferredAction::PromoteToCharging {
                slot_id: 1,
                truck_id,
            },
        );
        let kept = scheduler.schedule(now, DeferredAction::AutoAssign { truck_id: other });

        assert_eq!(scheduler.cancel_for_truck(truck_id), 2);
        assert_eq!(scheduler.pending().len(), 1);
        assert_eq!(scheduler.pending()[0].id, kept);
        assert_eq!(scheduler.cancel_for_truck(truck_id), 0);
    }
}
