use crate::models::{Slot, SlotId};

/// Pick the slot an arriving truck is sent to: the available slot with the
/// lowest id, if any.
pub(crate) fn first_available(slots: &[Slot]) -> Option<SlotId> {
    slots
        .iter()
        .filter(|slot| slot.is_available())
        .map(|slot| slot.id)
        .min()
}
