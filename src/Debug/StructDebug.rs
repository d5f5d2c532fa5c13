use std::fmt;

use crate::Core::table::SlotTable;
use crate::MailSlot::Queue::RecordQueue;
use crate::MailSlot::Slot;

/// Debug function for SlotTable
///
/// Shows the configuration and which channels are active, not every slot.
pub fn debug_slot_table(table: &SlotTable, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SlotTable")
        .field("slot_count", &table.slot_count())
        .field("init_policy", &table.init_policy())
        .field("default_slot_size", &table.default_slot_size())
        .field("max_record_size", &table.max_record_size())
        .field("active", &table.active_slots())
        .finish()
}

/// Debug function for Slot
pub fn debug_slot(slot: &Slot, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Slot")
        .field("active", &slot.is_active())
        .field("max_record_size", &slot.max_record_size())
        .field("queue", slot.queue())
        .finish()
}

/// Debug function for RecordQueue
///
/// Prints an occupancy snapshot; the buffer contents are never dereferenced.
pub fn debug_record_queue(queue: &RecordQueue, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let stats = queue.stats();
    f.debug_struct("RecordQueue")
        .field("initialized", &queue.is_initialized())
        .field("capacity", &stats.capacity)
        .field("used", &stats.used)
        .finish_non_exhaustive()
}
