use super::*;

/// Read-only accessors for the table's configuration and occupancy.
impl SlotTable {
    pub fn config(&self) -> &SlotConfig {
        &self.config
    }

    /// Number of channel ids the table serves.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn init_policy(&self) -> InitPolicy {
        self.config.init_policy
    }

    pub fn default_slot_size(&self) -> usize {
        self.config.default_slot_size
    }

    pub fn max_record_size(&self) -> usize {
        self.config.max_record_size
    }

    /// Number of slots that currently own a buffer.
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_active()).count()
    }
}
