use std::sync::Arc;

use crate::Core::table::{InitPolicy, SlotConfig, SlotTable};

pub struct SlotTableBuilder {
    config: SlotConfig,
}

impl Default for SlotTableBuilder {
    fn default() -> Self {
        Self {
            config: SlotConfig::default(),
        }
    }
}

impl SlotTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_slots(mut self, max_slots: usize) -> Self {
        self.config.max_slots = max_slots;
        self
    }

    pub fn with_default_slot_size(mut self, size: usize) -> Self {
        self.config.default_slot_size = size;
        self
    }

    pub fn with_max_record_size(mut self, size: usize) -> Self {
        self.config.max_record_size = size;
        self
    }

    pub fn with_init_policy(mut self, policy: InitPolicy) -> Self {
        self.config.init_policy = policy;
        self
    }

    pub fn build(self) -> std::io::Result<Arc<SlotTable>> {
        SlotTable::new(self.config).map(Arc::new)
    }
}
