use std::io;
use std::sync::Arc;

use crate::error::SlotError;
use crate::MailSlot::handle::{OpenMode, SlotHandle};
use crate::MailSlot::Queue::layout::{DEFAULT_MAX_RECORD_SIZE, DEFAULT_SLOT_SIZE, MAX_SLOTS, MIN_CAPACITY};
use crate::MailSlot::Slot;
mod debug;
mod getters;

/// When a slot gets its buffer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum InitPolicy {
    /// Opening for writing or blocking reads, writing, or blocking on an
    /// inactive slot initializes it with the default slot size.
    #[default]
    Lazy,
    /// Slots must be initialized through `SlotTable::initialize`; data
    /// operations on an inactive slot fail with `NotInitialized`.
    Explicit,
}

/// Table-wide settings, normally assembled by `SlotTableBuilder`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SlotConfig {
    pub max_slots: usize,
    pub default_slot_size: usize,
    pub max_record_size: usize,
    pub init_policy: InitPolicy,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            max_slots: MAX_SLOTS,
            default_slot_size: DEFAULT_SLOT_SIZE,
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
            init_policy: InitPolicy::Lazy,
        }
    }
}

/// Maps channel ids `0..max_slots` to their slots.
///
/// Slots start inactive and allocate nothing until initialized. Dropping the
/// table destroys every active slot; handles keep the table alive through an
/// `Arc`, so teardown never overlaps an in-flight operation.
pub struct SlotTable {
    slots: Box<[Slot]>,
    config: SlotConfig,
}

impl SlotTable {
    /// Create a table with `config.max_slots` inactive slots.
    pub fn new(config: SlotConfig) -> io::Result<Self> {
        if config.max_slots == 0 || config.max_slots > u32::MAX as usize {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("SlotTable::new(): invalid slot count {}", config.max_slots),
            ));
        }
        if config.default_slot_size < MIN_CAPACITY {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "SlotTable::new(): default slot size {} below minimum {}",
                    config.default_slot_size, MIN_CAPACITY
                ),
            ));
        }
        if config.max_record_size == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "SlotTable::new(): max record size must be greater than zero",
            ));
        }

        let slots = (0..config.max_slots)
            .map(|_| Slot::with_max_record_size(config.max_record_size))
            .collect();
        log::debug!("Maximum mailslots allowed: {}", config.max_slots);

        Ok(Self { slots, config })
    }

    /// The slot behind `channel_id`.
    pub fn slot(&self, channel_id: u32) -> io::Result<&Slot> {
        self.slots.get(channel_id as usize).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Channel {} out of bounds (max {})",
                    channel_id,
                    self.slots.len()
                ),
            )
        })
    }

    /// Open a handle on `channel_id`, initializing the slot first when the
    /// lazy policy asks for it.
    pub fn open(self: &Arc<Self>, channel_id: u32, mode: OpenMode) -> io::Result<SlotHandle> {
        let slot = self.slot(channel_id)?;
        let wants_buffer = mode.write || !mode.non_blocking;
        if self.config.init_policy == InitPolicy::Lazy && wants_buffer && !slot.is_active() {
            self.ensure_initialized(channel_id)?;
        }
        Ok(SlotHandle::new(Arc::clone(self), channel_id, mode))
    }

    /// Explicitly initialize `channel_id` with `capacity` bytes (rounded up).
    pub fn initialize(&self, channel_id: u32, capacity: usize) -> io::Result<usize> {
        let slot = self.slot(channel_id)?;
        slot.initialize(capacity).map_err(|err| {
            log::error!("Cannot initialize slot {}: {}", channel_id, err);
            err.into()
        })
    }

    /// Initialize with the default size unless some other thread got there first.
    pub(crate) fn ensure_initialized(&self, channel_id: u32) -> io::Result<()> {
        let slot = self.slot(channel_id)?;
        if slot.is_active() {
            return Ok(());
        }
        log::info!("Initializing slot: {}", channel_id);
        match slot.initialize(self.config.default_slot_size) {
            Ok(_) | Err(SlotError::AlreadyInitialized) => Ok(()),
            Err(err) => {
                log::error!("Cannot initialize slot {}: {}", channel_id, err);
                Err(err.into())
            }
        }
    }

    /// Destroy `channel_id`'s buffer, discarding its records and waking its readers.
    pub fn remove(&self, channel_id: u32) -> io::Result<()> {
        let slot = self.slot(channel_id)?;
        if !slot.is_active() {
            return Err(SlotError::NotInitialized.into());
        }
        log::debug!("Freeing slot number {}", channel_id);
        slot.destroy();
        Ok(())
    }

    pub fn is_active(&self, channel_id: u32) -> bool {
        self.slot(channel_id).map(Slot::is_active).unwrap_or(false)
    }

    /// Ids of every slot that currently owns a buffer.
    pub fn active_slots(&self) -> Vec<u32> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_active())
            .map(|(id, _)| id as u32)
            .collect()
    }
}

impl Drop for SlotTable {
    fn drop(&mut self) {
        log::debug!("Removing slot table");
        for (id, slot) in self.slots.iter().enumerate() {
            if slot.is_active() {
                log::debug!("Freeing slot number {}", id);
                slot.destroy();
            }
        }
    }
}
