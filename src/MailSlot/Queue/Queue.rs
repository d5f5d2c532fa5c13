// The bounded record queue backing one mail slot

use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::ptr;
use std::sync::atomic::Ordering::{Acquire, Relaxed};
use std::sync::atomic::{AtomicBool, AtomicUsize};

use crate::MailSlot::Structs::Record_Structs::QueueStats;

/// A fixed-capacity ring of length-prefixed records.
///
/// ### Concurrency Design:
/// The queue itself takes no locks. Its `&self` operations are split into
/// three roles and the owner must keep each role exclusive:
/// - **Producer** (`push_as_producer`): at most one at a time.
/// - **Consumer** (`peek_as_consumer`, `pop_as_consumer`): at most one at a time.
/// - **Structural** (`initialize_exclusive`, `resize_exclusive`,
///   `release_exclusive`): excludes every other role.
///
/// One producer and one consumer may run concurrently. The producer only
/// writes into free space and publishes with a `Release` store of `input`;
/// the consumer only reads published bytes and frees them with a `Release`
/// store of `output`.
///
/// The `&mut self` methods in `Queue_impl.rs` are the safe single-owner API.
pub struct RecordQueue {
    /// Base of the backing buffer, null while uninitialized.
    /// Replaced only by structural operations.
    pub(crate) base: UnsafeCell<*mut u8>,

    /// Backing buffer size in bytes; always a power of two once initialized.
    pub(crate) capacity: AtomicUsize,

    /// Free-running producer cursor. Wraps at `usize::MAX`; masked on use.
    pub(crate) input: CachePadded<AtomicUsize>,

    /// Free-running consumer cursor.
    pub(crate) output: CachePadded<AtomicUsize>,

    pub(crate) initialized: AtomicBool,
}

unsafe impl Send for RecordQueue {}
unsafe impl Sync for RecordQueue {}

impl RecordQueue {
    /// An uninitialized queue with capacity 0. Allocates nothing.
    pub fn new() -> Self {
        Self {
            base: UnsafeCell::new(ptr::null_mut()),
            capacity: AtomicUsize::new(0),
            input: CachePadded::new(AtomicUsize::new(0)),
            output: CachePadded::new(AtomicUsize::new(0)),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Acquire)
    }

    pub fn capacity(&self) -> usize {
        self.capacity.load(Relaxed)
    }

    /// Occupancy snapshot. Lock-free and therefore only advisory while other
    /// threads are operating on the queue.
    pub fn stats(&self) -> QueueStats {
        let output = self.output.load(Acquire);
        let input = self.input.load(Acquire);
        let capacity = self.capacity();
        QueueStats {
            capacity,
            used: input.wrapping_sub(output).min(capacity),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stats().used == 0
    }
}

impl Default for RecordQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RecordQueue {
    fn drop(&mut self) {
        let base = *self.base.get_mut();
        if !base.is_null() {
            unsafe { super::Queue_impl::free_buffer(base, *self.capacity.get_mut()) };
        }
    }
}
