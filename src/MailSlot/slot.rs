// src/MailSlot/slot.rs

use crossbeam_utils::CachePadded;
use parking_lot::Mutex;

use super::Queue::layout::DEFAULT_MAX_RECORD_SIZE;
use super::Queue::RecordQueue;
use super::Structs::QueueStats;
use crate::error::{SlotError, SlotResult};
use crate::Core::interrupt::Interrupt;
use crate::Core::lock::lock_interruptible;
use crate::Core::wait::WaitQueue;

/// One mail slot: a record queue plus the locking and wake-up protocol that
/// makes it safe to share between threads.
///
/// ### Locking:
/// - `writer` serializes producers, `reader` serializes consumers. A reader and
///   a writer run concurrently against the queue's producer/consumer roles.
/// - Operations that replace the backing buffer (initialize, resize, destroy)
///   take `writer` then `reader`, always in that order. Every other path takes
///   at most one of the two, so the fixed order cannot deadlock.
/// - Resize is the only data-path operation needing both locks; initialize and
///   destroy reuse its writer-then-reader order, so all three paths agree.
pub struct Slot {
    writer: CachePadded<Mutex<()>>,
    reader: CachePadded<Mutex<()>>,
    queue: RecordQueue,
    wait: WaitQueue,
    max_record_size: usize,
}

impl Slot {
    pub fn new() -> Self {
        Self::with_max_record_size(DEFAULT_MAX_RECORD_SIZE)
    }

    /// An uninitialized slot rejecting records larger than `max_record_size`.
    pub fn with_max_record_size(max_record_size: usize) -> Self {
        Self {
            writer: CachePadded::new(Mutex::new(())),
            reader: CachePadded::new(Mutex::new(())),
            queue: RecordQueue::new(),
            wait: WaitQueue::new(),
            max_record_size,
        }
    }

    /// Allocate the slot's buffer. Fails with `AlreadyInitialized` on an active slot.
    pub fn initialize(&self, capacity: usize) -> SlotResult<usize> {
        let _w = self.writer.lock();
        let _r = self.reader.lock();
        // Safety: both locks held, nothing else can touch the queue.
        let capacity = unsafe { self.queue.initialize_exclusive(capacity) }?;
        // Stale sleepers re-check against the fresh queue.
        self.wait.notify_all();
        log::debug!("slot initialized with capacity {}", capacity);
        Ok(capacity)
    }

    /// Whether the slot currently owns a buffer.
    pub fn is_active(&self) -> bool {
        self.queue.is_initialized()
    }

    pub fn max_record_size(&self) -> usize {
        self.max_record_size
    }

    /// Store `record` as one message and wake every blocked reader.
    ///
    /// A full slot is reported as `InsufficientSpace`; writers never block on
    /// backpressure. A zero-length record is queued like any other and reads
    /// back as 0 bytes.
    pub fn write(&self, record: &[u8], interrupt: &Interrupt) -> SlotResult<usize> {
        if record.len() > self.max_record_size {
            return Err(SlotError::RecordTooLarge);
        }
        let copied = {
            let _w = lock_interruptible(&self.writer, interrupt)?;
            // Safety: the writer lock makes us the only producer, and
            // structural operations also need it.
            unsafe { self.queue.push_as_producer(record) }?
        };

        log::trace!("slot write of {} bytes", copied);
        self.wait.notify_all();
        Ok(copied)
    }

    /// Take the oldest record into `dst`.
    ///
    /// With `non_blocking` an empty slot returns `WouldBlock`; otherwise the
    /// caller sleeps until a write lands or `interrupt` is raised. A record
    /// longer than `dst` is left queued and `DestinationTooSmall` is returned.
    pub fn read(&self, dst: &mut [u8], non_blocking: bool, interrupt: &Interrupt) -> SlotResult<usize> {
        let mut guard = lock_interruptible(&self.reader, interrupt)?;
        loop {
            // Sample the generation before checking, so a write landing after
            // the check still moves it.
            let seen = self.wait.epoch();
            // Safety: the reader lock makes us the only consumer.
            match unsafe { self.queue.peek_as_consumer() } {
                Ok(len) if len > dst.len() => return Err(SlotError::DestinationTooSmall),
                Ok(_) => break,
                Err(SlotError::Empty) if non_blocking => return Err(SlotError::WouldBlock),
                Err(SlotError::Empty) => {}
                Err(err) => return Err(err),
            }

            drop(guard);
            self.wait.wait(seen, interrupt)?;
            // A wake-up is only a hint; another reader may win the record.
            guard = lock_interruptible(&self.reader, interrupt)?;
        }

        let copied = unsafe { self.queue.pop_as_consumer(dst) }?;
        drop(guard);
        log::trace!("slot read of {} bytes", copied);
        Ok(copied)
    }

    /// Replace the backing buffer with one of `capacity` bytes (rounded up),
    /// keeping every queued record.
    pub fn resize(&self, capacity: usize, interrupt: &Interrupt) -> SlotResult<usize> {
        let _w = lock_interruptible(&self.writer, interrupt)?;
        let _r = lock_interruptible(&self.reader, interrupt)?;
        // Safety: both locks held.
        match unsafe { self.queue.resize_exclusive(capacity) } {
            Ok(new_capacity) => {
                log::debug!("slot resized to {} bytes", new_capacity);
                Ok(new_capacity)
            }
            Err(err) => {
                log::warn!("slot resize to {} refused: {}", capacity, err);
                Err(err)
            }
        }
    }

    /// Release the buffer and wake all blocked readers, which then observe
    /// `NotInitialized`. Queued records are discarded.
    pub fn destroy(&self) {
        {
            let _w = self.writer.lock();
            let _r = self.reader.lock();
            // Safety: both locks held.
            unsafe { self.queue.release_exclusive() };
        }
        self.wait.notify_all();
        log::debug!("slot destroyed");
    }

    /// Wake every blocked reader without producing a record. Readers whose
    /// interrupt is raised return `Interrupted`; the rest go back to sleep.
    pub fn interrupt_waiters(&self) {
        self.wait.notify_all();
    }

    /// Advisory occupancy snapshot.
    pub fn stats(&self) -> QueueStats {
        self.queue.stats()
    }

    pub(crate) fn queue(&self) -> &RecordQueue {
        &self.queue
    }
}

impl Default for Slot {
    fn default() -> Self {
        Self::new()
    }
}
