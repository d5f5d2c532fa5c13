use std::ptr;
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};

use super::layout::{record_footprint, round_capacity, LEN_PREFIX};
use super::Queue::RecordQueue;
use crate::error::{SlotError, SlotResult};
use crate::MailSlot::Structs::Record_Structs::RecordHeader;

/// Allocate a zeroed buffer of exactly `capacity` bytes.
pub(crate) fn allocate_buffer(capacity: usize) -> SlotResult<*mut u8> {
    let mut buf: Vec<u8> = Vec::new();
    buf.try_reserve_exact(capacity)
        .map_err(|_| SlotError::OutOfMemory)?;
    buf.resize(capacity, 0);
    Ok(Box::into_raw(buf.into_boxed_slice()) as *mut u8)
}

/// # Safety
/// `base` must come from `allocate_buffer(capacity)` and not be used afterwards.
pub(crate) unsafe fn free_buffer(base: *mut u8, capacity: usize) {
    drop(Box::from_raw(ptr::slice_from_raw_parts_mut(base, capacity)));
}

/// Copy `src` into the ring starting at logical position `at`, wrapping once.
///
/// # Safety
/// `base` must point to `capacity` writable bytes, `capacity` a power of two
/// and `src.len() <= capacity`.
#[inline]
unsafe fn copy_in(base: *mut u8, capacity: usize, at: usize, src: &[u8]) {
    let offset = at & (capacity - 1);
    let first = src.len().min(capacity - offset);
    ptr::copy_nonoverlapping(src.as_ptr(), base.add(offset), first);
    ptr::copy_nonoverlapping(src.as_ptr().add(first), base, src.len() - first);
}

/// Copy `dst.len()` bytes out of the ring starting at logical position `at`.
///
/// # Safety
/// Same as `copy_in`, with `dst.len() <= capacity`.
#[inline]
unsafe fn copy_out(base: *const u8, capacity: usize, at: usize, dst: &mut [u8]) {
    let offset = at & (capacity - 1);
    let first = dst.len().min(capacity - offset);
    ptr::copy_nonoverlapping(base.add(offset), dst.as_mut_ptr(), first);
    ptr::copy_nonoverlapping(base, dst.as_mut_ptr().add(first), dst.len() - first);
}

impl RecordQueue {
    // ---------------------------------------------------------------------
    // Role-based operations. See the struct docs for the exclusivity rules.
    // ---------------------------------------------------------------------

    /// Allocate the backing buffer. Returns the rounded capacity.
    ///
    /// # Safety
    /// Structural role: no other operation may run concurrently.
    pub unsafe fn initialize_exclusive(&self, requested: usize) -> SlotResult<usize> {
        if self.is_initialized() {
            return Err(SlotError::AlreadyInitialized);
        }
        let capacity = round_capacity(requested)?;
        let base = allocate_buffer(capacity)?;

        *self.base.get() = base;
        self.capacity.store(capacity, Relaxed);
        self.input.store(0, Relaxed);
        self.output.store(0, Relaxed);
        self.initialized.store(true, Release);
        Ok(capacity)
    }

    /// Release the backing buffer and return to the uninitialized state.
    /// Buffered records are discarded.
    ///
    /// # Safety
    /// Structural role.
    pub unsafe fn release_exclusive(&self) {
        self.initialized.store(false, Release);
        let base = std::mem::replace(&mut *self.base.get(), ptr::null_mut());
        let capacity = self.capacity.swap(0, Relaxed);
        if !base.is_null() {
            free_buffer(base, capacity);
        }
        self.input.store(0, Relaxed);
        self.output.store(0, Relaxed);
    }

    /// Append one whole record. Either the full record is stored or nothing is.
    ///
    /// # Safety
    /// Producer role.
    pub unsafe fn push_as_producer(&self, record: &[u8]) -> SlotResult<usize> {
        if !self.is_initialized() {
            return Err(SlotError::NotInitialized);
        }
        if record.len() > u32::MAX as usize {
            return Err(SlotError::RecordTooLarge);
        }
        let base = *self.base.get();
        let capacity = self.capacity.load(Relaxed);

        let input = self.input.load(Relaxed);
        let output = self.output.load(Acquire);
        let free = capacity - input.wrapping_sub(output);
        let need = record_footprint(record.len());
        if need > free {
            return Err(SlotError::InsufficientSpace);
        }

        copy_in(base, capacity, input, &RecordHeader::new(record.len()).to_bytes());
        copy_in(base, capacity, input.wrapping_add(LEN_PREFIX), record);

        // Publish
        self.input.store(input.wrapping_add(need), Release);
        Ok(record.len())
    }

    /// Payload length of the oldest record, without consuming it.
    ///
    /// # Safety
    /// Consumer role.
    pub unsafe fn peek_as_consumer(&self) -> SlotResult<usize> {
        if !self.is_initialized() {
            return Err(SlotError::NotInitialized);
        }
        let output = self.output.load(Relaxed);
        let input = self.input.load(Acquire);
        if input == output {
            return Err(SlotError::Empty);
        }
        Ok(self.header_at(output).len())
    }

    /// Move the oldest record into `dst`. A record longer than `dst` stays queued.
    ///
    /// # Safety
    /// Consumer role.
    pub unsafe fn pop_as_consumer(&self, dst: &mut [u8]) -> SlotResult<usize> {
        let len = self.peek_as_consumer()?;
        if len > dst.len() {
            return Err(SlotError::DestinationTooSmall);
        }
        let base = *self.base.get();
        let capacity = self.capacity.load(Relaxed);
        let output = self.output.load(Relaxed);

        copy_out(base, capacity, output.wrapping_add(LEN_PREFIX), &mut dst[..len]);

        // free the bytes for future producers
        self.output
            .store(output.wrapping_add(record_footprint(len)), Release);
        Ok(len)
    }

    /// Swap in a buffer of the rounded `requested` size, repacking the live
    /// region to its start. Returns the new capacity.
    ///
    /// The old buffer is released only after the new one is populated, so a
    /// failed allocation leaves the queue untouched.
    ///
    /// # Safety
    /// Structural role.
    pub unsafe fn resize_exclusive(&self, requested: usize) -> SlotResult<usize> {
        if !self.is_initialized() {
            return Err(SlotError::NotInitialized);
        }
        let new_capacity = round_capacity(requested)?;

        let old_base = *self.base.get();
        let old_capacity = self.capacity.load(Relaxed);
        let output = self.output.load(Relaxed);
        let used = self.input.load(Relaxed).wrapping_sub(output);
        if used > new_capacity {
            return Err(SlotError::WouldTruncate);
        }

        let new_base = allocate_buffer(new_capacity)?;
        let live = std::slice::from_raw_parts_mut(new_base, used);
        copy_out(old_base, old_capacity, output, live);

        *self.base.get() = new_base;
        self.capacity.store(new_capacity, Relaxed);
        self.output.store(0, Relaxed);
        self.input.store(used, Release);
        free_buffer(old_base, old_capacity);
        Ok(new_capacity)
    }

    #[inline]
    unsafe fn header_at(&self, at: usize) -> RecordHeader {
        let mut raw = [0u8; LEN_PREFIX];
        copy_out(*self.base.get(), self.capacity.load(Relaxed), at, &mut raw);
        RecordHeader::from_bytes(raw)
    }

    // ---------------------------------------------------------------------
    // Single-owner API. `&mut self` proves every role is exclusive.
    // ---------------------------------------------------------------------

    /// Allocate the backing buffer with `capacity` rounded up to a power of two.
    pub fn initialize(&mut self, capacity: usize) -> SlotResult<usize> {
        unsafe { self.initialize_exclusive(capacity) }
    }

    /// Append a length-prefixed record. Returns the payload length on success.
    pub fn push(&mut self, record: &[u8]) -> SlotResult<usize> {
        unsafe { self.push_as_producer(record) }
    }

    /// Length of the next record to be popped.
    ///
    /// Takes `&mut self` only to prove the consumer role is exclusive; the
    /// queue is not modified.
    pub fn peek_next_length(&mut self) -> SlotResult<usize> {
        unsafe { self.peek_as_consumer() }
    }

    /// Pop the next record into `dst`, returning its length.
    pub fn pop_into(&mut self, dst: &mut [u8]) -> SlotResult<usize> {
        unsafe { self.pop_as_consumer(dst) }
    }

    /// Resize to `capacity` rounded up to a power of two without dropping records.
    pub fn resize(&mut self, capacity: usize) -> SlotResult<usize> {
        unsafe { self.resize_exclusive(capacity) }
    }

    /// Release the buffer; the queue may be initialized again afterwards.
    pub fn destroy(&mut self) {
        unsafe { self.release_exclusive() }
    }
}
