use crate::error::{SlotError, SlotResult};

/// Maximum number of channels a default slot table exposes.
pub const MAX_SLOTS: usize = 256;

/// Capacity given to a slot that is initialized lazily.
pub const DEFAULT_SLOT_SIZE: usize = 1024;

/// Default ceiling on a single record's payload.
pub const DEFAULT_MAX_RECORD_SIZE: usize = 65_535;

/// Smallest capacity a queue can be given.
pub const MIN_CAPACITY: usize = 2;

/// Bytes of length prefix in front of every stored record.
pub const LEN_PREFIX: usize = 4;

/// Round a requested capacity up to the next power of two.
///
/// Requests below `MIN_CAPACITY`, or so large that the next power of two
/// overflows, are rejected with `InvalidSize`.
pub fn round_capacity(requested: usize) -> SlotResult<usize> {
    if requested < MIN_CAPACITY {
        return Err(SlotError::InvalidSize);
    }
    requested
        .checked_next_power_of_two()
        .ok_or(SlotError::InvalidSize)
}

/// Bytes a record of `payload_len` occupies inside the ring.
#[inline]
pub fn record_footprint(payload_len: usize) -> usize {
    LEN_PREFIX + payload_len
}
