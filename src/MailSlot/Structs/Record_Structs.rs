// Framing of a record inside the ring: [length: u32 little-endian][payload]

use crate::MailSlot::Queue::layout::LEN_PREFIX;

/// Length prefix stored in front of every record payload.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordHeader {
    pub payload_len: u32,
}

impl RecordHeader {
    pub fn new(payload_len: usize) -> Self {
        Self {
            payload_len: payload_len as u32,
        }
    }

    pub fn to_bytes(self) -> [u8; LEN_PREFIX] {
        self.payload_len.to_le_bytes()
    }

    pub fn from_bytes(bytes: [u8; LEN_PREFIX]) -> Self {
        Self {
            payload_len: u32::from_le_bytes(bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.payload_len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.payload_len == 0
    }
}

/// Point-in-time view of a queue's occupancy.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Backing buffer size in bytes (0 while uninitialized).
    pub capacity: usize,
    /// Bytes held by queued records, length prefixes included.
    pub used: usize,
}

impl QueueStats {
    pub fn free(&self) -> usize {
        self.capacity - self.used
    }
}
