use std::io;

/// Every way a slot operation can fail.
///
/// A failed operation never leaves a partially stored or partially consumed
/// record behind, so all of these are recoverable by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    #[error("slot already initialized")]
    AlreadyInitialized,
    #[error("slot not initialized")]
    NotInitialized,
    #[error("cannot allocate slot buffer")]
    OutOfMemory,
    #[error("invalid slot size")]
    InvalidSize,
    #[error("resize would drop buffered records")]
    WouldTruncate,
    #[error("record exceeds the maximum record size")]
    RecordTooLarge,
    #[error("not enough space available on slot")]
    InsufficientSpace,
    #[error("slot is empty")]
    Empty,
    #[error("destination buffer smaller than next record")]
    DestinationTooSmall,
    #[error("operation would block")]
    WouldBlock,
    #[error("interrupted")]
    Interrupted,
}

/// Result type for slot operations.
pub type SlotResult<T> = Result<T, SlotError>;

impl SlotError {
    /// POSIX errno an adapter should report for this error.
    pub fn errno(&self) -> i32 {
        match self {
            SlotError::AlreadyInitialized => libc::EEXIST,
            SlotError::NotInitialized => libc::ENODEV,
            SlotError::OutOfMemory => libc::ENOMEM,
            SlotError::InvalidSize | SlotError::WouldTruncate => libc::EINVAL,
            SlotError::RecordTooLarge | SlotError::DestinationTooSmall => libc::EMSGSIZE,
            SlotError::InsufficientSpace => libc::ENOSPC,
            SlotError::Empty | SlotError::WouldBlock => libc::EAGAIN,
            SlotError::Interrupted => libc::EINTR,
        }
    }

    /// The `io::ErrorKind` used when this error crosses the `io::Result` surface.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            SlotError::AlreadyInitialized => io::ErrorKind::AlreadyExists,
            SlotError::NotInitialized => io::ErrorKind::NotConnected,
            SlotError::OutOfMemory => io::ErrorKind::OutOfMemory,
            SlotError::InvalidSize
            | SlotError::WouldTruncate
            | SlotError::RecordTooLarge
            | SlotError::DestinationTooSmall => io::ErrorKind::InvalidInput,
            SlotError::InsufficientSpace => io::ErrorKind::Other,
            SlotError::Empty | SlotError::WouldBlock => io::ErrorKind::WouldBlock,
            SlotError::Interrupted => io::ErrorKind::Interrupted,
        }
    }

    /// Recover the slot error wrapped by `From<SlotError> for io::Error`.
    pub fn from_io(err: &io::Error) -> Option<SlotError> {
        err.get_ref()
            .and_then(|inner| inner.downcast_ref::<SlotError>())
            .copied()
    }
}

impl From<SlotError> for io::Error {
    fn from(err: SlotError) -> Self {
        io::Error::new(err.kind(), err)
    }
}
