// src/MailSlot/handle.rs

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::SlotError;
use crate::Core::interrupt::Interrupt;
use crate::Core::table::{InitPolicy, SlotTable};
use crate::MailSlot::Slot;

const IOC_MAGIC: u32 = b'l' as u32;
const IOC_START_CMD_NUM: u32 = 128;
const IOC_WRITE: u32 = 1;
const IOC_READ: u32 = 2;

/// Largest capacity a `Resize` command may request; its result must fit the u32 reply.
pub const MAX_RESIZE_ARG: u32 = 1 << 31;

/// Linux `_IOC` encoding for a command carrying an `unsigned int`.
const fn ioc(dir: u32, nr: u32) -> u32 {
    (dir << 30) | ((std::mem::size_of::<u32>() as u32) << 16) | (IOC_MAGIC << 8) | nr
}

pub const IOC_SET_NONBLOCKING: u32 = ioc(IOC_WRITE, IOC_START_CMD_NUM);
pub const IOC_IS_NONBLOCKING: u32 = ioc(IOC_READ, IOC_START_CMD_NUM + 1);
pub const IOC_RESIZE: u32 = ioc(IOC_READ, IOC_START_CMD_NUM + 2);

/// Control commands accepted by `SlotHandle::control`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SlotCommand {
    /// Non-zero switches the handle to non-blocking reads.
    SetNonBlocking(u32),
    IsNonBlocking,
    /// New capacity in bytes, rounded up to a power of two.
    Resize(u32),
}

impl SlotCommand {
    /// Decode a raw command number and its argument. Unknown numbers fail with ENOTTY.
    pub fn from_raw(cmd: u32, arg: u32) -> io::Result<Self> {
        match cmd {
            IOC_SET_NONBLOCKING => Ok(SlotCommand::SetNonBlocking(arg)),
            IOC_IS_NONBLOCKING => Ok(SlotCommand::IsNonBlocking),
            IOC_RESIZE => Ok(SlotCommand::Resize(arg)),
            _ => Err(io::Error::from_raw_os_error(libc::ENOTTY)),
        }
    }
}

/// How a handle is opened.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct OpenMode {
    pub read: bool,
    pub write: bool,
    pub non_blocking: bool,
}

impl OpenMode {
    pub fn read_only() -> Self {
        Self {
            read: true,
            ..Self::default()
        }
    }

    pub fn write_only() -> Self {
        Self {
            write: true,
            ..Self::default()
        }
    }

    pub fn read_write() -> Self {
        Self {
            read: true,
            write: true,
            non_blocking: false,
        }
    }

    pub fn non_blocking(mut self, non_blocking: bool) -> Self {
        self.non_blocking = non_blocking;
        self
    }
}

/// An open handle on one channel of a `SlotTable`.
///
/// The handle owns the non-blocking flag and the `Interrupt` used to cancel
/// its blocking calls; the slot itself is shared with every other handle on
/// the same channel.
#[derive(Debug)]
pub struct SlotHandle {
    table: Arc<SlotTable>,
    channel_id: u32,
    mode: OpenMode,
    non_blocking: AtomicBool,
    interrupt: Interrupt,
}

impl SlotHandle {
    pub(crate) fn new(table: Arc<SlotTable>, channel_id: u32, mode: OpenMode) -> Self {
        Self {
            table,
            channel_id,
            mode,
            non_blocking: AtomicBool::new(mode.non_blocking),
            interrupt: Interrupt::new(),
        }
    }

    fn slot(&self) -> io::Result<&Slot> {
        self.table.slot(self.channel_id)
    }

    /// Receive the oldest record on the channel.
    ///
    /// # Returns
    /// * `Ok(n)` with the record copied into `buf[..n]`
    /// * `WouldBlock` if the channel is empty and the handle is non-blocking
    /// * `InvalidInput` if the next record does not fit in `buf`; it stays queued
    /// * `Interrupted` if the handle's interrupt was raised while waiting
    pub fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.mode.read {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "handle not opened for reading",
            ));
        }
        let non_blocking = self.is_non_blocking();
        let slot = self.slot()?;
        log::trace!("Read operation on slot {}", self.channel_id);

        if !slot.is_active() {
            match self.table.init_policy() {
                InitPolicy::Explicit => return Err(SlotError::NotInitialized.into()),
                InitPolicy::Lazy if non_blocking => return Err(SlotError::WouldBlock.into()),
                InitPolicy::Lazy => self.table.ensure_initialized(self.channel_id)?,
            }
        }

        slot.read(buf, non_blocking, &self.interrupt)
            .map_err(io::Error::from)
    }

    /// Send `data` as one record.
    ///
    /// # Returns
    /// * `Ok(n)` with `n == data.len()`
    /// * `InvalidInput` if `data` exceeds the maximum record size
    /// * `Other` (ENOSPC) if the slot has no room; nothing is stored
    pub fn write(&self, data: &[u8]) -> io::Result<usize> {
        if !self.mode.write {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "handle not opened for writing",
            ));
        }
        let slot = self.slot()?;
        log::trace!("Write operation on slot {}, of bytes {}", self.channel_id, data.len());

        if !slot.is_active() {
            match self.table.init_policy() {
                InitPolicy::Explicit => return Err(SlotError::NotInitialized.into()),
                InitPolicy::Lazy => self.table.ensure_initialized(self.channel_id)?,
            }
        }

        slot.write(data, &self.interrupt).map_err(|err| {
            if err == SlotError::InsufficientSpace {
                log::debug!("Not enough space available on slot {}", self.channel_id);
            }
            io::Error::from(err)
        })
    }

    pub fn set_non_blocking(&self, non_blocking: bool) {
        log::debug!("Setting non-blocking mode on slot {}: {}", self.channel_id, non_blocking);
        self.non_blocking.store(non_blocking, Ordering::Release);
    }

    pub fn is_non_blocking(&self) -> bool {
        self.non_blocking.load(Ordering::Acquire)
    }

    /// Resize the channel's buffer, keeping its queued records. Returns the new capacity.
    pub fn resize(&self, capacity: u32) -> io::Result<usize> {
        log::debug!("Request to resize slot {}: {}", self.channel_id, capacity);
        self.slot()?
            .resize(capacity as usize, &self.interrupt)
            .map_err(io::Error::from)
    }

    /// Execute a control command. `IsNonBlocking` yields 0 or 1, `Resize`
    /// yields the new capacity, `SetNonBlocking` yields 0.
    pub fn control(&self, cmd: SlotCommand) -> io::Result<u32> {
        match cmd {
            SlotCommand::SetNonBlocking(flag) => {
                self.set_non_blocking(flag != 0);
                Ok(0)
            }
            SlotCommand::IsNonBlocking => Ok(self.is_non_blocking() as u32),
            SlotCommand::Resize(capacity) if capacity > MAX_RESIZE_ARG => {
                Err(SlotError::InvalidSize.into())
            }
            SlotCommand::Resize(capacity) => {
                let new_capacity = self.resize(capacity)?;
                u32::try_from(new_capacity).map_err(|_| SlotError::InvalidSize.into())
            }
        }
    }

    /// Cancellation token for this handle's blocking calls. Raise it from
    /// another thread to make a pending `read` return `Interrupted`.
    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    /// Raise this handle's interrupt and wake the channel's sleepers at once,
    /// so a pending `read` returns `Interrupted` without waiting for a tick.
    /// Call `interrupt().clear()` before reusing the handle.
    pub fn cancel(&self) {
        self.interrupt.raise();
        if let Ok(slot) = self.slot() {
            slot.interrupt_waiters();
        }
    }

    pub fn channel_id(&self) -> u32 {
        self.channel_id
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn table(&self) -> &Arc<SlotTable> {
        &self.table
    }
}
