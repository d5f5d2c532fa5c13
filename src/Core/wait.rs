use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use super::futex::{futex_wait_timeout, futex_wake_all};
use super::interrupt::Interrupt;
use crate::error::{SlotError, SlotResult};

/// Upper bound on how long a sleeper goes without re-checking its interrupt.
pub const WAIT_TICK: Duration = Duration::from_millis(10);

/// The "queue became non-empty" wait facility of a slot.
///
/// The futex word is a wake generation. A reader samples it with `epoch()`
/// *before* checking the queue for emptiness, then sleeps in `wait` until the
/// generation moves. A writer publishes its record first and bumps the
/// generation second, so a record pushed after the emptiness check always
/// changes the sampled value and the sleeper cannot miss it.
#[derive(Debug, Default)]
pub struct WaitQueue {
    signal: AtomicU32,
}

impl WaitQueue {
    pub const fn new() -> Self {
        Self {
            signal: AtomicU32::new(0),
        }
    }

    /// Current wake generation.
    pub fn epoch(&self) -> u32 {
        self.signal.load(Ordering::Acquire)
    }

    /// Wake all sleepers.
    pub fn notify_all(&self) {
        self.signal.fetch_add(1, Ordering::Release);
        futex_wake_all(&self.signal);
    }

    /// Sleep until the generation differs from `seen` or `interrupt` is raised.
    pub fn wait(&self, seen: u32, interrupt: &Interrupt) -> SlotResult<()> {
        loop {
            if self.signal.load(Ordering::Acquire) != seen {
                return Ok(());
            }
            if interrupt.is_raised() {
                return Err(SlotError::Interrupted);
            }
            futex_wait_timeout(&self.signal, seen, WAIT_TICK);
        }
    }
}
