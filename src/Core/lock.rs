use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

use super::interrupt::Interrupt;
use crate::error::{SlotError, SlotResult};

/// How long a contended acquisition parks before looking at the interrupt again.
pub const LOCK_TICK: Duration = Duration::from_millis(5);

/// Acquire `mutex`, giving up with `Interrupted` if `interrupt` is raised
/// while the caller has to wait.
///
/// An uncontended lock is taken immediately even when the interrupt is raised,
/// matching an interruptible kernel mutex which only fails when it would sleep.
pub fn lock_interruptible<'a, T>(
    mutex: &'a Mutex<T>,
    interrupt: &Interrupt,
) -> SlotResult<MutexGuard<'a, T>> {
    if let Some(guard) = mutex.try_lock() {
        return Ok(guard);
    }
    loop {
        if interrupt.is_raised() {
            return Err(SlotError::Interrupted);
        }
        if let Some(guard) = mutex.try_lock_for(LOCK_TICK) {
            return Ok(guard);
        }
    }
}
