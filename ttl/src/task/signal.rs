use std::time::Instant;

use parking_lot::{Condvar, Mutex};

/// A resettable "wake the worker" flag.
///
/// Raising it any number of times before the worker wakes collapses into a
/// single wake-up.
#[derive(Debug, Default)]
pub(crate) struct WakeSignal {
  raised: Mutex<bool>,
  cond: Condvar,
}

impl WakeSignal {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  /// Raises the flag and wakes the waiting worker, if any.
  pub(crate) fn raise(&self) {
    *self.raised.lock() = true;
    self.cond.notify_one();
  }

  /// Blocks until the flag is raised or `deadline` passes, then clears the
  /// flag. Returns `true` if the wake-up came from `raise`.
  pub(crate) fn wait_until(&self, deadline: Instant) -> bool {
    let mut raised = self.raised.lock();
    while !*raised {
      if self.cond.wait_until(&mut raised, deadline).timed_out() {
        break;
      }
    }
    std::mem::replace(&mut *raised, false)
  }
}
