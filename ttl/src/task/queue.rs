use crate::task::record::{DeadlineRecord, StoreId};

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use parking_lot::{Condvar, Mutex};

/// A blocking min-heap of deadline records, earliest deadline first.
///
/// There is no decrease-key or removal. Superseded records stay queued until
/// they reach the front, where the worker recognizes them as stale.
#[derive(Debug, Default)]
pub(crate) struct ExpirationQueue {
  heap: Mutex<BinaryHeap<Reverse<DeadlineRecord>>>,
  available: Condvar,
}

impl ExpirationQueue {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  /// Adds a record. Also used to put a not-yet-due record back; its own
  /// deadline puts it back in the right place.
  pub(crate) fn push(&self, record: DeadlineRecord) {
    self.heap.lock().push(Reverse(record));
    self.available.notify_one();
  }

  /// Removes and returns the record with the earliest deadline, blocking the
  /// calling thread while the queue is empty.
  pub(crate) fn pop_min(&self) -> DeadlineRecord {
    let mut heap = self.heap.lock();
    loop {
      if let Some(Reverse(record)) = heap.pop() {
        return record;
      }
      self.available.wait(&mut heap);
    }
  }

  pub(crate) fn len(&self) -> usize {
    self.heap.lock().len()
  }

  /// Returns `true` if any queued record, live or stale, belongs to `owner`.
  pub(crate) fn has_records_for(&self, owner: StoreId) -> bool {
    self
      .heap
      .lock()
      .iter()
      .any(|Reverse(record)| record.owner == owner)
  }
}
