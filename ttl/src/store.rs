use core::fmt;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};

/// The key -> value contents of one map.
pub(crate) type Contents<K, V, H> = RwLock<HashMap<K, Arc<V>, H>>;

/// The most recent deadline assigned to every key of one map.
///
/// This is the single source of truth for which queued deadline record of a
/// key is still live: a record is live only if its deadline equals the one
/// stored here. The lock is separate from the contents lock and is only ever
/// held for a single lookup or update. When both are needed, the contents
/// lock is always taken first.
pub(crate) struct DeadlineTable<K, H> {
  deadlines: Mutex<HashMap<K, Instant, H>>,
}

impl<K, H> fmt::Debug for DeadlineTable<K, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("DeadlineTable")
      .field("tracked_keys", &self.deadlines.lock().len())
      .finish()
  }
}

impl<K, H> DeadlineTable<K, H>
where
  K: Eq + Hash,
  H: BuildHasher,
{
  pub(crate) fn new(hasher: H) -> Self {
    Self {
      deadlines: Mutex::new(HashMap::with_hasher(hasher)),
    }
  }

  /// Overwrites the deadline for `key`, superseding every earlier record.
  pub(crate) fn record(&self, key: K, deadline: Instant) {
    self.deadlines.lock().insert(key, deadline);
  }

  /// Returns the latest deadline assigned to `key`.
  pub(crate) fn get<Q>(&self, key: &Q) -> Option<Instant>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.deadlines.lock().get(key).copied()
  }

  /// Returns `false` once the deadline for `key` has passed. A key with no
  /// deadline never expires.
  pub(crate) fn is_live<Q>(&self, key: &Q, now: Instant) -> bool
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.get(key).map_or(true, |deadline| deadline > now)
  }

  /// Forgets `key` if its latest deadline is still `deadline`. Returns
  /// `false` if a newer write has replaced it in the meantime.
  pub(crate) fn retire(&self, key: &K, deadline: Instant) -> bool {
    let mut deadlines = self.deadlines.lock();
    match deadlines.get(key) {
      Some(latest) if *latest == deadline => {
        deadlines.remove(key);
        true
      }
      _ => false,
    }
  }
}

// Lock-only operations, usable without hashing bounds.
impl<K, H> DeadlineTable<K, H> {
  /// Forgets every key, making all of the map's queued records stale.
  pub(crate) fn clear(&self) {
    self.deadlines.lock().clear();
  }

  pub(crate) fn len(&self) -> usize {
    self.deadlines.lock().len()
  }
}
