use crate::domain::SchedulingDomain;
use crate::metrics::Metrics;
use crate::store::{Contents, DeadlineTable};
use crate::task::record::{DeadlineRecord, Expire, Expiry, StoreId};
use crate::time;

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::RwLock;

/// The internal, thread-safe core of a map.
pub(crate) struct TtlMapShared<K, V, H> {
  pub(crate) id: StoreId,
  pub(crate) contents: Contents<K, V, H>,
  pub(crate) deadlines: DeadlineTable<K, H>,
  pub(crate) domain: Arc<SchedulingDomain>,
  pub(crate) metrics: Metrics,
  pub(crate) default_ttl: Duration,
}

impl<K, V, H> fmt::Debug for TtlMapShared<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TtlMapShared")
      .field("id", &self.id)
      .field("domain", &self.domain.kind())
      .field("worker_running", &self.domain.is_worker_running())
      .field("queued_in_domain", &self.domain.queued())
      .field("tracked_deadlines", &self.deadlines.len())
      .field("default_ttl", &self.default_ttl)
      .field("metrics", &self.metrics.snapshot())
      .finish_non_exhaustive()
  }
}

impl<K, V, H> TtlMapShared<K, V, H>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + Sync + 'static,
  H: BuildHasher + Clone + Send + Sync + 'static,
{
  pub(crate) fn new(
    id: StoreId,
    domain: Arc<SchedulingDomain>,
    default_ttl: Duration,
    hasher: H,
  ) -> Self {
    Self {
      id,
      contents: RwLock::new(HashMap::with_hasher(hasher.clone())),
      deadlines: DeadlineTable::new(hasher),
      domain,
      metrics: Metrics::new(),
      default_ttl,
    }
  }

  /// Stores `value` under `key` and schedules its expiration `ttl` from now.
  /// A zero `ttl` means the map's default.
  pub(crate) fn set(self: &Arc<Self>, key: K, value: V, ttl: Duration) {
    let ttl = if ttl.is_zero() { self.default_ttl } else { ttl };
    let deadline = time::deadline_after(ttl);

    let previous = {
      let mut contents = self.contents.write();
      let previous = contents.insert(key.clone(), Arc::new(value));
      // Written under the contents lock so that concurrent writers of the
      // same key leave a matching value and deadline behind.
      self.deadlines.record(key.clone(), deadline);
      previous
    };
    drop(previous);

    Metrics::bump(&self.metrics.inserts);

    let target = KeyExpiry {
      owner: Arc::downgrade(self),
      key,
    };
    self
      .domain
      .schedule(DeadlineRecord::new(deadline, self.id, Box::new(target)));
  }

  /// Runs `f` on the value for `key` if it is present and not expired.
  pub(crate) fn with_live<Q, F, R>(&self, key: &Q, f: F) -> Option<R>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    F: FnOnce(&Arc<V>) -> R,
  {
    let result = {
      let contents = self.contents.read();
      contents
        .get(key)
        .filter(|_| self.deadlines.is_live(key, Instant::now()))
        .map(f)
    };

    if result.is_some() {
      Metrics::bump(&self.metrics.hits);
    } else {
      Metrics::bump(&self.metrics.misses);
    }
    result
  }

  /// Removes `key` from the contents. Its deadline and queued records are
  /// left alone; the worker disposes of them when they come due.
  pub(crate) fn remove<Q>(&self, key: &Q) -> Option<Arc<V>>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    let removed = self.contents.write().remove(key);
    if removed.is_some() {
      Metrics::bump(&self.metrics.deletes);
    }
    removed
  }

  /// Time left before `key` expires, if it is present and live.
  pub(crate) fn time_to_live<Q>(&self, key: &Q) -> Option<Duration>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    let contents = self.contents.read();
    if !contents.contains_key(key) {
      return None;
    }
    let deadline = self.deadlines.get(key)?;
    time::remaining(deadline, Instant::now())
  }

  pub(crate) fn clear(&self) {
    let drained = {
      let mut contents = self.contents.write();
      self.deadlines.clear();
      let empty = HashMap::with_hasher(contents.hasher().clone());
      std::mem::replace(&mut *contents, empty)
    };
    drop(drained);
  }

  /// Called by the worker once the live record for `key` has come due.
  fn expire_key(&self, key: &K, deadline: Instant) -> Expiry {
    let removed = {
      let mut contents = self.contents.write();
      // Re-checked under the contents lock: a `set` that landed after the
      // worker validated the record must not lose its fresh value.
      if !self.deadlines.retire(key, deadline) {
        return Expiry::Superseded;
      }
      contents.remove(key)
    };

    match removed {
      Some(_) => {
        Metrics::bump(&self.metrics.expired);
        Expiry::Removed
      }
      None => Expiry::AlreadyAbsent,
    }
  }
}

/// The typed half of a deadline record: which key of which map to expire.
///
/// Only a weak reference to the map is kept, so queued records never keep a
/// dropped map alive. Records of a dropped map are discarded as stale.
struct KeyExpiry<K, V, H> {
  owner: Weak<TtlMapShared<K, V, H>>,
  key: K,
}

impl<K, V, H> Expire for KeyExpiry<K, V, H>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + Sync + 'static,
  H: BuildHasher + Clone + Send + Sync + 'static,
{
  fn latest_deadline(&self) -> Option<Instant> {
    self.owner.upgrade()?.deadlines.get(&self.key)
  }

  fn expire(&self, deadline: Instant) -> Expiry {
    match self.owner.upgrade() {
      Some(owner) => owner.expire_key(&self.key, deadline),
      None => Expiry::Orphaned,
    }
  }

  fn discard(&self) {
    if let Some(owner) = self.owner.upgrade() {
      Metrics::bump(&owner.metrics.stale_records_discarded);
    }
  }
}
