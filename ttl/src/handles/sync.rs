use crate::builder::{TtlMapBuilder, TtlMapConfig};
use crate::error::BuildError;
use crate::shared::TtlMapShared;
use crate::MetricsSnapshot;

use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use std::time::Duration;

/// A thread-safe map whose entries expire independently.
///
/// Every write gives its key a deadline. Once the deadline passes the key
/// reads as absent, and a background worker removes it some time later
/// without any caller having to sweep the map.
///
/// Cloning a `TtlMap` is cheap and yields another handle to the same map.
///
/// # Example
///
/// ```rust
/// use fibre_ttl::TtlMap;
/// use std::time::Duration;
///
/// let sessions = TtlMap::<String, u32>::new().unwrap();
/// sessions.set("alice".to_string(), 7, Duration::from_secs(30));
/// assert_eq!(sessions.get("alice").as_deref(), Some(&7));
///
/// sessions.delete("alice");
/// assert!(sessions.get("alice").is_none());
/// ```
#[derive(Debug)]
pub struct TtlMap<K, V, H = ahash::RandomState> {
  pub(crate) shared: Arc<TtlMapShared<K, V, H>>,
}

impl<K, V, H> Clone for TtlMap<K, V, H> {
  fn clone(&self) -> Self {
    Self {
      shared: Arc::clone(&self.shared),
    }
  }
}

impl<K, V> TtlMap<K, V>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + Sync + 'static,
{
  /// Creates a map with a 60 second default TTL, served by the shared worker.
  pub fn new() -> Result<Self, BuildError> {
    TtlMapBuilder::new().build()
  }

  /// Creates a map from a plain configuration value.
  pub fn with_config(config: TtlMapConfig) -> Result<Self, BuildError> {
    TtlMapBuilder::new().config(config).build()
  }

  /// Returns a builder for a customised map.
  pub fn builder() -> TtlMapBuilder<K, V> {
    TtlMapBuilder::new()
  }
}

impl<K, V, H> TtlMap<K, V, H>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + Sync + 'static,
  H: BuildHasher + Clone + Send + Sync + 'static,
{
  /// Stores `value` under `key`, replacing any previous value, and sets the
  /// key to expire `ttl` from now.
  ///
  /// A zero `ttl` uses the map's default TTL. Rewriting a key always resets
  /// its deadline, whether the new TTL is shorter or longer.
  pub fn set(&self, key: K, value: V, ttl: Duration) {
    self.shared.set(key, value, ttl);
  }

  /// Stores `value` under `key` with the map's default TTL.
  pub fn insert(&self, key: K, value: V) {
    self.shared.set(key, value, self.shared.default_ttl);
  }

  /// Returns the value for `key`, or `None` if it is absent or its deadline
  /// has passed. Expired keys read as absent even before the worker has
  /// removed them.
  pub fn get<Q>(&self, key: &Q) -> Option<Arc<V>>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.shared.with_live(key, Arc::clone)
  }

  /// Looks up a live value and applies a closure to it.
  ///
  /// The closure runs while a read lock is held on the map's contents, so it
  /// should be fast. Nothing is cloned.
  pub fn get_with<Q, F, R>(&self, key: &Q, f: F) -> Option<R>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    F: FnOnce(&V) -> R,
  {
    self.shared.with_live(key, |value| f(value.as_ref()))
  }

  /// Returns `true` if `key` is present and not expired.
  pub fn contains_key<Q>(&self, key: &Q) -> bool
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.shared.with_live(key, |_| ()).is_some()
  }

  /// Removes `key`, returning `true` if a value was removed.
  ///
  /// Deleting an absent key is a no-op, so repeated deletes are harmless.
  /// The key's already scheduled expiration stays queued and is discarded
  /// by the worker when it comes due.
  pub fn delete<Q>(&self, key: &Q) -> bool
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.shared.remove(key).is_some()
  }

  /// Removes `key` and returns its value, if any.
  ///
  /// A value whose deadline has passed but which the worker has not swept
  /// yet is still returned.
  pub fn remove<Q>(&self, key: &Q) -> Option<Arc<V>>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.shared.remove(key)
  }

  /// Returns how long `key` has left to live, or `None` if it is absent or
  /// already expired.
  pub fn time_to_live<Q>(&self, key: &Q) -> Option<Duration>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.shared.time_to_live(key)
  }

  /// Removes all entries. Their queued expirations become stale.
  pub fn clear(&self) {
    self.shared.clear();
  }
}

impl<K, V, H> TtlMap<K, V, H> {
  /// Number of entries physically present.
  ///
  /// This includes keys whose deadline has passed but which the worker has
  /// not removed yet, so it is an upper bound on the number of live keys.
  pub fn len(&self) -> usize {
    self.shared.contents.read().len()
  }

  /// Returns `true` if no entries are physically present.
  pub fn is_empty(&self) -> bool {
    self.shared.contents.read().is_empty()
  }

  /// The TTL applied by `insert`, and by `set` with a zero TTL.
  pub fn default_ttl(&self) -> Duration {
    self.shared.default_ttl
  }

  /// Returns `true` if this map has an expiration worker of its own.
  pub fn is_dedicated(&self) -> bool {
    matches!(self.shared.domain.kind(), crate::domain::DomainKind::Dedicated(_))
  }

  /// Returns `true` once no expiration record for this map remains queued.
  ///
  /// Deleted and overwritten keys leave stale records behind, which are only
  /// dropped when they reach the front of the queue. This therefore becomes
  /// `true` some time after the last scheduled deadline, not at deletion.
  pub fn pending_expirations_empty(&self) -> bool {
    !self.shared.domain.has_pending(self.shared.id)
  }

  /// Returns a point-in-time snapshot of this map's metrics, including keys
  /// removed by the expiration worker.
  pub fn metrics(&self) -> MetricsSnapshot {
    self.shared.metrics.snapshot()
  }
}
