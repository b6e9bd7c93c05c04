use crate::domain::SchedulingDomain;
use crate::error::BuildError;
use crate::handles::TtlMap;
use crate::shared::TtlMapShared;
use crate::task::record::StoreId;
use crate::time;

use core::fmt;
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The time-to-live used when none is given, and the default for `default_ttl`.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Selects which expiration worker a map is served by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Scheduling {
  /// One worker and one queue for every shared-mode map in the process.
  /// The worker is started when the first such map is built.
  #[default]
  Shared,

  /// A worker and queue of its own, started when the map is built.
  ///
  /// The worker is never stopped, even after the map is dropped. Processes
  /// that build many short-lived dedicated maps accumulate idle threads.
  Dedicated,
}

/// Plain configuration for a `TtlMap`, suitable for loading from a file.
///
/// # Example
///
/// ```rust
/// use fibre_ttl::{Scheduling, TtlMapConfig};
/// use std::time::Duration;
///
/// let config = TtlMapConfig::default()
///   .with_default_ttl(Duration::from_secs(30))
///   .with_scheduling(Scheduling::Dedicated);
/// assert_eq!(config.default_ttl, Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TtlMapConfig {
  /// Lifetime of entries written without an explicit TTL (default: 60 seconds).
  pub default_ttl: Duration,
  /// Shared or dedicated expiration worker (default: shared).
  pub scheduling: Scheduling,
}

impl Default for TtlMapConfig {
  fn default() -> Self {
    Self {
      default_ttl: DEFAULT_TTL,
      scheduling: Scheduling::Shared,
    }
  }
}

impl TtlMapConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
    self.default_ttl = ttl;
    self
  }

  pub fn with_scheduling(mut self, scheduling: Scheduling) -> Self {
    self.scheduling = scheduling;
    self
  }
}

/// A builder for creating `TtlMap` instances.
pub struct TtlMapBuilder<K, V, H = ahash::RandomState> {
  default_ttl: Duration,
  scheduling: Scheduling,
  hasher: H,
  _key_marker: PhantomData<K>,
  _value_marker: PhantomData<V>,
}

impl<K, V, H> fmt::Debug for TtlMapBuilder<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TtlMapBuilder")
      .field("default_ttl", &self.default_ttl)
      .field("scheduling", &self.scheduling)
      .finish_non_exhaustive()
  }
}

// --- General Configuration Methods ---
impl<K, V, H> TtlMapBuilder<K, V, H> {
  /// Sets the lifetime of entries written without an explicit TTL.
  pub fn default_ttl(mut self, ttl: Duration) -> Self {
    self.default_ttl = ttl;
    self
  }

  /// Chooses between the shared worker and a dedicated one.
  pub fn scheduling(mut self, scheduling: Scheduling) -> Self {
    self.scheduling = scheduling;
    self
  }

  /// Shorthand for `scheduling(Scheduling::Dedicated)` when `dedicated` is true.
  pub fn dedicated(self, dedicated: bool) -> Self {
    self.scheduling(if dedicated {
      Scheduling::Dedicated
    } else {
      Scheduling::Shared
    })
  }

  /// Applies every setting from `config`.
  pub fn config(self, config: TtlMapConfig) -> Self {
    self
      .default_ttl(config.default_ttl)
      .scheduling(config.scheduling)
  }
}

// --- Default Constructor ---
impl<K, V, H: BuildHasher + Default> TtlMapBuilder<K, V, H> {
  /// Creates a new `TtlMapBuilder` with default settings.
  pub fn new() -> Self {
    Self {
      default_ttl: DEFAULT_TTL,
      scheduling: Scheduling::Shared,
      hasher: H::default(),
      _key_marker: PhantomData,
      _value_marker: PhantomData,
    }
  }
}

impl<K, V> Default for TtlMapBuilder<K, V, ahash::RandomState> {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(feature = "rapidhash")]
impl<K, V> TtlMapBuilder<K, V, rapidhash::RapidRandomState> {
  /// Creates a builder that hashes keys with `rapidhash`.
  pub fn rapidhash() -> Self {
    Self::new()
  }
}

// --- Build Methods ---
impl<K, V, H> TtlMapBuilder<K, V, H>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + Sync + 'static,
  H: BuildHasher + Clone + Send + Sync + 'static,
{
  /// Sets the hasher for the map's contents and deadline table.
  pub fn hasher(mut self, hasher: H) -> Self {
    self.hasher = hasher;
    self
  }

  /// Builds the map, binding it to its scheduling domain.
  ///
  /// Building the first shared-mode map, or any dedicated-mode map, starts a
  /// worker thread.
  pub fn build(self) -> Result<TtlMap<K, V, H>, BuildError> {
    self.validate()?;

    let id = StoreId::next();
    let domain = match self.scheduling {
      Scheduling::Shared => SchedulingDomain::shared()?,
      Scheduling::Dedicated => SchedulingDomain::dedicated(id)?,
    };

    let shared = TtlMapShared::new(id, domain, self.default_ttl, self.hasher);
    Ok(TtlMap {
      shared: Arc::new(shared),
    })
  }

  /// Validates the builder configuration.
  pub(crate) fn validate(&self) -> Result<(), BuildError> {
    if self.default_ttl.is_zero() {
      return Err(BuildError::ZeroTtl);
    }
    if !time::is_representable(self.default_ttl) {
      return Err(BuildError::TtlTooLarge(self.default_ttl));
    }
    Ok(())
  }
}
