use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when building a `TtlMap`.
#[derive(Debug, Error)]
pub enum BuildError {
  /// The map was configured with a default time-to-live of zero. Every entry
  /// needs a positive lifetime.
  #[error("default time-to-live cannot be zero")]
  ZeroTtl,

  /// The default time-to-live is so large that `now + ttl` cannot be
  /// represented by the monotonic clock.
  #[error("default time-to-live of {0:?} overflows the monotonic clock")]
  TtlTooLarge(Duration),

  /// The operating system refused to start the expiration worker thread.
  #[error("failed to spawn expiration worker: {0}")]
  WorkerSpawn(#[from] std::io::Error),
}
