//! A concurrent key-value map where every entry expires on its own deadline.
//!
//! Entries become invisible to readers the moment their deadline passes and
//! are physically removed later by a background worker, without any reader
//! or writer sweeping the map.
//!
//! # How expiration works
//! - Every write computes a deadline, records it as the key's latest
//!   deadline, and queues a deadline record on a min-heap.
//! - A worker thread pops the earliest record. Records that no longer match
//!   the key's latest deadline (the key was rewritten) are dropped. Due
//!   records remove their key. Records that are not yet due are put back,
//!   and the worker sleeps until the deadline or until a new write wakes it.
//! - Deletes never touch the queue; leftover records are discarded lazily.
//!
//! # Scheduling
//! By default all maps in a process share one queue and one worker thread.
//! A map built with [`Scheduling::Dedicated`] gets a queue and worker of its
//! own. See [`running_workers`].
//!
//! # Example
//!
//! ```rust
//! use fibre_ttl::{Scheduling, TtlMapBuilder};
//! use std::time::Duration;
//!
//! let tokens = TtlMapBuilder::<u64, String>::new()
//!   .default_ttl(Duration::from_secs(5))
//!   .scheduling(Scheduling::Dedicated)
//!   .build()
//!   .unwrap();
//!
//! tokens.insert(1, "abc".to_string());
//! tokens.set(2, "def".to_string(), Duration::from_millis(250));
//! assert!(tokens.contains_key(&1));
//! assert!(tokens.time_to_live(&2).unwrap() <= Duration::from_millis(250));
//! ```

// Public modules that form the API
pub mod builder;
pub mod error;
pub mod handles;
pub mod metrics;

// Internal, crate-only modules
mod domain;
mod shared;
mod store;
mod task;
mod time;

// Re-export the primary user-facing types for convenience
pub use builder::{Scheduling, TtlMapBuilder, TtlMapConfig, DEFAULT_TTL};
pub use error::BuildError;
pub use handles::TtlMap;
pub use metrics::MetricsSnapshot;
pub use task::worker::running_workers;
