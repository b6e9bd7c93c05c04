//! User-facing handles to a map.

mod sync;

pub use sync::TtlMap;
