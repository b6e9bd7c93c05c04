//! The expiration machinery: deadline records, the queue that orders them,
//! the wake-up signal, and the worker thread that retires expired keys.

pub(crate) mod queue;
pub(crate) mod record;
pub(crate) mod signal;
pub(crate) mod worker;
