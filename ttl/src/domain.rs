use crate::error::BuildError;
use crate::task::queue::ExpirationQueue;
use crate::task::record::{DeadlineRecord, StoreId};
use crate::task::signal::WakeSignal;
use crate::task::worker::Worker;

use std::fmt;
use std::sync::Arc;

use crossbeam_utils::CachePadded;
use once_cell::sync::OnceCell;
use tracing::debug;

/// The one scheduling domain shared by every map built in shared mode.
/// Created on first use and kept for the life of the process.
static SHARED_DOMAIN: OnceCell<Arc<SchedulingDomain>> = OnceCell::new();

/// Which maps a scheduling domain serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DomainKind {
  /// Every shared-mode map in the process.
  Shared,
  /// A single dedicated-mode map.
  Dedicated(StoreId),
}

impl fmt::Display for DomainKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DomainKind::Shared => write!(f, "shared"),
      DomainKind::Dedicated(owner) => write!(f, "dedicated-{}", owner),
    }
  }
}

/// The parts of a domain the worker thread needs.
#[derive(Debug, Default)]
pub(crate) struct DomainCore {
  pub(crate) queue: CachePadded<ExpirationQueue>,
  pub(crate) signal: CachePadded<WakeSignal>,
}

impl DomainCore {
  pub(crate) fn new() -> Self {
    Self {
      queue: CachePadded::new(ExpirationQueue::new()),
      signal: CachePadded::new(WakeSignal::new()),
    }
  }
}

/// An expiration queue, its wake-up signal, and the worker draining them.
///
/// Maps bind to a domain when they are built and never change it.
#[derive(Debug)]
pub(crate) struct SchedulingDomain {
  kind: DomainKind,
  core: Arc<DomainCore>,
  worker: Worker,
}

impl SchedulingDomain {
  /// Returns the process-wide shared domain, starting its worker on the
  /// first call. Concurrent first calls start exactly one worker.
  pub(crate) fn shared() -> Result<Arc<Self>, BuildError> {
    SHARED_DOMAIN
      .get_or_try_init(|| Self::start(DomainKind::Shared).map(Arc::new))
      .map(Arc::clone)
  }

  /// Creates a new domain with its own worker, serving only `owner`.
  ///
  /// There is no way to stop the worker; it lives until the process exits.
  pub(crate) fn dedicated(owner: StoreId) -> Result<Arc<Self>, BuildError> {
    Self::start(DomainKind::Dedicated(owner)).map(Arc::new)
  }

  fn start(kind: DomainKind) -> Result<Self, BuildError> {
    let core = Arc::new(DomainCore::new());
    let worker = Worker::spawn(format!("fibre-ttl-{}", kind), Arc::clone(&core))?;
    debug!(domain = %kind, worker = worker.name(), "scheduling domain started");
    Ok(Self { kind, core, worker })
  }

  /// Queues `record` and wakes the worker so it can re-evaluate its sleep.
  pub(crate) fn schedule(&self, record: DeadlineRecord) {
    self.core.queue.push(record);
    self.core.signal.raise();
  }

  /// Returns `true` if any record for `owner`, live or stale, is still queued.
  pub(crate) fn has_pending(&self, owner: StoreId) -> bool {
    self.core.queue.has_records_for(owner)
  }

  /// Total records queued in this domain, across all of its maps.
  pub(crate) fn queued(&self) -> usize {
    self.core.queue.len()
  }

  pub(crate) fn kind(&self) -> DomainKind {
    self.kind
  }

  pub(crate) fn is_worker_running(&self) -> bool {
    self.worker.is_running()
  }
}
