use crate::domain::DomainCore;
use crate::task::record::Expiry;
use crate::time;

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, error, trace};

/// Number of expiration worker threads currently alive in this process.
static RUNNING_WORKERS: AtomicUsize = AtomicUsize::new(0);

/// Returns the number of expiration worker threads currently running.
///
/// All shared-mode maps together account for at most one worker. Every
/// dedicated-mode map adds exactly one more, which then lives until the
/// process exits.
pub fn running_workers() -> usize {
  RUNNING_WORKERS.load(Ordering::Acquire)
}

/// Holds one slot in `RUNNING_WORKERS` for as long as it is alive.
struct LiveWorker;

impl LiveWorker {
  fn register() -> Self {
    RUNNING_WORKERS.fetch_add(1, Ordering::AcqRel);
    Self
  }
}

impl Drop for LiveWorker {
  fn drop(&mut self) {
    RUNNING_WORKERS.fetch_sub(1, Ordering::AcqRel);
  }
}

/// The background thread that retires expired keys for one scheduling domain.
///
/// The thread is detached in spirit: nothing ever joins it and it never
/// keeps the process alive once `main` returns.
#[derive(Debug)]
pub(crate) struct Worker {
  name: String,
  handle: JoinHandle<()>,
}

impl Worker {
  /// Spawns a new worker thread serving `core`.
  pub(crate) fn spawn(name: String, core: Arc<DomainCore>) -> io::Result<Self> {
    // Registered before spawning so the count is already correct when the
    // constructing map is returned to its caller. If the spawn fails the
    // closure, and the registration with it, is dropped.
    let live = LiveWorker::register();

    let handle = thread::Builder::new().name(name.clone()).spawn(move || {
      let _live = live;
      debug!(worker = ?thread::current().name(), "expiration worker started");
      Self::run(&core);
    })?;

    Ok(Self { name, handle })
  }

  pub(crate) fn name(&self) -> &str {
    &self.name
  }

  pub(crate) fn is_running(&self) -> bool {
    !self.handle.is_finished()
  }

  /// The main loop. One misbehaving iteration is logged and skipped; it never
  /// takes the worker down.
  fn run(core: &DomainCore) {
    loop {
      if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| Self::step(core))) {
        error!(
          fault = panic_message(payload.as_ref()),
          "expiration worker iteration panicked; continuing with the next record"
        );
      }
    }
  }

  /// Processes the earliest queued record.
  fn step(core: &DomainCore) {
    let record = core.queue.pop_min();

    if !record.is_current() {
      trace!(owner = %record.owner, "discarding stale deadline record");
      record.target.discard();
      return;
    }

    let now = Instant::now();
    if time::remaining(record.deadline, now).is_none() {
      match record.target.expire(record.deadline) {
        Expiry::Removed => trace!(owner = %record.owner, "expired key removed"),
        Expiry::AlreadyAbsent => trace!(owner = %record.owner, "expired key was already deleted"),
        Expiry::Superseded => trace!(owner = %record.owner, "key was rewritten before removal"),
        Expiry::Orphaned => trace!(owner = %record.owner, "owner dropped before removal"),
      }
      return;
    }

    // Not due yet. Put it back and sleep until it is, unless a write raises
    // the signal first because it may have queued an earlier deadline.
    let deadline = record.deadline;
    core.queue.push(record);
    core.signal.wait_until(deadline);
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
  payload
    .downcast_ref::<&str>()
    .copied()
    .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
    .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::task::record::tests::{record_for, FakeOwner};
  use crate::task::record::{DeadlineRecord, Expire, StoreId};
  use std::time::Duration;

  fn spawn_test_worker() -> (Arc<DomainCore>, Worker) {
    let core = Arc::new(DomainCore::new());
    let worker = Worker::spawn("fibre-ttl-test".to_string(), core.clone()).unwrap();
    (core, worker)
  }

  fn schedule(core: &DomainCore, record: DeadlineRecord) {
    core.queue.push(record);
    core.signal.raise();
  }

  fn wait_for(mut condition: impl FnMut() -> bool, timeout: Duration) -> bool {
    let give_up = Instant::now() + timeout;
    while Instant::now() < give_up {
      if condition() {
        return true;
      }
      thread::sleep(Duration::from_millis(5));
    }
    condition()
  }

  #[test]
  fn expires_a_due_record() {
    let (core, worker) = spawn_test_worker();
    assert!(worker.is_running());
    assert_eq!(worker.name(), "fibre-ttl-test");

    let owner = Arc::new(FakeOwner::default());
    let deadline = Instant::now();
    *owner.latest.lock() = Some(deadline);
    schedule(&core, record_for(&owner, StoreId::next(), deadline));

    assert!(wait_for(|| owner.expired.lock().len() == 1, Duration::from_secs(2)));
    assert!(wait_for(|| core.queue.len() == 0, Duration::from_secs(2)));
  }

  #[test]
  fn discards_stale_records_without_expiring() {
    let (core, _worker) = spawn_test_worker();
    let owner = Arc::new(FakeOwner::default());
    let stale = Instant::now();
    let live = stale + Duration::from_secs(60);
    *owner.latest.lock() = Some(live);

    schedule(&core, record_for(&owner, StoreId::next(), stale));

    assert!(wait_for(|| *owner.discarded.lock() == 1, Duration::from_secs(2)));
    assert!(owner.expired.lock().is_empty());
  }

  #[test]
  fn waits_for_a_future_deadline() {
    let (core, _worker) = spawn_test_worker();
    let owner = Arc::new(FakeOwner::default());
    let deadline = Instant::now() + Duration::from_millis(150);
    *owner.latest.lock() = Some(deadline);

    schedule(&core, record_for(&owner, StoreId::next(), deadline));

    thread::sleep(Duration::from_millis(50));
    assert!(owner.expired.lock().is_empty(), "record must not expire early");

    assert!(wait_for(|| owner.expired.lock().len() == 1, Duration::from_secs(2)));
    assert!(Instant::now() >= deadline);
  }

  #[test]
  fn an_earlier_deadline_interrupts_the_sleep() {
    let (core, _worker) = spawn_test_worker();
    let id = StoreId::next();

    let far_owner = Arc::new(FakeOwner::default());
    let far = Instant::now() + Duration::from_secs(30);
    *far_owner.latest.lock() = Some(far);
    schedule(&core, record_for(&far_owner, id, far));

    // Let the worker settle into its long sleep.
    thread::sleep(Duration::from_millis(50));

    let near_owner = Arc::new(FakeOwner::default());
    let near = Instant::now() + Duration::from_millis(50);
    *near_owner.latest.lock() = Some(near);
    schedule(&core, record_for(&near_owner, id, near));

    assert!(wait_for(
      || near_owner.expired.lock().len() == 1,
      Duration::from_secs(2)
    ));
    assert!(far_owner.expired.lock().is_empty());
  }

  struct PanickingTarget;

  impl Expire for PanickingTarget {
    fn latest_deadline(&self) -> Option<Instant> {
      panic!("owner bookkeeping is corrupt");
    }

    fn expire(&self, _deadline: Instant) -> Expiry {
      unreachable!()
    }

    fn discard(&self) {}
  }

  #[test]
  fn survives_a_panicking_iteration() {
    let (core, worker) = spawn_test_worker();
    let id = StoreId::next();

    schedule(
      &core,
      DeadlineRecord::new(Instant::now(), id, Box::new(PanickingTarget)),
    );

    let owner = Arc::new(FakeOwner::default());
    let deadline = Instant::now();
    *owner.latest.lock() = Some(deadline);
    schedule(&core, record_for(&owner, id, deadline));

    assert!(wait_for(|| owner.expired.lock().len() == 1, Duration::from_secs(2)));
    assert!(worker.is_running());
  }

  #[test]
  fn counts_live_workers() {
    let (_core, _worker) = spawn_test_worker();
    // Other tests in this binary spawn workers concurrently, so only a lower
    // bound is stable here. Exact counts are covered by tests/worker_count.rs.
    assert!(running_workers() >= 1);
  }
}
