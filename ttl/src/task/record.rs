use std::cmp::Ordering;
use std::fmt;
use std::sync::atomic::{self, AtomicU64};
use std::time::Instant;

/// Process-unique identity of a single `TtlMap`.
///
/// Maps sharing one scheduling domain tell their records apart by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct StoreId(u64);

impl StoreId {
  /// Allocates the next unused id.
  pub(crate) fn next() -> Self {
    static NEXT_ID: AtomicU64 = AtomicU64::new(1);
    Self(NEXT_ID.fetch_add(1, atomic::Ordering::Relaxed))
  }
}

impl fmt::Display for StoreId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// What happened when the worker asked an owner to retire a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Expiry {
  /// The key was present and has been removed.
  Removed,
  /// The deadline was current but the key had already been deleted by a caller.
  AlreadyAbsent,
  /// A newer write replaced the deadline between validation and removal.
  Superseded,
  /// The owning map no longer exists.
  Orphaned,
}

/// The owner-side half of a deadline record.
///
/// A scheduling domain serves maps of arbitrary key and value types, so the
/// queue only sees this type-erased view. Implementations hold the typed key
/// and a weak reference back to the owning map.
pub(crate) trait Expire: Send {
  /// The latest deadline the owner holds for this key, or `None` if the key
  /// has no scheduled expiration or the owner has been dropped.
  fn latest_deadline(&self) -> Option<Instant>;

  /// Removes the key if `deadline` is still its latest deadline.
  fn expire(&self, deadline: Instant) -> Expiry;

  /// Called when the record has been found stale and is being dropped.
  fn discard(&self);
}

/// A queued request to expire one key of one map at `deadline`.
///
/// Records are never mutated. A newer write for the same key simply queues
/// another record, which makes this one stale.
pub(crate) struct DeadlineRecord {
  pub(crate) deadline: Instant,
  pub(crate) owner: StoreId,
  pub(crate) target: Box<dyn Expire>,
}

impl DeadlineRecord {
  pub(crate) fn new(deadline: Instant, owner: StoreId, target: Box<dyn Expire>) -> Self {
    Self {
      deadline,
      owner,
      target,
    }
  }

  /// A record is authoritative only while the owner still holds exactly its deadline.
  #[inline]
  pub(crate) fn is_current(&self) -> bool {
    self.target.latest_deadline() == Some(self.deadline)
  }
}

impl fmt::Debug for DeadlineRecord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("DeadlineRecord")
      .field("deadline", &self.deadline)
      .field("owner", &self.owner)
      .finish_non_exhaustive()
  }
}

// Records are ordered by deadline only. Ties are left unordered.
impl PartialEq for DeadlineRecord {
  fn eq(&self, other: &Self) -> bool {
    self.deadline == other.deadline
  }
}

impl Eq for DeadlineRecord {}

impl PartialOrd for DeadlineRecord {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for DeadlineRecord {
  fn cmp(&self, other: &Self) -> Ordering {
    self.deadline.cmp(&other.deadline)
  }
}
