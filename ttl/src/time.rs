use std::time::{Duration, Instant};

/// The furthest a deadline may be pushed into the future. Larger TTLs are
/// clamped to this so that computing a deadline can never overflow.
const MAX_DEADLINE_OFFSET: Duration = Duration::from_secs(u32::MAX as u64);

/// Computes the absolute deadline `ttl` from now, saturating instead of
/// overflowing the monotonic clock.
#[inline]
pub(crate) fn deadline_after(ttl: Duration) -> Instant {
  let now = Instant::now();
  now
    .checked_add(ttl)
    .or_else(|| now.checked_add(MAX_DEADLINE_OFFSET))
    .unwrap_or(now)
}

/// Returns `true` if `now + ttl` is representable without clamping.
#[inline]
pub(crate) fn is_representable(ttl: Duration) -> bool {
  Instant::now().checked_add(ttl).is_some()
}

/// Time left until `deadline`, or `None` if it has already passed.
#[inline]
pub(crate) fn remaining(deadline: Instant, now: Instant) -> Option<Duration> {
  deadline
    .checked_duration_since(now)
    .filter(|left| !left.is_zero())
}
