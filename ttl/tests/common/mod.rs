#![allow(dead_code)]

use std::thread;
use std::time::{Duration, Instant};

use fibre_ttl::{Scheduling, TtlMap, TtlMapBuilder};

// One "second" of the classic expiry scenarios, scaled down so the suite
// stays fast. Every scenario keeps at least one unit of slack on both sides
// of each deadline.
pub const UNIT: Duration = Duration::from_millis(300);

/// Generous bound for the worker to catch up after a deadline.
pub const SETTLE: Duration = Duration::from_secs(5);

pub fn units(n: u32) -> Duration {
  UNIT * n
}

pub fn shared_map(default_ttl: Duration) -> TtlMap<String, String> {
  TtlMapBuilder::new()
    .default_ttl(default_ttl)
    .build()
    .unwrap()
}

pub fn dedicated_map(default_ttl: Duration) -> TtlMap<String, String> {
  TtlMapBuilder::new()
    .default_ttl(default_ttl)
    .scheduling(Scheduling::Dedicated)
    .build()
    .unwrap()
}

pub fn s(value: &str) -> String {
  value.to_string()
}

/// Polls `condition` until it holds or `timeout` elapses.
pub fn eventually(mut condition: impl FnMut() -> bool, timeout: Duration) -> bool {
  let give_up = Instant::now() + timeout;
  while Instant::now() < give_up {
    if condition() {
      return true;
    }
    thread::sleep(Duration::from_millis(10));
  }
  condition()
}
