//! Worker accounting is process-wide, so everything that reads the count
//! lives in this binary and runs serially.

use fibre_ttl::{running_workers, Scheduling, TtlMapBuilder};
use serial_test::serial;
use std::time::Duration;

#[test]
#[serial]
fn test_shared_maps_add_at_most_one_worker() {
  let before = running_workers();

  let maps: Vec<_> = (0..5)
    .map(|_| {
      TtlMapBuilder::<u32, u32>::new()
        .default_ttl(Duration::from_secs(10))
        .build()
        .unwrap()
    })
    .collect();

  let after = running_workers();
  assert!(after >= 1);
  assert!(after <= before + 1, "shared maps must share one worker");

  // Building more shared maps never adds workers once one exists.
  let more = TtlMapBuilder::<String, u32>::new().build().unwrap();
  assert_eq!(running_workers(), after);

  drop(more);
  drop(maps);
}

#[test]
#[serial]
fn test_each_dedicated_map_adds_one_worker() {
  let before = running_workers();

  let first = TtlMapBuilder::<u32, u32>::new()
    .scheduling(Scheduling::Dedicated)
    .build()
    .unwrap();
  assert_eq!(running_workers(), before + 1);

  let second = TtlMapBuilder::<u32, u32>::new()
    .dedicated(true)
    .build()
    .unwrap();
  assert_eq!(running_workers(), before + 2);

  assert!(first.is_dedicated());
  assert!(second.is_dedicated());
}

#[test]
#[serial]
fn test_dedicated_workers_outlive_their_maps() {
  let map = TtlMapBuilder::<u32, u32>::new()
    .scheduling(Scheduling::Dedicated)
    .build()
    .unwrap();
  let with_map = running_workers();

  drop(map);
  assert_eq!(running_workers(), with_map);
}
