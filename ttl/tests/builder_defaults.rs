use fibre_ttl::{BuildError, Scheduling, TtlMap, TtlMapBuilder, TtlMapConfig, DEFAULT_TTL};
use std::time::Duration;

#[test]
fn test_builder_defaults() {
  let map = TtlMapBuilder::<i32, i32>::new().build().unwrap();
  assert_eq!(map.default_ttl(), DEFAULT_TTL);
  assert_eq!(DEFAULT_TTL, Duration::from_secs(60));
  assert!(!map.is_dedicated());
}

#[test]
fn test_builder_rejects_zero_default_ttl() {
  let result = TtlMapBuilder::<i32, i32>::new()
    .default_ttl(Duration::ZERO)
    .build();
  assert!(matches!(result, Err(BuildError::ZeroTtl)));
}

#[test]
fn test_builder_rejects_unrepresentable_default_ttl() {
  let result = TtlMapBuilder::<i32, i32>::new()
    .default_ttl(Duration::MAX)
    .build();
  match result {
    Err(BuildError::TtlTooLarge(ttl)) => assert_eq!(ttl, Duration::MAX),
    other => panic!("expected TtlTooLarge, got {:?}", other.map(|_| ())),
  }
}

#[test]
fn test_builder_error_messages() {
  assert_eq!(
    BuildError::ZeroTtl.to_string(),
    "default time-to-live cannot be zero"
  );
}

#[test]
fn test_builder_dedicated_flag() {
  let dedicated = TtlMapBuilder::<i32, i32>::new()
    .dedicated(true)
    .build()
    .unwrap();
  assert!(dedicated.is_dedicated());

  let shared = TtlMapBuilder::<i32, i32>::new()
    .scheduling(Scheduling::Dedicated)
    .dedicated(false)
    .build()
    .unwrap();
  assert!(!shared.is_dedicated());
}

#[test]
fn test_map_from_config() {
  let config = TtlMapConfig::new()
    .with_default_ttl(Duration::from_secs(5))
    .with_scheduling(Scheduling::Dedicated);
  let map: TtlMap<String, String> = TtlMap::with_config(config).unwrap();

  assert_eq!(map.default_ttl(), Duration::from_secs(5));
  assert!(map.is_dedicated());
}

#[test]
fn test_config_zero_ttl_is_rejected_at_build() {
  let config = TtlMapConfig::new().with_default_ttl(Duration::ZERO);
  let result = TtlMap::<String, String>::with_config(config);
  assert!(matches!(result, Err(BuildError::ZeroTtl)));
}

#[test]
fn test_set_with_huge_ttl_saturates() {
  let map = TtlMapBuilder::<i32, i32>::new().build().unwrap();
  map.set(1, 1, Duration::MAX);

  assert_eq!(map.get(&1).as_deref(), Some(&1));
  let remaining = map.time_to_live(&1).unwrap();
  assert!(remaining > Duration::from_secs(365 * 24 * 60 * 60));
}

#[cfg(feature = "serde")]
#[test]
fn test_config_deserializes_with_defaults() {
  let config: TtlMapConfig = serde_json::from_str(r#"{"scheduling":"dedicated"}"#).unwrap();
  assert_eq!(config.scheduling, Scheduling::Dedicated);
  assert_eq!(config.default_ttl, DEFAULT_TTL);

  let config: TtlMapConfig =
    serde_json::from_str(r#"{"default_ttl":{"secs":2,"nanos":0}}"#).unwrap();
  assert_eq!(config.default_ttl, Duration::from_secs(2));
  assert_eq!(config.scheduling, Scheduling::Shared);
}

#[cfg(feature = "serde")]
#[test]
fn test_config_round_trips_through_json() {
  let config = TtlMapConfig::new()
    .with_default_ttl(Duration::from_millis(1500))
    .with_scheduling(Scheduling::Dedicated);
  let json = serde_json::to_string(&config).unwrap();
  let back: TtlMapConfig = serde_json::from_str(&json).unwrap();
  assert_eq!(back, config);
}
