//! Property tests for bucket arithmetic.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use tally_core::{Frequency, Interval};

fn any_time() -> impl Strategy<Value = DateTime<Utc>> {
    // 2000-01-01 .. 2100-01-01, second precision.
    (946_684_800i64..4_102_444_800i64).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

fn any_frequency() -> impl Strategy<Value = Frequency> {
    prop_oneof![Just(Frequency::Hour), Just(Frequency::Day)]
}

proptest! {
    #[test]
    fn floor_is_aligned_and_not_later(t in any_time(), freq in any_frequency()) {
        let floored = freq.floor(t);
        prop_assert!(freq.is_aligned(floored));
        prop_assert!(floored <= t);
        prop_assert!(t - floored < freq.step());
        prop_assert_eq!(freq.floor(floored), floored);
    }

    #[test]
    fn bucket_window_contains_its_events(t in any_time(), freq in any_frequency()) {
        let end = freq.bucket_end_for(t).unwrap();
        prop_assert!(freq.is_aligned(end));
        let window = Interval::of(freq).window_ending(end);
        prop_assert!(window.contains(t));
        prop_assert!(!window.contains(end));
        prop_assert!(!window.contains(end - freq.step() - Duration::seconds(1)));
    }

    #[test]
    fn aligned_targets_validate(t in any_time(), freq in any_frequency()) {
        let aligned = freq.floor(t);
        prop_assert_eq!(freq.validate_target(&aligned).unwrap(), aligned);
        if aligned != t {
            prop_assert!(freq.validate_target(&t).is_err());
        }
    }
}
