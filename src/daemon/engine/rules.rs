//! Hour gates shared by the reminders. All hours are local wall clock hours.

/// Whether `now_hour` falls in `[start_hour, end_hour)`. `end_hour` 24 means until midnight,
/// `start_hour > end_hour` wraps across midnight (22..6 allows 22, 23, 0..5). Bounds are clamped to
/// 0..=23 and 1..=24 first, equal bounds after that are an always open window.
pub fn is_in_hour_window(start_hour: i64, end_hour: i64, now_hour: u32) -> bool {
    let start = start_hour.clamp(0, 23);
    let end = end_hour.clamp(1, 24);
    let hour = i64::from(now_hour).clamp(0, 23);

    if start == end {
        return true;
    }
    if start < end {
        start <= hour && hour < end
    } else {
        hour >= start || hour < end
    }
}

/// "Only before" gate with a 1..=24 bound. 24 or more is the whole day, anything below 1 is
/// treated as 1.
pub fn is_before_cutoff(cutoff_hour: i64, now_hour: u32) -> bool {
    if cutoff_hour >= 24 {
        return true;
    }
    i64::from(now_hour) < cutoff_hour.max(1)
}

/// "Only after" gate with a 0..=23 bound. 0 is the whole day.
pub fn is_after_hour(after_hour: i64, now_hour: u32) -> bool {
    i64::from(now_hour) >= after_hour.clamp(0, 23)
}

#[cfg(test)]
mod tests {
    use super::{is_after_hour, is_before_cutoff, is_in_hour_window};

    #[test]
    fn test_equal_bounds_are_always_open() {
        for bound in 1..=23 {
            for hour in 0..24 {
                assert!(is_in_hour_window(bound, bound, hour), "{bound} {hour}");
            }
        }
    }

    #[test]
    fn test_out_of_range_bounds_are_clamped_before_comparing() {
        // 0..0 becomes 0..1 and 24..24 becomes 23..24.
        for hour in 0..24 {
            assert_eq!(is_in_hour_window(0, 0, hour), hour == 0, "0..0 at {hour}");
            assert_eq!(is_in_hour_window(24, 24, hour), hour == 23, "24..24 at {hour}");
        }
        // -3..99 becomes 0..24.
        for hour in 0..24 {
            assert!(is_in_hour_window(-3, 99, hour));
        }
    }

    #[test]
    fn test_window_matches_definition() {
        for start in 0..=23 {
            for end in 1..=24 {
                for hour in 0..24u32 {
                    let h = i64::from(hour);
                    let expected = if start == end {
                        true
                    } else if start < end {
                        start <= h && h < end
                    } else {
                        h >= start || h < end
                    };
                    assert_eq!(
                        is_in_hour_window(start, end, hour),
                        expected,
                        "{start}..{end} at {hour}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_window_examples() {
        assert!(is_in_hour_window(12, 22, 12));
        assert!(!is_in_hour_window(12, 22, 22));
        assert!(is_in_hour_window(12, 24, 23));
        assert!(is_in_hour_window(22, 6, 23));
        assert!(is_in_hour_window(22, 6, 0));
        assert!(!is_in_hour_window(22, 6, 6));
        assert!(!is_in_hour_window(22, 6, 12));
    }

    #[test]
    fn test_cutoff_of_a_full_day_is_always_open() {
        for cutoff in [24, 25, 100] {
            for hour in 0..24 {
                assert!(is_before_cutoff(cutoff, hour));
            }
        }
    }

    #[test]
    fn test_cutoff_is_exclusive_and_clamped() {
        assert!(is_before_cutoff(15, 14));
        assert!(!is_before_cutoff(15, 15));
        assert!(!is_before_cutoff(15, 16));
        assert!(is_before_cutoff(0, 0));
        assert!(!is_before_cutoff(-5, 1));
    }

    #[test]
    fn test_after_hour() {
        for hour in 0..24 {
            assert!(is_after_hour(0, hour));
        }
        assert!(!is_after_hour(17, 16));
        assert!(is_after_hour(17, 17));
        assert!(is_after_hour(40, 23));
        assert!(!is_after_hour(40, 22));
    }
}
