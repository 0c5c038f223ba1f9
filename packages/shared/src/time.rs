//! Time-related utilities.

use chrono::{DateTime, TimeZone, Utc};

/// Get current Unix timestamp in UTC (milliseconds)
pub fn now_utc_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert Unix timestamp (milliseconds) to an RFC 3339 string in UTC
pub fn millis_to_rfc3339(timestamp_millis: i64) -> String {
    let seconds = timestamp_millis.div_euclid(1000);
    let nanos = (timestamp_millis.rem_euclid(1000) * 1_000_000) as u32;
    let dt: DateTime<Utc> = match Utc.timestamp_opt(seconds, nanos) {
        chrono::LocalResult::Single(dt) => dt,
        // Out-of-range timestamps cannot come from the system clock; render
        // the epoch rather than panic on a hostile value.
        _ => Utc.timestamp_opt(0, 0).unwrap(),
    };
    dt.to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_utc_millis_returns_positive_value() {
        // given:

        // when:
        let timestamp = now_utc_millis();

        // then:
        assert!(timestamp > 0);
    }

    #[test]
    fn test_now_utc_millis_is_monotonic_enough() {
        // given:
        let first = now_utc_millis();

        // when:
        std::thread::sleep(std::time::Duration::from_millis(10));
        let second = now_utc_millis();

        // then:
        assert!(second >= first);
    }

    #[test]
    fn test_millis_to_rfc3339_format() {
        // given: 2023-01-01 00:00:00 UTC in milliseconds
        let timestamp = 1672531200000;

        // when:
        let result = millis_to_rfc3339(timestamp);

        // then:
        assert!(result.starts_with("2023-01-01T00:00:00"));
        assert!(result.contains("+00:00"));
    }

    #[test]
    fn test_millis_to_rfc3339_keeps_millisecond_precision() {
        // given:
        let timestamp = 1672531200123;

        // when:
        let result = millis_to_rfc3339(timestamp);

        // then:
        assert!(result.starts_with("2023-01-01T00:00:00.123"));
    }

    #[test]
    fn test_millis_to_rfc3339_out_of_range_falls_back_to_epoch() {
        // given:
        let timestamp = i64::MAX;

        // when:
        let result = millis_to_rfc3339(timestamp);

        // then:
        assert!(result.starts_with("1970-01-01T00:00:00"));
    }
}
