//! Exponential lockout backoff.

use std::time::Duration;

/// Failed submissions before the first lockout.
pub const LOCKOUT_THRESHOLD: u32 = 5;

/// Lockout imposed at the threshold.
pub const BASE_LOCKOUT: Duration = Duration::from_secs(30);

/// Upper bound for a single lockout.
pub const MAX_LOCKOUT: Duration = Duration::from_secs(300);

/// `base * 2^step`, capped at `max`.
pub fn calculate_backoff(step: u32, base: Duration, max: Duration) -> Duration {
    let factor = 2u32.checked_pow(step).unwrap_or(u32::MAX);
    base.saturating_mul(factor).min(max)
}

/// Lockout duration after `attempt_count` consecutive failures under the default policy.
///
/// Zero below the threshold; `min(30s * 2^(attempt_count - 5), 300s)` from there on.
pub fn backoff_duration(attempt_count: u32) -> Duration {
    if attempt_count < LOCKOUT_THRESHOLD {
        return Duration::ZERO;
    }
    calculate_backoff(attempt_count - LOCKOUT_THRESHOLD, BASE_LOCKOUT, MAX_LOCKOUT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_below_threshold_is_zero() {
        for attempts in 0..LOCKOUT_THRESHOLD {
            assert_eq!(backoff_duration(attempts), Duration::ZERO);
        }
    }

    #[test]
    fn test_backoff_calculation() {
        assert_eq!(backoff_duration(5), Duration::from_secs(30));
        assert_eq!(backoff_duration(6), Duration::from_secs(60));
        assert_eq!(backoff_duration(7), Duration::from_secs(120));
        assert_eq!(backoff_duration(8), Duration::from_secs(240));
        // 30 * 2^4 = 480 > 300
        assert_eq!(backoff_duration(9), Duration::from_secs(300));
    }

    #[test]
    fn test_monotonic_and_capped() {
        let mut previous = Duration::ZERO;
        for attempts in 0..200 {
            let current = backoff_duration(attempts);
            assert!(current >= previous, "backoff decreased at {attempts}");
            assert!(current <= MAX_LOCKOUT);
            previous = current;
        }
        assert_eq!(backoff_duration(u32::MAX), MAX_LOCKOUT);
    }
}
