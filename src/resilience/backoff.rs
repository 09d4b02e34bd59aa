//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// Delay before retry number `retry` (1-based), capped at `max`.
///
/// Jitter adds up to 10% of the capped delay so that endpoints failing
/// together do not retry in lockstep.
pub fn calculate_backoff(retry: u32, base: Duration, max: Duration) -> Duration {
    if retry == 0 {
        return Duration::ZERO;
    }

    let factor = 2u32.saturating_pow(retry - 1);
    let capped = base.saturating_mul(factor).min(max);

    let jitter_range = capped.as_millis() / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    capped + Duration::from_millis(u64::try_from(jitter).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        let base = Duration::from_millis(100);
        let max = Duration::from_millis(2000);

        assert_eq!(calculate_backoff(0, base, max), Duration::ZERO);

        let b1 = calculate_backoff(1, base, max);
        assert!(b1 >= Duration::from_millis(100) && b1 < Duration::from_millis(110));

        let b2 = calculate_backoff(2, base, max);
        assert!(b2 >= Duration::from_millis(200) && b2 < Duration::from_millis(220));
    }

    #[test]
    fn test_backoff_is_capped() {
        let capped = calculate_backoff(30, Duration::from_millis(100), Duration::from_millis(1000));
        assert!(capped >= Duration::from_millis(1000));
        assert!(capped < Duration::from_millis(1100));
    }
}
