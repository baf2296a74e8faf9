//! # Arrival pacing.
//!
//! [`ArrivalPacing`] draws the pause between two arrivals uniformly from
//! `[min, max]`. It spreads cars out so they do not all hammer the boarding
//! signal at once; it has no part in deciding who boards.

use std::time::Duration;

use rand::Rng;

/// Uniform random pause between arrivals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArrivalPacing {
    /// Shortest pause.
    pub min: Duration,
    /// Longest pause.
    pub max: Duration,
}

impl Default for ArrivalPacing {
    /// `0s..=1s`.
    fn default() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::from_secs(1),
        }
    }
}

impl ArrivalPacing {
    /// Fixed pause of `delay` (no randomness).
    pub fn fixed(delay: Duration) -> Self {
        Self {
            min: delay,
            max: delay,
        }
    }

    /// True if `min <= max`.
    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }

    /// Draws the next pause. An inverted range yields `min`.
    pub fn next_delay(&self) -> Duration {
        if self.min >= self.max {
            return self.min;
        }
        rand::rng().random_range(self.min..=self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_range_bounds() {
        let pacing = ArrivalPacing::default();
        for _ in 0..200 {
            let d = pacing.next_delay();
            assert!(d <= Duration::from_secs(1), "{d:?} above max");
        }
    }

    #[test]
    fn narrow_range_bounds() {
        let pacing = ArrivalPacing {
            min: Duration::from_millis(100),
            max: Duration::from_millis(150),
        };
        for _ in 0..200 {
            let d = pacing.next_delay();
            assert!(d >= Duration::from_millis(100));
            assert!(d <= Duration::from_millis(150));
        }
    }

    #[test]
    fn huge_range_stays_in_bounds() {
        let pacing = ArrivalPacing {
            min: Duration::from_secs(1 << 62),
            max: Duration::from_secs(1 << 63),
        };
        for _ in 0..200 {
            let d = pacing.next_delay();
            assert!(d >= pacing.min && d <= pacing.max, "{d:?} out of range");
        }
    }

    #[test]
    fn fixed_and_inverted_return_min() {
        let fixed = ArrivalPacing::fixed(Duration::from_millis(250));
        assert_eq!(fixed.next_delay(), Duration::from_millis(250));

        let inverted = ArrivalPacing {
            min: Duration::from_millis(300),
            max: Duration::from_millis(100),
        };
        assert!(!inverted.is_valid());
        assert_eq!(inverted.next_delay(), Duration::from_millis(300));
    }
}
