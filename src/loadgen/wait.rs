use anyhow::Result;
use rand::Rng;
use std::time::Duration;

/// Pause a simulated user takes before each request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaitTime {
    min: Duration,
    max: Duration,
}

impl WaitTime {
    /// Uniform draw from `[min_secs, max_secs]`
    pub fn between(min_secs: f64, max_secs: f64) -> Result<Self> {
        if !(min_secs.is_finite() && max_secs.is_finite()) || min_secs < 0.0 {
            anyhow::bail!("wait bounds must be finite and non-negative: {min_secs}..{max_secs}");
        }
        if min_secs > max_secs {
            anyhow::bail!("min wait {min_secs}s exceeds max wait {max_secs}s");
        }
        Ok(Self {
            min: Duration::from_secs_f64(min_secs),
            max: Duration::from_secs_f64(max_secs),
        })
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        Duration::from_secs_f64(rng.gen_range(self.min.as_secs_f64()..=self.max.as_secs_f64()))
    }
}

impl Default for WaitTime {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(1),
            max: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_default_is_one_to_five_seconds() {
        let wait = WaitTime::default();
        assert_eq!(wait.min(), Duration::from_secs(1));
        assert_eq!(wait.max(), Duration::from_secs(5));
    }

    #[test]
    fn test_samples_stay_in_bounds() {
        let wait = WaitTime::between(1.0, 5.0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let d = wait.sample(&mut rng);
            assert!(d >= wait.min() && d <= wait.max(), "{d:?} out of range");
        }
    }

    #[test]
    fn test_samples_are_not_constant() {
        let wait = WaitTime::between(1.0, 5.0).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let first = wait.sample(&mut rng);
        assert!((0..50).any(|_| wait.sample(&mut rng) != first));
    }

    #[test]
    fn test_same_seed_same_schedule() {
        let wait = WaitTime::default();
        let mut a = StdRng::seed_from_u64(3);
        let mut b = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            assert_eq!(wait.sample(&mut a), wait.sample(&mut b));
        }
    }

    #[test]
    fn test_equal_bounds_give_constant_wait() {
        let wait = WaitTime::between(0.25, 0.25).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(wait.sample(&mut rng), Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_bounds() {
        assert!(WaitTime::between(5.0, 1.0).is_err());
        assert!(WaitTime::between(-1.0, 1.0).is_err());
        assert!(WaitTime::between(0.0, f64::INFINITY).is_err());
    }
}
