use std::time::Duration;

/// A positive rate, in Hz, from which a period ("interval") can be derived.
///
/// Constructing a `Frequency` with a non-positive rate is rejected: the rest
/// of the crate (rate limiters, sequencers) relies on `interval()` being a
/// finite, strictly-positive `Duration`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frequency(f64);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FrequencyError {
    #[error("frequency must be a positive, finite number of Hz, got {0}")]
    NotPositive(String),
}

impl Frequency {
    pub fn from_hz(hz: f64) -> Result<Self, FrequencyError> {
        if !hz.is_finite() || hz <= 0.0 {
            return Err(FrequencyError::NotPositive(hz.to_string()));
        }
        Ok(Self(hz))
    }

    pub fn hz(&self) -> f64 {
        self.0
    }

    /// Duration of one cycle at this frequency.
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_and_negative() {
        assert!(Frequency::from_hz(0.0).is_err());
        assert!(Frequency::from_hz(-1.0).is_err());
        assert!(Frequency::from_hz(f64::NAN).is_err());
    }

    #[test]
    fn interval_is_inverse_of_hz() {
        let f = Frequency::from_hz(10.0).unwrap();
        assert_eq!(f.interval(), Duration::from_millis(100));
    }
}
