//! Confidence score module

use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence score in the closed range [0, 100]
///
/// The inner value can only be built through constructors that keep it in
/// range, so every stored element satisfies the bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Confidence(u8);

impl Confidence {
    /// Upper bound, and the score a freshly extracted element starts with
    pub const MAX: Confidence = Confidence(100);

    /// Lower bound
    pub const MIN: Confidence = Confidence(0);

    /// Create a confidence score, rejecting values above 100
    ///
    /// # Examples
    ///
    /// ```
    /// use claimchart_domain::Confidence;
    ///
    /// assert_eq!(Confidence::new(80).unwrap().value(), 80);
    /// assert!(Confidence::new(101).is_err());
    /// ```
    pub fn new(value: u8) -> Result<Self, String> {
        if value > 100 {
            return Err(format!("Confidence {} out of range [0, 100]", value));
        }
        Ok(Self(value))
    }

    /// Build a score from an arbitrary number reported by the AI
    ///
    /// Fractional values are rounded, out-of-range values are clamped and
    /// NaN maps to zero.
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            return Self::MIN;
        }
        Self(value.round().clamp(0.0, 100.0) as u8)
    }

    /// Get the raw score
    pub fn value(&self) -> u8 {
        self.0
    }

    /// The lower of two scores
    pub fn lowest(self, other: Confidence) -> Confidence {
        self.min(other)
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::MAX
    }
}

impl TryFrom<i64> for Confidence {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if !(0..=100).contains(&value) {
            return Err(format!("Confidence {} out of range [0, 100]", value));
        }
        Ok(Self(value as u8))
    }
}

impl From<Confidence> for u8 {
    fn from(confidence: Confidence) -> Self {
        confidence.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_full_confidence() {
        assert_eq!(Confidence::default().value(), 100);
    }

    #[test]
    fn test_clamped() {
        assert_eq!(Confidence::clamped(85.4).value(), 85);
        assert_eq!(Confidence::clamped(-3.0).value(), 0);
        assert_eq!(Confidence::clamped(250.0).value(), 100);
        assert_eq!(Confidence::clamped(f64::NAN).value(), 0);
    }

    #[test]
    fn test_lowest() {
        let current = Confidence::new(70).unwrap();
        let incoming = Confidence::new(85).unwrap();
        assert_eq!(current.lowest(incoming), current);
        assert_eq!(incoming.lowest(current), current);
    }

    #[test]
    fn test_serde_rejects_out_of_range() {
        assert!(serde_json::from_str::<Confidence>("101").is_err());
        assert!(serde_json::from_str::<Confidence>("-1").is_err());
        let parsed: Confidence = serde_json::from_str("42").unwrap();
        assert_eq!(parsed.value(), 42);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "42");
    }

    #[test]
    fn test_display() {
        assert_eq!(Confidence::new(55).unwrap().to_string(), "55%");
    }
}
