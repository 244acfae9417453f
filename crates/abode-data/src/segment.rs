//! Market segments: bedroom count crossed with urban-density code.
//!
//! Every regression market is identified by a [`SegmentKey`]. The universe is
//! fixed at 4 bedroom counts × 3 density codes = 12 segments.

use crate::error::{DataError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest bedroom count in the universe.
pub const MIN_BEDROOMS: u8 = 1;

/// Largest bedroom count in the universe.
pub const MAX_BEDROOMS: u8 = 4;

/// Number of segments in the universe.
pub const SEGMENT_COUNT: usize = 12;

/// NCHS urban-rural classification collapsed into three density classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DensityCode {
    /// Code 1
    Urban,

    /// Code 2
    Suburban,

    /// Code 3
    Rural,
}

impl DensityCode {
    /// Returns all density codes in code order.
    pub const fn all() -> [Self; 3] {
        [Self::Urban, Self::Suburban, Self::Rural]
    }

    /// Returns the numeric density code.
    pub const fn code(&self) -> u8 {
        match self {
            Self::Urban => 1,
            Self::Suburban => 2,
            Self::Rural => 3,
        }
    }

    /// Returns the human-readable label used in prediction output.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Urban => "urban",
            Self::Suburban => "suburban",
            Self::Rural => "rural",
        }
    }

    /// Parse a density class from its numeric code.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Urban),
            2 => Some(Self::Suburban),
            3 => Some(Self::Rural),
            _ => None,
        }
    }
}

impl fmt::Display for DensityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Identifies one independent regression market.
///
/// Ordering is bedrooms first, then density code, which is also the
/// iteration order of [`SegmentKey::all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SegmentKey {
    bedrooms: u8,
    density: DensityCode,
}

impl SegmentKey {
    /// Create a segment key, validating it against the universe.
    pub fn new(bedrooms: u8, density_code: u8) -> Result<Self> {
        Self::from_codes(i64::from(bedrooms), i64::from(density_code))
    }

    /// Create a segment key from wide integer codes (as read from data files).
    pub fn from_codes(bedrooms: i64, density_code: i64) -> Result<Self> {
        let invalid = || DataError::InvalidSegment {
            bedrooms,
            density_code,
        };

        let bedrooms_u8 = u8::try_from(bedrooms).map_err(|_| invalid())?;
        if !(MIN_BEDROOMS..=MAX_BEDROOMS).contains(&bedrooms_u8) {
            return Err(invalid());
        }
        let density = u8::try_from(density_code)
            .ok()
            .and_then(DensityCode::from_code)
            .ok_or_else(invalid)?;

        Ok(Self {
            bedrooms: bedrooms_u8,
            density,
        })
    }

    /// Build a key from an already validated density class.
    pub fn with_density(bedrooms: u8, density: DensityCode) -> Result<Self> {
        Self::new(bedrooms, density.code())
    }

    /// All 12 segments, bedroom count outer, density code inner.
    pub fn all() -> Vec<Self> {
        (MIN_BEDROOMS..=MAX_BEDROOMS)
            .flat_map(|bedrooms| {
                DensityCode::all()
                    .into_iter()
                    .map(move |density| Self { bedrooms, density })
            })
            .collect()
    }

    /// Bedroom count.
    pub const fn bedrooms(&self) -> u8 {
        self.bedrooms
    }

    /// Density class.
    pub const fn density(&self) -> DensityCode {
        self.density
    }

    /// Numeric density code.
    pub const fn density_code(&self) -> u8 {
        self.density.code()
    }
}

impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}br/{}", self.bedrooms, self.density.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_universe_size_and_order() {
        let keys = SegmentKey::all();
        assert_eq!(keys.len(), SEGMENT_COUNT);
        assert_eq!(keys[0], SegmentKey::new(1, 1).unwrap());
        assert_eq!(keys[1], SegmentKey::new(1, 2).unwrap());
        assert_eq!(keys[3], SegmentKey::new(2, 1).unwrap());
        assert_eq!(keys[11], SegmentKey::new(4, 3).unwrap());

        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(sorted, keys);
    }

    #[rstest]
    #[case(0, 1)]
    #[case(5, 1)]
    #[case(2, 0)]
    #[case(2, 4)]
    fn test_outside_universe(#[case] bedrooms: u8, #[case] density: u8) {
        assert!(matches!(
            SegmentKey::new(bedrooms, density),
            Err(DataError::InvalidSegment { .. })
        ));
    }

    #[test]
    fn test_from_codes_rejects_negative() {
        assert!(SegmentKey::from_codes(-1, 2).is_err());
        assert!(SegmentKey::from_codes(2, 300).is_err());
    }

    #[test]
    fn test_density_labels() {
        assert_eq!(DensityCode::Urban.label(), "urban");
        assert_eq!(DensityCode::Suburban.label(), "suburban");
        assert_eq!(DensityCode::Rural.label(), "rural");
        assert_eq!(DensityCode::from_code(2), Some(DensityCode::Suburban));
        assert_eq!(DensityCode::from_code(9), None);
    }

    #[test]
    fn test_display() {
        let key = SegmentKey::new(3, 3).unwrap();
        assert_eq!(key.to_string(), "3br/rural");
    }
}
