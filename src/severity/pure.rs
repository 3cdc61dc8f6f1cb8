/// Pure threshold classification.
///
/// A [`Thresholds`] value is a base tier plus ascending bands. Each band has a
/// floor and says whether the floor itself belongs to the band. The highest
/// band whose floor admits a value wins; values no band admits fall to the
/// base tier. Because floors and tiers are both validated to be strictly
/// ascending, classification is monotonic in the input.
use serde::{Deserialize, Serialize};

use super::{PassRateTier, SeverityTier};
use crate::errors::{Error, Result};

/// Whether a band's floor value belongs to that band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Boundary {
    /// `value >= floor` enters the band (floor belongs to the higher tier)
    Inclusive,
    /// `value > floor` enters the band (floor belongs to the lower tier)
    Exclusive,
}

/// One band: values past `floor` classify as `tier`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band<T> {
    pub floor: f64,
    pub boundary: Boundary,
    pub tier: T,
}

impl<T> Band<T> {
    pub fn inclusive(floor: f64, tier: T) -> Self {
        Self {
            floor,
            boundary: Boundary::Inclusive,
            tier,
        }
    }

    pub fn exclusive(floor: f64, tier: T) -> Self {
        Self {
            floor,
            boundary: Boundary::Exclusive,
            tier,
        }
    }

    #[inline]
    fn admits(&self, value: f64) -> bool {
        match self.boundary {
            Boundary::Inclusive => value >= self.floor,
            Boundary::Exclusive => value > self.floor,
        }
    }
}

/// Validated, ascending classification bands.
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds<T> {
    base: T,
    bands: Vec<Band<T>>,
}

impl<T: Copy + Ord + std::fmt::Debug> Thresholds<T> {
    /// Build thresholds from a base tier and bands listed lowest first.
    ///
    /// Floors must be finite and strictly ascending; tiers must be strictly
    /// ascending and above `base`.
    pub fn new(base: T, bands: Vec<Band<T>>) -> Result<Self> {
        let mut previous_floor = f64::NEG_INFINITY;
        let mut previous_tier = base;
        for band in &bands {
            if !band.floor.is_finite() {
                return Err(Error::configuration(format!(
                    "threshold for {:?} must be finite, got {}",
                    band.tier, band.floor
                )));
            }
            if band.floor <= previous_floor {
                return Err(Error::configuration(format!(
                    "threshold for {:?} ({}) must be greater than the previous threshold ({})",
                    band.tier, band.floor, previous_floor
                )));
            }
            if band.tier <= previous_tier {
                return Err(Error::configuration(format!(
                    "tier {:?} must rank above {:?}",
                    band.tier, previous_tier
                )));
            }
            previous_floor = band.floor;
            previous_tier = band.tier;
        }
        Ok(Self { base, bands })
    }
}

impl<T: Copy> Thresholds<T> {
    /// Tier for values no band admits.
    pub fn base(&self) -> T {
        self.base
    }

    /// Bands, lowest first.
    pub fn bands(&self) -> &[Band<T>] {
        &self.bands
    }

    pub(crate) fn from_known_good(base: T, bands: Vec<Band<T>>) -> Self {
        Self { base, bands }
    }
}

impl Thresholds<SeverityTier> {
    /// `|p| > 50` urgent, `> 25` critical, `> 10` warning.
    pub fn variance_default() -> Self {
        Self::from_known_good(
            SeverityTier::Normal,
            vec![
                Band::exclusive(10.0, SeverityTier::Warning),
                Band::exclusive(25.0, SeverityTier::Critical),
                Band::exclusive(50.0, SeverityTier::Urgent),
            ],
        )
    }
}

impl Thresholds<PassRateTier> {
    /// `>= 95` success, `>= 80` warning, otherwise danger.
    pub fn pass_rate_default() -> Self {
        Self::from_known_good(
            PassRateTier::Danger,
            vec![
                Band::inclusive(80.0, PassRateTier::Warning),
                Band::inclusive(95.0, PassRateTier::Success),
            ],
        )
    }
}

/// Classify a value against ascending bands.
///
/// Total over `f64`: no clamping, and NaN (which no floor admits) falls to
/// the base tier.
pub fn classify<T: Copy>(value: f64, thresholds: &Thresholds<T>) -> T {
    thresholds
        .bands
        .iter()
        .rev()
        .find(|band| band.admits(value))
        .map(|band| band.tier)
        .unwrap_or(thresholds.base)
}

/// Classify a variance percentage by its magnitude.
pub fn classify_variance(percent: f64, thresholds: &Thresholds<SeverityTier>) -> SeverityTier {
    classify(percent.abs(), thresholds)
}

/// Classify a pass rate. Values outside [0, 100] use the same bands.
pub fn classify_pass_rate(pass_rate: f64, thresholds: &Thresholds<PassRateTier>) -> PassRateTier {
    classify(pass_rate, thresholds)
}
