/// Severity classification for variances and rule pass rates
///
/// A continuous metric is mapped to a discrete, ordered tier by a set of
/// threshold bands. The ordering of the tier enums is load-bearing: summaries
/// sort and tally by it, and classification is monotonic in it.
///
/// ## Architecture
///
/// - **pure.rs**: band representation and the classification function
/// - **mod.rs**: tier enums and threshold configuration
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

pub mod pure;

pub use pure::{classify, classify_pass_rate, classify_variance, Band, Boundary, Thresholds};

/// Severity of a period-over-period variance.
///
/// Declared lowest to highest; never reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    /// Within normal period-to-period movement
    Normal,
    /// Worth a second look
    Warning,
    /// Needs review before the period closes
    Critical,
    /// Needs immediate attention
    Urgent,
}

impl SeverityTier {
    /// All tiers in ascending order.
    pub const ALL: [SeverityTier; 4] = [
        SeverityTier::Normal,
        SeverityTier::Warning,
        SeverityTier::Critical,
        SeverityTier::Urgent,
    ];

    /// Get tier label for display
    pub fn label(&self) -> &'static str {
        match self {
            SeverityTier::Normal => "NORMAL",
            SeverityTier::Warning => "WARNING",
            SeverityTier::Critical => "CRITICAL",
            SeverityTier::Urgent => "URGENT",
        }
    }

    /// Whether an account in this tier should be raised with the alerting collaborator.
    pub fn is_alertable(&self) -> bool {
        *self >= SeverityTier::Critical
    }
}

impl std::fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Tier of a validation rule's pass rate.
///
/// Declared lowest to highest; never reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassRateTier {
    Danger,
    Warning,
    Success,
}

impl PassRateTier {
    /// Get tier label for display
    pub fn label(&self) -> &'static str {
        match self {
            PassRateTier::Danger => "danger",
            PassRateTier::Warning => "warning",
            PassRateTier::Success => "success",
        }
    }
}

impl std::fmt::Display for PassRateTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Configuration for severity thresholds
///
/// ```toml
/// [severity]
/// variance_warning = 10.0
/// variance_critical = 25.0
/// variance_urgent = 50.0
/// pass_rate_warning = 80.0
/// pass_rate_success = 95.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityConfig {
    /// |variance %| strictly above this is at least WARNING
    #[serde(default = "default_variance_warning")]
    pub variance_warning: f64,

    /// |variance %| strictly above this is at least CRITICAL
    #[serde(default = "default_variance_critical")]
    pub variance_critical: f64,

    /// |variance %| strictly above this is URGENT
    #[serde(default = "default_variance_urgent")]
    pub variance_urgent: f64,

    /// Pass rate at or above this is at least warning (below is danger)
    #[serde(default = "default_pass_rate_warning")]
    pub pass_rate_warning: f64,

    /// Pass rate at or above this is success
    #[serde(default = "default_pass_rate_success")]
    pub pass_rate_success: f64,
}

impl Default for SeverityConfig {
    fn default() -> Self {
        Self {
            variance_warning: default_variance_warning(),
            variance_critical: default_variance_critical(),
            variance_urgent: default_variance_urgent(),
            pass_rate_warning: default_pass_rate_warning(),
            pass_rate_success: default_pass_rate_success(),
        }
    }
}

impl SeverityConfig {
    /// Build the variance-percentage bands (lower bound exclusive).
    pub fn variance_thresholds(&self) -> Result<Thresholds<SeverityTier>> {
        Thresholds::new(
            SeverityTier::Normal,
            vec![
                Band::exclusive(self.variance_warning, SeverityTier::Warning),
                Band::exclusive(self.variance_critical, SeverityTier::Critical),
                Band::exclusive(self.variance_urgent, SeverityTier::Urgent),
            ],
        )
        .map_err(|e| e.with_context("severity.variance"))
    }

    /// Build the pass-rate bands (lower bound inclusive).
    pub fn pass_rate_thresholds(&self) -> Result<Thresholds<PassRateTier>> {
        Thresholds::new(
            PassRateTier::Danger,
            vec![
                Band::inclusive(self.pass_rate_warning, PassRateTier::Warning),
                Band::inclusive(self.pass_rate_success, PassRateTier::Success),
            ],
        )
        .map_err(|e| e.with_context("severity.pass_rate"))
    }

    /// Check that both band sets can be built.
    pub fn validate(&self) -> Result<()> {
        self.variance_thresholds()?;
        self.pass_rate_thresholds()?;
        if self.variance_warning < 0.0 {
            return Err(Error::configuration(
                "variance thresholds apply to absolute values and must not be negative",
            ));
        }
        Ok(())
    }
}

fn default_variance_warning() -> f64 {
    10.0
}
fn default_variance_critical() -> f64 {
    25.0
}
fn default_variance_urgent() -> f64 {
    50.0
}
fn default_pass_rate_warning() -> f64 {
    80.0
}
fn default_pass_rate_success() -> f64 {
    95.0
}
