//! Validation-rule health scoring.
//!
//! A rule's health blends how often it passes with how much evidence there is
//! behind that pass rate:
//!
//! ```text
//! activity = min(total_tests / saturation_tests, 1) * 100
//! health   = pass_rate * accuracy_weight + activity * activity_weight
//! ```
//!
//! With the default weights (0.7 / 0.3, saturation at 10 tests) a rule that
//! has never run cannot score above 70, whatever its nominal pass rate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::score_types::Score0To100;
use crate::serde_util::{null_as_default, string_or_number};
use crate::severity::{classify_pass_rate, PassRateTier, Thresholds};

pub mod report;

pub use report::{RuleHealth, RuleHealthReport, TierTally};

/// Per-rule execution statistics as served by the rule-statistics endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleStatistics {
    #[serde(deserialize_with = "string_or_number")]
    pub rule_id: String,

    #[serde(default)]
    pub document_type: Option<String>,

    /// Severity the rule was authored with (e.g. "error", "warning")
    #[serde(default)]
    pub severity: Option<String>,

    #[serde(default)]
    pub rule_name: Option<String>,

    #[serde(default)]
    pub rule_type: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub passed_count: u64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub failed_count: u64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub total_tests: u64,

    /// Reported pass rate in percent; derived from the counts when absent
    #[serde(default)]
    pub pass_rate: Option<f64>,

    #[serde(default = "default_is_active")]
    pub is_active: bool,

    #[serde(default)]
    pub last_executed_at: Option<DateTime<Utc>>,
}

fn default_is_active() -> bool {
    true
}

impl RuleStatistics {
    /// Build statistics from raw pass/fail counts.
    pub fn from_counts(rule_id: impl Into<String>, passed: u64, failed: u64) -> Self {
        let total = passed + failed;
        Self {
            rule_id: rule_id.into(),
            document_type: None,
            severity: None,
            rule_name: None,
            rule_type: None,
            passed_count: passed,
            failed_count: failed,
            total_tests: total,
            pass_rate: Some(derive_pass_rate(passed, total)),
            is_active: true,
            last_executed_at: None,
        }
    }

    /// Effective pass rate in percent.
    ///
    /// The reported value wins when present; otherwise it is derived from
    /// `passed_count / total_tests`, and is 0 for a rule with no tests.
    pub fn pass_rate(&self) -> f64 {
        self.pass_rate
            .unwrap_or_else(|| derive_pass_rate(self.passed_count, self.total_tests))
    }

    /// Name for display, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.rule_name.as_deref().unwrap_or(&self.rule_id)
    }
}

fn derive_pass_rate(passed: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64 * 100.0
    }
}

/// Health blend weights.
///
/// ```toml
/// [health]
/// accuracy_weight = 0.7
/// activity_weight = 0.3
/// saturation_tests = 10
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Weight of the pass rate component
    #[serde(default = "default_accuracy_weight")]
    pub accuracy_weight: f64,

    /// Weight of the activity component
    #[serde(default = "default_activity_weight")]
    pub activity_weight: f64,

    /// Test count at which the activity component saturates at 100
    #[serde(default = "default_saturation_tests")]
    pub saturation_tests: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            accuracy_weight: default_accuracy_weight(),
            activity_weight: default_activity_weight(),
            saturation_tests: default_saturation_tests(),
        }
    }
}

impl HealthConfig {
    /// Weights must be non-negative and sum to 1; saturation must be positive.
    pub fn validate(&self) -> Result<()> {
        if self.accuracy_weight < 0.0 || self.activity_weight < 0.0 {
            return Err(Error::configuration("health weights must not be negative"));
        }
        let sum = self.accuracy_weight + self.activity_weight;
        if (sum - 1.0).abs() > 0.001 {
            return Err(Error::configuration(format!(
                "health weights must sum to 1.0, got {sum:.3}"
            )));
        }
        if self.saturation_tests == 0 {
            return Err(Error::configuration(
                "health.saturation_tests must be at least 1",
            ));
        }
        Ok(())
    }
}

fn default_accuracy_weight() -> f64 {
    0.7
}
fn default_activity_weight() -> f64 {
    0.3
}
fn default_saturation_tests() -> u64 {
    10
}

/// Activity component: saturates at `config.saturation_tests`.
pub fn activity_component(total_tests: u64, config: &HealthConfig) -> f64 {
    let saturation = config.saturation_tests.max(1) as f64;
    (total_tests as f64 / saturation).min(1.0) * 100.0
}

/// Composite health score for one rule.
pub fn score(rule: &RuleStatistics, config: &HealthConfig) -> Score0To100 {
    let activity = activity_component(rule.total_tests, config);
    Score0To100::new(rule.pass_rate() * config.accuracy_weight + activity * config.activity_weight)
}

/// Pass-rate tier for one rule.
pub fn pass_rate_tier(rule: &RuleStatistics, thresholds: &Thresholds<PassRateTier>) -> PassRateTier {
    classify_pass_rate(rule.pass_rate(), thresholds)
}
