//! Period-over-period variance computation.
//!
//! [`compute`] takes the previous and current snapshots of a set of accounts
//! and returns one [`VarianceAccount`] per account code in the union of both,
//! ordered by account code. Each account carries its absolute and percentage
//! delta, a [`SeverityTier`], a [`MatchStatus`] and, when a polarity is
//! known, whether the movement is favorable.
//!
//! Two situations are flagged rather than reported as errors:
//!
//! - an account present on one side only is zero-filled on the missing side
//!   and marked [`Presence::MissingPrevious`] or [`Presence::MissingCurrent`];
//! - a zero previous amount leaves `delta_percent` undefined (`None`), and
//!   severity falls back to absolute-delta bands (see [`VarianceConfig`]).
//!
//! The computation has no side effects. Raising alerts for critical accounts
//! is the caller's job; see [`alerts`].

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::serde_util::null_as_default;
use crate::severity::{classify, classify_variance, Band, SeverityConfig, SeverityTier, Thresholds};

pub mod alerts;
pub mod snapshot;
pub mod summary;

pub use alerts::{critical_alerts, emit_alerts, AlertSink, CollectingSink, EmitOutcome, LogSink, VarianceAlert};
pub use snapshot::{load_comparison, load_snapshot, Period, PeriodComparison, PeriodSnapshot, SnapshotRow};
pub use summary::{group_by_tier, VarianceSummary};

/// One account's amount in a single period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountAmount {
    pub account_code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub account_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub amount: Decimal,
}

impl AccountAmount {
    pub fn new(account_code: impl Into<String>, amount: Decimal) -> Self {
        Self {
            account_code: account_code.into(),
            account_name: String::new(),
            amount,
        }
    }

    pub fn with_name(mut self, account_name: impl Into<String>) -> Self {
        self.account_name = account_name.into();
        self
    }
}

/// Which snapshots an account appeared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Both,
    MissingPrevious,
    MissingCurrent,
}

/// How closely the two period amounts agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Equal to the cent
    Exact,
    /// Within the relative tolerance but not exact
    Tolerance,
    Mismatch,
    MissingPrevious,
    MissingCurrent,
}

impl MatchStatus {
    pub fn label(&self) -> &'static str {
        match self {
            MatchStatus::Exact => "exact",
            MatchStatus::Tolerance => "tolerance",
            MatchStatus::Mismatch => "mismatch",
            MatchStatus::MissingPrevious => "missing_previous",
            MatchStatus::MissingCurrent => "missing_current",
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Direction of movement that counts as good news for an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Revenue and income accounts: growth is favorable
    IncreaseFavorable,
    /// Expense and liability accounts: shrinkage is favorable
    DecreaseFavorable,
}

impl Polarity {
    /// A zero delta is favorable under either polarity.
    pub fn is_favorable(&self, delta: Decimal) -> bool {
        match self {
            Polarity::IncreaseFavorable => delta >= Decimal::ZERO,
            Polarity::DecreaseFavorable => delta <= Decimal::ZERO,
        }
    }
}

/// A classified account comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarianceAccount {
    pub account_code: String,
    pub account_name: String,
    pub previous_amount: Decimal,
    pub current_amount: Decimal,
    pub delta_amount: Decimal,
    /// `None` when the previous amount is zero
    pub delta_percent: Option<f64>,
    pub severity: SeverityTier,
    /// `None` when no polarity is known for the account
    pub is_favorable: Option<bool>,
    pub presence: Presence,
    pub match_status: MatchStatus,
}

impl VarianceAccount {
    /// Percentage for display: one decimal place, or `N/A` for a zero baseline.
    pub fn delta_percent_display(&self) -> String {
        format_percent(self.delta_percent)
    }

    pub fn is_flagged(&self) -> bool {
        self.severity != SeverityTier::Normal
    }
}

/// Render an optional percentage, `N/A` when undefined.
pub fn format_percent(percent: Option<f64>) -> String {
    match percent {
        Some(p) => format!("{p:+.1}%"),
        None => "N/A".to_string(),
    }
}

/// Variance settings.
///
/// ```toml
/// [variance]
/// tolerance_percent = 1.0
/// zero_baseline_warning = 1000
/// zero_baseline_critical = 5000
/// zero_baseline_urgent = 10000
/// ```
///
/// The zero-baseline bands classify accounts whose previous amount is zero by
/// the magnitude of the absolute delta, since no percentage exists for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceConfig {
    /// Relative tolerance, in percent of the larger magnitude
    #[serde(default = "default_tolerance_percent")]
    pub tolerance_percent: Decimal,

    #[serde(default = "default_zero_baseline_warning")]
    pub zero_baseline_warning: Decimal,

    #[serde(default = "default_zero_baseline_critical")]
    pub zero_baseline_critical: Decimal,

    #[serde(default = "default_zero_baseline_urgent")]
    pub zero_baseline_urgent: Decimal,
}

impl Default for VarianceConfig {
    fn default() -> Self {
        Self {
            tolerance_percent: default_tolerance_percent(),
            zero_baseline_warning: default_zero_baseline_warning(),
            zero_baseline_critical: default_zero_baseline_critical(),
            zero_baseline_urgent: default_zero_baseline_urgent(),
        }
    }
}

impl VarianceConfig {
    /// Absolute-delta bands for zero-baseline accounts (lower bound exclusive).
    pub fn zero_baseline_thresholds(&self) -> Result<Thresholds<SeverityTier>> {
        let floor = |amount: Decimal| amount.to_f64().unwrap_or(f64::NAN);
        Thresholds::new(
            SeverityTier::Normal,
            vec![
                Band::exclusive(floor(self.zero_baseline_warning), SeverityTier::Warning),
                Band::exclusive(floor(self.zero_baseline_critical), SeverityTier::Critical),
                Band::exclusive(floor(self.zero_baseline_urgent), SeverityTier::Urgent),
            ],
        )
        .map_err(|e| e.with_context("variance.zero_baseline"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.tolerance_percent.is_sign_negative() {
            return Err(Error::configuration(
                "variance.tolerance_percent must not be negative",
            ));
        }
        if self.zero_baseline_warning.is_sign_negative() {
            return Err(Error::configuration(
                "variance.zero_baseline_warning must not be negative",
            ));
        }
        self.zero_baseline_thresholds()?;
        Ok(())
    }
}

fn default_tolerance_percent() -> Decimal {
    Decimal::ONE
}
fn default_zero_baseline_warning() -> Decimal {
    Decimal::from(1_000)
}
fn default_zero_baseline_critical() -> Decimal {
    Decimal::from(5_000)
}
fn default_zero_baseline_urgent() -> Decimal {
    Decimal::from(10_000)
}

/// Everything [`compute`] needs besides the two snapshots.
#[derive(Debug, Clone)]
pub struct VarianceOptions {
    tolerance: Decimal,
    percent_bands: Thresholds<SeverityTier>,
    zero_baseline_bands: Thresholds<SeverityTier>,
    polarity: BTreeMap<String, Polarity>,
}

impl Default for VarianceOptions {
    fn default() -> Self {
        let config = VarianceConfig::default();
        Self {
            tolerance: config.tolerance_percent / Decimal::ONE_HUNDRED,
            percent_bands: Thresholds::variance_default(),
            zero_baseline_bands: Thresholds::from_known_good(
                SeverityTier::Normal,
                vec![
                    Band::exclusive(1_000.0, SeverityTier::Warning),
                    Band::exclusive(5_000.0, SeverityTier::Critical),
                    Band::exclusive(10_000.0, SeverityTier::Urgent),
                ],
            ),
            polarity: BTreeMap::new(),
        }
    }
}

impl VarianceOptions {
    pub fn from_config(severity: &SeverityConfig, variance: &VarianceConfig) -> Result<Self> {
        variance.validate()?;
        Ok(Self {
            tolerance: variance.tolerance_percent / Decimal::ONE_HUNDRED,
            percent_bands: severity.variance_thresholds()?,
            zero_baseline_bands: variance.zero_baseline_thresholds()?,
            polarity: BTreeMap::new(),
        })
    }

    pub fn with_polarity(mut self, account_code: impl Into<String>, polarity: Polarity) -> Self {
        self.polarity.insert(account_code.into(), polarity);
        self
    }

    pub fn with_polarities(
        mut self,
        polarities: impl IntoIterator<Item = (String, Polarity)>,
    ) -> Self {
        self.polarity.extend(polarities);
        self
    }

    pub fn polarity(&self, account_code: &str) -> Option<Polarity> {
        self.polarity.get(account_code).copied()
    }

    /// Severity of a delta given its percentage, falling back to absolute
    /// bands when the percentage is undefined.
    pub fn severity(&self, delta_amount: Decimal, delta_percent: Option<f64>) -> SeverityTier {
        match delta_percent {
            Some(percent) => classify_variance(percent, &self.percent_bands),
            None => {
                let magnitude = delta_amount.abs().to_f64().unwrap_or(f64::MAX);
                classify(magnitude, &self.zero_baseline_bands)
            }
        }
    }

    /// Match status of two amounts that are both present.
    pub fn match_status(&self, previous: Decimal, current: Decimal) -> MatchStatus {
        if previous.round_dp(2) == current.round_dp(2) {
            return MatchStatus::Exact;
        }
        let Some(gap) = current.checked_sub(previous) else {
            return MatchStatus::Mismatch;
        };
        let allowed = self
            .tolerance
            .checked_mul(previous.abs().max(current.abs()))
            .unwrap_or(Decimal::MAX);
        if gap.abs() <= allowed {
            MatchStatus::Tolerance
        } else {
            MatchStatus::Mismatch
        }
    }
}

/// `delta / |previous| * 100`, undefined for a zero previous amount.
///
/// A ratio too large for `Decimal` saturates to an infinity carrying the
/// sign of `delta`.
pub fn delta_percent(previous: Decimal, delta: Decimal) -> Option<f64> {
    if previous.is_zero() {
        return None;
    }
    let percent = delta
        .checked_div(previous.abs())
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .and_then(|percent| percent.to_f64())
        .unwrap_or(if delta.is_sign_negative() {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    Some(percent)
}

#[derive(Default)]
struct Sides {
    name: String,
    previous: Option<Decimal>,
    current: Option<Decimal>,
}

fn absorb(
    by_code: &mut BTreeMap<String, Sides>,
    rows: &[AccountAmount],
    side: fn(&mut Sides) -> &mut Option<Decimal>,
) -> Result<()> {
    for row in rows {
        let entry = by_code.entry(row.account_code.clone()).or_default();
        if entry.name.is_empty() {
            entry.name.clone_from(&row.account_name);
        }
        let slot = side(entry);
        let total = slot
            .unwrap_or_default()
            .checked_add(row.amount)
            .ok_or_else(|| {
                Error::validation(format!(
                    "amounts for account {} overflow when summed",
                    row.account_code
                ))
            })?;
        *slot = Some(total);
    }
    Ok(())
}

/// Compare two snapshots account by account.
///
/// The result holds one entry per code in the union of both snapshots,
/// ordered by code. Repeated codes within one snapshot are summed.
///
/// Fails with a validation error when summing repeated codes or taking a
/// delta exceeds the range of `Decimal`.
pub fn compute(
    previous: &[AccountAmount],
    current: &[AccountAmount],
    options: &VarianceOptions,
) -> Result<Vec<VarianceAccount>> {
    let mut by_code: BTreeMap<String, Sides> = BTreeMap::new();
    absorb(&mut by_code, current, |s| &mut s.current)?;
    absorb(&mut by_code, previous, |s| &mut s.previous)?;

    by_code
        .into_iter()
        .map(|(account_code, sides)| -> Result<VarianceAccount> {
            let (presence, match_status) = match (sides.previous, sides.current) {
                (Some(p), Some(c)) => (Presence::Both, options.match_status(p, c)),
                (None, _) => (Presence::MissingPrevious, MatchStatus::MissingPrevious),
                (_, None) => (Presence::MissingCurrent, MatchStatus::MissingCurrent),
            };
            let previous_amount = sides.previous.unwrap_or_default();
            let current_amount = sides.current.unwrap_or_default();
            let delta_amount = current_amount.checked_sub(previous_amount).ok_or_else(|| {
                Error::validation(format!(
                    "delta for account {account_code} is out of range ({previous_amount} -> {current_amount})"
                ))
            })?;
            let delta_percent = delta_percent(previous_amount, delta_amount);

            Ok(VarianceAccount {
                severity: options.severity(delta_amount, delta_percent),
                is_favorable: options
                    .polarity(&account_code)
                    .map(|polarity| polarity.is_favorable(delta_amount)),
                account_code,
                account_name: sides.name,
                previous_amount,
                current_amount,
                delta_amount,
                delta_percent,
                presence,
                match_status,
            })
        })
        .collect()
}
