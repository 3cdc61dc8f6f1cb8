//! Tallies over a classified variance list.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use super::{Presence, VarianceAccount};
use crate::errors::{Error, Result};
use crate::severity::SeverityTier;

/// Counts per severity tier plus period totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VarianceSummary {
    pub normal: usize,
    pub warning: usize,
    pub critical: usize,
    pub urgent: usize,
    pub total_accounts: usize,
    /// Accounts whose severity is above NORMAL
    pub flagged_accounts: usize,
    pub missing_previous: usize,
    pub missing_current: usize,
    /// Sum of previous amounts, zero-filled sides included
    pub total_previous_period: Decimal,
    /// Sum of current amounts, zero-filled sides included
    pub total_current_period: Decimal,
}

impl VarianceSummary {
    /// Tally `accounts`. Fails when a period total leaves the range of `Decimal`.
    pub fn from_accounts(accounts: &[VarianceAccount]) -> Result<Self> {
        let mut summary = Self::default();
        for account in accounts {
            *summary.count_mut(account.severity) += 1;
            summary.total_accounts += 1;
            if account.is_flagged() {
                summary.flagged_accounts += 1;
            }
            match account.presence {
                Presence::MissingPrevious => summary.missing_previous += 1,
                Presence::MissingCurrent => summary.missing_current += 1,
                Presence::Both => {}
            }
            summary.total_previous_period =
                add_to_total(summary.total_previous_period, account.previous_amount, "previous")?;
            summary.total_current_period =
                add_to_total(summary.total_current_period, account.current_amount, "current")?;
        }
        Ok(summary)
    }

    pub fn count(&self, tier: SeverityTier) -> usize {
        match tier {
            SeverityTier::Normal => self.normal,
            SeverityTier::Warning => self.warning,
            SeverityTier::Critical => self.critical,
            SeverityTier::Urgent => self.urgent,
        }
    }

    fn count_mut(&mut self, tier: SeverityTier) -> &mut usize {
        match tier {
            SeverityTier::Normal => &mut self.normal,
            SeverityTier::Warning => &mut self.warning,
            SeverityTier::Critical => &mut self.critical,
            SeverityTier::Urgent => &mut self.urgent,
        }
    }

    /// Current minus previous total, `None` when the difference is out of range.
    pub fn total_delta(&self) -> Option<Decimal> {
        self.total_current_period.checked_sub(self.total_previous_period)
    }
}

fn add_to_total(total: Decimal, amount: Decimal, period: &str) -> Result<Decimal> {
    total
        .checked_add(amount)
        .ok_or_else(|| Error::validation(format!("{period} period total overflows")))
}

/// Group accounts by tier, highest tier first, keeping input order inside a tier.
pub fn group_by_tier(accounts: &[VarianceAccount]) -> Vec<(SeverityTier, Vec<&VarianceAccount>)> {
    let mut groups: BTreeMap<SeverityTier, Vec<&VarianceAccount>> = BTreeMap::new();
    for account in accounts {
        groups.entry(account.severity).or_default().push(account);
    }
    groups.into_iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variance::{compute, AccountAmount, VarianceOptions};
    use rust_decimal_macros::dec;

    fn sample() -> Vec<VarianceAccount> {
        let previous = vec![
            AccountAmount::new("4010", dec!(1000)),
            AccountAmount::new("4020", dec!(200)),
            AccountAmount::new("6100", dec!(300)),
        ];
        let current = vec![
            AccountAmount::new("4010", dec!(1500)),
            AccountAmount::new("4020", dec!(210)),
            AccountAmount::new("5200", dec!(80)),
        ];
        compute(&previous, &current, &VarianceOptions::default()).unwrap()
    }

    #[test]
    fn test_summary_counts_and_totals() {
        let summary = VarianceSummary::from_accounts(&sample()).unwrap();
        assert_eq!(summary.total_accounts, 4);
        // 4010 critical, 4020 normal (5%), 5200 normal (zero baseline, 80), 6100 urgent
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.urgent, 1);
        assert_eq!(summary.normal, 2);
        assert_eq!(summary.flagged_accounts, 2);
        assert_eq!(summary.missing_previous, 1);
        assert_eq!(summary.missing_current, 1);
        assert_eq!(summary.total_previous_period, dec!(1500));
        assert_eq!(summary.total_current_period, dec!(1790));
        assert_eq!(summary.total_delta(), Some(dec!(290)));
    }

    #[test]
    fn test_tier_counts_sum_to_total() {
        let summary = VarianceSummary::from_accounts(&sample()).unwrap();
        let sum: usize = SeverityTier::ALL.iter().map(|t| summary.count(*t)).sum();
        assert_eq!(sum, summary.total_accounts);
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(VarianceSummary::from_accounts(&[]).unwrap(), VarianceSummary::default());
    }

    #[test]
    fn test_group_by_tier_highest_first() {
        let accounts = sample();
        let groups = group_by_tier(&accounts);
        let tiers: Vec<SeverityTier> = groups.iter().map(|(tier, _)| *tier).collect();
        assert_eq!(
            tiers,
            vec![SeverityTier::Urgent, SeverityTier::Critical, SeverityTier::Normal]
        );
        let normal: Vec<&str> = groups[2].1.iter().map(|a| a.account_code.as_str()).collect();
        assert_eq!(normal, vec!["4020", "5200"]);
    }

    #[test]
    fn test_overflowing_totals_are_an_error() {
        let half = Decimal::MAX / dec!(2) + dec!(1);
        let previous = vec![AccountAmount::new("1000", half), AccountAmount::new("2000", half)];
        let accounts = compute(&previous, &previous, &VarianceOptions::default()).unwrap();
        assert!(VarianceSummary::from_accounts(&accounts).is_err());
    }

    #[test]
    fn test_total_delta_out_of_range_is_none() {
        let summary = VarianceSummary {
            total_previous_period: Decimal::MIN,
            total_current_period: Decimal::MAX,
            ..Default::default()
        };
        assert_eq!(summary.total_delta(), None);
    }
}
