//! Ranked health report over a set of rules.

use serde::Serialize;

use super::{pass_rate_tier, score, HealthConfig, RuleStatistics};
use crate::score_types::Score0To100;
use crate::severity::{PassRateTier, Thresholds};

/// One scored rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleHealth {
    pub rule_id: String,
    pub rule_name: String,
    pub pass_rate: f64,
    pub total_tests: u64,
    pub health: Score0To100,
    pub tier: PassRateTier,
    pub is_active: bool,
}

/// Rule counts per pass-rate tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierTally {
    pub success: usize,
    pub warning: usize,
    pub danger: usize,
}

impl TierTally {
    fn record(&mut self, tier: PassRateTier) {
        match tier {
            PassRateTier::Success => self.success += 1,
            PassRateTier::Warning => self.warning += 1,
            PassRateTier::Danger => self.danger += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.success + self.warning + self.danger
    }
}

/// Rules ranked worst-first, with tier tallies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleHealthReport {
    /// Sorted by health ascending; ties broken by rule id
    pub rules: Vec<RuleHealth>,
    pub tiers: TierTally,
    pub inactive_rules: usize,
    /// Mean health across all rules, `None` for an empty report
    pub average_health: Option<f64>,
}

impl RuleHealthReport {
    pub fn build(
        rules: &[RuleStatistics],
        config: &HealthConfig,
        thresholds: &Thresholds<PassRateTier>,
    ) -> Self {
        let mut scored: Vec<RuleHealth> = rules
            .iter()
            .map(|rule| RuleHealth {
                rule_id: rule.rule_id.clone(),
                rule_name: rule.display_name().to_string(),
                pass_rate: rule.pass_rate(),
                total_tests: rule.total_tests,
                health: score(rule, config),
                tier: pass_rate_tier(rule, thresholds),
                is_active: rule.is_active,
            })
            .collect();

        scored.sort_by(|a, b| {
            a.health
                .value()
                .total_cmp(&b.health.value())
                .then_with(|| a.rule_id.cmp(&b.rule_id))
        });

        let mut tiers = TierTally::default();
        for rule in &scored {
            tiers.record(rule.tier);
        }

        let average_health = if scored.is_empty() {
            None
        } else {
            Some(scored.iter().map(|r| r.health.value()).sum::<f64>() / scored.len() as f64)
        };

        Self {
            inactive_rules: scored.iter().filter(|r| !r.is_active).count(),
            rules: scored,
            tiers,
            average_health,
        }
    }

    /// The `n` least healthy rules.
    pub fn worst(&self, n: usize) -> &[RuleHealth] {
        &self.rules[..n.min(self.rules.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(rules: &[RuleStatistics]) -> RuleHealthReport {
        RuleHealthReport::build(
            rules,
            &HealthConfig::default(),
            &Thresholds::pass_rate_default(),
        )
    }

    #[test]
    fn test_report_sorted_worst_first() {
        let rules = vec![
            RuleStatistics::from_counts("a", 100, 0),
            RuleStatistics::from_counts("b", 10, 10),
            RuleStatistics::from_counts("c", 90, 10),
        ];
        let report = build(&rules);
        let ids: Vec<&str> = report.rules.iter().map(|r| r.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_ties_broken_by_rule_id() {
        let rules = vec![
            RuleStatistics::from_counts("z", 50, 50),
            RuleStatistics::from_counts("m", 50, 50),
        ];
        let report = build(&rules);
        assert_eq!(report.rules[0].rule_id, "m");
        assert_eq!(report.rules[1].rule_id, "z");
    }

    #[test]
    fn test_tier_tally_and_average() {
        let mut inactive = RuleStatistics::from_counts("d", 0, 10);
        inactive.is_active = false;
        let rules = vec![
            RuleStatistics::from_counts("a", 100, 0),
            RuleStatistics::from_counts("b", 85, 15),
            RuleStatistics::from_counts("c", 94, 6),
            inactive,
        ];
        let report = build(&rules);
        assert_eq!(
            report.tiers,
            TierTally {
                success: 1,
                warning: 2,
                danger: 1
            }
        );
        assert_eq!(report.tiers.total(), 4);
        assert_eq!(report.inactive_rules, 1);
        assert!(report.average_health.is_some());
    }

    #[test]
    fn test_empty_report() {
        let report = build(&[]);
        assert!(report.rules.is_empty());
        assert_eq!(report.average_health, None);
        assert!(report.worst(3).is_empty());
    }

    #[test]
    fn test_worst_truncates() {
        let rules = vec![
            RuleStatistics::from_counts("a", 1, 0),
            RuleStatistics::from_counts("b", 0, 1),
        ];
        let report = build(&rules);
        assert_eq!(report.worst(1).len(), 1);
        assert_eq!(report.worst(1)[0].rule_id, "b");
        assert_eq!(report.worst(10).len(), 2);
    }
}
