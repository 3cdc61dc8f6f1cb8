mod common;

use chrono::{NaiveDate, TimeZone, Utc};
use common::{sample_tasks, write_fixture};
use indoc::indoc;
use ledgerlens::filter::{filter, filter_with_metrics, rejection_stage, FilterPredicateSet, FilterStage};
use ledgerlens::health::{HealthConfig, RuleHealthReport, RuleStatistics};
use ledgerlens::paging::VecPageSource;
use ledgerlens::severity::{PassRateTier, Thresholds};
use ledgerlens::tasks::{Task, TaskState};
use ledgerlens::{PageSource, Pager};
use pretty_assertions::assert_eq;

fn report(rules: &[RuleStatistics]) -> RuleHealthReport {
    RuleHealthReport::build(
        rules,
        &HealthConfig::default(),
        &Thresholds::pass_rate_default(),
    )
}

#[test]
fn test_ninety_four_percent_is_warning() {
    let rule = RuleStatistics::from_counts("R-17", 94, 6);
    assert_eq!(rule.total_tests, 100);
    assert_eq!(rule.pass_rate(), 94.0);

    let report = report(&[rule]);
    assert_eq!(report.rules[0].tier, PassRateTier::Warning);
    assert_eq!(report.tiers.warning, 1);
}

#[test]
fn test_rules_file_ranked_worst_first() {
    let json = indoc! {r#"
        [
          {"ruleId": "balance-check", "ruleName": "Balance check", "passedCount": 99, "failedCount": 1, "totalTests": 100},
          {"ruleId": 42, "passedCount": 3, "failedCount": 1, "totalTests": 4, "isActive": false},
          {"ruleId": "date-format", "passedCount": null, "failedCount": null, "totalTests": 0}
        ]
    "#};
    let (_dir, path) = write_fixture(json, "rules.json");

    let mut source = VecPageSource::<RuleStatistics>::from_json_file(&path).unwrap();
    let rules = Pager::new(2).assemble(&mut source).into_result().unwrap().items;
    assert_eq!(rules.len(), 3);

    let report = report(&rules);
    let order: Vec<&str> = report.rules.iter().map(|r| r.rule_id.as_str()).collect();
    assert_eq!(order, vec!["date-format", "42", "balance-check"]);

    assert_eq!(report.rules[0].pass_rate, 0.0);
    assert_eq!(report.rules[0].tier, PassRateTier::Danger);
    assert_eq!(report.rules[2].rule_name, "Balance check");
    assert_eq!(report.inactive_rules, 1);
    assert_eq!(report.tiers.total(), 3);
    assert_eq!(report.worst(1).len(), 1);
    assert_eq!(report.worst(10).len(), 3);
}

#[test]
fn test_health_scores_stay_in_range() {
    let rules = vec![
        RuleStatistics::from_counts("a", 0, 0),
        RuleStatistics::from_counts("b", 10_000, 0),
        RuleStatistics::from_counts("c", 0, 10_000),
    ];
    for rule in report(&rules).rules {
        let value = rule.health.value();
        assert!((0.0..=100.0).contains(&value), "{} scored {value}", rule.rule_id);
    }
}

#[test]
fn test_status_filter_keeps_failures_in_order() {
    let tasks = sample_tasks();
    let predicates = FilterPredicateSet::all().with_status("FAILURE").with_search("");

    let kept = filter(&tasks, &predicates);
    let ids: Vec<&str> = kept.iter().map(|t| t.task_id.as_str()).collect();
    assert_eq!(ids, vec!["t-2", "t-4"]);
}

#[test]
fn test_predicates_combine_and_report_first_rejection() {
    let tasks = sample_tasks();
    let predicates = FilterPredicateSet::all()
        .with_type("extraction")
        .with_search("RENT ROLL");

    let (kept, metrics) = filter_with_metrics(&tasks, &predicates);
    let ids: Vec<&str> = kept.iter().map(|t| t.task_id.as_str()).collect();
    assert_eq!(ids, vec!["t-1", "t-2"]);
    assert_eq!(metrics.rejected_by_type, 2);
    assert_eq!(metrics.rejected_by_search, 1);
    assert_eq!(metrics.total_rejected(), 3);

    assert_eq!(rejection_stage(&tasks[2], &predicates), Some(FilterStage::Type));
    assert_eq!(rejection_stage(&tasks[4], &predicates), Some(FilterStage::Search));
}

#[test]
fn test_date_range_is_inclusive_and_excludes_undated() {
    let at = |day: u32, hour: u32| Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap();
    let tasks = vec![
        Task::new("early", "extraction", TaskState::Pending).with_created_at(at(1, 0)),
        Task::new("late", "extraction", TaskState::Pending).with_created_at(at(3, 23)),
        Task::new("outside", "extraction", TaskState::Pending).with_created_at(at(4, 0)),
        Task::new("undated", "extraction", TaskState::Pending),
    ];
    let predicates = FilterPredicateSet::all().with_date_range(
        NaiveDate::from_ymd_opt(2024, 5, 1),
        NaiveDate::from_ymd_opt(2024, 5, 3),
    );

    let ids: Vec<&str> = filter(&tasks, &predicates)
        .iter()
        .map(|t| t.task_id.as_str())
        .collect();
    assert_eq!(ids, vec!["early", "late"]);
}

#[test]
fn test_task_page_decodes_tagged_states() {
    let json = indoc! {r#"
        {"items": [
          {"task_id": "a", "task_type": "extraction", "status": "PENDING"},
          {"task_id": "b", "task_type": "extraction", "status": "PROCESSING", "progress": 0.25},
          {"task_id": "c", "task_type": "extraction", "status": "FAILURE", "error": "bad scan"}
        ], "total": 3}
    "#};
    let (_dir, path) = write_fixture(json, "tasks.json");

    let mut source = VecPageSource::<Task>::from_json_file(&path).unwrap();
    let page = source.fetch_page(1, 1).unwrap();
    assert_eq!(page.total_count, Some(3));
    assert_eq!(page.items[0].state, TaskState::Processing { progress: 0.25 });
}
