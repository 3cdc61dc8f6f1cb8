//! Terminal rendering for command results.
//!
//! Tables go through `comfy-table`; headings and status lines through
//! `colored`, which honors the override set by [`super::setup::configure_color`].

use colored::{ColoredString, Colorize};
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::filter::FilterMetrics;
use crate::health::RuleHealthReport;
use crate::severity::{PassRateTier, SeverityTier};
use crate::tasks::Task;
use crate::variance::{VarianceAccount, VarianceSummary};

fn table(header: &[&str], styled: bool) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    if !styled {
        table.force_no_tty();
    }
    table
}

fn severity_color(tier: SeverityTier) -> Color {
    match tier {
        SeverityTier::Normal => Color::Green,
        SeverityTier::Warning => Color::Yellow,
        SeverityTier::Critical => Color::Red,
        SeverityTier::Urgent => Color::Magenta,
    }
}

fn pass_rate_color(tier: PassRateTier) -> Color {
    match tier {
        PassRateTier::Success => Color::Green,
        PassRateTier::Warning => Color::Yellow,
        PassRateTier::Danger => Color::Red,
    }
}

/// Severity label colored by tier.
pub fn severity_label(tier: SeverityTier) -> ColoredString {
    match tier {
        SeverityTier::Normal => tier.label().green(),
        SeverityTier::Warning => tier.label().yellow(),
        SeverityTier::Critical => tier.label().red(),
        SeverityTier::Urgent => tier.label().magenta().bold(),
    }
}

fn favorable_cell(is_favorable: Option<bool>) -> Cell {
    match is_favorable {
        Some(true) => Cell::new("yes").fg(Color::Green),
        Some(false) => Cell::new("no").fg(Color::Red),
        None => Cell::new("-"),
    }
}

pub fn variance_table(accounts: &[&VarianceAccount], styled: bool) -> String {
    let mut table = table(
        &[
            "Account", "Name", "Previous", "Current", "Delta", "Delta %", "Severity", "Match",
            "Favorable",
        ],
        styled,
    );
    for account in accounts {
        table.add_row(vec![
            Cell::new(&account.account_code),
            Cell::new(&account.account_name),
            Cell::new(account.previous_amount.round_dp(2)).set_alignment(CellAlignment::Right),
            Cell::new(account.current_amount.round_dp(2)).set_alignment(CellAlignment::Right),
            Cell::new(account.delta_amount.round_dp(2)).set_alignment(CellAlignment::Right),
            Cell::new(account.delta_percent_display()).set_alignment(CellAlignment::Right),
            Cell::new(account.severity.label()).fg(severity_color(account.severity)),
            Cell::new(account.match_status.label()),
            favorable_cell(account.is_favorable),
        ]);
    }
    table.to_string()
}

pub fn variance_summary(summary: &VarianceSummary) -> String {
    let tiers = SeverityTier::ALL
        .iter()
        .rev()
        .map(|tier| format!("{} {}", severity_label(*tier), summary.count(*tier)))
        .collect::<Vec<_>>()
        .join("  ");
    format!(
        "{}\n  accounts: {} ({} flagged, {} missing previous, {} missing current)\n  \
         totals: previous {} / current {} / delta {}\n  {}",
        "Variance summary".bold(),
        summary.total_accounts,
        summary.flagged_accounts,
        summary.missing_previous,
        summary.missing_current,
        summary.total_previous_period.round_dp(2),
        summary.total_current_period.round_dp(2),
        summary
            .total_delta()
            .map_or_else(|| "out of range".to_string(), |delta| delta.round_dp(2).to_string()),
        tiers
    )
}

pub fn health_table(report: &RuleHealthReport, limit: Option<usize>, styled: bool) -> String {
    let rules = match limit {
        Some(n) => report.worst(n),
        None => report.rules.as_slice(),
    };
    let mut table = table(
        &["Rule", "Name", "Pass rate", "Tests", "Health", "Tier", "Active"],
        styled,
    );
    for rule in rules {
        table.add_row(vec![
            Cell::new(&rule.rule_id),
            Cell::new(&rule.rule_name),
            Cell::new(format!("{:.1}%", rule.pass_rate)).set_alignment(CellAlignment::Right),
            Cell::new(rule.total_tests).set_alignment(CellAlignment::Right),
            Cell::new(rule.health).set_alignment(CellAlignment::Right),
            Cell::new(rule.tier.label()).fg(pass_rate_color(rule.tier)),
            Cell::new(if rule.is_active { "yes" } else { "no" }),
        ]);
    }
    table.to_string()
}

pub fn health_summary(report: &RuleHealthReport) -> String {
    let average = report
        .average_health
        .map(|avg| format!("{avg:.1}"))
        .unwrap_or_else(|| "N/A".to_string());
    format!(
        "{}\n  rules: {} ({} inactive)  average health: {}\n  {} {}  {} {}  {} {}",
        "Rule health".bold(),
        report.rules.len(),
        report.inactive_rules,
        average,
        "success".green(),
        report.tiers.success,
        "warning".yellow(),
        report.tiers.warning,
        "danger".red(),
        report.tiers.danger,
    )
}

pub fn task_table(tasks: &[&Task], styled: bool) -> String {
    let mut table = table(&["Task", "Name", "Type", "Status", "Property", "Created"], styled);
    for task in tasks {
        table.add_row(vec![
            Cell::new(&task.task_id),
            Cell::new(task.name.as_deref().unwrap_or("-")),
            Cell::new(&task.task_type),
            Cell::new(task.state.label()),
            Cell::new(task.property_code.as_deref().unwrap_or("-")),
            Cell::new(
                task.created_at
                    .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]);
    }
    table.to_string()
}

pub fn filter_metrics(metrics: &FilterMetrics) -> String {
    format!(
        "{}\n  total {}  included {}\n  rejected by type {}, status {}, property {}, search {}, date {}",
        "Filter metrics".bold(),
        metrics.total_records,
        metrics.included,
        metrics.rejected_by_type,
        metrics.rejected_by_status,
        metrics.rejected_by_property,
        metrics.rejected_by_search,
        metrics.rejected_by_date,
    )
}

/// Green "ok" or red "error" prefix for a status line.
pub fn status_prefix(ok: bool) -> ColoredString {
    if ok {
        "ok".green().bold()
    } else {
        "error".red().bold()
    }
}
