//! Alert events for critical and urgent variances.
//!
//! Variance computation never raises alerts itself. Callers derive the events
//! with [`critical_alerts`] and hand them to an [`AlertSink`].

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use super::{format_percent, Period, VarianceAccount};
use crate::errors::Result;
use crate::severity::SeverityTier;

/// An account that crossed into an alertable tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarianceAlert {
    pub account_code: String,
    pub account_name: String,
    pub severity: SeverityTier,
    pub delta_amount: Decimal,
    pub delta_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

impl VarianceAlert {
    pub fn message(&self) -> String {
        format!(
            "{} variance on {} {}: {} ({})",
            self.severity,
            self.account_code,
            self.account_name,
            self.delta_amount,
            format_percent(self.delta_percent)
        )
    }
}

/// Alerts for every CRITICAL or URGENT account, in input order.
pub fn critical_alerts(accounts: &[VarianceAccount], period: Option<Period>) -> Vec<VarianceAlert> {
    accounts
        .iter()
        .filter(|account| account.severity.is_alertable())
        .map(|account| VarianceAlert {
            account_code: account.account_code.clone(),
            account_name: account.account_name.clone(),
            severity: account.severity,
            delta_amount: account.delta_amount,
            delta_percent: account.delta_percent,
            period,
        })
        .collect()
}

/// Downstream alerting collaborator.
pub trait AlertSink {
    fn emit(&mut self, alert: &VarianceAlert) -> Result<()>;
}

/// Keeps every alert in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub alerts: Vec<VarianceAlert>,
}

impl AlertSink for CollectingSink {
    fn emit(&mut self, alert: &VarianceAlert) -> Result<()> {
        self.alerts.push(alert.clone());
        Ok(())
    }
}

/// Writes each alert to the log at WARN level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl AlertSink for LogSink {
    fn emit(&mut self, alert: &VarianceAlert) -> Result<()> {
        warn!(
            account = %alert.account_code,
            severity = %alert.severity,
            delta = %alert.delta_amount,
            "{}",
            alert.message()
        );
        Ok(())
    }
}

/// Outcome of handing a batch of alerts to a sink.
#[derive(Debug, Default)]
pub struct EmitOutcome {
    pub emitted: usize,
    /// Account code and error message for each alert the sink refused
    pub failures: Vec<(String, String)>,
}

/// Hand every alert to `sink`. A refused alert does not stop the rest.
pub fn emit_alerts<S: AlertSink + ?Sized>(sink: &mut S, alerts: &[VarianceAlert]) -> EmitOutcome {
    let mut outcome = EmitOutcome::default();
    for alert in alerts {
        match sink.emit(alert) {
            Ok(()) => outcome.emitted += 1,
            Err(e) => {
                warn!(account = %alert.account_code, error = %e, "alert sink refused alert");
                outcome.failures.push((alert.account_code.clone(), e.to_string()));
            }
        }
    }
    outcome
}
