//! Command handlers.
//!
//! Each handler reads its inputs, runs the library computation and writes
//! the rendered result to `out`. Handlers never print directly, so the
//! integration tests can capture what a command produces.

use std::collections::BTreeMap;
use std::io::Write;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::args::{Cli, Commands, OutputFormat};
use super::output;
use super::setup::{configure_color, resolve_config};
use crate::config::LedgerlensConfig;
use crate::errors::read_to_string;
use crate::filter::{filter_with_metrics, FilterPredicateSet};
use crate::health::{RuleHealthReport, RuleStatistics};
use crate::paging::{decode_page, Assembly, HttpPageSource, PageSource, Pager, VecPageSource};
use crate::refresh::{CancellationToken, RefreshSchedule};
use crate::tasks::Task;
use crate::variance::{
    compute, critical_alerts, emit_alerts, load_comparison, load_snapshot, LogSink, Period,
    Polarity, VarianceAccount, VarianceOptions, VarianceSummary,
};

/// Settings shared by every handler.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: LedgerlensConfig,
    /// Colors and table styling
    pub styled: bool,
    pub show_progress: bool,
}

impl CommandContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = resolve_config(cli.config.as_deref())?;
        let styled = configure_color(cli.plain);
        Ok(Self {
            config,
            styled,
            show_progress: styled,
        })
    }

    pub fn plain(config: LedgerlensConfig) -> Self {
        Self {
            config,
            styled: false,
            show_progress: false,
        }
    }
}

/// Dispatch a parsed command line.
pub fn run(cli: Cli, ctx: &CommandContext, out: &mut impl Write) -> Result<()> {
    match cli.command {
        Commands::Variance {
            previous,
            current,
            snapshot,
            polarity,
            flagged,
            alerts,
            format,
        } => {
            let input = match (snapshot, previous, current) {
                (Some(snapshot), _, _) => VarianceInput::Comparison(snapshot),
                (None, Some(previous), Some(current)) => VarianceInput::Sides { previous, current },
                _ => bail!("variance needs --snapshot, or both --previous and --current"),
            };
            let request = VarianceRequest {
                input,
                polarity,
                flagged_only: flagged,
                emit_alerts: alerts,
                format,
            };
            handle_variance(ctx, &request, out)
        }
        Commands::Health { rules, top, format } => handle_health(ctx, &rules, top, format, out),
        Commands::Filter {
            records,
            record_type,
            status,
            property,
            search,
            from,
            to,
            metrics,
            format,
        } => {
            let predicates = FilterPredicateSet {
                record_type,
                status,
                property,
                search,
                date_from: from,
                date_to: to,
            };
            handle_filter(ctx, &records, &predicates, metrics, format, out)
        }
        Commands::Fetch {
            url,
            file,
            page_size,
            watch,
            refreshes,
            format,
        } => {
            let source = match (url, file) {
                (Some(url), _) => FetchSource::Url(url),
                (None, Some(file)) => FetchSource::File(file),
                (None, None) => bail!("fetch needs --url or --file"),
            };
            let request = FetchRequest {
                source,
                page_size,
                watch: watch.map(Duration::from_secs),
                refreshes,
                format,
            };
            handle_fetch(ctx, &request, out)
        }
    }
}

/// Read a JSON list file: a bare array or an `{ items, total }` page.
pub fn load_items<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let contents = read_to_string(path)?;
    let page = decode_page::<T>(&contents)
        .with_context(|| format!("reading records from {}", path.display()))?;
    Ok(page.items)
}

fn write_json<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// variance

#[derive(Debug, Clone)]
pub enum VarianceInput {
    Sides { previous: PathBuf, current: PathBuf },
    Comparison(PathBuf),
}

#[derive(Debug, Clone)]
pub struct VarianceRequest {
    pub input: VarianceInput,
    pub polarity: Option<PathBuf>,
    pub flagged_only: bool,
    pub emit_alerts: bool,
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct VarianceReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    previous_period: Option<Period>,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_period: Option<Period>,
    summary: &'a VarianceSummary,
    accounts: Vec<&'a VarianceAccount>,
}

fn load_polarity(path: &Path) -> Result<BTreeMap<String, Polarity>> {
    let contents = read_to_string(path)?;
    serde_json::from_str(&contents)
        .with_context(|| format!("reading account polarities from {}", path.display()))
}

pub fn handle_variance(
    ctx: &CommandContext,
    request: &VarianceRequest,
    out: &mut impl Write,
) -> Result<()> {
    let (previous, current, previous_period, current_period) = match &request.input {
        VarianceInput::Sides { previous, current } => {
            let previous = load_snapshot(previous)?;
            let current = load_snapshot(current)?;
            (previous.accounts, current.accounts, previous.period, current.period)
        }
        VarianceInput::Comparison(path) => {
            let comparison = load_comparison(path)?;
            let (previous, current) = comparison.split();
            (previous, current, comparison.previous_period, comparison.current_period)
        }
    };

    let mut options = VarianceOptions::from_config(&ctx.config.severity(), &ctx.config.variance())?;
    if let Some(path) = &request.polarity {
        options = options.with_polarities(load_polarity(path)?);
    }

    let accounts = compute(&previous, &current, &options)?;
    let summary = VarianceSummary::from_accounts(&accounts)?;

    if request.emit_alerts {
        let alerts = critical_alerts(&accounts, current_period);
        let outcome = emit_alerts(&mut LogSink, &alerts);
        tracing::info!(emitted = outcome.emitted, "variance alerts emitted");
    }

    let shown: Vec<&VarianceAccount> = accounts
        .iter()
        .filter(|account| !request.flagged_only || account.is_flagged())
        .collect();

    match request.format {
        OutputFormat::Json => write_json(
            out,
            &VarianceReport {
                previous_period,
                current_period,
                summary: &summary,
                accounts: shown,
            },
        ),
        OutputFormat::Terminal => {
            if let (Some(previous), Some(current)) = (previous_period, current_period) {
                writeln!(out, "{previous} -> {current}")?;
            }
            writeln!(out, "{}", output::variance_table(&shown, ctx.styled))?;
            writeln!(out, "{}", output::variance_summary(&summary))?;
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// health

pub fn handle_health(
    ctx: &CommandContext,
    rules_path: &Path,
    top: Option<usize>,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let rules: Vec<RuleStatistics> = load_items(rules_path)?;
    let thresholds = ctx.config.severity().pass_rate_thresholds()?;
    let report = RuleHealthReport::build(&rules, &ctx.config.health(), &thresholds);

    match format {
        OutputFormat::Json => write_json(out, &report),
        OutputFormat::Terminal => {
            writeln!(out, "{}", output::health_table(&report, top, ctx.styled))?;
            writeln!(out, "{}", output::health_summary(&report))?;
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// filter

pub fn handle_filter(
    ctx: &CommandContext,
    records_path: &Path,
    predicates: &FilterPredicateSet,
    show_metrics: bool,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    if let (Some(from), Some(to)) = (predicates.date_from, predicates.date_to) {
        if from > to {
            bail!("--from {from} is after --to {to}");
        }
    }

    let tasks: Vec<Task> = load_items(records_path)?;
    let (kept, metrics) = filter_with_metrics(&tasks, predicates);

    match format {
        OutputFormat::Json => write_json(out, &kept),
        OutputFormat::Terminal => {
            writeln!(out, "{}", output::task_table(&kept, ctx.styled))?;
            writeln!(out, "{} of {} records", kept.len(), tasks.len())?;
            if show_metrics {
                writeln!(out, "{}", output::filter_metrics(&metrics))?;
            }
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// fetch

#[derive(Debug, Clone)]
pub enum FetchSource {
    Url(String),
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub source: FetchSource,
    pub page_size: Option<usize>,
    pub watch: Option<Duration>,
    pub refreshes: Option<usize>,
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct FetchReport<'a> {
    complete: bool,
    received: usize,
    total_count: usize,
    pages: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    items: &'a [Value],
}

fn open_source(
    source: &FetchSource,
    timeout: Duration,
) -> Result<Box<dyn PageSource<Value>>> {
    Ok(match source {
        FetchSource::Url(url) => Box::new(HttpPageSource::<Value>::new(url.as_str(), timeout)?),
        FetchSource::File(path) => Box::new(VecPageSource::<Value>::from_json_file(path)?),
    })
}

fn spinner(visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
        bar.set_style(style);
    }
    bar.set_message("assembling pages");
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

fn assemble_once(
    ctx: &CommandContext,
    pager: &Pager,
    request: &FetchRequest,
    timeout: Duration,
) -> Result<Assembly<Value>> {
    let mut source = open_source(&request.source, timeout)?;
    let bar = spinner(ctx.show_progress && request.format == OutputFormat::Terminal);
    let assembly = pager.assemble(source.as_mut());
    bar.finish_and_clear();
    Ok(assembly)
}

fn report_assembly(
    assembly: &Assembly<Value>,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(
            out,
            &FetchReport {
                complete: assembly.is_complete(),
                received: assembly.collection.len(),
                total_count: assembly.collection.total_count,
                pages: assembly.pages_fetched,
                error: assembly.error.as_ref().map(|e| e.to_string()),
                items: &assembly.collection.items,
            },
        ),
        OutputFormat::Terminal => {
            match &assembly.error {
                None => writeln!(
                    out,
                    "{} {} items in {} page(s)",
                    output::status_prefix(true),
                    assembly.collection.len(),
                    assembly.pages_fetched
                )?,
                Some(error) => writeln!(
                    out,
                    "{} partial collection: {} of {} items: {}",
                    output::status_prefix(false),
                    assembly.collection.len(),
                    assembly.collection.total_count,
                    error
                )?,
            }
            Ok(())
        }
    }
}

pub fn handle_fetch(ctx: &CommandContext, request: &FetchRequest, out: &mut impl Write) -> Result<()> {
    let mut paging = ctx.config.paging();
    if let Some(page_size) = request.page_size {
        paging.page_size = page_size;
    }
    paging.validate()?;
    let pager = Pager::from_config(&paging);
    let timeout = paging.timeout();

    let Some(interval) = request.watch else {
        let assembly = assemble_once(ctx, &pager, request, timeout)?;
        report_assembly(&assembly, request.format, out)?;
        if let Some(error) = assembly.error {
            bail!(error);
        }
        return Ok(());
    };

    let mut schedule = RefreshSchedule::new(interval)?;
    if let Some(refreshes) = request.refreshes {
        schedule = schedule.with_max_ticks(refreshes);
    }
    // Nothing cancels this token: `--watch` without `--refreshes` ends only
    // when the process is killed.
    let token = CancellationToken::new();
    let mut failure = None;
    let outcome = schedule.run(&token, |tick| {
        let step = assemble_once(ctx, &pager, request, timeout).and_then(|assembly| {
            if request.format == OutputFormat::Terminal {
                write!(out, "[{tick}] ")?;
            }
            report_assembly(&assembly, request.format, out)
        });
        match step {
            Ok(()) => ControlFlow::Continue(()),
            Err(e) => {
                failure = Some(e);
                ControlFlow::Break(())
            }
        }
    });
    tracing::debug!(ticks = outcome.ticks, stopped = ?outcome.stopped, "refresh finished");

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
