use chrono::NaiveDate;
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ledgerlens")]
#[command(about = "Period variance, rule health and paging tools for ledger data", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to the nearest .ledgerlens.toml)
    #[arg(long, global = true, env = "LEDGERLENS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Plain output: no colors, no progress spinner
    #[arg(long, global = true)]
    pub plain: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare two period snapshots account by account
    #[command(group(
        ArgGroup::new("input")
            .required(true)
            .args(["previous", "snapshot"]),
    ))]
    Variance {
        /// Previous period snapshot (JSON)
        #[arg(long, requires = "current")]
        previous: Option<PathBuf>,

        /// Current period snapshot (JSON)
        #[arg(long, requires = "previous")]
        current: Option<PathBuf>,

        /// Single document with both period amounts per account
        #[arg(long, conflicts_with_all = ["previous", "current"])]
        snapshot: Option<PathBuf>,

        /// Account polarities: JSON object mapping account code to
        /// "increase_favorable" or "decrease_favorable"
        #[arg(long)]
        polarity: Option<PathBuf>,

        /// Show only accounts above NORMAL
        #[arg(long)]
        flagged: bool,

        /// Log an alert for every CRITICAL or URGENT account
        #[arg(long)]
        alerts: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,
    },

    /// Score validation rules by pass rate and activity
    Health {
        /// Rule statistics (JSON array or {items, total} page)
        #[arg(long)]
        rules: PathBuf,

        /// Show only the N lowest-scoring rules
        #[arg(long)]
        top: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,
    },

    /// Filter task records
    Filter {
        /// Task records (JSON array or {items, total} page)
        #[arg(long)]
        records: PathBuf,

        /// Task type, or "all"
        #[arg(long = "type", default_value = "all")]
        record_type: String,

        /// Task status, or "all"
        #[arg(long, default_value = "all")]
        status: String,

        /// Property code, or "all"
        #[arg(long, default_value = "all")]
        property: String,

        /// Case-insensitive substring over id and name
        #[arg(long, default_value = "")]
        search: String,

        /// Earliest creation date (inclusive, YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Latest creation date (inclusive, YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Print how many records each predicate rejected
        #[arg(long)]
        metrics: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,
    },

    /// Assemble a complete collection from a paged source
    #[command(group(
        ArgGroup::new("source")
            .required(true)
            .args(["url", "file"]),
    ))]
    Fetch {
        /// List endpoint answering GET <url>?skip=<n>&limit=<m>
        #[arg(long)]
        url: Option<String>,

        /// Local JSON file served page by page
        #[arg(long)]
        file: Option<PathBuf>,

        /// Items per page (clamped to the server maximum)
        #[arg(long)]
        page_size: Option<usize>,

        /// Re-assemble every N seconds; runs until killed unless --refreshes is set
        #[arg(long)]
        watch: Option<u64>,

        /// Stop watching after N refreshes
        #[arg(long, requires = "watch")]
        refreshes: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Terminal,
}

/// Parse CLI arguments using Clap
pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_variance_requires_both_sides() {
        let result = Cli::try_parse_from(["ledgerlens", "variance", "--previous", "a.json"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_variance_snapshot_conflicts_with_sides() {
        let result = Cli::try_parse_from([
            "ledgerlens",
            "variance",
            "--snapshot",
            "s.json",
            "--previous",
            "a.json",
            "--current",
            "b.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_filter_defaults_disable_predicates() {
        let cli = Cli::try_parse_from(["ledgerlens", "filter", "--records", "t.json"]).unwrap();
        match cli.command {
            Commands::Filter {
                record_type,
                status,
                search,
                from,
                ..
            } => {
                assert_eq!(record_type, "all");
                assert_eq!(status, "all");
                assert_eq!(search, "");
                assert_eq!(from, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_filter_parses_dates() {
        let cli = Cli::try_parse_from([
            "ledgerlens",
            "filter",
            "--records",
            "t.json",
            "--from",
            "2024-03-01",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Filter { from: Some(d), .. } if d == NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        ));
    }

    #[test]
    fn test_fetch_requires_a_source() {
        assert!(Cli::try_parse_from(["ledgerlens", "fetch"]).is_err());
        assert!(Cli::try_parse_from(["ledgerlens", "fetch", "--file", "x.json"]).is_ok());
    }
}
