//! Period snapshots as served by the ledger API.
//!
//! Two shapes are accepted:
//!
//! - a single-period snapshot, either a bare array of
//!   `{ accountCode, accountName, amount }` rows or an object
//!   `{ "period": { "year", "month" }, "accounts": [...] }`;
//! - a comparison, whose rows carry both sides:
//!   `{ accountCode, accountName, previousPeriodAmount, currentPeriodAmount }`.
//!
//! In a comparison row a `null` or absent amount means the account does not
//! exist on that side.

use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::AccountAmount;
use crate::errors::{read_to_string, Error, Result, ResultExt};
use crate::serde_util::null_as_default;

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct Period {
    year: i32,
    month: u32,
}

#[derive(Deserialize)]
struct RawPeriod {
    year: i32,
    month: u32,
}

impl TryFrom<RawPeriod> for Period {
    type Error = Error;

    fn try_from(raw: RawPeriod) -> Result<Self> {
        Period::new(raw.year, raw.month)
    }
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::validation(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The month before this one.
    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = Error;

    /// Parse `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| Error::validation(format!("expected YYYY-MM, got '{s}'")))?;
        let year = year
            .parse()
            .map_err(|_| Error::validation(format!("invalid year in '{s}'")))?;
        let month = month
            .parse()
            .map_err(|_| Error::validation(format!("invalid month in '{s}'")))?;
        Period::new(year, month)
    }
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSnapshot {
    #[serde(default)]
    pub period: Option<Period>,
    pub accounts: Vec<AccountAmount>,
}

/// A row carrying both period amounts for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRow {
    pub account_code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub account_name: String,
    #[serde(default)]
    pub previous_period_amount: Option<Decimal>,
    #[serde(default)]
    pub current_period_amount: Option<Decimal>,
}

/// Both sides of a comparison in one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodComparison {
    #[serde(default)]
    pub previous_period: Option<Period>,
    #[serde(default)]
    pub current_period: Option<Period>,
    pub accounts: Vec<SnapshotRow>,
}

impl PeriodComparison {
    /// Split the rows into previous and current snapshots, leaving out the
    /// side of any row whose amount is missing.
    pub fn split(&self) -> (Vec<AccountAmount>, Vec<AccountAmount>) {
        let side = |row: &SnapshotRow, amount: Option<Decimal>| {
            amount.map(|amount| AccountAmount {
                account_code: row.account_code.clone(),
                account_name: row.account_name.clone(),
                amount,
            })
        };
        let previous = self
            .accounts
            .iter()
            .filter_map(|row| side(row, row.previous_period_amount))
            .collect();
        let current = self
            .accounts
            .iter()
            .filter_map(|row| side(row, row.current_period_amount))
            .collect();
        (previous, current)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotDocument {
    Full(PeriodSnapshot),
    Bare(Vec<AccountAmount>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ComparisonDocument {
    Full(PeriodComparison),
    Bare(Vec<SnapshotRow>),
}

/// Parse a single-period snapshot document.
pub fn parse_snapshot(json: &str) -> Result<PeriodSnapshot> {
    Ok(match serde_json::from_str::<SnapshotDocument>(json)? {
        SnapshotDocument::Full(snapshot) => snapshot,
        SnapshotDocument::Bare(accounts) => PeriodSnapshot {
            period: None,
            accounts,
        },
    })
}

/// Parse a comparison document.
pub fn parse_comparison(json: &str) -> Result<PeriodComparison> {
    Ok(match serde_json::from_str::<ComparisonDocument>(json)? {
        ComparisonDocument::Full(comparison) => comparison,
        ComparisonDocument::Bare(accounts) => PeriodComparison {
            previous_period: None,
            current_period: None,
            accounts,
        },
    })
}

pub fn load_snapshot(path: impl AsRef<Path>) -> Result<PeriodSnapshot> {
    let path = path.as_ref();
    parse_snapshot(&read_to_string(path)?).context(format!("parsing snapshot {}", path.display()))
}

pub fn load_comparison(path: impl AsRef<Path>) -> Result<PeriodComparison> {
    let path = path.as_ref();
    parse_comparison(&read_to_string(path)?)
        .context(format!("parsing comparison {}", path.display()))
}
