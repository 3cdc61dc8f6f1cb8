//! Aggregation core for a property ledger dashboard.
//!
//! - [`paging`]: assemble complete collections from offset-paged sources
//! - [`severity`]: map variances and pass rates to ordered tiers
//! - [`health`]: blend pass rate and activity into rule health scores
//! - [`filter`]: ordered, short-circuit multi-predicate filtering
//! - [`variance`]: period-over-period account comparison and summaries
//!
//! Everything here is synchronous. The only I/O is performed by page sources
//! and the CLI; the computations are pure functions over owned data.

// Export modules for library usage
pub mod cli;
pub mod config;
pub mod errors;
pub mod filter;
pub mod health;
pub mod paging;
pub mod refresh;
pub mod score_types;
pub mod serde_util;
pub mod severity;
pub mod tasks;
pub mod variance;

// Re-export commonly used types
pub use crate::errors::{Error, Result};
pub use crate::filter::{filter, matches, FilterPredicateSet, Filterable};
pub use crate::health::{RuleHealthReport, RuleStatistics};
pub use crate::paging::{AssembledCollection, Assembly, AssemblyError, PageSource, Pager};
pub use crate::score_types::Score0To100;
pub use crate::severity::{classify, PassRateTier, SeverityTier, Thresholds};
pub use crate::variance::{compute, VarianceAccount, VarianceOptions, VarianceSummary};
