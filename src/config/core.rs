use serde::{Deserialize, Serialize};

use crate::errors::{Result, ResultExt};
use crate::health::HealthConfig;
use crate::paging::PagingConfig;
use crate::severity::SeverityConfig;
use crate::variance::VarianceConfig;

/// Root configuration structure for ledgerlens
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LedgerlensConfig {
    /// Variance and pass-rate severity bands
    #[serde(default)]
    pub severity: Option<SeverityConfig>,

    /// Rule health score weights
    #[serde(default)]
    pub health: Option<HealthConfig>,

    /// Variance tolerance and zero-baseline bands
    #[serde(default)]
    pub variance: Option<VarianceConfig>,

    /// Page size, server ceiling and retry policy
    #[serde(default)]
    pub paging: Option<PagingConfig>,

    /// Output configuration
    #[serde(default)]
    pub output: Option<OutputConfig>,
}

impl LedgerlensConfig {
    pub fn severity(&self) -> SeverityConfig {
        self.severity.clone().unwrap_or_default()
    }

    pub fn health(&self) -> HealthConfig {
        self.health.clone().unwrap_or_default()
    }

    pub fn variance(&self) -> VarianceConfig {
        self.variance.clone().unwrap_or_default()
    }

    pub fn paging(&self) -> PagingConfig {
        self.paging.clone().unwrap_or_default()
    }

    /// Validate every table that is present.
    pub fn validate(&self) -> Result<()> {
        if let Some(severity) = &self.severity {
            severity.validate().context("[severity]")?;
        }
        if let Some(health) = &self.health {
            health.validate().context("[health]")?;
        }
        if let Some(variance) = &self.variance {
            variance.validate().context("[variance]")?;
        }
        if let Some(paging) = &self.paging {
            paging.validate().context("[paging]")?;
            paging.retry.validate().context("[paging.retry]")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Format used when `--format` is not given
    #[serde(default)]
    pub default_format: Option<String>,
    /// Enable colored output (default: auto-detect based on TTY)
    #[serde(default)]
    pub use_color: Option<bool>,
}
