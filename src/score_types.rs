//! Type-safe score scale for health scoring.
//!
//! Health scores are always reported on a 0-100 scale. Wrapping the value in
//! a newtype keeps raw pass rates (which may legitimately sit outside
//! [0, 100] on malformed input) from being confused with a finished score.
//!
//! # Examples
//!
//! ```rust
//! use ledgerlens::score_types::Score0To100;
//!
//! let score = Score0To100::new(85.0);
//! assert_eq!(score.value(), 85.0);
//!
//! // Out-of-bounds values are clamped
//! let clamped = Score0To100::new(150.0);
//! assert_eq!(clamped.value(), 100.0);
//! ```

use serde::{Deserialize, Serialize};

/// Score on 0-100 scale.
///
/// Values are automatically clamped to the [0.0, 100.0] range. NaN collapses
/// to 0 so that a score is always orderable.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Score0To100(f64);

impl Score0To100 {
    /// Create a new score, clamping to [0.0, 100.0].
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 100.0))
    }

    /// Get the raw score value.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for Score0To100 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}
