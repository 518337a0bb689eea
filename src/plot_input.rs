//! Conversion of raw form fields into a plot request.
//!
//! Substitution rules:
//! * a bound that is blank, unparsable or non-finite becomes the default;
//!   an explicit `0` is a value like any other and is kept
//! * a sample count that is blank, unparsable or not positive becomes the
//!   default, and anything above the configured maximum is clamped
//! * the expression is trimmed and must not be empty

use crate::config::PlotDefaults;
use crate::error::InputError;
use serde::{Deserialize, Serialize};

/// A validated request to sample one expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotRequest {
    pub expression: String,
    pub xmin: f64,
    pub xmax: f64,
    pub samples: usize,
}

impl PlotRequest {
    /// Builds a request from the text of the expression, bound and sample fields.
    ///
    /// # Errors
    /// * `InputError::EmptyExpression` if the expression is blank
    pub fn from_fields(
        expression: &str,
        xmin: &str,
        xmax: &str,
        samples: &str,
        defaults: &PlotDefaults,
    ) -> Result<Self, InputError> {
        let expression = expression.trim();
        if expression.is_empty() {
            return Err(InputError::EmptyExpression);
        }

        Ok(PlotRequest {
            expression: expression.to_string(),
            xmin: parse_bound(xmin, defaults.xmin),
            xmax: parse_bound(xmax, defaults.xmax),
            samples: parse_sample_count(samples, defaults),
        })
    }
}

/// Parses a domain bound, substituting `default` for unusable text
pub fn parse_bound(raw: &str, default: f64) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => default,
    }
}

/// Parses a sample count, substituting the default for unusable or
/// non-positive text and clamping to the maximum.
pub fn parse_sample_count(raw: &str, defaults: &PlotDefaults) -> usize {
    match raw.trim().parse::<i64>() {
        Ok(value) if value > 0 => (value as u64).min(defaults.max_samples as u64) as usize,
        _ => defaults.samples,
    }
}
