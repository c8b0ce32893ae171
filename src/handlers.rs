//! Boundary between external payloads and [`PredictionResult`].
//!
//! Anything arriving from a classification service goes through one of the
//! `parse_*` functions. A payload that is missing a field, carries an extra
//! one, has a non-numeric probability, or names an unknown class is rejected
//! with [`ShapeMismatch`] instead of yielding a partial value.

use std::str::FromStr;

use serde_json::Value;

use crate::error::{Result, ShapeMismatch};
use crate::models::PredictionResult;

pub fn parse_str(payload: &str) -> Result<PredictionResult> {
    checked(serde_json::from_str(payload))
}

pub fn parse_slice(payload: &[u8]) -> Result<PredictionResult> {
    checked(serde_json::from_slice(payload))
}

pub fn parse_value(payload: Value) -> Result<PredictionResult> {
    checked(serde_json::from_value(payload))
}

pub fn to_json(result: &PredictionResult) -> Result<String> {
    Ok(serde_json::to_string(&encodable(result)?)?)
}

pub fn to_json_pretty(result: &PredictionResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(&encodable(result)?)?)
}

impl FromStr for PredictionResult {
    type Err = ShapeMismatch;

    fn from_str(s: &str) -> Result<Self> {
        parse_str(s)
    }
}

fn checked(decoded: serde_json::Result<PredictionResult>) -> Result<PredictionResult> {
    match decoded {
        Ok(result) => {
            tracing::debug!(
                kind = %result.kind,
                confidence = result.confidence(),
                "decoded prediction result"
            );
            Ok(result)
        }
        Err(e) => {
            tracing::warn!(error = %e, "rejected prediction payload");
            Err(e.into())
        }
    }
}

// serde_json writes NaN and infinities as `null`, which would not parse back.
fn encodable(result: &PredictionResult) -> Result<&PredictionResult> {
    match result.probabilities.iter().find(|(_, v)| !v.is_finite()) {
        Some((label, value)) => Err(ShapeMismatch::new(format!(
            "probability for `{}` is not a finite number ({})",
            label, value
        ))),
        None => Ok(result),
    }
}
