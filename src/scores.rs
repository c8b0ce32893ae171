//! Assembles a [`PredictionResult`] from a classifier's output row.

use ndarray::{ArrayView1, ArrayView2};

use crate::error::{Result, ShapeMismatch};
use crate::models::{PredictionResult, Probabilities, TumorType};

/// One score per class, in [`TumorType::ALL`] order. The label is the arg-max.
pub fn from_scores(scores: ArrayView1<f32>) -> Result<PredictionResult> {
    if scores.len() != TumorType::ALL.len() {
        return Err(ShapeMismatch::new(format!(
            "expected {} class scores, got {}",
            TumorType::ALL.len(),
            scores.len()
        )));
    }

    let probabilities = Probabilities {
        glioma: f64::from(scores[TumorType::Glioma.index()]),
        meningioma: f64::from(scores[TumorType::Meningioma.index()]),
        notumor: f64::from(scores[TumorType::Notumor.index()]),
        pituitary: f64::from(scores[TumorType::Pituitary.index()]),
    };
    let result = PredictionResult::from_probabilities(probabilities);
    tracing::debug!(kind = %result.kind, confidence = result.confidence(), "predicted class");
    Ok(result)
}

/// Batch output of shape `(1, classes)`, as a classifier returns it for a
/// single image.
pub fn from_batch(output: ArrayView2<f32>) -> Result<PredictionResult> {
    match output.dim() {
        (1, _) => from_scores(output.row(0)),
        (rows, cols) => Err(ShapeMismatch::new(format!(
            "expected a single output row, got shape ({}, {})",
            rows, cols
        ))),
    }
}

/// Same as [`from_scores`] for a plain slice of scores.
pub fn from_slice(scores: &[f32]) -> Result<PredictionResult> {
    from_scores(ArrayView1::from(scores))
}
