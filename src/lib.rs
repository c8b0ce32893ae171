//! Shape contract for brain-tumor classification results: a probability per
//! diagnostic class and the class selected from them.

pub mod error;
pub mod handlers;
pub mod models;
pub mod scores;

pub use error::{Result, ShapeMismatch};
pub use models::{PredictionResult, Probabilities, TumorType, DEFAULT_SUM_TOLERANCE};
