use thiserror::Error;

/// A payload or value that does not fit the prediction result shape.
#[derive(Debug, Error)]
#[error("shape mismatch: {detail}")]
pub struct ShapeMismatch {
    detail: String,
    #[source]
    source: Option<serde_json::Error>,
}

impl ShapeMismatch {
    /// Mismatch found outside the JSON layer, described by `detail`.
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            source: None,
        }
    }

    /// What did not fit, without the `shape mismatch:` prefix.
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl From<serde_json::Error> for ShapeMismatch {
    fn from(e: serde_json::Error) -> Self {
        Self {
            detail: e.to_string(),
            source: Some(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, ShapeMismatch>;
