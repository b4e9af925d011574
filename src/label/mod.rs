//! Text-generation collaborator, consumed by cluster labeling only.

mod http;

pub use http::HttpGenerator;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("text generation failed: {0}")]
    Generation(String),
}

/// Produces short free text from a prompt.
///
/// Labeling treats every failure as recoverable, so implementations just
/// report what went wrong and never need to retry.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, LabelError>;
}
