use thiserror::Error;

/// Failure kinds surfaced by [`crate::analyze`].
///
/// Nothing is retried internally; each variant carries a message meant for
/// whoever displays the failure.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("Failed to decode image: {0}")]
    ImageDecode(String),
    #[error("Failed to load model: {0}")]
    ModelLoad(String),
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("Overlap analysis failed: {0}")]
    Analytics(String),
}

impl DetectError {
    pub(crate) fn model_load(err: anyhow::Error) -> Self {
        Self::ModelLoad(format!("{err:#}"))
    }

    pub(crate) fn inference(err: anyhow::Error) -> Self {
        Self::Inference(format!("{err:#}"))
    }
}
