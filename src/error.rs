use thiserror::Error;

/// Failures surfaced by the detection loop.
///
/// End of stream is not an error; it comes back as
/// [`FrameOutcome::EndOfStream`](crate::detection_loop::FrameOutcome::EndOfStream).
#[derive(Debug, Error)]
pub enum LoopError {
    #[error("failed to load model")]
    ModelLoad(#[source] anyhow::Error),
    #[error("failed to open video source")]
    SourceOpen(#[source] anyhow::Error),
    #[error("inference failed")]
    Inference(#[source] anyhow::Error),
    #[error("display failed")]
    Display(#[source] anyhow::Error),
    #[error("failed to save frame")]
    Save(#[source] anyhow::Error),
}

impl LoopError {
    /// Process exit code for the binary.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoopError::ModelLoad(_) => 2,
            LoopError::SourceOpen(_) => 3,
            _ => 1,
        }
    }
}
