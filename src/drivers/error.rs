use thiserror::Error;
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("sweep program `{program}` not found in PATH")]
    ProgramNotFound { program: String },
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("sweep process has no stdout pipe")]
    MissingStdout,
    #[error("failed to read sweep source: {0}")]
    Io(#[from] std::io::Error),
    #[error("hand-off queue disconnected")]
    QueueDisconnected,
    #[error("failed to render plot: {0}")]
    Plot(String),
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for SweepError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        SweepError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for SweepError {
    fn from(value: image::ImageError) -> Self {
        SweepError::Plot(value.to_string())
    }
}
