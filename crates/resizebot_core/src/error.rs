use thiserror::Error;

use crate::pipeline::PipelineOutcome;

/// Why a resize job stopped. Every variant except `Unexpected` is reported
/// back to the requester on the page itself.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("invalid template parameters: {0}")]
    Params(String),

    /// Transport failures and local I/O or decode failures alike.
    #[error("download failed: {0}")]
    Download(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("requested width {requested}px is not smaller than the current {actual}px")]
    Size { requested: u32, actual: u32 },

    /// Unsupported extension or no usable file metadata.
    #[error("unsupported file: {0}")]
    Format(String),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl JobError {
    /// Outcome written to the page, or `None` when the page must be left alone.
    pub fn outcome(&self) -> Option<PipelineOutcome> {
        match self {
            Self::Params(_) => Some(PipelineOutcome::ParamsError),
            Self::Download(_) => Some(PipelineOutcome::DownloadError),
            Self::Upload(_) => Some(PipelineOutcome::UploadError),
            Self::Size { requested, actual } => Some(PipelineOutcome::SizeError {
                requested: *requested,
                actual: *actual,
            }),
            Self::Format(_) => Some(PipelineOutcome::FormatError),
            Self::Unexpected(_) => None,
        }
    }
}
