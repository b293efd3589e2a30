/// Error taxonomy shared by every pipeline stage
use crate::grid::TileKey;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("LAS error: {0}")]
    Las(#[from] las::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Source point cloud is missing. Fatal for the run.
    #[error("input file does not exist: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed PLY file {}: {reason}", path.display())]
    MalformedPly { path: PathBuf, reason: String },

    /// An external geometry collaborator failed for one tile.
    #[error("collaborator failed on tile {tile}: {reason}")]
    Collaborator { tile: TileKey, reason: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        PipelineError::MalformedPly {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
