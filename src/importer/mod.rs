//! Contrasting to the codec readers, that only parse files, importers
//! convert already parsed assets into the scene IR the rest of the pipeline
//! works on.

use thiserror::Error;
use vitrine_files::ParserError;

pub mod fbx_importer;
pub mod gltf_importer;
pub mod obj_importer;

#[derive(Error, Debug)]
pub enum ImportError {
    /// Accessing the parsed asset's data failed (bad indices, truncated
    /// buffers); this is a property of the payload, not of the import step.
    #[error(transparent)]
    Asset(#[from] ParserError),

    #[error("the decoded document contains no renderable geometry")]
    EmptyScene,

    #[error("the decoded document is inconsistent: {reason}")]
    Malformed { reason: String },
}

impl ImportError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        ImportError::Malformed { reason: reason.into() }
    }
}
