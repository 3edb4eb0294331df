use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("The file's magic value does not match the expectation {magic:#010X}")]
    InvalidMagicValue { magic: u32 },

    #[error("The file is violating the expected format, because: {reason}")]
    FormatError { reason: String },

    #[error("The file uses a feature this decoder does not implement: {reason}")]
    UnsupportedFeature { reason: String },

    /// Represents a failure to read from input.
    #[error("Read error")]
    ReadError { source: std::io::Error },

    /// Represents all other cases of `std::io::Error`.
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error("Embedded base64 payload could not be decoded")]
    Base64Error(#[from] base64::DecodeError),

    #[error(transparent)]
    UTF8ConversionError(#[from] std::string::FromUtf8Error),
}

impl ParserError {
    pub(crate) fn format(reason: impl Into<String>) -> Self {
        ParserError::FormatError { reason: reason.into() }
    }

    pub(crate) fn unsupported(reason: impl Into<String>) -> Self {
        ParserError::UnsupportedFeature { reason: reason.into() }
    }
}

pub mod common;
pub mod fbx;
pub mod glb;
pub mod gltf;
pub mod obj;
