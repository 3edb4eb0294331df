//! Contrasting to the importers, that convert already parsed files into the
//! scene IR, loaders are a lot more high level: they fetch the payload, call
//! the parser and pipe the result into the importer, all on the blocking
//! pool so the caller's loop keeps turning.

use std::sync::Arc;

use thiserror::Error;
use vitrine_files::ParserError;

use crate::format::ModelFormat;
use crate::importer::ImportError;
use crate::io::common::fetcher::{FetchError, RawPayloadFetcher};
use crate::scene::SceneGraph;

pub mod fbx_loader;
pub mod glb_loader;
pub mod gltf_loader;
pub mod obj_loader;

pub use fbx_loader::FbxLoader;
pub use glb_loader::GlbLoader;
pub use gltf_loader::GltfLoader;
pub use obj_loader::ObjLoader;

/// Why a load ended without a scene. All variants are retried up to the
/// bound: a network hiccup or a truncated stream can heal on the next
/// attempt, while a structurally corrupt file just burns its attempts the
/// same way every time.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("network fetch failed: {0}")]
    Network(#[from] FetchError),

    #[error("payload could not be parsed: {0}")]
    Parse(#[source] ParserError),

    #[error("parsed payload could not be decoded into a scene: {0}")]
    Decode(#[source] ImportError),
}

impl From<ParserError> for LoadError {
    fn from(error: ParserError) -> Self {
        LoadError::Parse(error)
    }
}

impl From<ImportError> for LoadError {
    fn from(error: ImportError) -> Self {
        match error {
            // Data-access failures inside the importer are payload defects.
            ImportError::Asset(parser) => LoadError::Parse(parser),
            other => LoadError::Decode(other),
        }
    }
}

/// Runs the matching codec. The orchestrator filters unsupported formats
/// before this point; hitting one here is a programming error upstream and
/// reported as a decode failure rather than a panic.
pub async fn load_for_format(
    format: ModelFormat,
    fetcher: Arc<dyn RawPayloadFetcher>,
    url: &str,
) -> Result<SceneGraph, LoadError> {
    match format {
        ModelFormat::Glb => GlbLoader::load(fetcher, url).await,
        ModelFormat::Gltf => GltfLoader::load(fetcher, url).await,
        ModelFormat::Obj => ObjLoader::load(fetcher, url).await,
        ModelFormat::Fbx => FbxLoader::load(fetcher, url).await,
        ModelFormat::Stl | ModelFormat::Unknown => {
            debug_assert!(false, "unsupported format {format} reached the loader");
            Err(LoadError::Decode(ImportError::Malformed {
                reason: format!("no decoder for format {format}"),
            }))
        }
    }
}

/// Shared fetch-then-decode scaffolding: the closure runs on the blocking
/// pool with the fetched payload.
pub(crate) async fn fetch_and_decode<F>(
    fetcher: Arc<dyn RawPayloadFetcher>,
    url: &str,
    decode: F,
) -> Result<SceneGraph, LoadError>
where
    F: FnOnce(Vec<u8>) -> Result<SceneGraph, LoadError> + Send + 'static,
{
    let url = url.to_owned();
    let handle = tokio::task::spawn_blocking(move || -> Result<SceneGraph, LoadError> {
        let payload = fetcher.fetch_raw_owned(&url)?;
        log::debug!("fetched {} bytes from {url}", payload.len());
        decode(payload)
    });

    handle.await.map_err(|join_error| {
        LoadError::Decode(ImportError::Malformed {
            reason: format!("decode task aborted: {join_error}"),
        })
    })?
}

impl LoadError {
    /// The outbound error class the presentation layer shows.
    pub fn kind_name(&self) -> &'static str {
        match self {
            LoadError::Network(_) => "network",
            LoadError::Parse(_) => "parse",
            LoadError::Decode(_) => "decode",
        }
    }
}
