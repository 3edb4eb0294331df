use std::sync::Arc;

use vitrine_files::gltf::reader::GltfReader;

use crate::importer::gltf_importer::GltfImporter;
use crate::io::common::fetcher::RawPayloadFetcher;
use crate::loader::{fetch_and_decode, LoadError};
use crate::scene::SceneGraph;

pub struct GltfLoader {}

impl GltfLoader {
    pub async fn load(
        fetcher: Arc<dyn RawPayloadFetcher>,
        url: &str,
    ) -> Result<SceneGraph, LoadError> {
        fetch_and_decode(fetcher, url, |payload| {
            let asset = GltfReader::parse_asset(&payload)?;
            Ok(GltfImporter::import(&asset)?)
        })
        .await
    }
}
