use std::io::Cursor;
use std::sync::Arc;

use vitrine_files::glb::reader::GlbReader;

use crate::importer::gltf_importer::GltfImporter;
use crate::io::common::fetcher::RawPayloadFetcher;
use crate::loader::{fetch_and_decode, LoadError};
use crate::scene::SceneGraph;

pub struct GlbLoader {}

impl GlbLoader {
    pub async fn load(
        fetcher: Arc<dyn RawPayloadFetcher>,
        url: &str,
    ) -> Result<SceneGraph, LoadError> {
        fetch_and_decode(fetcher, url, |payload| {
            let asset = GlbReader::parse_asset(&mut Cursor::new(payload))?;
            Ok(GltfImporter::import(&asset)?)
        })
        .await
    }
}
