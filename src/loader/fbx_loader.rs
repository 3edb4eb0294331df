use std::io::Cursor;
use std::sync::Arc;

use vitrine_files::fbx::reader::FbxReader;

use crate::importer::fbx_importer::FbxImporter;
use crate::io::common::fetcher::RawPayloadFetcher;
use crate::loader::{fetch_and_decode, LoadError};
use crate::scene::SceneGraph;

pub struct FbxLoader {}

impl FbxLoader {
    pub async fn load(
        fetcher: Arc<dyn RawPayloadFetcher>,
        url: &str,
    ) -> Result<SceneGraph, LoadError> {
        fetch_and_decode(fetcher, url, |payload| {
            let asset = FbxReader::parse_asset(&mut Cursor::new(payload))?;
            Ok(FbxImporter::import(&asset)?)
        })
        .await
    }
}
