use std::io::BufReader;
use std::sync::Arc;

use vitrine_files::obj::reader::ObjReader;

use crate::importer::obj_importer::ObjImporter;
use crate::io::common::fetcher::RawPayloadFetcher;
use crate::loader::{fetch_and_decode, LoadError};
use crate::scene::SceneGraph;

pub struct ObjLoader {}

impl ObjLoader {
    pub async fn load(
        fetcher: Arc<dyn RawPayloadFetcher>,
        url: &str,
    ) -> Result<SceneGraph, LoadError> {
        fetch_and_decode(fetcher, url, |payload| {
            let asset = ObjReader::parse_asset(&mut BufReader::new(payload.as_slice()))?;
            Ok(ObjImporter::import(&asset)?)
        })
        .await
    }
}
