use std::collections::HashMap;

use glam::{Vec2, Vec3, Vec4};
use vitrine_files::obj::types::{FaceVertex, ObjAsset, ObjGroup};

use crate::importer::ImportError;
use crate::scene::{Material, Mesh, SceneGraph, SceneNode, VertexBuffers};

/// The color a classic viewer gives OBJ surfaces when no material library is
/// available; the name from `usemtl` is kept for display purposes.
const DEFAULT_OBJ_COLOR: Vec4 = Vec4::ONE;
const DEFAULT_OBJ_SHININESS: f32 = 30.0;

pub struct ObjImporter {}

impl ObjImporter {
    /// One flat node per group. The corner references are rewritten into a
    /// single index space, deduplicating corners that share all three of
    /// position, texcoord and normal.
    pub fn import(asset: &ObjAsset) -> Result<SceneGraph, ImportError> {
        let mut roots = Vec::with_capacity(asset.groups.len());
        for group in &asset.groups {
            roots.push(Self::import_group(asset, group)?);
        }

        let graph = SceneGraph { roots };
        if graph.stats().vertices == 0 {
            return Err(ImportError::EmptyScene);
        }
        Ok(graph)
    }

    fn import_group(asset: &ObjAsset, group: &ObjGroup) -> Result<SceneNode, ImportError> {
        let mut remap: HashMap<FaceVertex, u32> = HashMap::new();
        let mut buffers = VertexBuffers::default();
        let mut index_buffer = Vec::with_capacity(group.faces.len() * 3);

        let has_texcoords = group
            .faces
            .iter()
            .all(|face| face.iter().all(|corner| corner.texcoord.is_some()));
        let has_normals = group
            .faces
            .iter()
            .all(|face| face.iter().all(|corner| corner.normal.is_some()));

        for face in &group.faces {
            for corner in face {
                let next_index = remap.len() as u32;
                let index = *remap.entry(*corner).or_insert(next_index);
                if index == next_index {
                    // The reader validated every reference already.
                    buffers
                        .position_buffer
                        .push(Vec3::from_array(asset.positions[corner.position as usize]));
                    if has_normals {
                        let normal = corner.normal.expect("all corners carry normals");
                        buffers
                            .normals_buffer
                            .push(Vec3::from_array(asset.normals[normal as usize]));
                    }
                    if has_texcoords {
                        let texcoord = corner.texcoord.expect("all corners carry texcoords");
                        buffers
                            .texcoord_buffer_0
                            .push(Vec2::from_array(asset.texcoords[texcoord as usize]));
                    }
                }
                index_buffer.push(index);
            }
        }

        Ok(SceneNode {
            name: group.name.clone(),
            mesh: Some(Mesh {
                vertex_buffers: buffers,
                index_buffer,
            }),
            materials: vec![Material::phong(
                group.material.clone(),
                DEFAULT_OBJ_COLOR,
                DEFAULT_OBJ_SHININESS,
            )],
            ..SceneNode::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::BufReader;

    use vitrine_files::obj::reader::ObjReader;

    use super::*;

    fn parse(source: &str) -> ObjAsset {
        ObjReader::parse_asset(&mut BufReader::new(source.as_bytes())).unwrap()
    }

    #[test]
    fn shared_corners_are_deduplicated() -> Result<(), anyhow::Error> {
        let asset = parse(
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
             f 1 2 3\nf 1 3 4\n",
        );
        let graph = ObjImporter::import(&asset)?;

        let mesh = graph.roots[0].mesh.as_ref().unwrap();
        // 4 distinct corners across 6 face slots.
        assert_eq!(mesh.vertex_buffers.position_buffer.len(), 4);
        assert_eq!(mesh.index_buffer, vec![0, 1, 2, 0, 2, 3]);
        Ok(())
    }

    #[test]
    fn group_names_and_material_names_survive() -> Result<(), anyhow::Error> {
        let asset = parse(
            "v 0 0 0\nv 1 0 0\nv 0 1 0\n\
             g wing\nusemtl aluminium\nf 1 2 3\n",
        );
        let graph = ObjImporter::import(&asset)?;

        let node = &graph.roots[0];
        assert_eq!(node.name.as_deref(), Some("wing"));
        assert_eq!(node.materials[0].name.as_deref(), Some("aluminium"));
        assert!(matches!(
            node.materials[0].kind,
            crate::scene::MaterialKind::Phong { .. }
        ));
        Ok(())
    }

    #[test]
    fn mixed_corner_forms_drop_the_partial_channel() -> Result<(), anyhow::Error> {
        // Second face has no normals, so the channel is dropped wholesale
        // rather than padded with fabricated data.
        let asset = parse(
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\n\
             f 1//1 2//1 3//1\nf 3 2 1\n",
        );
        let graph = ObjImporter::import(&asset)?;

        let mesh = graph.roots[0].mesh.as_ref().unwrap();
        assert!(mesh.vertex_buffers.normals_buffer.is_empty());
        Ok(())
    }

    #[test]
    fn empty_asset_is_an_empty_scene() {
        let asset = parse("v 0 0 0\n");
        assert!(matches!(
            ObjImporter::import(&asset),
            Err(ImportError::EmptyScene)
        ));
    }
}
