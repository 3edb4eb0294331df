use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use itertools::Itertools;
use vitrine_files::gltf::reader::GltfAsset;
use vitrine_files::gltf::types::{GltfNode, Primitive, MODE_TRIANGLES};

use crate::importer::ImportError;
use crate::scene::{Material, Mesh, SceneGraph, SceneNode, Transform, VertexBuffers};

/// glTF defaults when a primitive carries no material entry.
const DEFAULT_BASE_COLOR: Vec4 = Vec4::ONE;
const DEFAULT_ROUGHNESS: f32 = 1.0;
const DEFAULT_METALNESS: f32 = 1.0;

/// Guard against self-referential node hierarchies, which the format forbids
/// but a hostile payload can still encode.
const MAX_NODE_DEPTH: usize = 256;

pub struct GltfImporter {}

impl GltfImporter {
    /// Builds the scene graph for the default scene (or the first one). Both
    /// the text and the binary container run through here; they only differ
    /// in how their buffers arrived.
    pub fn import(asset: &GltfAsset) -> Result<SceneGraph, ImportError> {
        let document = &asset.document;

        let materials = document
            .materials
            .iter()
            .map(|material| {
                let pbr = &material.pbr_metallic_roughness;
                Material::standard(
                    material.name.clone(),
                    pbr.base_color_factor.map(Vec4::from_array).unwrap_or(DEFAULT_BASE_COLOR),
                    pbr.roughness_factor.unwrap_or(DEFAULT_ROUGHNESS),
                    pbr.metallic_factor.unwrap_or(DEFAULT_METALNESS),
                )
            })
            .collect_vec();

        let root_indices = match document.scene.or(if document.scenes.is_empty() {
            None
        } else {
            Some(0)
        }) {
            Some(scene_idx) => document
                .scenes
                .get(scene_idx)
                .ok_or_else(|| {
                    ImportError::malformed(format!("default scene index {scene_idx} out of range"))
                })?
                .nodes
                .clone(),
            // No scenes at all: every node that is nobody's child is a root.
            None => {
                let referenced: std::collections::HashSet<usize> = document
                    .nodes
                    .iter()
                    .flat_map(|node| node.children.iter().copied())
                    .collect();
                (0..document.nodes.len())
                    .filter(|idx| !referenced.contains(idx))
                    .collect()
            }
        };

        let mut roots = Vec::with_capacity(root_indices.len());
        for node_idx in root_indices {
            roots.push(Self::import_node(asset, &materials, node_idx, 0)?);
        }

        let graph = SceneGraph { roots };
        if graph.stats().vertices == 0 {
            return Err(ImportError::EmptyScene);
        }
        Ok(graph)
    }

    fn import_node(
        asset: &GltfAsset,
        materials: &[Material],
        node_idx: usize,
        depth: usize,
    ) -> Result<SceneNode, ImportError> {
        if depth > MAX_NODE_DEPTH {
            return Err(ImportError::malformed("node hierarchy exceeds depth limit"));
        }

        let document = &asset.document;
        let node: &GltfNode = document
            .nodes
            .get(node_idx)
            .ok_or_else(|| ImportError::malformed(format!("node index {node_idx} out of range")))?;

        let mut scene_node = SceneNode {
            name: node.name.clone(),
            transform: node_transform(node),
            ..SceneNode::default()
        };

        if let Some(mesh_idx) = node.mesh {
            let mesh = document.meshes.get(mesh_idx).ok_or_else(|| {
                ImportError::malformed(format!("mesh index {mesh_idx} out of range"))
            })?;

            // A single primitive stays on the node; additional primitives
            // become children so each keeps its own material slot.
            let mut primitives = mesh.primitives.iter();
            if let Some(primitive) = primitives.next() {
                let (geometry, material) = Self::import_primitive(asset, materials, primitive)?;
                scene_node.mesh = Some(geometry);
                scene_node.materials.push(material);
            }
            for (extra_idx, primitive) in primitives.enumerate() {
                let (geometry, material) = Self::import_primitive(asset, materials, primitive)?;
                scene_node.children.push(SceneNode {
                    name: mesh.name.as_ref().map(|name| format!("{name}#{}", extra_idx + 1)),
                    mesh: Some(geometry),
                    materials: vec![material],
                    ..SceneNode::default()
                });
            }
        }

        for &child_idx in &node.children {
            scene_node
                .children
                .push(Self::import_node(asset, materials, child_idx, depth + 1)?);
        }

        Ok(scene_node)
    }

    fn import_primitive(
        asset: &GltfAsset,
        materials: &[Material],
        primitive: &Primitive,
    ) -> Result<(Mesh, Material), ImportError> {
        if primitive.mode.unwrap_or(MODE_TRIANGLES) != MODE_TRIANGLES {
            return Err(ImportError::malformed(format!(
                "primitive mode {} (only triangles render)",
                primitive.mode.unwrap_or(MODE_TRIANGLES)
            )));
        }

        let position_accessor = primitive
            .attributes
            .get("POSITION")
            .copied()
            .ok_or_else(|| ImportError::malformed("primitive without POSITION attribute"))?;
        let positions = asset
            .read_vec3(position_accessor)?
            .into_iter()
            .map(Vec3::from_array)
            .collect_vec();

        let normals = match primitive.attributes.get("NORMAL") {
            Some(&accessor) => asset
                .read_vec3(accessor)?
                .into_iter()
                .map(Vec3::from_array)
                .collect_vec(),
            None => Vec::new(),
        };
        let texcoords = match primitive.attributes.get("TEXCOORD_0") {
            Some(&accessor) => asset
                .read_vec2(accessor)?
                .into_iter()
                .map(Vec2::from_array)
                .collect_vec(),
            None => Vec::new(),
        };

        let index_buffer = match primitive.indices {
            Some(accessor) => {
                let indices = asset.read_indices(accessor)?;
                if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
                    return Err(ImportError::malformed(format!(
                        "index {bad} references past {} vertices",
                        positions.len()
                    )));
                }
                indices
            }
            None => (0..positions.len() as u32).collect(),
        };
        if index_buffer.len() % 3 != 0 {
            return Err(ImportError::malformed("index count not divisible by 3"));
        }

        let material = match primitive.material {
            Some(material_idx) => materials
                .get(material_idx)
                .cloned()
                .ok_or_else(|| {
                    ImportError::malformed(format!("material index {material_idx} out of range"))
                })?,
            None => Material::standard(None, DEFAULT_BASE_COLOR, DEFAULT_ROUGHNESS, DEFAULT_METALNESS),
        };

        Ok((
            Mesh {
                vertex_buffers: VertexBuffers {
                    position_buffer: positions,
                    normals_buffer: normals,
                    texcoord_buffer_0: texcoords,
                },
                index_buffer,
            },
            material,
        ))
    }
}

fn node_transform(node: &GltfNode) -> Transform {
    if let Some(matrix) = node.matrix {
        let (scale, rotation, translation) =
            Mat4::from_cols_array(&matrix).to_scale_rotation_translation();
        return Transform {
            translation,
            rotation,
            scale,
        };
    }

    Transform {
        translation: node.translation.map(Vec3::from_array).unwrap_or(Vec3::ZERO),
        rotation: node
            .rotation
            .map(Quat::from_array)
            .unwrap_or(Quat::IDENTITY),
        scale: node.scale.map(Vec3::from_array).unwrap_or(Vec3::ONE),
    }
}

#[cfg(test)]
mod tests {
    use vitrine_files::gltf::reader::GltfReader;

    use super::*;

    fn triangle_asset() -> GltfAsset {
        let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let buffer: Vec<u8> = positions.iter().flat_map(|p| p.to_le_bytes()).collect();
        let json = serde_json::json!({
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [{ "nodes": [0] }],
            "nodes": [{
                "mesh": 0,
                "name": "tri",
                "translation": [0.0, 5.0, 0.0],
                "scale": [2.0, 2.0, 2.0]
            }],
            "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "material": 0 }] }],
            "materials": [{
                "name": "paint",
                "pbrMetallicRoughness": {
                    "baseColorFactor": [0.2, 0.4, 0.6, 1.0],
                    "roughnessFactor": 0.5,
                    "metallicFactor": 0.0
                }
            }],
            "accessors": [
                { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3" }
            ],
            "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }],
            "buffers": [{ "byteLength": 36 }]
        })
        .to_string();
        GltfReader::parse_with_bin(json.as_bytes(), Some(buffer)).unwrap()
    }

    #[test]
    fn imports_node_transform_mesh_and_material() -> Result<(), anyhow::Error> {
        let graph = GltfImporter::import(&triangle_asset())?;

        assert_eq!(graph.roots.len(), 1);
        let node = &graph.roots[0];
        assert_eq!(node.name.as_deref(), Some("tri"));
        assert_eq!(node.transform.translation, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(node.transform.scale, Vec3::splat(2.0));

        let mesh = node.mesh.as_ref().unwrap();
        assert_eq!(mesh.vertex_buffers.position_buffer.len(), 3);
        // No explicit indices: sequential triangles.
        assert_eq!(mesh.index_buffer, vec![0, 1, 2]);

        let material = &node.materials[0];
        assert_eq!(material.name.as_deref(), Some("paint"));
        assert_eq!(material.color, Some(Vec4::new(0.2, 0.4, 0.6, 1.0)));
        assert!(material.has_roughness());
        Ok(())
    }

    #[test]
    fn document_without_geometry_is_an_empty_scene() {
        let json = serde_json::json!({
            "asset": { "version": "2.0" },
            "scenes": [{ "nodes": [0] }],
            "scene": 0,
            "nodes": [{ "name": "empty" }]
        })
        .to_string();
        let asset = GltfReader::parse_asset(json.as_bytes()).unwrap();

        assert!(matches!(
            GltfImporter::import(&asset),
            Err(ImportError::EmptyScene)
        ));
    }
}
