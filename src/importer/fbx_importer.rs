use std::collections::{HashMap, HashSet};

use glam::{EulerRot, Quat, Vec3, Vec4};
use itertools::Itertools;
use vitrine_files::fbx::types::{FbxAsset, FbxGeometry, FbxMaterial, FbxModel};

use crate::importer::ImportError;
use crate::scene::{Material, Mesh, SceneGraph, SceneNode, Transform, VertexBuffers};

/// This codec conventionally measures in centimeters while the viewer works
/// in meters, so the imported hierarchy sits under one corrective root.
/// Codec-specific; no other format gets rescaled.
pub const UNIT_SCALE: f32 = 0.01;

const DEFAULT_FBX_COLOR: Vec4 = Vec4::new(0.8, 0.8, 0.8, 1.0);
const DEFAULT_FBX_SHININESS: f32 = 20.0;

pub struct FbxImporter {}

impl FbxImporter {
    /// Joins geometries, models and materials through the object-to-object
    /// connection table, then scales the whole hierarchy to viewer units.
    pub fn import(asset: &FbxAsset) -> Result<SceneGraph, ImportError> {
        let geometries = asset.geometries()?;
        let models = asset.models()?;
        let materials = asset.materials()?;
        let connections = asset.connections();

        let model_ids: HashSet<i64> = models.iter().map(|model| model.id).collect();

        // child object id -> owning model id
        let mut geometry_for_model: HashMap<i64, &FbxGeometry> = HashMap::new();
        let mut material_for_model: HashMap<i64, &FbxMaterial> = HashMap::new();
        let mut model_parent: HashMap<i64, i64> = HashMap::new();
        let mut placed_geometry: HashSet<i64> = HashSet::new();

        for &(child, parent) in &connections {
            if model_ids.contains(&parent) {
                if let Some(geometry) = geometries.iter().find(|g| g.id == child) {
                    geometry_for_model.entry(parent).or_insert(geometry);
                    placed_geometry.insert(child);
                }
                if let Some(material) = materials.iter().find(|m| m.id == child) {
                    material_for_model.entry(parent).or_insert(material);
                }
            }
            if model_ids.contains(&child) {
                model_parent.insert(child, parent);
            }
        }

        let mut nodes = Vec::new();
        for model in &models {
            // Hierarchies deeper than one model level are flattened; the
            // exporters seen in the gallery emit flat object lists.
            nodes.push(Self::import_model(
                model,
                geometry_for_model.get(&model.id).copied(),
                material_for_model.get(&model.id).copied(),
            )?);
        }

        // Geometry nobody claimed still has to show up.
        for geometry in &geometries {
            if !placed_geometry.contains(&geometry.id) {
                if let Some(mesh) = Self::import_geometry(geometry)? {
                    nodes.push(SceneNode {
                        mesh: Some(mesh),
                        materials: vec![default_material(None)],
                        ..SceneNode::default()
                    });
                }
            }
        }

        let root = SceneNode {
            transform: Transform::from_scale(Vec3::splat(UNIT_SCALE)),
            children: nodes,
            ..SceneNode::default()
        };

        let graph = SceneGraph { roots: vec![root] };
        if graph.stats().vertices == 0 {
            return Err(ImportError::EmptyScene);
        }
        Ok(graph)
    }

    fn import_model(
        model: &FbxModel,
        geometry: Option<&FbxGeometry>,
        material: Option<&FbxMaterial>,
    ) -> Result<SceneNode, ImportError> {
        let mesh = match geometry {
            Some(geometry) => Self::import_geometry(geometry)?,
            None => None,
        };

        let materials = if mesh.is_some() {
            vec![material.map(fbx_material).unwrap_or_else(|| default_material(None))]
        } else {
            Vec::new()
        };

        Ok(SceneNode {
            name: (!model.name.is_empty()).then(|| model.name.clone()),
            transform: model_transform(model),
            mesh,
            materials,
            ..SceneNode::default()
        })
    }

    fn import_geometry(geometry: &FbxGeometry) -> Result<Option<Mesh>, ImportError> {
        if geometry.positions.is_empty() || geometry.polygon_vertex_index.is_empty() {
            return Ok(None);
        }

        let triangles = geometry.triangulate()?;
        let positions = geometry
            .positions
            .iter()
            .map(|p| Vec3::new(p[0] as f32, p[1] as f32, p[2] as f32))
            .collect_vec();

        // Per-corner normal layers force de-indexing; per-control-point
        // layers keep the index buffer intact.
        let per_vertex_normals = geometry.normals.as_ref().filter(|layer| {
            matches!(layer.mapping.as_str(), "ByVertice" | "ByVertex")
                && layer.reference == "Direct"
                && layer.normals.len() == positions.len()
        });
        let per_corner_normals = geometry.normals.as_ref().filter(|layer| {
            layer.mapping == "ByPolygonVertex" && layer.reference == "Direct"
        });

        if let Some(layer) = per_corner_normals {
            let mut buffers = VertexBuffers::default();
            let mut index_buffer = Vec::with_capacity(triangles.len() * 3);
            let mut corner = 0usize;
            for triangle in &triangles {
                for &vertex in triangle {
                    buffers.position_buffer.push(positions[vertex as usize]);
                    if let Some(n) = layer.normals.get(corner) {
                        buffers
                            .normals_buffer
                            .push(Vec3::new(n[0] as f32, n[1] as f32, n[2] as f32));
                    }
                    index_buffer.push(corner as u32);
                    corner += 1;
                }
            }
            if buffers.normals_buffer.len() != buffers.position_buffer.len() {
                // The layer is shorter than the corner stream; drop it.
                buffers.normals_buffer.clear();
            }
            return Ok(Some(Mesh {
                vertex_buffers: buffers,
                index_buffer,
            }));
        }

        let normals = per_vertex_normals
            .map(|layer| {
                layer
                    .normals
                    .iter()
                    .map(|n| Vec3::new(n[0] as f32, n[1] as f32, n[2] as f32))
                    .collect_vec()
            })
            .unwrap_or_default();

        Ok(Some(Mesh {
            vertex_buffers: VertexBuffers {
                position_buffer: positions,
                normals_buffer: normals,
                texcoord_buffer_0: Vec::new(),
            },
            index_buffer: triangles.into_iter().flatten().collect(),
        }))
    }
}

fn model_transform(model: &FbxModel) -> Transform {
    Transform {
        translation: Vec3::new(
            model.translation[0] as f32,
            model.translation[1] as f32,
            model.translation[2] as f32,
        ),
        rotation: Quat::from_euler(
            EulerRot::XYZ,
            (model.rotation[0] as f32).to_radians(),
            (model.rotation[1] as f32).to_radians(),
            (model.rotation[2] as f32).to_radians(),
        ),
        scale: Vec3::new(
            model.scale[0] as f32,
            model.scale[1] as f32,
            model.scale[2] as f32,
        ),
    }
}

fn fbx_material(material: &FbxMaterial) -> Material {
    let color = material
        .diffuse_color
        .map(|[r, g, b]| Vec4::new(r as f32, g as f32, b as f32, 1.0))
        .unwrap_or(DEFAULT_FBX_COLOR);
    Material::phong(
        (!material.name.is_empty()).then(|| material.name.clone()),
        color,
        material.shininess.unwrap_or(DEFAULT_FBX_SHININESS as f64) as f32,
    )
}

fn default_material(name: Option<String>) -> Material {
    Material::phong(name, DEFAULT_FBX_COLOR, DEFAULT_FBX_SHININESS)
}
