//! The renderer-facing intermediate representation every codec decodes
//! into. Nodes own their geometry and materials; the presentation layer only
//! ever borrows a normalized graph.

use std::fmt::{Debug, Formatter};

use glam::{Affine3A, Quat, Vec2, Vec3, Vec4};

#[derive(Clone)]
pub struct Mesh {
    pub vertex_buffers: VertexBuffers,
    pub index_buffer: Vec<u32>,
}

impl Mesh {
    pub fn triangle_count(&self) -> usize {
        self.index_buffer.len() / 3
    }
}

impl Debug for Mesh {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{ vertex_buffers: {:?}, ", self.vertex_buffers)?;
        write!(f, "index_buffer: [{}] }}", self.index_buffer.len())
    }
}

#[derive(Clone, Default)]
pub struct VertexBuffers {
    pub position_buffer: Vec<Vec3>,
    pub normals_buffer: Vec<Vec3>,
    pub texcoord_buffer_0: Vec<Vec2>,
}

impl Debug for VertexBuffers {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{ position_buffer: [{}], ", self.position_buffer.len())?;
        write!(f, "normals_buffer: [{}], ", self.normals_buffer.len())?;
        write!(f, "texcoord_buffer_0: [{}] }}", self.texcoord_buffer_0.len())
    }
}

/// Local TRS transform of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_scale(scale: Vec3) -> Self {
        Transform {
            scale,
            ..Transform::IDENTITY
        }
    }

    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::IDENTITY
    }
}

/// Lighting model of a surface, tagged so normalization is one exhaustive
/// match instead of a chain of runtime type tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialKind {
    /// Metallic/roughness PBR (the glTF family).
    Standard { roughness: f32, metalness: f32 },
    /// Classic specular response (OBJ, FBX diffuse materials).
    Phong { shininess: f32 },
    /// Unlit flat shading.
    Basic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: Option<String>,
    /// RGBA base color; `None` for material models without a color response.
    pub color: Option<Vec4>,
    pub kind: MaterialKind,
    /// Set when GPU-side state must be (re-)uploaded before the next frame.
    pub needs_upload: bool,
}

impl Material {
    pub fn standard(name: Option<String>, color: Vec4, roughness: f32, metalness: f32) -> Self {
        Material {
            name,
            color: Some(color),
            kind: MaterialKind::Standard { roughness, metalness },
            needs_upload: false,
        }
    }

    pub fn phong(name: Option<String>, color: Vec4, shininess: f32) -> Self {
        Material {
            name,
            color: Some(color),
            kind: MaterialKind::Phong { shininess },
            needs_upload: false,
        }
    }

    pub fn has_color(&self) -> bool {
        self.color.is_some()
    }

    pub fn has_roughness(&self) -> bool {
        matches!(self.kind, MaterialKind::Standard { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SceneNode {
    pub name: Option<String>,
    pub transform: Transform,
    pub mesh: Option<Mesh>,
    /// Every material the mesh's primitives reference (one or many).
    pub materials: Vec<Material>,
    pub cast_shadows: bool,
    pub receive_shadows: bool,
    pub children: Vec<SceneNode>,
}

/// A decoded, display-ready hierarchy. Produced by a codec loader, mutated
/// in place exactly once by normalization, then shared read-only.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    pub roots: Vec<SceneNode>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub nodes: usize,
    pub vertices: usize,
    pub triangles: usize,
    pub materials: usize,
}

impl SceneGraph {
    pub fn stats(&self) -> SceneStats {
        let mut stats = SceneStats::default();
        for root in &self.roots {
            accumulate_stats(root, &mut stats);
        }
        stats
    }
}

fn accumulate_stats(node: &SceneNode, stats: &mut SceneStats) {
    stats.nodes += 1;
    stats.materials += node.materials.len();
    if let Some(mesh) = &node.mesh {
        stats.vertices += mesh.vertex_buffers.position_buffer.len();
        stats.triangles += mesh.triangle_count();
    }
    for child in &node.children {
        accumulate_stats(child, stats);
    }
}
