//! Post-load pass that makes heterogeneous uploads display consistently:
//! authoring tools export unset (black) colors, wild specular exponents and
//! no shadow flags, and the renderer must not inherit any of that.

use glam::Vec4;
use log::trace;

use crate::scene::{Material, MaterialKind, SceneGraph, SceneNode};

/// A color whose channels sum to less than this renders as an invisible
/// silhouette under gallery lighting and is treated as unset.
pub const NEAR_BLACK_EPSILON: f32 = 0.1;

/// Replacement for unset colors. Its channel sum (1.86) sits far outside the
/// epsilon band, which is what makes a second pass a no-op.
pub const DEFAULT_SURFACE_COLOR: Vec4 = Vec4::new(0.62, 0.62, 0.62, 1.0);

const ROUGHNESS_RANGE: (f32, f32) = (0.05, 1.0);
const METALNESS_RANGE: (f32, f32) = (0.0, 1.0);
const SHININESS_RANGE: (f32, f32) = (1.0, 1024.0);

/// In-place and idempotent: running this twice leaves the second pass with
/// nothing to change.
pub fn normalize(graph: &mut SceneGraph) {
    for root in &mut graph.roots {
        normalize_node(root);
    }
}

fn normalize_node(node: &mut SceneNode) {
    if node.mesh.is_some() {
        node.cast_shadows = true;
        node.receive_shadows = true;
    }
    for material in &mut node.materials {
        normalize_material(material);
    }
    for child in &mut node.children {
        normalize_node(child);
    }
}

fn normalize_material(material: &mut Material) {
    if let Some(color) = material.color.as_mut() {
        if color.x + color.y + color.z < NEAR_BLACK_EPSILON {
            trace!(
                "replacing near-black color of {:?} with the default gray",
                material.name
            );
            *color = DEFAULT_SURFACE_COLOR;
        }
    }

    match &mut material.kind {
        MaterialKind::Standard { roughness, metalness } => {
            *roughness = roughness.clamp(ROUGHNESS_RANGE.0, ROUGHNESS_RANGE.1);
            *metalness = metalness.clamp(METALNESS_RANGE.0, METALNESS_RANGE.1);
        }
        MaterialKind::Phong { shininess } => {
            *shininess = shininess.clamp(SHININESS_RANGE.0, SHININESS_RANGE.1);
        }
        MaterialKind::Basic => (),
    }

    // The renderer re-uploads GPU-side material state before the next frame.
    material.needs_upload = true;
}
