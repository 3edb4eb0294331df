//! World-space bounding volume of a scene graph, the input to camera
//! framing.

use glam::{Affine3A, Vec3};

use crate::scene::types::{SceneGraph, SceneNode};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_point(point: Vec3) -> Self {
        Aabb {
            min: point,
            max: point,
        }
    }

    pub fn grow(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Accumulates every mesh vertex under the node transforms. `None` for a
/// graph without geometry.
pub fn scene_bounds(graph: &SceneGraph) -> Option<Aabb> {
    let mut bounds = None;
    for root in &graph.roots {
        node_bounds(root, Affine3A::IDENTITY, &mut bounds);
    }
    bounds
}

fn node_bounds(node: &SceneNode, parent: Affine3A, bounds: &mut Option<Aabb>) {
    let world = parent * node.transform.to_affine();

    if let Some(mesh) = &node.mesh {
        for &position in &mesh.vertex_buffers.position_buffer {
            let point = world.transform_point3(position);
            match bounds {
                Some(aabb) => aabb.grow(point),
                None => *bounds = Some(Aabb::from_point(point)),
            }
        }
    }

    for child in &node.children {
        node_bounds(child, world, bounds);
    }
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};

    use super::*;
    use crate::scene::types::{Mesh, SceneNode, Transform, VertexBuffers};

    fn mesh_node(positions: Vec<Vec3>, transform: Transform) -> SceneNode {
        SceneNode {
            transform,
            mesh: Some(Mesh {
                vertex_buffers: VertexBuffers {
                    position_buffer: positions,
                    ..VertexBuffers::default()
                },
                index_buffer: Vec::new(),
            }),
            ..SceneNode::default()
        }
    }

    #[test]
    fn empty_graph_has_no_bounds() {
        assert!(scene_bounds(&SceneGraph::default()).is_none());
    }

    #[test]
    fn bounds_cover_all_roots() {
        let graph = SceneGraph {
            roots: vec![
                mesh_node(vec![Vec3::new(-1.0, 0.0, 0.0)], Transform::IDENTITY),
                mesh_node(vec![Vec3::new(0.0, 3.0, 2.0)], Transform::IDENTITY),
            ],
        };

        let aabb = scene_bounds(&graph).unwrap();
        assert_eq!(aabb.min, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(0.0, 3.0, 2.0));
    }

    #[test]
    fn child_transforms_compose_with_parents() {
        let mut parent = mesh_node(vec![Vec3::ZERO], Transform::from_scale(Vec3::splat(2.0)));
        parent.children.push(mesh_node(
            vec![Vec3::new(1.0, 0.0, 0.0)],
            Transform {
                translation: Vec3::new(1.0, 0.0, 0.0),
                rotation: Quat::IDENTITY,
                scale: Vec3::ONE,
            },
        ));
        let graph = SceneGraph { roots: vec![parent] };

        // Child vertex lands at parent_scale * (translation + local) = (4, 0, 0).
        let aabb = scene_bounds(&graph).unwrap();
        assert_eq!(aabb.max, Vec3::new(4.0, 0.0, 0.0));
    }
}
