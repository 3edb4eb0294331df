pub mod bounds;
pub mod types;

pub use bounds::{scene_bounds, Aabb};
pub use types::{
    Material, MaterialKind, Mesh, SceneGraph, SceneNode, SceneStats, Transform, VertexBuffers,
};
