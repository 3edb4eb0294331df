//! Frames an arbitrary asset: whatever its native scale or origin offset,
//! the whole bounding volume ends up in view.

use glam::Vec3;

use crate::scene::{scene_bounds, SceneGraph};

/// Presentation context class; compact viewports get extra margin so the
/// asset stays visible under the on-screen controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewport {
    Desktop,
    Compact,
}

/// Distance multiplier applied on compact (mobile-class) viewports.
const COMPACT_MARGIN: f32 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    pub position: Vec3,
    pub look_at: Vec3,
}

#[derive(Debug, Clone, Copy)]
pub struct FitSettings {
    pub fov_y_radians: f32,
    pub viewport: Viewport,
}

impl Default for FitSettings {
    fn default() -> Self {
        Self {
            // The gallery canvas renders with a 50 degree vertical FOV.
            fov_y_radians: 50.0_f32.to_radians(),
            viewport: Viewport::Desktop,
        }
    }
}

/// Pure given the graph's bounds, and total: a graph without geometry (or a
/// degenerate point-sized one) frames the origin at distance zero instead of
/// failing.
pub fn fit(graph: &SceneGraph, settings: FitSettings) -> CameraFrame {
    let Some(aabb) = scene_bounds(graph) else {
        return CameraFrame {
            position: Vec3::ZERO,
            look_at: Vec3::ZERO,
        };
    };

    let center = aabb.center();
    let max_dim = aabb.size().max_element();

    let mut distance = max_dim / (2.0 * (settings.fov_y_radians / 2.0).tan());
    if settings.viewport == Viewport::Compact {
        distance *= COMPACT_MARGIN;
    }

    // Equal offset on all three axes: the diagonal view shows silhouette and
    // depth for assets authored facing any cardinal direction.
    CameraFrame {
        position: center + Vec3::splat(distance),
        look_at: center,
    }
}
