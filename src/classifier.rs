use crate::types::ObjectCategory;
use glam::Vec3;

/// What a classifier gets to look at for one surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceDescriptor {
    /// Mesh vertex count or any comparable feature count.
    pub complexity: u32,
    pub position: Vec3,
}

/// Maps a surface to an object category.
///
/// Implementations must be pure: the same descriptor always yields the same
/// category. Anything that cannot be categorized confidently should come back
/// as [`ObjectCategory::Unknown`], which downstream rates as no threat.
pub trait ObjectClassifier: Send {
    fn classify(&self, descriptor: &SurfaceDescriptor) -> ObjectCategory;
}

/// Complexity-threshold heuristic. Larger meshes are assumed to be larger
/// objects; it never reports bicycles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryClassifier {
    pub vehicle_above: u32,
    pub obstacle_above: u32,
    pub pedestrian_above: u32,
}

impl GeometryClassifier {
    pub fn new() -> Self {
        Self {
            vehicle_above: 5000,
            obstacle_above: 1000,
            pedestrian_above: 200,
        }
    }
}

impl Default for GeometryClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectClassifier for GeometryClassifier {
    fn classify(&self, descriptor: &SurfaceDescriptor) -> ObjectCategory {
        let complexity = descriptor.complexity;
        if complexity > self.vehicle_above {
            ObjectCategory::Vehicle
        } else if complexity > self.obstacle_above {
            ObjectCategory::Obstacle
        } else if complexity > self.pedestrian_above {
            ObjectCategory::Pedestrian
        } else {
            ObjectCategory::Unknown
        }
    }
}
