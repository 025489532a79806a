//! Rigid obstacle geometry
//!
//! The obstacle is a union of axis-aligned boxes in a unit local frame
//! (`[-0.5, 0.5]` on every axis). A `MeshPose` scales, rotates about z and
//! offsets it into grid units.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::ObstacleShape;
use crate::constants::grid::OBSTACLE_VELOCITY_BAND;
use crate::grid::{GridDims, MacGrid, RealGrid};

/// Wall thickness of the cup, in local units
const CUP_WALL: f32 = 0.1;

/// Axis-aligned box in the local mesh frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl LocalBox {
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }
}

/// Scale, rotation about z and offset of the mesh
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshPose {
    /// Per-axis scale in grid units
    pub scale: Vec3,
    /// Rotation about z in radians
    pub angle: f32,
    /// Position of the local origin in grid units
    pub offset: Vec3,
}

impl MeshPose {
    pub fn new(scale: Vec3, angle: f32, offset: Vec3) -> Self {
        Self { scale, angle, offset }
    }

    fn rotation(&self) -> Quat {
        Quat::from_rotation_z(self.angle)
    }

    /// Local mesh coordinates to grid units
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.offset + self.rotation() * (local * self.scale)
    }

    /// Grid units to local mesh coordinates
    pub fn to_local(&self, world: Vec3) -> Vec3 {
        (self.rotation().inverse() * (world - self.offset)) / self.scale
    }
}

/// Box-union obstacle
#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleMesh {
    boxes: Vec<LocalBox>,
    is_3d: bool,
}

impl ObstacleMesh {
    /// Build one of the built-in shapes
    ///
    /// The cup opens towards +y; in 2D it is a bottom plate with two side
    /// walls, in 3D a bottom plate with four.
    pub fn load(shape: ObstacleShape, is_3d: bool) -> Self {
        let boxes = match shape {
            ObstacleShape::Box => vec![LocalBox::new(Vec3::splat(-0.5), Vec3::splat(0.5))],
            ObstacleShape::Cup => {
                let lo = -0.5;
                let hi = 0.5;
                let w = CUP_WALL;
                let mut boxes = vec![
                    // bottom
                    LocalBox::new(Vec3::new(lo, lo, lo), Vec3::new(hi, lo + w, hi)),
                    LocalBox::new(Vec3::new(lo, lo, lo), Vec3::new(lo + w, hi, hi)),
                    LocalBox::new(Vec3::new(hi - w, lo, lo), Vec3::new(hi, hi, hi)),
                ];
                if is_3d {
                    boxes.push(LocalBox::new(Vec3::new(lo, lo, lo), Vec3::new(hi, hi, lo + w)));
                    boxes.push(LocalBox::new(Vec3::new(lo, lo, hi - w), Vec3::new(hi, hi, hi)));
                }
                boxes
            }
        };
        Self { boxes, is_3d }
    }

    pub fn from_boxes(boxes: Vec<LocalBox>, is_3d: bool) -> Self {
        Self { boxes, is_3d }
    }

    pub fn boxes(&self) -> &[LocalBox] {
        &self.boxes
    }

    /// Signed distance in grid units, negative inside
    ///
    /// Each box becomes an oriented box in grid units; the union is the
    /// minimum over boxes. 2D meshes ignore z.
    pub fn signed_distance(&self, pose: &MeshPose, p: Vec3) -> f32 {
        let inverse = pose.rotation().inverse();
        let mut best = f32::MAX;
        for b in &self.boxes {
            let center = pose.to_world(b.center());
            let half = (b.half_extents() * pose.scale).abs();
            let mut q = (inverse * (p - center)).abs() - half;
            if !self.is_3d {
                q.z = f32::NEG_INFINITY;
            }
            let outside = q.max(Vec3::ZERO).length();
            let inside = q.max_element().min(0.0);
            best = best.min(outside + inside);
        }
        best
    }

    pub fn contains(&self, pose: &MeshPose, p: Vec3) -> bool {
        self.signed_distance(pose, p) < 0.0
    }

    /// Write the signed distance at every cell center into `phi`
    pub fn compute_levelset(&self, pose: &MeshPose, phi: &mut RealGrid) {
        let dims = phi.dims();
        for idx in 0..dims.cells() {
            phi.set(idx, self.signed_distance(pose, dims.center(idx)));
        }
    }

    /// Set `value` in every cell whose center lies inside the mesh
    pub fn apply_to_grid(&self, pose: &MeshPose, grid: &mut RealGrid, value: f32) -> usize {
        let dims = grid.dims();
        let mut touched = 0;
        for idx in 0..dims.cells() {
            if self.contains(pose, dims.center(idx)) {
                grid.set(idx, value);
                touched += 1;
            }
        }
        touched
    }

    /// Rigid-body velocity of the move from `previous` to `current`
    ///
    /// Every MAC face within the band around the current pose gets the
    /// matching component of the displacement of its material point over
    /// `dt`. Faces outside the band are left untouched.
    pub fn compute_velocity(&self, current: &MeshPose, previous: &MeshPose, obs_vel: &mut MacGrid, dt: f32) {
        let dims: GridDims = obs_vel.dims();
        for idx in 0..dims.cells() {
            for axis in 0..dims.dim() {
                let p = dims.face(idx, axis);
                if self.signed_distance(current, p) > OBSTACLE_VELOCITY_BAND {
                    continue;
                }
                let before = previous.to_world(current.to_local(p));
                let v = (p - before) / dt;
                obs_vel.set_component(idx, axis, v[axis]);
            }
        }
    }
}
