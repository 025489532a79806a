use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{GridDims, MacGrid, RealGrid};
use crate::error::{SimError, SimResult};

/// Dense `[depth, height, width, channels]` copy of a grid field
///
/// The layout fields leave the grid in for encoding and export. Velocity
/// arrays hold the raw MAC components of each cell (3 channels), scalar
/// arrays one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldArray {
    shape: [usize; 4],
    data: Vec<f32>,
}

impl FieldArray {
    pub fn zeros(dims: GridDims, channels: usize) -> Self {
        Self {
            shape: [dims.z, dims.y, dims.x, channels],
            data: vec![0.0; dims.cells() * channels],
        }
    }

    pub fn from_vec(shape: [usize; 4], data: Vec<f32>) -> SimResult<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(SimError::ShapeMismatch {
                field: "array".to_string(),
                expected: shape,
                found: [data.len(), 1, 1, 1],
            });
        }
        Ok(Self { shape, data })
    }

    pub fn from_mac(grid: &MacGrid) -> Self {
        let mut data = Vec::with_capacity(grid.data().len() * 3);
        for v in grid.data() {
            data.extend_from_slice(&v.to_array());
        }
        let dims = grid.dims();
        Self {
            shape: [dims.z, dims.y, dims.x, 3],
            data,
        }
    }

    pub fn from_real(grid: &RealGrid) -> Self {
        let dims = grid.dims();
        Self {
            shape: [dims.z, dims.y, dims.x, 1],
            data: grid.data().to_vec(),
        }
    }

    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    pub fn channels(&self) -> usize {
        self.shape[3]
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    fn check(&self, field: &str, dims: GridDims, channels: usize) -> SimResult<()> {
        let expected = [dims.z, dims.y, dims.x, channels];
        if self.shape != expected {
            return Err(SimError::ShapeMismatch {
                field: field.to_string(),
                expected,
                found: self.shape,
            });
        }
        Ok(())
    }

    /// Overwrite a MAC grid with this array
    pub fn write_mac(&self, grid: &mut MacGrid) -> SimResult<()> {
        self.check("velocity", grid.dims(), 3)?;
        for (v, chunk) in grid.data_mut().iter_mut().zip(self.data.chunks_exact(3)) {
            *v = Vec3::from_slice(chunk);
        }
        Ok(())
    }

    /// Overwrite a scalar grid with this array
    pub fn write_real(&self, grid: &mut RealGrid) -> SimResult<()> {
        self.check("density", grid.dims(), 1)?;
        grid.data_mut().copy_from_slice(&self.data);
        Ok(())
    }
}
