//! Reference latent model
//!
//! Average pooling over cubic blocks as the encoder, piecewise-constant
//! upsampling as the decoder, and linear extrapolation of the last two
//! latent states as the time predictor. Deterministic and cheap, so the
//! whole pipeline runs without a trained network.

use super::latent::{Latent, LatentLayout, PredictionHistory};
use super::predictor::{DecodeTarget, DecodedFields, Predictor};
use crate::config::PredictorConfig;
use crate::error::{prediction_error, SimResult};
use crate::grid::{FieldArray, GridDims};

/// Slots appended after the field blocks for the control parameters
const TRAILING_PARAM_SLOTS: usize = 2;

#[derive(Debug, Clone)]
pub struct PoolingPredictor {
    dims: GridDims,
    block_size: usize,
    blocks: [usize; 3],
    momentum: f32,
    supervised_param_count: usize,
    layout: LatentLayout,
}

impl PoolingPredictor {
    pub fn new(dims: GridDims, config: &PredictorConfig) -> SimResult<Self> {
        let b = config.block_size.max(1);
        let blocks = [
            dims.x.div_ceil(b),
            dims.y.div_ceil(b),
            dims.z.div_ceil(b),
        ];
        let count = blocks.iter().product::<usize>();
        let velocity = 0..3 * count;
        let density = config.has_density().then(|| velocity.end..velocity.end + count);
        let len = density.as_ref().map_or(velocity.end, |d| d.end) + TRAILING_PARAM_SLOTS;
        let layout = LatentLayout::new(len, velocity, density, config.param_slots.clone())?;

        log::debug!(
            "[PoolingPredictor] {}x{}x{} blocks of {} cells, latent size {}",
            blocks[0],
            blocks[1],
            blocks[2],
            b,
            len
        );

        Ok(Self {
            dims,
            block_size: b,
            blocks,
            momentum: config.momentum,
            supervised_param_count: config.supervised_param_count,
            layout,
        })
    }

    fn block_of(&self, idx: usize) -> usize {
        let [i, j, k] = self.dims.coords(idx);
        let b = self.block_size;
        i / b + (j / b) * self.blocks[0] + (k / b) * self.blocks[0] * self.blocks[1]
    }

    fn block_count(&self) -> usize {
        self.blocks.iter().product()
    }

    /// Per-block channel means, block-major
    fn pool(&self, array: &FieldArray) -> Vec<f32> {
        let channels = array.channels();
        let mut sums = vec![0.0f64; self.block_count() * channels];
        let mut counts = vec![0usize; self.block_count()];
        for (idx, cell) in array.data().chunks_exact(channels).enumerate() {
            let block = self.block_of(idx);
            counts[block] += 1;
            for (c, value) in cell.iter().enumerate() {
                sums[block * channels + c] += *value as f64;
            }
        }
        sums.iter()
            .enumerate()
            .map(|(i, s)| {
                let n = counts[i / channels];
                if n == 0 { 0.0 } else { (*s / n as f64) as f32 }
            })
            .collect()
    }

    fn unpool(&self, values: &[f32], channels: usize) -> SimResult<FieldArray> {
        let mut array = FieldArray::zeros(self.dims, channels);
        for (idx, cell) in array.data_mut().chunks_exact_mut(channels).enumerate() {
            let block = self.block_of(idx);
            cell.copy_from_slice(&values[block * channels..(block + 1) * channels]);
        }
        Ok(array)
    }
}

impl Predictor for PoolingPredictor {
    fn supervised_param_count(&self) -> usize {
        self.supervised_param_count
    }

    fn layout(&self) -> &LatentLayout {
        &self.layout
    }

    fn encode(&mut self, velocity: &FieldArray, density: &FieldArray) -> SimResult<Latent> {
        let mut latent = Latent::zeros(self.layout.len());
        let pooled = self.pool(velocity);
        latent.values[self.layout.velocity()].copy_from_slice(&pooled);
        if let Some(range) = self.layout.density() {
            latent.values[range].copy_from_slice(&self.pool(density));
        }
        Ok(latent)
    }

    fn refresh_density(&mut self, density: &FieldArray, history: &mut PredictionHistory) -> SimResult<()> {
        let Some(range) = self.layout.density() else {
            return Ok(());
        };
        let pooled = self.pool(density);
        let entry = history
            .latest_mut()
            .ok_or_else(|| prediction_error("no latent state to refresh density in"))?;
        entry.latent.values[range].copy_from_slice(&pooled);
        Ok(())
    }

    fn predict(&mut self, history: &PredictionHistory) -> SimResult<Latent> {
        let mut entries = history.entries().rev();
        let latest = entries
            .next()
            .ok_or_else(|| prediction_error("prediction history is empty"))?;
        let Some(previous) = entries.next() else {
            return Ok(latest.latent.clone());
        };
        let values = latest
            .latent
            .values
            .iter()
            .zip(&previous.latent.values)
            .map(|(now, before)| now + self.momentum * (now - before))
            .collect();
        Ok(Latent::new(values))
    }

    fn decode(&mut self, latent: &Latent, target: DecodeTarget) -> SimResult<DecodedFields> {
        if latent.len() != self.layout.len() {
            return Err(prediction_error(format!(
                "latent of size {} does not match layout size {}",
                latent.len(),
                self.layout.len()
            )));
        }
        let velocity = self.unpool(&latent.values[self.layout.velocity()], 3)?;
        let density = match (target, self.layout.density()) {
            (DecodeTarget::Full, Some(range)) => Some(self.unpool(&latent.values[range], 1)?),
            _ => None,
        };
        Ok(DecodedFields {
            velocity: Some(velocity),
            density,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DataChannel;
    use crate::grid::{MacGrid, RealGrid};
    use glam::Vec3;

    fn predictor(dims: GridDims, momentum: f32, density: bool) -> PoolingPredictor {
        let mut config = PredictorConfig { block_size: 2, momentum, ..Default::default() };
        if !density {
            config.data_type = vec![DataChannel::Velocity];
        }
        PoolingPredictor::new(dims, &config).unwrap()
    }

    #[test]
    fn test_layout_sizes() {
        let p = predictor(GridDims::new(5, 4, 1), 0.0, true);
        // 3 x 2 x 1 blocks
        assert_eq!(p.layout().velocity(), 0..18);
        assert_eq!(p.layout().density(), Some(18..24));
        assert_eq!(p.layout().len(), 26);
        let no_density = predictor(GridDims::new(5, 4, 1), 0.0, false);
        assert_eq!(no_density.layout().len(), 20);
    }

    #[test]
    fn test_block_constant_field_survives_roundtrip() {
        let dims = GridDims::new(4, 4, 1);
        let mut p = predictor(dims, 0.0, true);
        let mut vel = MacGrid::new(dims);
        let mut density = RealGrid::new(dims);
        for idx in 0..dims.cells() {
            let [i, j, _] = dims.coords(idx);
            let block = (i / 2 + 2 * (j / 2)) as f32;
            vel.set(idx, Vec3::new(block, -block, 0.0));
            density.set(idx, block * 0.1);
        }
        let latent = p.encode(&FieldArray::from_mac(&vel), &FieldArray::from_real(&density)).unwrap();
        let decoded = p.decode(&latent, DecodeTarget::Full).unwrap();
        assert_eq!(decoded.velocity, Some(FieldArray::from_mac(&vel)));
        assert_eq!(decoded.density, Some(FieldArray::from_real(&density)));

        let velocity_only = p.decode(&latent, DecodeTarget::VelocityOnly).unwrap();
        assert!(velocity_only.density.is_none());
    }

    #[test]
    fn test_prediction_extrapolates_with_momentum() {
        let dims = GridDims::new(2, 2, 1);
        let mut p = predictor(dims, 0.5, false);
        let len = p.layout().len();
        let mut history = PredictionHistory::new(2);
        assert!(p.predict(&history).is_err());
        history.add_simulation(Latent::new(vec![1.0; len]));
        assert_eq!(p.predict(&history).unwrap(), Latent::new(vec![1.0; len]));
        history.add_simulation(Latent::new(vec![3.0; len]));
        assert_eq!(p.predict(&history).unwrap(), Latent::new(vec![4.0; len]));
    }

    #[test]
    fn test_refresh_density_touches_density_part_only() {
        let dims = GridDims::new(2, 2, 1);
        let mut p = predictor(dims, 0.0, true);
        let len = p.layout().len();
        let mut history = PredictionHistory::new(2);
        history.add_simulation(Latent::new(vec![7.0; len]));
        let mut density = RealGrid::new(dims);
        density.set_const(0.5);
        p.refresh_density(&FieldArray::from_real(&density), &mut history).unwrap();
        let latent = &history.latest().unwrap().latent;
        assert_eq!(latent.values[0], 7.0);
        assert_eq!(latent.values[3], 0.5);
        assert_eq!(latent.values[len - 1], 7.0);
    }
}
