use super::latent::{Latent, LatentLayout, PredictionHistory};
use crate::error::SimResult;
use crate::grid::FieldArray;

/// Which fields a decode writes back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeTarget {
    VelocityOnly,
    /// Velocity, plus density when the latent carries it
    Full,
}

/// Fields produced by a decode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedFields {
    pub velocity: Option<FieldArray>,
    pub density: Option<FieldArray>,
}

/// Latent-space model standing in for the physical solve
///
/// Implementations wrap a trained encoder/decoder and a latent time
/// predictor. Every call blocks until its result is complete.
pub trait Predictor {
    /// Number of control parameters the model was trained with
    fn supervised_param_count(&self) -> usize;

    fn layout(&self) -> &LatentLayout;

    fn encode(&mut self, velocity: &FieldArray, density: &FieldArray) -> SimResult<Latent>;

    /// Replace the density part of the newest history entry with an
    /// encoding of `density`
    fn refresh_density(&mut self, density: &FieldArray, history: &mut PredictionHistory) -> SimResult<()>;

    /// Next latent state from the history window
    fn predict(&mut self, history: &PredictionHistory) -> SimResult<Latent>;

    fn decode(&mut self, latent: &Latent, target: DecodeTarget) -> SimResult<DecodedFields>;
}
