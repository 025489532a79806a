//! State substitution bridge
//!
//! Per frame, either records the physically solved state in the latent
//! history or replaces the physical solve with a predicted latent state.
//! In both cases the reserved latent slots are overwritten with the
//! current frame's normalized control parameters before anything is
//! stored or decoded.

pub mod mode;
pub mod latent;
pub mod predictor;
pub mod pooling;

pub use latent::{HistoryEntry, Latent, LatentLayout, LatentOrigin, PredictionHistory};
pub use mode::StepMode;
pub use pooling::PoolingPredictor;
pub use predictor::{DecodeTarget, DecodedFields, Predictor};

use crate::backend::FluidBackend;
use crate::config::PredictorConfig;
use crate::constants::prediction::SUPERVISED_PARAM_COUNT;
use crate::error::{prediction_error, SimError, SimResult};

pub struct StateBridge {
    predictor: Box<dyn Predictor>,
    history: PredictionHistory,
}

impl StateBridge {
    /// Wrap a predictor, refusing one trained with a different control parameter count
    pub fn new(predictor: Box<dyn Predictor>, config: &PredictorConfig) -> SimResult<Self> {
        let found = predictor.supervised_param_count();
        if found != SUPERVISED_PARAM_COUNT {
            return Err(SimError::ParamCountMismatch {
                expected: SUPERVISED_PARAM_COUNT,
                found,
            });
        }
        Ok(Self {
            predictor,
            history: PredictionHistory::new(config.history_window),
        })
    }

    pub fn history(&self) -> &PredictionHistory {
        &self.history
    }

    pub fn layout(&self) -> &LatentLayout {
        self.predictor.layout()
    }

    /// Forget the previous scene's latent states
    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Record a physically solved frame; for enc_dec also replace the
    /// fields with the decoded round trip
    pub fn record_physical(
        &mut self,
        mode: StepMode,
        backend: &mut dyn FluidBackend,
        params: [f32; 2],
    ) -> SimResult<()> {
        if !mode.encodes() {
            return Ok(());
        }
        let velocity = backend.velocity_array();
        let density = backend.density_array();
        let mut latent = self.predictor.encode(&velocity, &density)?;
        self.predictor.layout().write_params(&mut latent, params)?;

        if mode == StepMode::PredictedEncDec {
            let decoded = self.predictor.decode(&latent, DecodeTarget::Full)?;
            import(backend, decoded)?;
        }
        self.history.add_simulation(latent);
        Ok(())
    }

    /// Produce the frame from the latent predictor
    pub fn predict(&mut self, mode: StepMode, backend: &mut dyn FluidBackend, params: [f32; 2]) -> SimResult<Latent> {
        let target = match mode {
            StepMode::PredictedVelocity { refresh_density } => {
                if refresh_density {
                    let density = backend.density_array();
                    self.predictor.refresh_density(&density, &mut self.history)?;
                }
                DecodeTarget::VelocityOnly
            }
            StepMode::PredictedState => DecodeTarget::Full,
            other => return Err(prediction_error(format!("mode {:?} does not predict", other))),
        };

        let mut latent = self.predictor.predict(&self.history)?;
        self.predictor.layout().write_params(&mut latent, params)?;
        self.history.add_prediction(latent.clone());

        let decoded = self.predictor.decode(&latent, target)?;
        import(backend, decoded)?;
        Ok(latent)
    }
}

fn import(backend: &mut dyn FluidBackend, decoded: DecodedFields) -> SimResult<()> {
    if let Some(velocity) = decoded.velocity {
        backend.import_velocity(&velocity)?;
    }
    if let Some(density) = decoded.density {
        backend.import_density(&density)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::GridSolver;
    use crate::grid::GridDims;

    /// Predictor returning a fixed latent, ignoring the history
    struct Constant {
        layout: LatentLayout,
        value: f32,
        params: usize,
    }

    impl Predictor for Constant {
        fn supervised_param_count(&self) -> usize {
            self.params
        }
        fn layout(&self) -> &LatentLayout {
            &self.layout
        }
        fn encode(&mut self, _: &crate::grid::FieldArray, _: &crate::grid::FieldArray) -> SimResult<Latent> {
            Ok(Latent::new(vec![self.value; self.layout.len()]))
        }
        fn refresh_density(&mut self, _: &crate::grid::FieldArray, _: &mut PredictionHistory) -> SimResult<()> {
            Ok(())
        }
        fn predict(&mut self, _: &PredictionHistory) -> SimResult<Latent> {
            Ok(Latent::new(vec![self.value; self.layout.len()]))
        }
        fn decode(&mut self, _: &Latent, _: DecodeTarget) -> SimResult<DecodedFields> {
            Ok(DecodedFields::default())
        }
    }

    fn constant(params: usize) -> Box<dyn Predictor> {
        let layout = LatentLayout::new(8, 0..6, None, vec![crate::config::ParamSlots::TRAILING]).unwrap();
        Box::new(Constant { layout, value: 9.0, params })
    }

    #[test]
    fn test_wrong_param_count_rejected() {
        let err = StateBridge::new(constant(3), &PredictorConfig::default()).err().unwrap();
        assert!(matches!(err, SimError::ParamCountMismatch { expected: 2, found: 3 }));
    }

    #[test]
    fn test_predicted_slots_carry_current_params() {
        let mut bridge = StateBridge::new(constant(2), &PredictorConfig::default()).unwrap();
        let mut backend = GridSolver::new(GridDims::new(4, 4, 1), 1.0, 1e-3, 10);
        let latent = bridge
            .predict(StepMode::PredictedState, &mut backend, [0.3, -0.6])
            .unwrap();
        assert_eq!(&latent.values[6..], &[0.3, -0.6]);
        assert_eq!(latent.values[0], 9.0);
        let stored = bridge.history().latest().unwrap();
        assert_eq!(stored.origin, LatentOrigin::Predicted);
        assert_eq!(&stored.latent.values[6..], &[0.3, -0.6]);
    }

    #[test]
    fn test_physical_modes() {
        let mut bridge = StateBridge::new(constant(2), &PredictorConfig::default()).unwrap();
        let mut backend = GridSolver::new(GridDims::new(4, 4, 1), 1.0, 1e-3, 10);
        bridge.record_physical(StepMode::Physical, &mut backend, [0.0, 0.0]).unwrap();
        assert!(bridge.history().is_empty());
        bridge.record_physical(StepMode::PhysicalWithEncode, &mut backend, [0.1, 0.2]).unwrap();
        let stored = bridge.history().latest().unwrap();
        assert_eq!(stored.origin, LatentOrigin::Simulated);
        assert_eq!(&stored.latent.values[6..], &[0.1, 0.2]);
        assert!(bridge.predict(StepMode::Physical, &mut backend, [0.0, 0.0]).is_err());
        bridge.reset();
        assert!(bridge.history().is_empty());
    }
}
