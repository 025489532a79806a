use serde::{Deserialize, Serialize};

use crate::config::PredictionType;

/// How one frame is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepMode {
    /// Physical solve only
    Physical,
    /// Physical solve, encoded into the prediction history
    PhysicalWithEncode,
    /// Physical solve, then an encode/decode round trip replaces the fields
    PredictedEncDec,
    /// Predicted velocity; density stays physically transported and is
    /// re-encoded before prediction when the latent carries it
    PredictedVelocity { refresh_density: bool },
    /// Predicted velocity and density
    PredictedState,
}

impl StepMode {
    /// Select the mode of one frame
    pub fn select(frame: usize, warmup_steps: usize, prediction_type: PredictionType, has_density: bool) -> Self {
        match prediction_type {
            PredictionType::Simulation => StepMode::Physical,
            _ if frame < warmup_steps => StepMode::PhysicalWithEncode,
            PredictionType::EncDec => StepMode::PredictedEncDec,
            PredictionType::VelPrediction => StepMode::PredictedVelocity { refresh_density: has_density },
            PredictionType::Prediction => StepMode::PredictedState,
        }
    }

    /// Whether buoyancy and the pressure solve run this frame
    pub fn is_physical(&self) -> bool {
        matches!(self, StepMode::Physical | StepMode::PhysicalWithEncode | StepMode::PredictedEncDec)
    }

    /// Whether the physical result is encoded into the history
    pub fn encodes(&self) -> bool {
        matches!(self, StepMode::PhysicalWithEncode | StepMode::PredictedEncDec)
    }

    /// Whether the latent predictor produces this frame
    pub fn predicts(&self) -> bool {
        !self.is_physical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulation_is_always_physical() {
        for frame in [0, 5, 100] {
            assert_eq!(StepMode::select(frame, 10, PredictionType::Simulation, true), StepMode::Physical);
        }
    }

    #[test]
    fn test_warmup_prefix_is_physical() {
        for ty in [PredictionType::EncDec, PredictionType::VelPrediction, PredictionType::Prediction] {
            for frame in 0..10 {
                let mode = StepMode::select(frame, 10, ty, true);
                assert_eq!(mode, StepMode::PhysicalWithEncode);
                assert!(mode.is_physical());
            }
        }
    }

    #[test]
    fn test_after_warmup() {
        assert_eq!(StepMode::select(10, 10, PredictionType::EncDec, true), StepMode::PredictedEncDec);
        assert!(StepMode::PredictedEncDec.is_physical());
        assert_eq!(
            StepMode::select(10, 10, PredictionType::VelPrediction, false),
            StepMode::PredictedVelocity { refresh_density: false }
        );
        let mode = StepMode::select(12, 10, PredictionType::Prediction, true);
        assert_eq!(mode, StepMode::PredictedState);
        assert!(mode.predicts() && !mode.encodes());
    }
}
