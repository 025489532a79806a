use serde::{Deserialize, Serialize};

use crate::obstacle::ControlParams;

/// Control parameters of one scene from its first frame up to, not
/// including, the current one
///
/// Values are stored as generated (rotation in units of π, position in
/// domain units), the form exported next to every frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupervisedParamHistory {
    pub rotation: Vec<f32>,
    pub position: Vec<f32>,
}

impl SupervisedParamHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, params: ControlParams) {
        self.rotation.push(params.rotation);
        self.position.push(params.position);
    }

    pub fn len(&self) -> usize {
        self.rotation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rotation.is_empty()
    }

    pub fn clear(&mut self) {
        self.rotation.clear();
        self.position.clear();
    }
}
