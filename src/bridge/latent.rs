use std::collections::VecDeque;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::config::{ParamSlots, SlotIndex};
use crate::error::{SimError, SimResult};

/// Latent state vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Latent {
    pub values: Vec<f32>,
}

impl Latent {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn zeros(len: usize) -> Self {
        Self { values: vec![0.0; len] }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Named regions of a latent vector
///
/// Every layout reserves the control parameter slots listed in
/// `param_slots`; whatever the predictor returns there is overwritten with
/// the current frame's rotation and position.
#[derive(Debug, Clone, PartialEq)]
pub struct LatentLayout {
    len: usize,
    velocity: Range<usize>,
    density: Option<Range<usize>>,
    param_slots: Vec<ParamSlots>,
}

impl LatentLayout {
    /// Build a layout, checking that every slot falls inside the latent
    pub fn new(
        len: usize,
        velocity: Range<usize>,
        density: Option<Range<usize>>,
        param_slots: Vec<ParamSlots>,
    ) -> SimResult<Self> {
        let layout = Self { len, velocity, density, param_slots };
        for pair in &layout.param_slots {
            layout.resolve(pair.rotation)?;
            layout.resolve(pair.position)?;
        }
        Ok(layout)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn velocity(&self) -> Range<usize> {
        self.velocity.clone()
    }

    pub fn density(&self) -> Option<Range<usize>> {
        self.density.clone()
    }

    pub fn param_slots(&self) -> &[ParamSlots] {
        &self.param_slots
    }

    /// Absolute offset of a slot
    pub fn resolve(&self, slot: SlotIndex) -> SimResult<usize> {
        let out_of_range = || SimError::LatentSlotOutOfRange {
            index: format!("{:?}", slot),
            len: self.len,
        };
        match slot {
            SlotIndex::FromEnd(back) if back >= 1 && back <= self.len => Ok(self.len - back),
            SlotIndex::At(at) if at < self.len => Ok(at),
            _ => Err(out_of_range()),
        }
    }

    /// Overwrite every reserved slot pair with `[rotation, position]`
    pub fn write_params(&self, latent: &mut Latent, params: [f32; 2]) -> SimResult<()> {
        if latent.len() != self.len {
            return Err(SimError::LatentSlotOutOfRange {
                index: "latent length".to_string(),
                len: latent.len(),
            });
        }
        for pair in &self.param_slots {
            latent.values[self.resolve(pair.rotation)?] = params[0];
            latent.values[self.resolve(pair.position)?] = params[1];
        }
        Ok(())
    }

    /// Values of the first reserved slot pair
    pub fn read_params(&self, latent: &Latent) -> SimResult<[f32; 2]> {
        let pair = self.param_slots.first().copied().unwrap_or(ParamSlots::TRAILING);
        Ok([
            latent.values[self.resolve(pair.rotation)?],
            latent.values[self.resolve(pair.position)?],
        ])
    }
}

/// Where a history entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LatentOrigin {
    Simulated,
    Predicted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub latent: Latent,
    pub origin: LatentOrigin,
}

/// Sliding window of the most recent latent states of one scene
#[derive(Debug, Clone)]
pub struct PredictionHistory {
    window: usize,
    entries: VecDeque<HistoryEntry>,
}

impl PredictionHistory {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            entries: VecDeque::with_capacity(window.max(1)),
        }
    }

    pub fn add_simulation(&mut self, latent: Latent) {
        self.push(latent, LatentOrigin::Simulated);
    }

    pub fn add_prediction(&mut self, latent: Latent) {
        self.push(latent, LatentOrigin::Predicted);
    }

    fn push(&mut self, latent: Latent, origin: LatentOrigin) {
        if self.entries.len() == self.window {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry { latent, origin });
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn latest_mut(&mut self) -> Option<&mut HistoryEntry> {
        self.entries.back_mut()
    }

    /// Oldest first
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
