//! Frame export
//!
//! Every frame hands its velocity, density and the control parameter
//! history to a `FrameExporter`. `FieldStore` writes files under the run
//! directory; `MemoryExporter` keeps frames in memory.

pub mod store;
pub mod run_dir;

pub use run_dir::RunDirectory;
pub use store::{FieldKind, FieldStore, StoredField};

use crate::error::SimResult;
use crate::grid::FieldArray;
use crate::simulation::SupervisedParamHistory;

/// One exported frame
#[derive(Debug, Clone, Copy)]
pub struct FrameRecord<'a> {
    pub scene: usize,
    pub frame: usize,
    pub velocity: &'a FieldArray,
    pub density: &'a FieldArray,
    pub params: &'a SupervisedParamHistory,
}

pub trait FrameExporter {
    fn write_frame(&mut self, record: &FrameRecord<'_>) -> SimResult<()>;
}

/// Owned copy of a `FrameRecord`
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    pub scene: usize,
    pub frame: usize,
    pub velocity: FieldArray,
    pub density: FieldArray,
    pub params: SupervisedParamHistory,
}

/// Keeps every exported frame in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryExporter {
    pub frames: Vec<CapturedFrame>,
}

impl MemoryExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scene(&self, scene: usize) -> impl Iterator<Item = &CapturedFrame> {
        self.frames.iter().filter(move |f| f.scene == scene)
    }
}

impl FrameExporter for MemoryExporter {
    fn write_frame(&mut self, record: &FrameRecord<'_>) -> SimResult<()> {
        self.frames.push(CapturedFrame {
            scene: record.scene,
            frame: record.frame,
            velocity: record.velocity.clone(),
            density: record.density.clone(),
            params: record.params.clone(),
        });
        Ok(())
    }
}
