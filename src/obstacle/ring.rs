use super::mesh::MeshPose;

/// Number of pose slots
const SLOTS: usize = 2;

/// Poses involved in one frame's obstacle update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseTransition {
    /// Pose just written for this frame
    pub current: MeshPose,
    /// Pose of the previous frame
    pub previous: MeshPose,
}

/// Two-slot ping-pong of obstacle poses
///
/// Each frame writes the new pose into the active slot, hands back the
/// (new, old) pair for the velocity and levelset, then flips the index.
/// After `advance`, `active` is the pose written `SLOTS - 1` frames ago,
/// which is what density clearing uses.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshRing {
    slots: [MeshPose; SLOTS],
    index: usize,
}

impl MeshRing {
    /// Both slots at the initial pose, index at the first slot
    pub fn new(initial: MeshPose) -> Self {
        Self {
            slots: [initial; SLOTS],
            index: 0,
        }
    }

    /// Reinitialize for a new scene
    pub fn reset(&mut self, initial: MeshPose) {
        self.slots = [initial; SLOTS];
        self.index = 0;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Pose in the slot the next `advance` writes to
    pub fn active(&self) -> &MeshPose {
        &self.slots[self.index]
    }

    /// Pose written by the most recent `advance`
    pub fn latest(&self) -> &MeshPose {
        &self.slots[(self.index + SLOTS - 1) % SLOTS]
    }

    /// Write this frame's pose and flip the index
    pub fn advance(&mut self, pose: MeshPose) -> PoseTransition {
        let previous = self.slots[(self.index + 1) % SLOTS];
        self.slots[self.index] = pose;
        self.index = (self.index + 1) % SLOTS;
        PoseTransition { current: pose, previous }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn at(x: f32) -> MeshPose {
        MeshPose::new(Vec3::ONE, 0.0, Vec3::new(x, 0.0, 0.0))
    }

    #[test]
    fn test_ping_pong() {
        let mut ring = MeshRing::new(at(0.0));
        for frame in 1..=5 {
            let index_before = ring.index();
            let step = ring.advance(at(frame as f32));
            assert_eq!(step.current, at(frame as f32));
            assert_eq!(step.previous, at((frame - 1) as f32));
            assert_eq!(ring.index(), (index_before + 1) % 2);
            // the slot used for density clearing holds the previous frame's pose
            assert_eq!(*ring.active(), at((frame - 1) as f32));
            assert_eq!(*ring.latest(), at(frame as f32));
        }
    }

    #[test]
    fn test_first_frame_is_static() {
        let mut ring = MeshRing::new(at(3.0));
        let step = ring.advance(at(3.0));
        assert_eq!(step.current, step.previous);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut ring = MeshRing::new(at(0.0));
        ring.advance(at(1.0));
        ring.advance(at(2.0));
        ring.advance(at(3.0));
        ring.reset(at(7.0));
        assert_eq!(ring, MeshRing::new(at(7.0)));
    }
}
