//! Kinematic chain: a rotating base with a stack of arm segments.
//!
//! Scene graph:
//!
//! ```text
//!            tip (0, L, 0) in segment n frame
//!             |
//!        [segment n]      local rotation Rx(x) * Rz(z), origin (0, L, 0) in parent
//!             |
//!        [segment 0]      origin (0, base_height / 2, 0) in base frame
//!             |
//!         ( base )        rotation Ry(base), at world origin
//! ```
//!
//! Angles are stored raw, in degrees. Segments and their axis locks live in two
//! vectors that are only ever resized together.

use glam::{DQuat, DVec3};

use crate::config::SimulatorConfig;
use crate::joint::{Axis, JointType};

/// Per-segment rotation locks. A locked axis ignores solver, GUI and playback writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AxisLocks {
    pub x: bool,
    pub z: bool,
}

impl AxisLocks {
    pub fn get(&self, axis: Axis) -> bool {
        match axis {
            Axis::X => self.x,
            Axis::Z => self.z,
        }
    }

    pub fn set(&mut self, axis: Axis, locked: bool) {
        match axis {
            Axis::X => self.x = locked,
            Axis::Z => self.z = locked,
        }
    }
}

/// A rigid arm link.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub length: f64,
    /// Rendering only.
    pub width: f64,
    /// Raw rotation around the local X axis, degrees.
    pub rotation_x: f64,
    /// Raw rotation around the local Z axis, degrees.
    pub rotation_z: f64,
}

impl Segment {
    fn new(length: f64, width: f64) -> Self {
        Self {
            length,
            width,
            rotation_x: 0.0,
            rotation_z: 0.0,
        }
    }

    pub fn rotation(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.rotation_x,
            Axis::Z => self.rotation_z,
        }
    }

    fn set_rotation(&mut self, axis: Axis, degrees: f64) {
        match axis {
            Axis::X => self.rotation_x = degrees,
            Axis::Z => self.rotation_z = degrees,
        }
    }

    /// Rotation relative to the parent frame.
    pub fn local_rotation(&self) -> DQuat {
        segment_rotation(self.rotation_x, self.rotation_z)
    }
}

/// `Rx(x) * Rz(z)` for angles in degrees.
pub fn segment_rotation(x_degrees: f64, z_degrees: f64) -> DQuat {
    DQuat::from_rotation_x(x_degrees.to_radians()) * DQuat::from_rotation_z(z_degrees.to_radians())
}

/// World-space placement of one segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentFrame {
    /// Joint position (bottom of the segment).
    pub origin: DVec3,
    pub rotation: DQuat,
}

#[derive(Clone, Debug)]
pub struct Chain {
    base_height: f64,
    segment_length: f64,
    segment_width: f64,
    /// Raw base rotation around Y, degrees.
    base_rotation: f64,
    segments: Vec<Segment>,
    locks: Vec<AxisLocks>,
}

impl Chain {
    /// Build a straight chain of `num_segments` segments (at least one).
    pub fn new(num_segments: usize, base_height: f64, segment_length: f64, segment_width: f64) -> Self {
        let mut chain = Self {
            base_height,
            segment_length,
            segment_width,
            base_rotation: 0.0,
            segments: Vec::new(),
            locks: Vec::new(),
        };
        chain.initialize(num_segments);
        chain
    }

    pub fn from_config(config: &SimulatorConfig) -> Self {
        Self::new(
            config.num_segments,
            config.base_height,
            config.segment_length,
            config.segment_width,
        )
    }

    /// Rebuild from scratch: `num_segments` straight segments, all unlocked.
    ///
    /// The base keeps its rotation, as the base mesh is not rebuilt.
    pub fn initialize(&mut self, num_segments: usize) {
        let count = num_segments.max(1);
        self.segments.clear();
        self.locks.clear();
        for _ in 0..count {
            self.push_segment();
        }
    }

    fn push_segment(&mut self) {
        self.segments
            .push(Segment::new(self.segment_length, self.segment_width));
        self.locks.push(AxisLocks::default());
    }

    /// Append a straight segment at the tip.
    pub fn add_segment(&mut self) {
        self.push_segment();
    }

    /// Remove the tip segment. Returns false (and does nothing) when only one is left.
    pub fn remove_segment(&mut self) -> bool {
        if self.segments.len() <= 1 {
            return false;
        }
        self.segments.pop();
        self.locks.pop();
        true
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false once constructed; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn locks(&self) -> &[AxisLocks] {
        &self.locks
    }

    pub fn base_height(&self) -> f64 {
        self.base_height
    }

    pub fn segment_length(&self) -> f64 {
        self.segment_length
    }

    pub fn base_rotation(&self) -> f64 {
        self.base_rotation
    }

    /// Raw angle of a joint, `None` if the joint's segment does not exist.
    pub fn raw_angle(&self, joint: JointType) -> Option<f64> {
        match joint {
            JointType::Base => Some(self.base_rotation),
            JointType::Arm { segment, axis } => self.segments.get(segment).map(|s| s.rotation(axis)),
        }
    }

    /// Raw angle, or 0 for joints on missing segments.
    pub fn raw_angle_or_zero(&self, joint: JointType) -> f64 {
        self.raw_angle(joint).unwrap_or(0.0)
    }

    /// Write a raw angle. Ignores locks; returns false if the segment is missing.
    pub fn set_raw_angle(&mut self, joint: JointType, degrees: f64) -> bool {
        match joint {
            JointType::Base => {
                self.base_rotation = degrees;
                true
            }
            JointType::Arm { segment, axis } => match self.segments.get_mut(segment) {
                Some(s) => {
                    s.set_rotation(axis, degrees);
                    true
                }
                None => false,
            },
        }
    }

    pub fn contains(&self, joint: JointType) -> bool {
        joint.segment().map_or(true, |i| i < self.segments.len())
    }

    /// Whether writes to this joint are suppressed. The base is never locked.
    pub fn is_locked(&self, joint: JointType) -> bool {
        match joint {
            JointType::Base => false,
            JointType::Arm { segment, axis } => {
                self.locks.get(segment).is_some_and(|l| l.get(axis))
            }
        }
    }

    /// Set one axis lock. Returns false if the segment is missing.
    pub fn set_lock(&mut self, segment: usize, axis: Axis, locked: bool) -> bool {
        match self.locks.get_mut(segment) {
            Some(l) => {
                l.set(axis, locked);
                true
            }
            None => false,
        }
    }

    /// Straighten the arm and zero the base.
    pub fn reset_rotations(&mut self) {
        self.base_rotation = 0.0;
        for s in &mut self.segments {
            s.rotation_x = 0.0;
            s.rotation_z = 0.0;
        }
    }

    pub fn base_quat(&self) -> DQuat {
        DQuat::from_rotation_y(self.base_rotation.to_radians())
    }

    /// Top of the base: where segment 0 pivots. Does not move with the solver.
    pub fn base_pivot(&self) -> DVec3 {
        self.base_quat() * DVec3::new(0.0, self.base_height / 2.0, 0.0)
    }

    /// Forward kinematics: world frame of every segment.
    pub fn segment_frames(&self) -> Vec<SegmentFrame> {
        let mut frames = Vec::with_capacity(self.segments.len());
        let mut rotation = self.base_quat();
        let mut origin = self.base_pivot();
        for segment in &self.segments {
            let world = rotation * segment.local_rotation();
            frames.push(SegmentFrame {
                origin,
                rotation: world,
            });
            origin += world * DVec3::new(0.0, segment.length, 0.0);
            rotation = world;
        }
        frames
    }

    /// Solver pivots: base pivot followed by the tip of each segment.
    pub fn pivots(&self) -> Vec<DVec3> {
        let mut pivots = Vec::with_capacity(self.segments.len() + 1);
        pivots.push(self.base_pivot());
        for (frame, segment) in self.segment_frames().iter().zip(&self.segments) {
            pivots.push(frame.origin + frame.rotation * DVec3::new(0.0, segment.length, 0.0));
        }
        pivots
    }

    /// World position of `(0, length, 0)` in the last segment's frame.
    pub fn tip_world_position(&self) -> DVec3 {
        self.pivots().last().copied().unwrap_or_else(|| self.base_pivot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: DVec3, b: DVec3) -> bool {
        a.distance(b) < 1e-9
    }

    #[test]
    fn test_straight_chain_tip() {
        let chain = Chain::new(2, 1.0, 2.0, 0.5);
        assert_eq!(chain.len(), 2);
        assert!(approx(chain.base_pivot(), DVec3::new(0.0, 0.5, 0.0)));
        assert!(approx(chain.tip_world_position(), DVec3::new(0.0, 4.5, 0.0)));
        assert_eq!(chain.pivots().len(), 3);
    }

    #[test]
    fn test_initialize_clamps_to_one_segment() {
        let chain = Chain::new(0, 1.0, 2.0, 0.5);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.locks().len(), 1);
    }

    #[test]
    fn test_segments_and_locks_stay_aligned() {
        let mut chain = Chain::new(1, 1.0, 2.0, 0.5);
        let ops = [true, true, false, false, false, false, true, false, true, true, true];
        for add in ops {
            if add {
                chain.add_segment();
            } else {
                chain.remove_segment();
            }
            assert_eq!(chain.segments().len(), chain.locks().len());
            assert!(chain.len() >= 1);
        }
        assert_eq!(chain.len(), 4);
    }

    #[test]
    fn test_remove_last_segment_is_noop() {
        let mut chain = Chain::new(1, 1.0, 2.0, 0.5);
        assert!(!chain.remove_segment());
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_x_rotation_tilts_toward_z() {
        let mut chain = Chain::new(1, 1.0, 2.0, 0.5);
        chain.set_raw_angle(JointType::ARM1_X, 90.0);
        assert!(approx(chain.tip_world_position(), DVec3::new(0.0, 0.5, 2.0)));
    }

    #[test]
    fn test_z_rotation_tilts_toward_negative_x() {
        let mut chain = Chain::new(1, 1.0, 2.0, 0.5);
        chain.set_raw_angle(JointType::ARM1_Z, 90.0);
        assert!(approx(chain.tip_world_position(), DVec3::new(-2.0, 0.5, 0.0)));
    }

    #[test]
    fn test_base_rotation_carries_segments() {
        let mut chain = Chain::new(1, 1.0, 2.0, 0.5);
        chain.set_raw_angle(JointType::ARM1_X, 90.0);
        chain.set_raw_angle(JointType::Base, 90.0);
        // Ry(90) maps +Z onto +X.
        assert!(approx(chain.tip_world_position(), DVec3::new(2.0, 0.5, 0.0)));
    }

    #[test]
    fn test_child_segment_inherits_parent_rotation() {
        let mut chain = Chain::new(2, 1.0, 2.0, 0.5);
        chain.set_raw_angle(JointType::ARM1_X, 90.0);
        chain.set_raw_angle(JointType::ARM2_X, -90.0);
        assert!(approx(chain.tip_world_position(), DVec3::new(0.0, 2.5, 2.0)));
    }

    #[test]
    fn test_missing_segment_access() {
        let mut chain = Chain::new(1, 1.0, 2.0, 0.5);
        assert_eq!(chain.raw_angle(JointType::ARM2_X), None);
        assert_eq!(chain.raw_angle_or_zero(JointType::ARM2_X), 0.0);
        assert!(!chain.set_raw_angle(JointType::ARM2_X, 10.0));
        assert!(!chain.set_lock(3, Axis::Z, true));
        assert!(!chain.contains(JointType::ARM2_Z));
        assert!(chain.contains(JointType::Base));
    }

    #[test]
    fn test_locks_reset_on_initialize() {
        let mut chain = Chain::new(2, 1.0, 2.0, 0.5);
        chain.set_lock(1, Axis::X, true);
        assert!(chain.is_locked(JointType::ARM2_X));
        assert!(!chain.is_locked(JointType::ARM2_Z));
        chain.initialize(3);
        assert!(chain.locks().iter().all(|l| *l == AxisLocks::default()));
    }
}
