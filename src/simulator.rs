//! The simulator controller.
//!
//! [`Simulator`] is the single owned value behind the whole arm: chain,
//! calibration, drag target, IK flag, the angles a GUI would display, and the
//! recorder and player. Every control-panel action maps onto one method
//! here. Nothing in this module blocks or sleeps; timing lives in
//! [`crate::runtime`].

use std::time::Instant;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::calibration::Calibration;
use crate::chain::Chain;
use crate::config::SimulatorConfig;
use crate::error::Result;
use crate::ik::{self, IkSolution};
use crate::joint::{Axis, JointType};
use crate::limits::{self, Enforcement};
use crate::player::{PlaybackStep, SequencePlayer};
use crate::recorder::MotionRecorder;
use crate::sequence::RecordedFrame;

/// Calibrated angles as shown next to each control.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DisplayAngles {
    pub base: i32,
    /// `[x, z]` per segment.
    pub segments: Vec<[i32; 2]>,
}

impl DisplayAngles {
    pub fn get(&self, joint: JointType) -> Option<i32> {
        match joint {
            JointType::Base => Some(self.base),
            JointType::Arm { segment, axis } => self.segments.get(segment).map(|s| match axis {
                Axis::X => s[0],
                Axis::Z => s[1],
            }),
        }
    }

    /// The five recorded joints; joints on missing segments read as 0.
    pub fn recorded(&self) -> [i32; 5] {
        JointType::RECORDED.map(|joint| self.get(joint).unwrap_or(0))
    }
}

/// Inclusive limits of one joint in calibrated degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointLimits {
    pub min: f64,
    pub max: f64,
}

impl Default for JointLimits {
    fn default() -> Self {
        Self { min: 0.0, max: 360.0 }
    }
}

/// The limit pairs exposed by the control panel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitSettings {
    pub base: JointLimits,
    pub arm1_x: JointLimits,
    pub arm1_z: JointLimits,
    pub arm2_x: JointLimits,
    pub arm2_z: JointLimits,
}

impl LimitSettings {
    /// `(joint, limits)` in application order.
    pub fn entries(&self) -> [(JointType, JointLimits); 5] {
        [
            (JointType::Base, self.base),
            (JointType::ARM1_X, self.arm1_x),
            (JointType::ARM1_Z, self.arm1_z),
            (JointType::ARM2_X, self.arm2_x),
            (JointType::ARM2_Z, self.arm2_z),
        ]
    }
}

/// How a direct-angle control is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ControlStyle {
    pub opacity: f32,
    pub interactive: bool,
}

pub fn control_style(locked: bool) -> ControlStyle {
    if locked {
        ControlStyle {
            opacity: 0.5,
            interactive: false,
        }
    } else {
        ControlStyle {
            opacity: 1.0,
            interactive: true,
        }
    }
}

#[derive(Debug)]
pub struct Simulator {
    config: SimulatorConfig,
    chain: Chain,
    calibration: Calibration,
    target: DVec3,
    ik_enabled: bool,
    orbit_enabled: bool,
    dragging: bool,
    display: DisplayAngles,
    recorder: MotionRecorder,
    player: SequencePlayer,
}

impl Simulator {
    pub fn new(config: SimulatorConfig) -> Self {
        let chain = Chain::from_config(&config);
        let recorder = MotionRecorder::new(std::time::Duration::from_millis(u64::from(
            config.min_frame_duration_ms,
        )));
        let mut sim = Self {
            ik_enabled: config.ik_enabled,
            config,
            chain,
            calibration: Calibration::new(),
            target: DVec3::ZERO,
            orbit_enabled: true,
            dragging: false,
            display: DisplayAngles::default(),
            recorder,
            player: SequencePlayer::new(),
        };
        let segments = sim.config.num_segments;
        sim.initialize(segments);
        sim
    }

    pub fn from_config_file(path: &str) -> Result<Self> {
        Ok(Self::new(SimulatorConfig::from_json_file(path)?))
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn target(&self) -> DVec3 {
        self.target
    }

    pub fn display(&self) -> &DisplayAngles {
        &self.display
    }

    pub fn recorder(&self) -> &MotionRecorder {
        &self.recorder
    }

    pub fn player(&self) -> &SequencePlayer {
        &self.player
    }

    pub fn ik_enabled(&self) -> bool {
        self.ik_enabled
    }

    pub fn set_ik_enabled(&mut self, enabled: bool) {
        self.ik_enabled = enabled;
    }

    /// Whether the camera may orbit (false while the target is being dragged).
    pub fn orbit_enabled(&self) -> bool {
        self.orbit_enabled
    }

    // -----------------------------------------------------------------------
    // Chain structure
    // -----------------------------------------------------------------------

    /// Rebuild the arm with `num_segments` straight, unlocked segments.
    ///
    /// The count is clamped to `1..=max_segments`.
    pub fn initialize(&mut self, num_segments: usize) {
        let max = self.config.max_segments.max(1);
        let count = num_segments.clamp(1, max);
        if count != num_segments {
            tracing::warn!(
                "Requested {} segments, using {} (range 1..={})",
                num_segments,
                count,
                max
            );
        }
        self.chain.initialize(count);
        self.reposition_target();
        self.sync_display();
    }

    /// Append a segment. Returns false once `max_segments` is reached.
    pub fn add_segment(&mut self) -> bool {
        if self.chain.len() >= self.config.max_segments {
            tracing::warn!("Already at {} segments, not adding", self.chain.len());
            return false;
        }
        self.chain.add_segment();
        self.reposition_target();
        self.sync_display();
        true
    }

    /// Remove the tip segment. Returns false with a single segment left.
    pub fn remove_segment(&mut self) -> bool {
        if !self.chain.remove_segment() {
            tracing::debug!("Cannot remove the last segment");
            return false;
        }
        self.reposition_target();
        self.sync_display();
        true
    }

    /// Snap the target to the tip plus the display offset.
    pub fn reposition_target(&mut self) {
        self.target = self.chain.tip_world_position() + self.config.target_offset();
    }

    /// Straighten the arm and zero the base.
    pub fn reset_position(&mut self) {
        self.chain.reset_rotations();
        self.reposition_target();
        self.sync_display();
    }

    // -----------------------------------------------------------------------
    // Direct joint control
    // -----------------------------------------------------------------------

    /// Write a clamped, decalibrated angle. No target or display update.
    fn apply_calibrated(&mut self, joint: JointType, calibrated: f64) -> bool {
        if !self.chain.contains(joint) {
            tracing::warn!("{} does not exist on a {}-segment arm", joint, self.chain.len());
            return false;
        }
        if self.chain.is_locked(joint) {
            tracing::debug!("{} is locked, ignoring {}°", joint, calibrated);
            return false;
        }
        let limited = self.calibration.clamp(calibrated, joint);
        let raw = self.calibration.decalibrate(limited, joint);
        self.chain.set_raw_angle(joint, raw)
    }

    /// Set a joint from a calibrated angle, as the angle sliders do.
    ///
    /// Locked joints and joints on missing segments are left alone.
    pub fn set_joint_rotation(&mut self, joint: JointType, calibrated: f64) -> bool {
        if !self.apply_calibrated(joint, calibrated) {
            return false;
        }
        self.reposition_target();
        self.sync_display();
        true
    }

    /// [`Simulator::set_joint_rotation`] addressed by name (`base`, `arm1X`, ...).
    pub fn set_joint_rotation_by_name(&mut self, name: &str, calibrated: f64) -> Result<bool> {
        let joint: JointType = name.parse()?;
        Ok(self.set_joint_rotation(joint, calibrated))
    }

    pub fn is_locked(&self, joint: JointType) -> bool {
        self.chain.is_locked(joint)
    }

    /// Flip one lock. `None` if the segment does not exist.
    pub fn toggle_lock(&mut self, segment: usize, axis: Axis) -> Option<bool> {
        let current = self.chain.locks().get(segment)?.get(axis);
        self.set_lock(segment, axis, !current);
        Some(!current)
    }

    pub fn set_lock(&mut self, segment: usize, axis: Axis, locked: bool) -> bool {
        let ok = self.chain.set_lock(segment, axis, locked);
        if ok {
            tracing::info!(
                "{} {}",
                JointType::arm(segment, axis),
                if locked { "locked" } else { "unlocked" }
            );
        } else {
            tracing::warn!("No segment {} to lock", segment + 1);
        }
        ok
    }

    /// Style of every arm axis control. The base has no lock and is not listed.
    pub fn control_styles(&self) -> Vec<(JointType, ControlStyle)> {
        JointType::all(self.chain.len())
            .filter(|joint| joint.segment().is_some())
            .map(|joint| (joint, control_style(self.chain.is_locked(joint))))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Calibration and limits
    // -----------------------------------------------------------------------

    /// Take the current pose as the new zero of the five recorded joints.
    pub fn set_current_as_zero(&mut self) {
        for joint in JointType::RECORDED {
            let raw = self.chain.raw_angle_or_zero(joint);
            self.calibration.set_zero_offset(joint, raw);
        }
        tracing::info!(
            "Zero set at base={:.1} arm1=({:.1}, {:.1}) arm2=({:.1}, {:.1})",
            self.calibration.zero_offset(JointType::Base),
            self.calibration.zero_offset(JointType::ARM1_X),
            self.calibration.zero_offset(JointType::ARM1_Z),
            self.calibration.zero_offset(JointType::ARM2_X),
            self.calibration.zero_offset(JointType::ARM2_Z)
        );
        self.sync_display();
    }

    pub fn reset_zero(&mut self) {
        self.calibration.reset_zero();
        tracing::info!("Zero offsets reset");
        self.sync_display();
    }

    /// Store limits for one joint and enforce them right away.
    pub fn set_limits(&mut self, joint: JointType, min: f64, max: f64) -> Option<Enforcement> {
        self.calibration.set_limits(joint, min, max);
        let enforced = limits::enforce_joint(&mut self.chain, &self.calibration, joint);
        if enforced.is_some() {
            self.reposition_target();
            self.sync_display();
        }
        enforced
    }

    /// Apply all panel limits, then enforce every joint.
    pub fn set_all_limits(&mut self, settings: &LimitSettings) -> Vec<Enforcement> {
        for (joint, l) in settings.entries() {
            self.calibration.set_limits(joint, l.min, l.max);
        }
        self.enforce_all()
    }

    pub fn enforce_all(&mut self) -> Vec<Enforcement> {
        let changed = limits::enforce_all(&mut self.chain, &self.calibration);
        if !changed.is_empty() {
            self.reposition_target();
            self.sync_display();
        }
        changed
    }

    // -----------------------------------------------------------------------
    // Drag and IK
    // -----------------------------------------------------------------------

    /// Pointer down on the target: the camera stops orbiting.
    pub fn begin_drag(&mut self) {
        self.dragging = true;
        self.orbit_enabled = false;
    }

    /// Move the target. Runs the solver when IK is enabled.
    pub fn drag_target(&mut self, position: DVec3) -> Option<IkSolution> {
        self.target = position;
        if !self.ik_enabled {
            return None;
        }
        let solution = self.solve_ik();
        Some(solution)
    }

    /// Pointer up: the camera orbits again and the panel catches up.
    pub fn end_drag(&mut self) {
        self.dragging = false;
        self.orbit_enabled = true;
        self.sync_display();
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// One solve toward the current target.
    pub fn solve_ik(&mut self) -> IkSolution {
        let solution = ik::solve(&mut self.chain, &self.calibration, self.target);
        self.sync_display();
        solution
    }

    /// Recompute the displayed angles from the chain. Idempotent.
    pub fn sync_display(&mut self) {
        let cal = &self.calibration;
        let chain = &self.chain;
        self.display = DisplayAngles {
            base: cal.calibrate(chain.base_rotation(), JointType::Base),
            segments: chain
                .segments()
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    [
                        cal.calibrate(s.rotation_x, JointType::arm(i, Axis::X)),
                        cal.calibrate(s.rotation_z, JointType::arm(i, Axis::Z)),
                    ]
                })
                .collect(),
        };
    }

    // -----------------------------------------------------------------------
    // Recording
    // -----------------------------------------------------------------------

    /// Calibrated pose of the five recorded joints.
    pub fn capture_frame(&self) -> [i32; 5] {
        JointType::RECORDED.map(|joint| match self.chain.raw_angle(joint) {
            Some(raw) => self.calibration.calibrate(raw, joint),
            None => 0,
        })
    }

    pub fn start_recording(&mut self, now: Instant) -> bool {
        self.recorder.start(now)
    }

    pub fn pause_recording(&mut self) -> bool {
        self.recorder.pause()
    }

    pub fn stop_recording(&mut self) -> Option<String> {
        self.recorder.stop()
    }

    pub fn record_tick(&mut self, now: Instant) -> Option<RecordedFrame> {
        let angles = self.capture_frame();
        self.recorder.tick(now, angles)
    }

    // -----------------------------------------------------------------------
    // Playback
    // -----------------------------------------------------------------------

    /// Replace the loaded sequence. An active playback is cancelled first.
    pub fn load_sequence(&mut self, text: &str) -> usize {
        let (count, restored) = self.player.load(text);
        if let Some(ik) = restored {
            self.ik_enabled = ik;
        }
        count
    }

    /// Start playing the loaded sequence with IK disabled.
    pub fn begin_playback(&mut self) -> bool {
        if !self.player.begin(self.ik_enabled) {
            tracing::warn!("No sequence loaded");
            return false;
        }
        self.ik_enabled = false;
        tracing::info!(
            "Playing {} steps ({} ms)",
            self.player.frames().len(),
            self.player.total_duration().as_millis()
        );
        true
    }

    /// Apply the next frame. `None` when the sequence is done.
    pub fn playback_step(&mut self) -> Option<PlaybackStep> {
        let step = self.player.next_step()?;
        tracing::debug!(
            "Step {}/{}: {:?} for {} ms",
            step.index + 1,
            self.player.frames().len(),
            step.frame.angles(),
            step.frame.duration_ms
        );
        self.apply_frame(&step.frame);
        Some(step)
    }

    /// Apply a frame's calibrated angles, respecting locks and current limits.
    ///
    /// Returns the joints the frame names that this arm does not have.
    pub fn apply_frame(&mut self, frame: &RecordedFrame) -> Vec<JointType> {
        let mut missing = Vec::new();
        for (joint, calibrated) in frame.joint_angles() {
            if self.chain.contains(joint) {
                self.apply_calibrated(joint, calibrated as f64);
            } else {
                missing.push(joint);
            }
        }
        if !missing.is_empty() {
            tracing::debug!(
                "Frame skips {:?} on a {}-segment arm",
                missing,
                self.chain.len()
            );
        }
        self.reposition_target();
        self.sync_display();
        missing
    }

    /// Playback ran to completion: restore IK and resync the target.
    pub fn finish_playback(&mut self) {
        if let Some(ik) = self.player.finish() {
            self.ik_enabled = ik;
            tracing::info!("Playback finished, IK {}", if ik { "enabled" } else { "disabled" });
        }
        self.reposition_target();
        self.sync_display();
    }

    /// Abort playback, restoring the IK flag saved when it started.
    pub fn cancel_playback(&mut self) {
        if let Some(ik) = self.player.cancel() {
            self.ik_enabled = ik;
        }
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}
