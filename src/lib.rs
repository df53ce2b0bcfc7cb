//! tobor - toy robot arm simulator core.
//!
//! A rotating base carrying a stack of two-axis arm segments, driven either by
//! FABRIK inverse kinematics toward a dragged target or by direct joint
//! angles. Joint angles are presented through a calibration layer (zero
//! offsets and limits), and poses can be recorded to and replayed from a small
//! text format.
//!
//! # Example
//!
//! ```
//! use glam::DVec3;
//! use tobor::{JointType, Simulator, SimulatorConfig};
//!
//! let mut sim = Simulator::new(SimulatorConfig::default());
//! sim.drag_target(DVec3::new(2.0, 2.0, 0.0));
//! assert_eq!(sim.display().base, 90);
//!
//! sim.set_limits(JointType::ARM1_X, 0.0, 45.0);
//! sim.set_joint_rotation(JointType::ARM1_X, 80.0);
//! assert_eq!(sim.display().get(JointType::ARM1_X), Some(45));
//! ```
//!
//! Timed behaviour (the recording ticker and sequence playback) runs on tokio
//! through [`SimulatorHandle`].

pub mod calibration;
pub mod chain;
pub mod config;
pub mod error;
pub mod ik;
pub mod joint;
pub mod limits;
pub mod player;
pub mod recorder;
pub mod robots;
pub mod runtime;
pub mod sequence;
pub mod simulator;

pub use calibration::{Calibration, JointCalibration};
pub use chain::{AxisLocks, Chain, Segment};
pub use config::SimulatorConfig;
pub use error::{Result, SimError};
pub use ik::IkSolution;
pub use joint::{Axis, JointType};
pub use limits::Enforcement;
pub use player::{PlaybackStep, SequencePlayer};
pub use recorder::{MotionRecorder, RecorderState};
pub use robots::{NewCommand, Robot, RobotCommand, RobotError, RobotStore};
pub use runtime::SimulatorHandle;
pub use sequence::{export_file_name, format_sequence, parse_sequence, RecordedFrame};
pub use simulator::{
    control_style, ControlStyle, DisplayAngles, JointLimits, LimitSettings, Simulator,
};
