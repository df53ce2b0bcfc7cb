//! FABRIK inverse kinematics.
//!
//! One solve is a single backward + forward reaching pass over the chain's
//! pivots, followed by extracting per-segment X/Z angles from the new pivot
//! positions. The base heading is derived directly from the target direction.
//!
//! Every extracted angle goes through calibration before being written:
//! normalise, calibrate, clamp to limits, decalibrate. Locked axes are never
//! written, but the geometry pass still runs so the other joints stay correct
//! relative to where the locked segment actually points.
//!
//! A single pass does not converge exactly; for an unconstrained two-segment
//! chain and a reachable target the tip ends up within one segment length of
//! the target, and usually much closer.

use glam::{DQuat, DVec3};

use crate::calibration::{wrap_degrees, Calibration};
use crate::chain::Chain;
use crate::joint::{Axis, JointType};

/// Horizontal distance below which the base heading is left alone.
pub const MIN_HEADING_DISTANCE: f64 = 0.001;

/// Outcome of one solve.
#[derive(Clone, Debug, Default)]
pub struct IkSolution {
    /// Pivot positions after the forward pass (base pivot first).
    pub pivots: Vec<DVec3>,
    /// Raw angles written into the chain, in write order.
    pub written: Vec<(JointType, f64)>,
    /// Joints whose derived angle was dropped because the axis is locked.
    pub skipped: Vec<JointType>,
}

/// Base heading for a target, degrees in `[0, 360)`.
///
/// `None` when the target is (almost) straight above or below the base.
pub fn base_heading(target: DVec3) -> Option<f64> {
    if target.x.hypot(target.z) > MIN_HEADING_DISTANCE {
        Some(wrap_degrees(target.x.atan2(target.z).to_degrees()))
    } else {
        None
    }
}

/// Unit direction from `from` to `to`.
///
/// When the two points coincide the link bends perpendicular to `hint` (a
/// neighbouring link) instead of snapping onto a fixed axis.
fn link_direction(from: DVec3, to: DVec3, hint: DVec3) -> DVec3 {
    (to - from).try_normalize().unwrap_or_else(|| {
        hint.try_normalize().unwrap_or(DVec3::Y).any_orthonormal_vector()
    })
}

/// Two-pass FABRIK over `pivots` in place.
///
/// `lengths[i]` is the distance between `pivots[i]` and `pivots[i + 1]`.
/// The first pivot is the fixed root and is restored by the forward pass.
pub fn fabrik_pass(pivots: &mut [DVec3], lengths: &[f64], target: DVec3) {
    let n = pivots.len();
    if n < 2 {
        return;
    }
    debug_assert_eq!(lengths.len(), n - 1);
    let before = pivots.to_vec();

    // Backward: pin the tip to the target and pull each pivot toward its successor.
    pivots[n - 1] = target;
    for i in (0..n - 1).rev() {
        let hint = if i + 2 < n {
            pivots[i + 1] - pivots[i + 2]
        } else {
            before[i] - before[i + 1]
        };
        let dir = link_direction(pivots[i + 1], pivots[i], hint);
        pivots[i] = pivots[i + 1] + dir * lengths[i];
    }

    // Forward: re-anchor the root and push each pivot out from its predecessor.
    pivots[0] = before[0];
    for i in 1..n {
        let hint = if i + 1 < n {
            pivots[i + 1] - pivots[i]
        } else if i >= 2 {
            pivots[i - 1] - pivots[i - 2]
        } else {
            before[i] - before[i - 1]
        };
        let dir = link_direction(pivots[i - 1], pivots[i], hint);
        pivots[i] = pivots[i - 1] + dir * lengths[i - 1];
    }
}

/// Local `(x, z)` angles in degrees that point a segment's up axis along `dir`.
///
/// Inverse of `Rx(x) * Rz(z) * Y`: `x` covers the full circle, `z` is in
/// `[-90, 90]`.
pub fn direction_angles(dir: DVec3) -> (f64, f64) {
    let x = dir.z.atan2(dir.y);
    let z = (-dir.x).atan2(dir.y.hypot(dir.z));
    (x.to_degrees(), z.to_degrees())
}

/// Write one solver-derived raw angle through calibration and limits.
///
/// The candidate is first shifted by whole turns so that `raw - offset` lands
/// in `[0, 360)`; otherwise a plain negative `atan2` result would be clamped
/// onto the lower limit before it is wrapped.
fn write_joint(
    chain: &mut Chain,
    calibration: &Calibration,
    joint: JointType,
    candidate: f64,
    solution: &mut IkSolution,
) {
    if chain.is_locked(joint) {
        solution.skipped.push(joint);
        return;
    }
    let offset = calibration.zero_offset(joint);
    let normalized = offset + wrap_degrees(candidate - offset);
    let calibrated = calibration.calibrate(normalized, joint);
    let limited = calibration.clamp(calibrated as f64, joint);
    if limited != calibrated as f64 {
        tracing::debug!(
            "{} rotation limited from {}° to {}°",
            joint,
            calibrated,
            limited
        );
    }
    let raw = calibration.decalibrate(limited, joint);
    if chain.set_raw_angle(joint, raw) {
        solution.written.push((joint, raw));
    }
}

/// Run one FABRIK solve toward `target` and write the resulting angles.
pub fn solve(chain: &mut Chain, calibration: &Calibration, target: DVec3) -> IkSolution {
    let mut solution = IkSolution::default();

    if let Some(heading) = base_heading(target) {
        write_joint(chain, calibration, JointType::Base, heading, &mut solution);
    }

    let mut pivots = chain.pivots();
    let lengths: Vec<f64> = chain.segments().iter().map(|s| s.length).collect();
    fabrik_pass(&mut pivots, &lengths, target);

    let mut parent: DQuat = chain.base_quat();
    for i in 0..chain.len() {
        let local = parent.inverse() * (pivots[i + 1] - pivots[i]);
        let (x, z) = direction_angles(local);
        write_joint(chain, calibration, JointType::arm(i, Axis::X), x, &mut solution);
        write_joint(chain, calibration, JointType::arm(i, Axis::Z), z, &mut solution);
        parent = parent * chain.segments()[i].local_rotation();
    }

    tracing::debug!(
        "IK solve: target=({:.2}, {:.2}, {:.2}) wrote {} joints, {} locked",
        target.x,
        target.y,
        target.z,
        solution.written.len(),
        solution.skipped.len()
    );

    solution.pivots = pivots;
    solution
}
