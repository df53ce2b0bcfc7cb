//! Angle calibration: raw joint angles ↔ user-facing calibrated angles.
//!
//! A raw angle is whatever the chain's rotation currently holds (degrees,
//! unbounded). A calibrated angle is zero-referenced against a per-joint
//! offset, clamped into the joint's limits, wrapped into `[0, 360)` and rounded
//! to whole degrees.
//!
//! The order of operations in [`Calibration::calibrate`] is offset, clamp,
//! wrap, round. Clamping happens *before* wrapping, so a joint whose limits
//! straddle 0° (e.g. `min = 300, max = 50`) does not get a wrap-aware clamp,
//! and `min > max` collapses every angle onto `min`. Both are kept as-is.
//!
//! [`Calibration::decalibrate`] only adds the offset back. It does not undo the
//! clamp or the wrap, so `decalibrate(calibrate(x))` is lossy whenever either
//! of those changed the value.

use std::collections::HashMap;

use crate::joint::JointType;

/// Zero offset and limits of one joint. All values in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JointCalibration {
    pub zero_offset: f64,
    pub limit_min: f64,
    pub limit_max: f64,
}

impl Default for JointCalibration {
    fn default() -> Self {
        Self {
            zero_offset: 0.0,
            limit_min: 0.0,
            limit_max: 360.0,
        }
    }
}

/// Wrap an angle into `[0, 360)` the way `((x % 360) + 360) % 360` does.
pub fn wrap_degrees(angle: f64) -> f64 {
    ((angle % 360.0) + 360.0) % 360.0
}

/// Round half toward positive infinity.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Round a wrapped angle to whole degrees, keeping the result below 360.
fn round_wrapped(angle: f64) -> i32 {
    let rounded = round_half_up(angle) as i32;
    if rounded >= 360 {
        rounded - 360
    } else {
        rounded
    }
}

/// Clamp with `max(min, min(max, x))` semantics.
///
/// Unlike `f64::clamp` this never panics: with `min > max` it returns `min`.
pub fn clamp_degrees(angle: f64, min: f64, max: f64) -> f64 {
    angle.min(max).max(min)
}

/// Per-joint zero offsets and limits.
///
/// Joints that were never configured use [`JointCalibration::default`].
#[derive(Clone, Debug, Default)]
pub struct Calibration {
    joints: HashMap<JointType, JointCalibration>,
}

impl Calibration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, joint: JointType) -> JointCalibration {
        self.joints.get(&joint).copied().unwrap_or_default()
    }

    /// Raw angle → calibrated integer degrees in `[0, 360)`.
    pub fn calibrate(&self, raw: f64, joint: JointType) -> i32 {
        let cal = self.get(joint);
        let relative = raw - cal.zero_offset;
        let limited = clamp_degrees(relative, cal.limit_min, cal.limit_max);
        round_wrapped(wrap_degrees(limited))
    }

    /// Calibrated angle → raw angle. Adds the zero offset back and nothing else.
    pub fn decalibrate(&self, calibrated: f64, joint: JointType) -> f64 {
        calibrated + self.get(joint).zero_offset
    }

    /// Clamp a calibrated angle into the joint's limits.
    pub fn clamp(&self, calibrated: f64, joint: JointType) -> f64 {
        let cal = self.get(joint);
        clamp_degrees(calibrated, cal.limit_min, cal.limit_max)
    }

    /// The calibrated angle the raw angle would have with no limits applied.
    pub fn unlimited(&self, raw: f64, joint: JointType) -> i32 {
        round_wrapped(wrap_degrees(raw - self.get(joint).zero_offset))
    }

    pub fn zero_offset(&self, joint: JointType) -> f64 {
        self.get(joint).zero_offset
    }

    pub fn set_zero_offset(&mut self, joint: JointType, offset: f64) {
        self.joints.entry(joint).or_default().zero_offset = offset;
    }

    /// Reset every zero offset to 0. Limits are kept.
    pub fn reset_zero(&mut self) {
        for cal in self.joints.values_mut() {
            cal.zero_offset = 0.0;
        }
    }

    /// Store limits for a joint. `min > max` is accepted unchanged.
    pub fn set_limits(&mut self, joint: JointType, min: f64, max: f64) {
        let cal = self.joints.entry(joint).or_default();
        cal.limit_min = min;
        cal.limit_max = max;
    }

    pub fn limits(&self, joint: JointType) -> (f64, f64) {
        let cal = self.get(joint);
        (cal.limit_min, cal.limit_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibrate_defaults() {
        let cal = Calibration::new();
        assert_eq!(cal.calibrate(0.0, JointType::Base), 0);
        assert_eq!(cal.calibrate(45.4, JointType::Base), 45);
        assert_eq!(cal.calibrate(45.5, JointType::Base), 46);
        assert_eq!(cal.calibrate(359.4, JointType::ARM1_X), 359);
    }

    #[test]
    fn test_calibrate_always_in_range() {
        let mut cal = Calibration::new();
        cal.set_zero_offset(JointType::ARM1_X, 37.25);
        cal.set_limits(JointType::ARM1_Z, -720.0, 720.0);
        let mut raw = -1000.0;
        while raw <= 1000.0 {
            for joint in [JointType::Base, JointType::ARM1_X, JointType::ARM1_Z] {
                let value = cal.calibrate(raw, joint);
                assert!((0..360).contains(&value), "{joint} {raw} -> {value}");
            }
            raw += 0.37;
        }
    }

    #[test]
    fn test_rounding_up_to_360_wraps_to_zero() {
        let mut cal = Calibration::new();
        cal.set_limits(JointType::Base, -720.0, 720.0);
        assert_eq!(cal.calibrate(359.7, JointType::Base), 0);
        assert_eq!(cal.calibrate(-0.2, JointType::Base), 0);
    }

    #[test]
    fn test_default_limits_clamp_before_wrap() {
        // -30 is clamped up to 0 before it ever reaches the wrap.
        let cal = Calibration::new();
        assert_eq!(cal.calibrate(-30.0, JointType::ARM2_Z), 0);
        assert_eq!(cal.unlimited(-30.0, JointType::ARM2_Z), 330);
    }

    #[test]
    fn test_offset_applied_before_clamp() {
        let mut cal = Calibration::new();
        cal.set_zero_offset(JointType::Base, 90.0);
        assert_eq!(cal.calibrate(120.0, JointType::Base), 30);
        // 45 - 90 = -45, clamped to the default minimum of 0.
        assert_eq!(cal.calibrate(45.0, JointType::Base), 0);
        assert_eq!(cal.decalibrate(30.0, JointType::Base), 120.0);
    }

    #[test]
    fn test_decalibrate_is_lossy() {
        let mut cal = Calibration::new();
        cal.set_limits(JointType::ARM1_X, 30.0, 300.0);
        // Clamp changes the value.
        let raw = 10.0;
        let back = cal.decalibrate(cal.calibrate(raw, JointType::ARM1_X) as f64, JointType::ARM1_X);
        assert_eq!(back, 30.0);
        assert_ne!(back, raw);

        // Wrap changes the value.
        cal.set_limits(JointType::Base, -720.0, 720.0);
        let back = cal.decalibrate(cal.calibrate(400.0, JointType::Base) as f64, JointType::Base);
        assert_eq!(back, 40.0);
    }

    #[test]
    fn test_limits_straddling_zero_are_not_wrap_aware() {
        // min = 300, max = 50 is a degenerate range for max(min, min(max, x)):
        // everything lands on 300.
        let mut cal = Calibration::new();
        cal.set_limits(JointType::Base, 300.0, 50.0);
        assert_eq!(cal.calibrate(10.0, JointType::Base), 300);
        assert_eq!(cal.calibrate(320.0, JointType::Base), 300);
        assert_eq!(cal.clamp(20.0, JointType::Base), 300.0);
    }

    #[test]
    fn test_min_greater_than_max_collapses_to_min() {
        let mut cal = Calibration::new();
        cal.set_limits(JointType::ARM1_Z, 200.0, 100.0);
        for raw in [0.0, 150.0, 250.0, 359.0] {
            assert_eq!(cal.calibrate(raw, JointType::ARM1_Z), 200);
        }
    }

    #[test]
    fn test_reset_zero_keeps_limits() {
        let mut cal = Calibration::new();
        cal.set_zero_offset(JointType::ARM2_X, 15.0);
        cal.set_limits(JointType::ARM2_X, 10.0, 200.0);
        cal.reset_zero();
        assert_eq!(cal.zero_offset(JointType::ARM2_X), 0.0);
        assert_eq!(cal.limits(JointType::ARM2_X), (10.0, 200.0));
    }

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(-90.0), 270.0);
        assert_eq!(wrap_degrees(720.0), 0.0);
        assert_eq!(wrap_degrees(365.0), 5.0);
    }
}
