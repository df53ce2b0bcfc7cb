//! Joint limit enforcement.
//!
//! Limits live in [`Calibration`]; this module pushes them back into a
//! [`Chain`] whose raw angles were moved outside them (by a new limit, a new
//! zero offset, or an external write).

use crate::calibration::Calibration;
use crate::chain::Chain;
use crate::joint::JointType;

/// One joint that was pulled back inside its limits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Enforcement {
    pub joint: JointType,
    /// Calibrated angle before enforcement, without limits applied.
    pub from: i32,
    /// Calibrated angle written back.
    pub to: f64,
}

/// Enforce one joint's limits.
///
/// Returns `None` when the joint is missing, locked, or already inside its
/// limits. Otherwise the decalibrated limited angle is written into the chain.
pub fn enforce_joint(
    chain: &mut Chain,
    calibration: &Calibration,
    joint: JointType,
) -> Option<Enforcement> {
    let raw = chain.raw_angle(joint)?;
    let limited = calibration.clamp(calibration.calibrate(raw, joint) as f64, joint);
    let current = calibration.unlimited(raw, joint);
    if (limited - current as f64).abs() < f64::EPSILON {
        return None;
    }
    if chain.is_locked(joint) {
        tracing::debug!("{} is locked, not enforcing limit ({}°)", joint, current);
        return None;
    }
    tracing::info!("Enforcing {} rotation limit: {}° → {}°", joint, current, limited);
    chain.set_raw_angle(joint, calibration.decalibrate(limited, joint));
    Some(Enforcement {
        joint,
        from: current,
        to: limited,
    })
}

/// Enforce every joint present in the chain: base, then segments low to high,
/// X before Z.
pub fn enforce_all(chain: &mut Chain, calibration: &Calibration) -> Vec<Enforcement> {
    let joints: Vec<JointType> = JointType::all(chain.len()).collect();
    joints
        .into_iter()
        .filter_map(|joint| enforce_joint(chain, calibration, joint))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::Axis;

    #[test]
    fn test_raw_below_min_is_pulled_up() {
        let mut chain = Chain::new(2, 1.0, 2.0, 0.5);
        let mut cal = Calibration::new();
        cal.set_limits(JointType::ARM1_X, 30.0, 300.0);
        chain.set_raw_angle(JointType::ARM1_X, 10.0);

        let changed = enforce_all(&mut chain, &cal);
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].joint, JointType::ARM1_X);
        assert_eq!(changed[0].from, 10);
        assert_eq!(changed[0].to, 30.0);
        assert_eq!(chain.raw_angle(JointType::ARM1_X), Some(30.0));
        assert_eq!(cal.calibrate(30.0, JointType::ARM1_X), 30);
    }

    #[test]
    fn test_within_limits_untouched() {
        let mut chain = Chain::new(2, 1.0, 2.0, 0.5);
        let mut cal = Calibration::new();
        cal.set_limits(JointType::ARM2_Z, 0.0, 90.0);
        chain.set_raw_angle(JointType::ARM2_Z, 45.3);
        assert!(enforce_all(&mut chain, &cal).is_empty());
        assert_eq!(chain.raw_angle(JointType::ARM2_Z), Some(45.3));
    }

    #[test]
    fn test_offset_write_back_is_decalibrated() {
        let mut chain = Chain::new(1, 1.0, 2.0, 0.5);
        let mut cal = Calibration::new();
        cal.set_zero_offset(JointType::Base, 20.0);
        cal.set_limits(JointType::Base, 0.0, 100.0);
        chain.set_raw_angle(JointType::Base, 150.0);
        let changed = enforce_joint(&mut chain, &cal, JointType::Base).unwrap();
        assert_eq!(changed.to, 100.0);
        assert_eq!(chain.raw_angle(JointType::Base), Some(120.0));
    }

    #[test]
    fn test_locked_joint_not_enforced() {
        let mut chain = Chain::new(1, 1.0, 2.0, 0.5);
        let mut cal = Calibration::new();
        cal.set_limits(JointType::ARM1_X, 30.0, 300.0);
        chain.set_raw_angle(JointType::ARM1_X, 10.0);
        chain.set_lock(0, Axis::X, true);
        assert!(enforce_all(&mut chain, &cal).is_empty());
        assert_eq!(chain.raw_angle(JointType::ARM1_X), Some(10.0));
    }

    #[test]
    fn test_enforcement_order_is_fixed() {
        let mut chain = Chain::new(2, 1.0, 2.0, 0.5);
        let mut cal = Calibration::new();
        for joint in JointType::RECORDED {
            cal.set_limits(joint, 50.0, 60.0);
        }
        let changed: Vec<JointType> = enforce_all(&mut chain, &cal)
            .into_iter()
            .map(|e| e.joint)
            .collect();
        assert_eq!(changed, JointType::RECORDED.to_vec());
    }

    #[test]
    fn test_missing_segment_skipped() {
        let mut chain = Chain::new(1, 1.0, 2.0, 0.5);
        let mut cal = Calibration::new();
        cal.set_limits(JointType::ARM2_X, 50.0, 60.0);
        assert!(enforce_joint(&mut chain, &cal, JointType::ARM2_X).is_none());
    }
}
