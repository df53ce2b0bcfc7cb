//! Joint addressing.
//!
//! A joint is one rotational degree of freedom: the base's Y rotation, or the
//! X / Z rotation of an arm segment. Names follow the control-panel
//! labels: `base`, `arm1X`, `arm1Z`, `arm2X`, ... (segment numbers
//! are 1-based in names, 0-based in code).

use std::fmt;
use std::str::FromStr;

use crate::error::SimError;

/// Rotation axis of an arm segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    X,
    Z,
}

impl Axis {
    pub fn as_char(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Z => 'Z',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JointType {
    /// Base rotation around Y.
    Base,
    /// Rotation of arm segment `segment` (0-based) around `axis`.
    Arm { segment: usize, axis: Axis },
}

impl JointType {
    pub const ARM1_X: JointType = JointType::arm(0, Axis::X);
    pub const ARM1_Z: JointType = JointType::arm(0, Axis::Z);
    pub const ARM2_X: JointType = JointType::arm(1, Axis::X);
    pub const ARM2_Z: JointType = JointType::arm(1, Axis::Z);

    /// The five joints carried by recorded frames and sequence files, in file order.
    pub const RECORDED: [JointType; 5] = [
        JointType::Base,
        JointType::ARM1_X,
        JointType::ARM1_Z,
        JointType::ARM2_X,
        JointType::ARM2_Z,
    ];

    pub const fn arm(segment: usize, axis: Axis) -> Self {
        JointType::Arm { segment, axis }
    }

    /// Segment index for arm joints, `None` for the base.
    pub fn segment(&self) -> Option<usize> {
        match self {
            JointType::Base => None,
            JointType::Arm { segment, .. } => Some(*segment),
        }
    }

    /// Every joint of a chain with `num_segments` segments, in enforcement
    /// order: base, then each segment low to high with X before Z.
    pub fn all(num_segments: usize) -> impl Iterator<Item = JointType> {
        std::iter::once(JointType::Base).chain(
            (0..num_segments)
                .flat_map(|i| [JointType::arm(i, Axis::X), JointType::arm(i, Axis::Z)]),
        )
    }
}

impl fmt::Display for JointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JointType::Base => write!(f, "base"),
            JointType::Arm { segment, axis } => write!(f, "arm{}{}", segment + 1, axis.as_char()),
        }
    }
}

impl FromStr for JointType {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "base" {
            return Ok(JointType::Base);
        }
        let rest = s
            .strip_prefix("arm")
            .ok_or_else(|| SimError::unknown_joint(s))?;
        let axis = match rest.chars().last() {
            Some('X') => Axis::X,
            Some('Z') => Axis::Z,
            _ => return Err(SimError::unknown_joint(s)),
        };
        let number: usize = rest[..rest.len() - 1]
            .parse()
            .map_err(|_| SimError::unknown_joint(s))?;
        if number == 0 {
            return Err(SimError::unknown_joint(s));
        }
        Ok(JointType::arm(number - 1, axis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_names() {
        assert_eq!(JointType::Base.to_string(), "base");
        assert_eq!(JointType::ARM1_X.to_string(), "arm1X");
        assert_eq!(JointType::ARM2_Z.to_string(), "arm2Z");
        assert_eq!(JointType::arm(4, Axis::X).to_string(), "arm5X");
    }

    #[test]
    fn test_parse_joint_names() {
        assert_eq!("base".parse::<JointType>().unwrap(), JointType::Base);
        assert_eq!("arm1Z".parse::<JointType>().unwrap(), JointType::ARM1_Z);
        assert_eq!(
            "arm12X".parse::<JointType>().unwrap(),
            JointType::arm(11, Axis::X)
        );
    }

    #[test]
    fn test_parse_rejects_bad_names() {
        for name in ["", "Base", "arm", "arm1", "arm0X", "arm1Y", "armXX", "arm1x"] {
            assert!(name.parse::<JointType>().is_err(), "{name} should not parse");
        }
    }

    #[test]
    fn test_enforcement_order() {
        let order: Vec<String> = JointType::all(2).map(|j| j.to_string()).collect();
        assert_eq!(order, ["base", "arm1X", "arm1Z", "arm2X", "arm2Z"]);
        assert_eq!(JointType::all(0).count(), 1);
    }
}
