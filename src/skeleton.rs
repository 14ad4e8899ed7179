//! The fixed joint taxonomy understood by the motion stream.
//!
//! Senders address joints by a small integer id. This table maps each id to
//! the canonical node name the skeleton must use inside the model file for
//! binding to succeed. The table is fixed at build time and read-only; a
//! model whose nodes are named differently is a content problem, not a
//! protocol problem.

use std::fmt;

/// Number of joints in the taxonomy.
pub const TOTAL_JOINTS: usize = 64;

/// Canonical joint names, indexed by joint id.
///
/// Layout: torso/head chain, left arm with full finger chains, right arm,
/// left leg, right leg. The per-hand finger block mirrors common mocap
/// interchange skeletons: three thumb joints, then metacarpal + three
/// phalanges for each remaining finger.
pub const JOINT_NAMES: [&str; TOTAL_JOINTS] = [
    // Torso and head
    "Hip",
    "LowerBack",
    "Spine",
    "Spine1",
    "Neck",
    "Neck1",
    "Head",
    "HeadEnd",
    // Left arm
    "LeftShoulder",
    "LeftArm",
    "LeftForeArm",
    "LeftHand",
    "LeftHandThumb1",
    "LeftHandThumb2",
    "LeftHandThumb3",
    "LeftInHandIndex",
    "LeftHandIndex1",
    "LeftHandIndex2",
    "LeftHandIndex3",
    "LeftInHandMiddle",
    "LeftHandMiddle1",
    "LeftHandMiddle2",
    "LeftHandMiddle3",
    "LeftInHandRing",
    "LeftHandRing1",
    "LeftHandRing2",
    "LeftHandRing3",
    "LeftInHandPinky",
    "LeftHandPinky1",
    "LeftHandPinky2",
    "LeftHandPinky3",
    // Right arm
    "RightShoulder",
    "RightArm",
    "RightForeArm",
    "RightHand",
    "RightHandThumb1",
    "RightHandThumb2",
    "RightHandThumb3",
    "RightInHandIndex",
    "RightHandIndex1",
    "RightHandIndex2",
    "RightHandIndex3",
    "RightInHandMiddle",
    "RightHandMiddle1",
    "RightHandMiddle2",
    "RightHandMiddle3",
    "RightInHandRing",
    "RightHandRing1",
    "RightHandRing2",
    "RightHandRing3",
    "RightInHandPinky",
    "RightHandPinky1",
    "RightHandPinky2",
    "RightHandPinky3",
    // Left leg
    "LeftUpLeg",
    "LeftLeg",
    "LeftFoot",
    "LeftToeBase",
    "LeftToeEnd",
    // Right leg
    "RightUpLeg",
    "RightLeg",
    "RightFoot",
    "RightToeBase",
    "RightToeEnd",
];

/// A validated joint identifier in `[0, TOTAL_JOINTS)`.
///
/// Constructed only through [`JointId::from_raw`], so holding one proves the
/// index is in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JointId(usize);

impl JointId {
    /// Validate a raw wire-format joint id.
    ///
    /// Returns `None` for anything outside the taxonomy, including negative
    /// values; callers treat that as a sample to drop, never an error.
    pub fn from_raw(raw: i32) -> Option<Self> {
        if (0..TOTAL_JOINTS as i32).contains(&raw) {
            Some(Self(raw as usize))
        } else {
            None
        }
    }

    /// The canonical node name for this joint.
    pub fn name(self) -> &'static str {
        JOINT_NAMES[self.0]
    }

    /// The taxonomy index, guaranteed `< TOTAL_JOINTS`.
    pub fn index(self) -> usize {
        self.0
    }

    /// All joints in taxonomy order.
    pub fn all() -> impl Iterator<Item = JointId> {
        (0..TOTAL_JOINTS).map(JointId)
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_nonempty_and_unique() {
        let mut seen = HashSet::new();
        for joint in JointId::all() {
            let name = joint.name();
            assert!(!name.is_empty(), "joint {} has an empty name", joint.index());
            assert!(seen.insert(name), "duplicate joint name: {}", name);
        }
        assert_eq!(seen.len(), TOTAL_JOINTS);
    }

    #[test]
    fn test_from_raw_bounds() {
        assert!(JointId::from_raw(0).is_some());
        assert!(JointId::from_raw(TOTAL_JOINTS as i32 - 1).is_some());
        assert!(JointId::from_raw(TOTAL_JOINTS as i32).is_none());
        assert!(JointId::from_raw(-1).is_none());
        assert!(JointId::from_raw(i32::MAX).is_none());
        assert!(JointId::from_raw(i32::MIN).is_none());
    }

    #[test]
    fn test_known_names_resolve() {
        let names: Vec<&str> = JointId::all().map(JointId::name).collect();
        for expected in ["Hip", "Neck", "Head", "LeftShoulder", "RightToeEnd"] {
            assert!(names.contains(&expected), "missing joint name {}", expected);
        }
        assert_eq!(JointId::from_raw(0).unwrap().name(), "Hip");
    }
}
