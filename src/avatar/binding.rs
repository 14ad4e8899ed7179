//! Resolution of the joint taxonomy against a loaded scene.

use crate::scene::{NodeIndex, Scene};
use crate::skeleton::{JointId, TOTAL_JOINTS};

/// The resolved mapping from joint ids to scene nodes for one model.
///
/// Built exactly once at avatar construction. Slots for joints the model
/// lacks stay unbound for the avatar's lifetime and silently absorb motion
/// samples; there is no later re-resolution.
pub struct SkeletonBinding {
    slots: [Option<NodeIndex>; TOTAL_JOINTS],
}

/// Outcome of a bind pass.
#[derive(Debug)]
pub struct BindReport {
    /// Joints that resolved to a scene node
    pub bound: usize,
    /// Names of joints the scene had no node for
    pub missing: Vec<&'static str>,
}

impl SkeletonBinding {
    /// Resolve every taxonomy joint against the scene by name.
    ///
    /// Best-effort: a missing joint is warned about once and left unbound.
    /// A scene with zero matches still yields a usable (if degenerate)
    /// binding.
    pub fn bind(scene: &Scene) -> (Self, BindReport) {
        let mut slots = [None; TOTAL_JOINTS];
        let mut missing = Vec::new();

        for joint in JointId::all() {
            match scene.find_node(joint.name()) {
                Some(node) => slots[joint.index()] = Some(node),
                None => {
                    tracing::warn!("No scene node for joint '{}'", joint.name());
                    missing.push(joint.name());
                }
            }
        }

        let report = BindReport {
            bound: TOTAL_JOINTS - missing.len(),
            missing,
        };

        (Self { slots }, report)
    }

    /// The node bound to a joint, if the scene had one.
    pub fn node(&self, joint: JointId) -> Option<NodeIndex> {
        self.slots[joint.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::test_scene;

    #[test]
    fn test_partial_binding() {
        let scene = test_scene(&[("Armature", None), ("Hip", Some(0)), ("Head", Some(1))]);
        let (binding, report) = SkeletonBinding::bind(&scene);

        assert_eq!(report.bound, 2);
        assert_eq!(report.missing.len(), TOTAL_JOINTS - 2);
        assert!(report.missing.contains(&"Neck"));

        let hip = JointId::from_raw(0).unwrap();
        assert_eq!(binding.node(hip), Some(1));
    }

    #[test]
    fn test_zero_matches_is_legal() {
        let scene = test_scene(&[("Cube", None)]);
        let (binding, report) = SkeletonBinding::bind(&scene);

        assert_eq!(report.bound, 0);
        assert_eq!(report.missing.len(), TOTAL_JOINTS);
        for joint in JointId::all() {
            assert_eq!(binding.node(joint), None);
        }
    }

    #[test]
    fn test_binding_is_deterministic() {
        let scene = test_scene(&[("Hip", None), ("Spine", Some(0)), ("Head", Some(1))]);
        let (a, report_a) = SkeletonBinding::bind(&scene);
        let (b, report_b) = SkeletonBinding::bind(&scene);

        assert_eq!(report_a.bound, report_b.bound);
        assert_eq!(report_a.missing, report_b.missing);
        for joint in JointId::all() {
            assert_eq!(a.node(joint), b.node(joint));
        }
    }
}
