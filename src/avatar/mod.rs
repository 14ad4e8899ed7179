//! The motion-driven avatar owned by the application.
//!
//! Construction loads the model and binds the skeleton; afterwards the
//! avatar is shared between the render loop (`update`) and the network
//! handlers (`set_position`/`set_orientation`), which may run on any
//! thread.

pub mod binding;
pub mod motion;

pub use binding::{BindReport, SkeletonBinding};

use std::path::Path;

use crate::error::Result;
use crate::scene::Scene;
use crate::skeleton::TOTAL_JOINTS;

/// A loaded, skeleton-bound avatar.
pub struct Avatar {
    scene: Scene,
    binding: SkeletonBinding,
    report: BindReport,
}

impl Avatar {
    /// Load a model file and bind the skeleton.
    ///
    /// Import failure is fatal. Missing joints are not: the bind report is
    /// logged and the avatar stays usable with a partial skeleton.
    pub fn create<P: AsRef<Path>>(model_path: P, skinning: bool) -> Result<Self> {
        let mut scene = Scene::load(model_path.as_ref())?;
        if skinning {
            scene.enable_skinning();
        }
        Ok(Self::from_scene(scene))
    }

    /// Bind a skeleton over an already-imported scene.
    pub fn from_scene(scene: Scene) -> Self {
        let (binding, report) = SkeletonBinding::bind(&scene);
        tracing::info!(
            "Skeleton bound: {}/{} joints resolved",
            report.bound,
            TOTAL_JOINTS
        );

        Self {
            scene,
            binding,
            report,
        }
    }

    /// Advance the scene's per-frame state. Call once per render tick.
    pub fn update(&self) {
        self.scene.update();
    }

    /// The underlying scene, read by the render path.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The bind outcome recorded at construction.
    pub fn bind_report(&self) -> &BindReport {
        &self.report
    }

    /// Motion entry point: absolute local position for one joint.
    ///
    /// `frame_id` is carried by the wire format but not used to order,
    /// buffer, or discard samples.
    pub fn set_position(&self, _frame_id: i32, joint: i32, position: [f32; 3]) {
        motion::apply_translation(&self.scene, &self.binding, joint, position);
    }

    /// Motion entry point: absolute local orientation for one joint, from
    /// Euler angles in degrees (Z-X-Y composition order).
    pub fn set_orientation(&self, _frame_id: i32, joint: i32, euler_degrees: [f32; 3]) {
        motion::apply_orientation(&self.scene, &self.binding, joint, euler_degrees);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::test_scene;
    use crate::skeleton::JointId;
    use glam::{Quat, Vec3};

    /// A scene whose skeleton carries taxonomy names for Hip and Head only.
    fn hip_and_head_avatar() -> Avatar {
        Avatar::from_scene(test_scene(&[
            ("Armature", None),
            ("Hip", Some(0)),
            ("Head", Some(1)),
        ]))
    }

    #[test]
    fn test_partial_skeleton_scenario() {
        let avatar = hip_and_head_avatar();
        let report = avatar.bind_report();
        assert_eq!(report.bound, 2);
        assert_eq!(report.missing.len(), TOTAL_JOINTS - 2);

        // Hip is joint 0 and resolves to node 1
        avatar.set_position(1, 0, [1.0, 2.0, 3.0]);
        assert_eq!(avatar.scene().node_position(1), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_unbound_joint_absorbs_samples() {
        let avatar = hip_and_head_avatar();

        // "Neck" (joint 4) exists in the taxonomy but not in this scene
        assert_eq!(JointId::from_raw(4).unwrap().name(), "Neck");
        avatar.set_position(1, 4, [9.0, 9.0, 9.0]);
        avatar.set_orientation(1, 4, [45.0, 0.0, 0.0]);

        // No node anywhere picked up the sample
        for node in 0..avatar.scene().node_count() {
            assert_eq!(avatar.scene().node_position(node), Vec3::ZERO);
            assert_eq!(avatar.scene().node_orientation(node), Quat::IDENTITY);
        }
    }

    #[test]
    fn test_out_of_range_joint_is_dropped() {
        let avatar = hip_and_head_avatar();

        // One past the end of the taxonomy, and assorted garbage
        avatar.set_position(1, TOTAL_JOINTS as i32, [5.0, 5.0, 5.0]);
        avatar.set_position(1, -1, [5.0, 5.0, 5.0]);
        avatar.set_orientation(1, i32::MAX, [90.0, 0.0, 0.0]);

        for node in 0..avatar.scene().node_count() {
            assert_eq!(avatar.scene().node_position(node), Vec3::ZERO);
            assert_eq!(avatar.scene().node_orientation(node), Quat::IDENTITY);
        }
    }

    #[test]
    fn test_samples_are_idempotent() {
        let avatar = hip_and_head_avatar();

        avatar.set_position(1, 0, [1.0, 2.0, 3.0]);
        let once = avatar.scene().node_position(1);
        avatar.set_position(2, 0, [1.0, 2.0, 3.0]);
        assert_eq!(avatar.scene().node_position(1), once);

        avatar.set_orientation(1, 0, [10.0, 20.0, 30.0]);
        let once = avatar.scene().node_orientation(1);
        avatar.set_orientation(2, 0, [10.0, 20.0, 30.0]);
        assert_eq!(avatar.scene().node_orientation(1), once);
    }

    #[test]
    fn test_frame_id_is_ignored() {
        // The wire format carries a frame index, but samples are applied
        // unconditionally: an "older" frame id overwrites a newer one.
        let avatar = hip_and_head_avatar();

        avatar.set_position(100, 0, [1.0, 0.0, 0.0]);
        avatar.set_position(50, 0, [2.0, 0.0, 0.0]);
        assert_eq!(avatar.scene().node_position(1), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_orientation_reaches_node_as_unit_quaternion() {
        let avatar = hip_and_head_avatar();

        avatar.set_orientation(1, 0, [0.0, 0.0, 90.0]);
        let q = avatar.scene().node_orientation(1);
        assert!((q.length() - 1.0).abs() < 1e-6);
        assert!(q.dot(Quat::from_rotation_z(90f32.to_radians())).abs() > 1.0 - 1e-5);
    }
}
