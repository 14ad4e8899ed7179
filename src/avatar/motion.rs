//! Application of motion samples to bound scene nodes.
//!
//! Orientation samples arrive as per-axis Euler angles in degrees and are
//! composed in the fixed order Z, then X, then Y about world axes — the
//! interchange convention of the motion senders. The composed rotation is
//! normalized to a quaternion before it reaches the node, so nothing
//! downstream has to know about axis order.

use glam::{Mat3, Quat, Vec3};

use super::binding::SkeletonBinding;
use crate::scene::Scene;
use crate::skeleton::JointId;

/// Convert Euler angles in degrees to a unit quaternion by rotating about
/// the world Z axis first, then X, then Y (each rotation pre-multiplied
/// onto the running matrix).
pub fn rotation_from_euler_zxy(degrees: Vec3) -> Quat {
    let m = Mat3::from_rotation_y(degrees.y.to_radians())
        * Mat3::from_rotation_x(degrees.x.to_radians())
        * Mat3::from_rotation_z(degrees.z.to_radians());
    Quat::from_mat3(&m).normalize()
}

/// Set a bound joint's local position (absolute, in model units).
///
/// Out-of-range or unbound joints absorb the sample with no effect and no
/// diagnostic; motion streams routinely reference joints the current model
/// lacks.
pub fn apply_translation(
    scene: &Scene,
    binding: &SkeletonBinding,
    joint_raw: i32,
    position: [f32; 3],
) {
    let Some(joint) = JointId::from_raw(joint_raw) else {
        return;
    };
    let Some(node) = binding.node(joint) else {
        return;
    };
    scene.set_node_position(node, Vec3::from(position));
}

/// Set a bound joint's local orientation from Euler angles in degrees
/// (absolute, Z-X-Y composition order). Same drop policy as
/// [`apply_translation`].
pub fn apply_orientation(
    scene: &Scene,
    binding: &SkeletonBinding,
    joint_raw: i32,
    euler_degrees: [f32; 3],
) {
    let Some(joint) = JointId::from_raw(joint_raw) else {
        return;
    };
    let Some(node) = binding.node(joint) else {
        return;
    };
    scene.set_node_orientation(node, rotation_from_euler_zxy(Vec3::from(euler_degrees)));
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Quaternions q and -q encode the same rotation.
    fn same_rotation(a: Quat, b: Quat) -> bool {
        a.dot(b).abs() > 1.0 - 1e-5
    }

    #[test]
    fn test_single_axis_z() {
        let q = rotation_from_euler_zxy(Vec3::new(0.0, 0.0, 90.0));
        assert!(same_rotation(q, Quat::from_rotation_z(90f32.to_radians())));
    }

    #[test]
    fn test_single_axis_x() {
        let q = rotation_from_euler_zxy(Vec3::new(90.0, 0.0, 0.0));
        assert!(same_rotation(q, Quat::from_rotation_x(90f32.to_radians())));
    }

    #[test]
    fn test_single_axis_y() {
        let q = rotation_from_euler_zxy(Vec3::new(0.0, 90.0, 0.0));
        assert!(same_rotation(q, Quat::from_rotation_y(90f32.to_radians())));
    }

    #[test]
    fn test_composition_order_is_z_then_x_then_y() {
        // Rotating X then Y is not the same as X then Z; if these agreed the
        // composition order would be wrong.
        let a = rotation_from_euler_zxy(Vec3::new(90.0, 90.0, 0.0));
        let b = rotation_from_euler_zxy(Vec3::new(90.0, 0.0, 90.0));
        assert!(!same_rotation(a, b));

        // Z is applied first: with only Z and X set, the X rotation acts on
        // the already-Z-rotated frame, i.e. q = Rx * Rz.
        let q = rotation_from_euler_zxy(Vec3::new(90.0, 0.0, 90.0));
        let expected =
            Quat::from_rotation_x(90f32.to_radians()) * Quat::from_rotation_z(90f32.to_radians());
        assert!(same_rotation(q, expected));
    }

    #[test]
    fn test_zero_angles_are_identity() {
        let q = rotation_from_euler_zxy(Vec3::ZERO);
        assert!(same_rotation(q, Quat::IDENTITY));
    }

    #[test]
    fn test_result_is_unit_length() {
        let q = rotation_from_euler_zxy(Vec3::new(33.0, -118.0, 77.5));
        assert!((q.length() - 1.0).abs() < 1e-6);
    }
}
