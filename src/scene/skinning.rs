//! CPU skinning: forward kinematics and linear blend skinning (LBS).

use glam::{Mat4, Quat, Vec3, Vec4};

use super::{NodeIndex, Scene};

/// Compute world transforms for all nodes using forward kinematics.
///
/// `translations`/`rotations` are the posed local-transform overrides
/// (one slot per node); nodes without overrides use their rest pose.
pub fn compute_world_transforms(
    scene: &Scene,
    translations: &[Option<Vec3>],
    rotations: &[Option<Quat>],
) -> Vec<Mat4> {
    let count = scene.node_count();
    let mut world = vec![Mat4::IDENTITY; count];
    let mut computed = vec![false; count];

    for i in 0..count {
        compute_node(scene, translations, rotations, &mut world, &mut computed, i);
    }

    world
}

fn compute_node(
    scene: &Scene,
    translations: &[Option<Vec3>],
    rotations: &[Option<Quat>],
    world: &mut [Mat4],
    computed: &mut [bool],
    idx: NodeIndex,
) {
    if computed[idx] {
        return;
    }

    let t = translations[idx].unwrap_or(scene.rest_translations[idx]);
    let r = rotations[idx].unwrap_or(scene.rest_rotations[idx]);
    let s = scene.rest_scales[idx];

    let local = Mat4::from_scale_rotation_translation(s, r, t);

    if let Some(parent) = scene.parents[idx] {
        compute_node(scene, translations, rotations, world, computed, parent);
        world[idx] = world[parent] * local;
    } else {
        world[idx] = local;
    }
    computed[idx] = true;
}

/// Apply linear blend skinning to a mesh's vertex positions.
///
/// Returns skinned positions per primitive. Meshes without a skin (or with
/// skinning disabled at the scene level) pass through their rest geometry.
pub fn skin_vertices(scene: &Scene, mesh_idx: usize, world: &[Mat4]) -> Vec<Vec<Vec3>> {
    let mesh = &scene.meshes[mesh_idx];

    let skin_idx = match scene.mesh_skin.get(&mesh_idx) {
        Some(&s) if scene.skinning_enabled() => s,
        _ => return base_positions(scene, mesh_idx),
    };

    let skin = &scene.skins[skin_idx];

    // Joint matrices: world[joint_node] * inverse_bind_matrix
    let joint_matrices: Vec<Mat4> = skin
        .joints
        .iter()
        .zip(skin.inverse_bind_matrices.iter())
        .map(|(&node_idx, ibm)| world[node_idx] * *ibm)
        .collect();

    let mut result = Vec::with_capacity(mesh.primitives.len());

    for prim in &mesh.primitives {
        let mut skinned = vec![Vec3::ZERO; prim.positions.len()];

        for (v_idx, pos) in prim.positions.iter().enumerate() {
            let j = prim.joints[v_idx];
            let w = prim.weights[v_idx];
            let p = Vec4::new(pos.x, pos.y, pos.z, 1.0);

            let mut result_pos = Vec4::ZERO;
            for k in 0..4 {
                if w[k] < 0.0001 {
                    continue;
                }
                let jm = joint_matrices[j[k] as usize];
                result_pos += w[k] * (jm * p);
            }

            skinned[v_idx] = result_pos.truncate();
        }

        result.push(skinned);
    }

    result
}

/// Rest-pose positions for a mesh, per primitive.
pub fn base_positions(scene: &Scene, mesh_idx: usize) -> Vec<Vec<Vec3>> {
    scene.meshes[mesh_idx]
        .primitives
        .iter()
        .map(|p| p.positions.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MeshData, PrimitiveData, SceneParts, SkinData};
    use std::collections::HashMap;

    /// One bone, one triangle fully weighted to it.
    fn rigged_scene() -> Scene {
        let prim = PrimitiveData {
            positions: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            normals: vec![Vec3::Z; 3],
            indices: vec![0, 1, 2],
            joints: vec![[0, 0, 0, 0]; 3],
            weights: vec![[1.0, 0.0, 0.0, 0.0]; 3],
            base_color: [1.0; 4],
        };

        let mut mesh_skin = HashMap::new();
        mesh_skin.insert(0, 0);

        Scene::from_parts(SceneParts {
            names: vec!["Bone".to_string()],
            parents: vec![None],
            rest_translations: vec![Vec3::ZERO],
            rest_rotations: vec![Quat::IDENTITY],
            rest_scales: vec![Vec3::ONE],
            meshes: vec![MeshData {
                primitives: vec![prim],
            }],
            skins: vec![SkinData {
                joints: vec![0],
                inverse_bind_matrices: vec![Mat4::IDENTITY],
            }],
            mesh_skin,
        })
    }

    #[test]
    fn test_rest_pose_skinning_is_identity() {
        let mut scene = rigged_scene();
        scene.enable_skinning();
        scene.update();

        let world = scene.world_transforms();
        let skinned = skin_vertices(&scene, 0, &world);
        let base = base_positions(&scene, 0);

        for (a, b) in skinned[0].iter().zip(base[0].iter()) {
            assert!((*a - *b).length() < 1e-6);
        }
    }

    #[test]
    fn test_moved_bone_carries_vertices() {
        let mut scene = rigged_scene();
        scene.enable_skinning();
        scene.set_node_position(0, Vec3::new(0.0, 0.0, 5.0));
        scene.update();

        let world = scene.world_transforms();
        let skinned = skin_vertices(&scene, 0, &world);

        assert!((skinned[0][0] - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-6);
        assert!((skinned[0][1] - Vec3::new(1.0, 0.0, 5.0)).length() < 1e-6);
    }

    #[test]
    fn test_skinning_disabled_passes_through() {
        let scene = rigged_scene();
        scene.set_node_position(0, Vec3::new(0.0, 0.0, 5.0));
        scene.update();

        let world = scene.world_transforms();
        let skinned = skin_vertices(&scene, 0, &world);
        let base = base_positions(&scene, 0);

        for (a, b) in skinned[0].iter().zip(base[0].iter()) {
            assert!((*a - *b).length() < 1e-6);
        }
    }
}
