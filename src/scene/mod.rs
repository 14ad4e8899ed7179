//! The loaded scene graph: node hierarchy, mesh/skin data, and pose state.
//!
//! Topology (names, parents, rest transforms, geometry) is immutable after
//! import. The only mutable state is the pose: per-node local translation
//! and rotation overrides written by the motion path and read by the render
//! path. Both sides go through a single mutex, held only for the duration
//! of one slot write or one `update()` snapshot, so a frame never observes
//! a half-written transform.

pub mod loader;
pub mod skinning;

use glam::{Mat4, Quat, Vec3};
use std::collections::HashMap;
use std::sync::Mutex;

/// Index of a node within the scene graph.
pub type NodeIndex = usize;

/// Skin data: the joint list and inverse bind matrices of one glTF skin.
#[derive(Debug)]
pub struct SkinData {
    pub joints: Vec<NodeIndex>,
    pub inverse_bind_matrices: Vec<Mat4>,
}

/// Geometry for a single primitive.
#[derive(Debug)]
pub struct PrimitiveData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
    /// Per-vertex joint indices (4 per vertex, into the skin's joint list)
    pub joints: Vec<[u16; 4]>,
    /// Per-vertex joint weights (4 per vertex)
    pub weights: Vec<[f32; 4]>,
    /// Base color factor from the material (RGBA)
    pub base_color: [f32; 4],
}

/// All geometry data for one mesh.
#[derive(Debug)]
pub struct MeshData {
    pub primitives: Vec<PrimitiveData>,
}

/// Everything the importer extracts from a model file.
#[derive(Default)]
pub(crate) struct SceneParts {
    pub names: Vec<String>,
    pub parents: Vec<Option<NodeIndex>>,
    pub rest_translations: Vec<Vec3>,
    pub rest_rotations: Vec<Quat>,
    pub rest_scales: Vec<Vec3>,
    pub meshes: Vec<MeshData>,
    pub skins: Vec<SkinData>,
    /// Which skin each mesh uses: mesh index -> skin index
    pub mesh_skin: HashMap<usize, usize>,
}

/// Local-transform overrides for posed nodes. `None` means rest pose.
#[derive(Debug)]
struct Pose {
    translations: Vec<Option<Vec3>>,
    rotations: Vec<Option<Quat>>,
}

impl Pose {
    fn new(node_count: usize) -> Self {
        Self {
            translations: vec![None; node_count],
            rotations: vec![None; node_count],
        }
    }
}

/// A loaded scene ready for posing and rendering.
#[derive(Debug)]
pub struct Scene {
    pub(crate) names: Vec<String>,
    pub(crate) parents: Vec<Option<NodeIndex>>,
    pub(crate) rest_translations: Vec<Vec3>,
    pub(crate) rest_rotations: Vec<Quat>,
    pub(crate) rest_scales: Vec<Vec3>,
    pub(crate) meshes: Vec<MeshData>,
    pub(crate) skins: Vec<SkinData>,
    pub(crate) mesh_skin: HashMap<usize, usize>,
    name_to_node: HashMap<String, NodeIndex>,
    skinning_enabled: bool,
    pose: Mutex<Pose>,
    /// World transforms from the last `update()`, read by the render path.
    world: Mutex<Vec<Mat4>>,
}

impl Scene {
    pub(crate) fn from_parts(parts: SceneParts) -> Self {
        let node_count = parts.names.len();

        // First occurrence wins so repeated names resolve deterministically.
        let mut name_to_node = HashMap::new();
        for (idx, name) in parts.names.iter().enumerate() {
            if !name.is_empty() {
                name_to_node.entry(name.clone()).or_insert(idx);
            }
        }

        Self {
            names: parts.names,
            parents: parts.parents,
            rest_translations: parts.rest_translations,
            rest_rotations: parts.rest_rotations,
            rest_scales: parts.rest_scales,
            meshes: parts.meshes,
            skins: parts.skins,
            mesh_skin: parts.mesh_skin,
            name_to_node,
            skinning_enabled: false,
            pose: Mutex::new(Pose::new(node_count)),
            world: Mutex::new(vec![Mat4::IDENTITY; node_count]),
        }
    }

    /// Total number of nodes in the hierarchy.
    pub fn node_count(&self) -> usize {
        self.names.len()
    }

    /// Look up a node by name.
    pub fn find_node(&self, name: &str) -> Option<NodeIndex> {
        self.name_to_node.get(name).copied()
    }

    /// The name of a node.
    pub fn node_name(&self, node: NodeIndex) -> &str {
        &self.names[node]
    }

    /// Opt in to smooth mesh deformation. Called once after loading, before
    /// the scene is shared with the motion and render paths.
    pub fn enable_skinning(&mut self) {
        self.skinning_enabled = true;
    }

    pub fn skinning_enabled(&self) -> bool {
        self.skinning_enabled
    }

    /// Set a node's local position (absolute, not accumulated).
    pub fn set_node_position(&self, node: NodeIndex, position: Vec3) {
        let mut pose = self.pose.lock().unwrap();
        pose.translations[node] = Some(position);
    }

    /// Set a node's local orientation (absolute, not accumulated).
    pub fn set_node_orientation(&self, node: NodeIndex, orientation: Quat) {
        let mut pose = self.pose.lock().unwrap();
        pose.rotations[node] = Some(orientation);
    }

    /// Current local position of a node (override if posed, rest otherwise).
    pub fn node_position(&self, node: NodeIndex) -> Vec3 {
        let pose = self.pose.lock().unwrap();
        pose.translations[node].unwrap_or(self.rest_translations[node])
    }

    /// Current local orientation of a node (override if posed, rest otherwise).
    pub fn node_orientation(&self, node: NodeIndex) -> Quat {
        let pose = self.pose.lock().unwrap();
        pose.rotations[node].unwrap_or(self.rest_rotations[node])
    }

    /// Advance per-frame state: snapshot the pose and recompute world
    /// transforms. Called once per render tick.
    pub fn update(&self) {
        let (translations, rotations) = {
            let pose = self.pose.lock().unwrap();
            (pose.translations.clone(), pose.rotations.clone())
        };

        let world = skinning::compute_world_transforms(self, &translations, &rotations);
        *self.world.lock().unwrap() = world;
    }

    /// World transforms from the last `update()`.
    pub fn world_transforms(&self) -> Vec<Mat4> {
        self.world.lock().unwrap().clone()
    }
}

#[cfg(test)]
pub(crate) fn test_scene(nodes: &[(&str, Option<NodeIndex>)]) -> Scene {
    let count = nodes.len();
    Scene::from_parts(SceneParts {
        names: nodes.iter().map(|(n, _)| n.to_string()).collect(),
        parents: nodes.iter().map(|(_, p)| *p).collect(),
        rest_translations: vec![Vec3::ZERO; count],
        rest_rotations: vec![Quat::IDENTITY; count],
        rest_scales: vec![Vec3::ONE; count],
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_node() {
        let scene = test_scene(&[("Root", None), ("Hip", Some(0)), ("Head", Some(1))]);
        assert_eq!(scene.find_node("Hip"), Some(1));
        assert_eq!(scene.find_node("Tail"), None);
        assert_eq!(scene.node_name(2), "Head");
    }

    #[test]
    fn test_duplicate_names_resolve_to_first() {
        let scene = test_scene(&[("Root", None), ("Arm", Some(0)), ("Arm", Some(0))]);
        assert_eq!(scene.find_node("Arm"), Some(1));
    }

    #[test]
    fn test_pose_defaults_to_rest() {
        let scene = test_scene(&[("Root", None)]);
        assert_eq!(scene.node_position(0), Vec3::ZERO);
        assert_eq!(scene.node_orientation(0), Quat::IDENTITY);
    }

    #[test]
    fn test_update_propagates_through_hierarchy() {
        let scene = test_scene(&[("Root", None), ("Child", Some(0))]);
        scene.set_node_position(0, Vec3::new(1.0, 0.0, 0.0));
        scene.set_node_position(1, Vec3::new(0.0, 2.0, 0.0));
        scene.update();

        let world = scene.world_transforms();
        let child_origin = world[1].transform_point3(Vec3::ZERO);
        assert!((child_origin - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-6);
    }
}
