//! glTF/GLB model import using the `gltf` crate.
//!
//! Extracts the node hierarchy with rest-pose transforms, mesh geometry,
//! and skin data (joint lists + inverse bind matrices) into a [`Scene`].

use glam::{Mat4, Quat, Vec3};
use std::collections::HashMap;
use std::path::Path;

use super::{MeshData, PrimitiveData, Scene, SceneParts, SkinData};
use crate::error::SceneError;

impl Scene {
    /// Import a model file and extract everything needed for posing and
    /// rendering. Fails if the file is missing or cannot be parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SceneError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SceneError::NotFound(path.display().to_string()));
        }

        let (document, buffers, _images) =
            gltf::import(path).map_err(|e| SceneError::Import(e.to_string()))?;

        let buf = &buffers;

        // Node hierarchy
        let node_count = document.nodes().count();
        let mut parents = vec![None; node_count];
        for node in document.nodes() {
            for child in node.children() {
                parents[child.index()] = Some(node.index());
            }
        }

        let names: Vec<String> = document
            .nodes()
            .map(|n| n.name().unwrap_or_default().to_string())
            .collect();

        // Rest-pose transforms
        let mut rest_translations = Vec::with_capacity(node_count);
        let mut rest_rotations = Vec::with_capacity(node_count);
        let mut rest_scales = Vec::with_capacity(node_count);
        for node in document.nodes() {
            let (t, r, s) = node.transform().decomposed();
            rest_translations.push(Vec3::from(t));
            rest_rotations.push(Quat::from_array(r));
            rest_scales.push(Vec3::from(s));
        }

        // Skins
        let mut skins = Vec::new();
        for skin in document.skins() {
            let joints: Vec<usize> = skin.joints().map(|j| j.index()).collect();
            let reader = skin.reader(|buffer| Some(&buf[buffer.index()]));
            let ibms: Vec<Mat4> = reader
                .read_inverse_bind_matrices()
                .map(|iter| iter.map(|m| Mat4::from_cols_array_2d(&m)).collect())
                .unwrap_or_else(|| vec![Mat4::IDENTITY; joints.len()]);

            skins.push(SkinData {
                joints,
                inverse_bind_matrices: ibms,
            });
        }

        // Map mesh -> skin
        let mut mesh_skin = HashMap::new();
        for node in document.nodes() {
            if let (Some(mesh), Some(skin)) = (node.mesh(), node.skin()) {
                mesh_skin.insert(mesh.index(), skin.index());
            }
        }

        // Meshes
        let mut meshes = Vec::new();
        for mesh in document.meshes() {
            let mut primitives = Vec::new();

            for prim in mesh.primitives() {
                let reader = prim.reader(|buffer| Some(&buf[buffer.index()]));

                let positions: Vec<Vec3> = reader
                    .read_positions()
                    .map(|iter| iter.map(Vec3::from).collect())
                    .unwrap_or_default();

                let normals: Vec<Vec3> = reader
                    .read_normals()
                    .map(|iter| iter.map(Vec3::from).collect())
                    .unwrap_or_else(|| vec![Vec3::Y; positions.len()]);

                let indices: Vec<u32> = reader
                    .read_indices()
                    .map(|iter| iter.into_u32().collect())
                    .unwrap_or_default();

                let joints: Vec<[u16; 4]> = reader
                    .read_joints(0)
                    .map(|iter| iter.into_u16().collect())
                    .unwrap_or_else(|| vec![[0; 4]; positions.len()]);

                let weights: Vec<[f32; 4]> = reader
                    .read_weights(0)
                    .map(|iter| iter.into_f32().collect())
                    .unwrap_or_else(|| vec![[1.0, 0.0, 0.0, 0.0]; positions.len()]);

                let base_color = prim
                    .material()
                    .pbr_metallic_roughness()
                    .base_color_factor();

                primitives.push(PrimitiveData {
                    positions,
                    normals,
                    indices,
                    joints,
                    weights,
                    base_color,
                });
            }

            meshes.push(MeshData { primitives });
        }

        tracing::debug!(
            "Imported {}: {} nodes, {} meshes, {} skins",
            path.display(),
            node_count,
            meshes.len(),
            skins.len()
        );

        Ok(Scene::from_parts(SceneParts {
            names,
            parents,
            rest_translations,
            rest_rotations,
            rest_scales,
            meshes,
            skins,
            mesh_skin,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_fatal() {
        let err = Scene::load("assets/model/no_such_model.glb").unwrap_err();
        assert!(matches!(err, SceneError::NotFound(_)));
    }

    #[test]
    fn test_load_model() {
        let model_path = "assets/model/avatar.glb";
        if !Path::new(model_path).exists() {
            eprintln!("Skipping test: avatar.glb not found");
            return;
        }

        let scene = Scene::load(model_path).expect("Failed to load model");
        assert!(scene.node_count() > 0, "Expected at least one node");
        assert!(
            scene.find_node("Hip").is_some(),
            "Expected a 'Hip' node in the shipped model"
        );
    }
}
