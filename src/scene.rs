use cgmath::{InnerSpace, Matrix4 as Mat4, Rad, Vector3 as Vec3};
use std::sync::Arc;

use crate::cube_map::CubeMap;
use crate::geometry::Geometry;
use crate::vertex::Material;

#[derive(Debug, Clone, Copy)]
pub struct DirectionalLight {
    pub color: Vec3<f32>,
    pub intensity: f32,
    pub position: Vec3<f32>,
    pub target: Vec3<f32>,
}

impl DirectionalLight {
    pub fn new(color: Vec3<f32>, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            position: Vec3::new(0.0, 1.0, 0.0),
            target: Vec3::new(0.0, 0.0, 0.0),
        }
    }

    /// 光线传播方向（从光源指向目标）
    pub fn direction(&self) -> Vec3<f32> {
        (self.target - self.position).normalize()
    }
}

/// 欧拉角，弧度，XYZ 顺序
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rotation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Rotation {
    pub fn to_mat(self) -> Mat4<f32> {
        Mat4::from_angle_x(Rad(self.x)) * Mat4::from_angle_y(Rad(self.y)) * Mat4::from_angle_z(Rad(self.z))
    }
}

pub struct Mesh {
    pub geometry: Arc<Geometry>,
    pub material: Material,
    pub position: Vec3<f32>,
    pub rotation: Rotation,
    pub scale: f32,
}

impl Mesh {
    pub fn new(geometry: Arc<Geometry>, material: Material) -> Self {
        Self {
            geometry,
            material,
            position: Vec3::new(0.0, 0.0, 0.0),
            rotation: Rotation::default(),
            scale: 1.0,
        }
    }

    pub fn model_matrix(&self) -> Mat4<f32> {
        Mat4::from_translation(self.position) * self.rotation.to_mat() * Mat4::from_scale(self.scale)
    }
}

pub type MeshId = usize;

pub struct Scene {
    pub meshes: Vec<Mesh>,
    pub lights: Vec<DirectionalLight>,
    pub ambient: Vec3<f32>,
    /// 没有背景时的清屏颜色（ARGB）
    pub clear_color: u32,
    pub background: Option<CubeMap>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            meshes: Vec::new(),
            lights: Vec::new(),
            ambient: Vec3::new(0.0, 0.0, 0.0),
            clear_color: 0xFF000000,
            background: None,
        }
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub fn add_light(&mut self, light: DirectionalLight) {
        self.lights.push(light);
    }

    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.get_mut(id)
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector4 as Vec4;

    #[test]
    fn meshes_share_geometry() {
        let geometry = Arc::new(Geometry::cube(1.0, 1.0, 1.0));
        let mut scene = Scene::new();
        let a = scene.add_mesh(Mesh::new(geometry.clone(), Material::default()));
        let b = scene.add_mesh(Mesh::new(geometry.clone(), Material::default()));
        assert_ne!(a, b);
        assert!(Arc::ptr_eq(
            &scene.mesh(a).unwrap().geometry,
            &scene.mesh(b).unwrap().geometry
        ));
        assert_eq!(Arc::strong_count(&geometry), 3);
    }

    #[test]
    fn model_matrix_translates_after_rotating() {
        let mut mesh = Mesh::new(Arc::new(Geometry::cube(1.0, 1.0, 1.0)), Material::default());
        mesh.position = Vec3::new(-2.0, 0.0, 0.0);
        mesh.rotation.y = std::f32::consts::FRAC_PI_2;

        let p = mesh.model_matrix() * Vec4::new(1.0, 0.0, 0.0, 1.0);
        // 绕 Y 轴转 90°：+X -> -Z，再平移
        assert!((p.x - -2.0).abs() < 1e-6);
        assert!((p.z - -1.0).abs() < 1e-6);
    }

    #[test]
    fn light_direction_points_from_position_to_target() {
        let mut light = DirectionalLight::new(Vec3::new(1.0, 1.0, 1.0), 1.0);
        light.position = Vec3::new(0.0, 0.0, 4.0);
        assert_eq!(light.direction(), Vec3::new(0.0, 0.0, -1.0));
    }
}
