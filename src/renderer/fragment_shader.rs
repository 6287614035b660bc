use cgmath::{ElementWise, InnerSpace, Vector3 as Vec3};

use crate::scene::DirectionalLight;
use crate::vertex::Material;

#[derive(Debug)]
pub struct FragmentData<'a> {
    pub world_pos: Vec3<f32>,
    pub normal: Vec3<f32>,
    pub color: Vec3<f32>, // 顶点颜色插值结果
    pub material: &'a Material,
    pub camera_pos: Vec3<f32>,
}

// 定义 Shader 的通用行为
pub trait FragmentShader: Sync {
    // 输入插值后的片元数据，输出 0.0 ~ 1.0 范围的颜色
    fn shade(&self, data: FragmentData) -> Vec3<f32>;
}

/// Blinn-Phong，支持多个方向光
pub struct PhongShader<'a> {
    pub lights: &'a [DirectionalLight],
    pub ambient: Vec3<f32>,
}

impl FragmentShader for PhongShader<'_> {
    fn shade(&self, data: FragmentData) -> Vec3<f32> {
        let base_color = data.color.mul_element_wise(data.material.color);
        let view_dir = (data.camera_pos - data.world_pos).normalize();

        let mut diffuse = Vec3::new(0.0, 0.0, 0.0);
        let mut specular = Vec3::new(0.0, 0.0, 0.0);
        for light in self.lights {
            let radiance = light.color * light.intensity;
            let to_light = -light.direction();

            let diff = data.normal.dot(to_light).max(0.0);
            diffuse += radiance * diff;

            // 背光面不产生高光
            if diff > 0.0 {
                let half_dir = (to_light + view_dir).normalize();
                let spec = data.normal.dot(half_dir).max(0.0).powf(data.material.shininess);
                specular += radiance.mul_element_wise(data.material.specular) * spec;
            }
        }

        let mut final_color = base_color.mul_element_wise(self.ambient + diffuse) + specular;

        final_color.x = final_color.x.clamp(0.0, 1.0);
        final_color.y = final_color.y.clamp(0.0, 1.0);
        final_color.z = final_color.z.clamp(0.0, 1.0);

        final_color
    }
}

/// 法线可视化，调试用
pub struct NormalDebugShader;

impl FragmentShader for NormalDebugShader {
    fn shade(&self, data: FragmentData) -> Vec3<f32> {
        (data.normal + Vec3::new(1.0, 1.0, 1.0)) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(normal: Vec3<f32>, material: &Material) -> FragmentData<'_> {
        FragmentData {
            world_pos: Vec3::new(0.0, 0.0, 0.0),
            normal,
            color: Vec3::new(1.0, 1.0, 1.0),
            material,
            camera_pos: Vec3::new(0.0, 0.0, 3.0),
        }
    }

    fn front_light() -> DirectionalLight {
        let mut light = DirectionalLight::new(Vec3::new(1.0, 1.0, 1.0), 1.0);
        light.position = Vec3::new(0.0, 0.0, 4.0);
        light
    }

    #[test]
    fn lit_face_is_brighter_than_unlit_face() {
        let lights = [front_light()];
        let shader = PhongShader {
            lights: &lights,
            ambient: Vec3::new(0.0, 0.0, 0.0),
        };
        let material = Material::phong(Vec3::new(0.27, 0.67, 0.53));

        let lit = shader.shade(fragment(Vec3::new(0.0, 0.0, 1.0), &material));
        let unlit = shader.shade(fragment(Vec3::new(0.0, 0.0, -1.0), &material));

        assert!(lit.y > 0.6);
        assert_eq!(unlit, Vec3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn ambient_only_scales_base_color() {
        let shader = PhongShader {
            lights: &[],
            ambient: Vec3::new(0.5, 0.5, 0.5),
        };
        let material = Material::phong(Vec3::new(0.4, 0.8, 1.0));
        let c = shader.shade(fragment(Vec3::new(0.0, 1.0, 0.0), &material));
        assert!((c - Vec3::new(0.2, 0.4, 0.5)).magnitude() < 1e-6);
    }

    #[test]
    fn output_is_clamped() {
        let lights = [front_light(), front_light(), front_light()];
        let shader = PhongShader {
            lights: &lights,
            ambient: Vec3::new(1.0, 1.0, 1.0),
        };
        let material = Material::default();
        let c = shader.shade(fragment(Vec3::new(0.0, 0.0, 1.0), &material));
        assert_eq!(c, Vec3::new(1.0, 1.0, 1.0));
    }
}
