use cgmath::{InnerSpace, Vector2 as Vec2, Vector3 as Vec3, Vector4 as Vec4};

#[derive(Debug, Clone, Copy)]
pub struct ColoredVertex {
    pub pos: Vec3<f32>,
    pub color: Vec3<f32>,
    pub normal: Vec3<f32>,
}

/// 顶点着色后的裁剪空间顶点
#[derive(Debug, Clone, Copy)]
pub struct ClipSpaceVertex {
    pub position: Vec4<f32>,
    pub world_pos: Vec3<f32>,
    pub normal: Vec3<f32>,
    pub color: Vec3<f32>,
}

/// 光栅化阶段的屏幕空间点
#[derive(Debug, Clone, Copy)]
pub struct RasterPoint {
    pub pos: Vec2<f32>,
    pub z: f32,
    pub world_pos: Vec3<f32>,
    pub normal: Vec3<f32>,
    pub color: Vec3<f32>,
}

#[derive(Debug, Clone, Copy)]
pub struct RasterTriangle {
    pub vertices: [RasterPoint; 3],
}

#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub vertices: [ColoredVertex; 3],
    pub normal: Vec3<f32>,
}

impl Triangle {
    fn compute_normal(v0: &ColoredVertex, v1: &ColoredVertex, v2: &ColoredVertex) -> Vec3<f32> {
        let edge1 = v1.pos - v0.pos;
        let edge2 = v2.pos - v0.pos;
        edge1.cross(edge2).normalize()
    }

    pub fn new(v0: ColoredVertex, v1: ColoredVertex, v2: ColoredVertex) -> Self {
        let normal = Self::compute_normal(&v0, &v1, &v2);
        Self {
            vertices: [v0, v1, v2],
            normal,
        }
    }
}

impl Default for ColoredVertex {
    fn default() -> Self {
        ColoredVertex {
            pos: Vec3::new(0.0, 0.0, 0.0),
            color: Vec3::new(1.0, 1.0, 1.0),
            normal: Vec3::new(0.0, 1.0, 0.0),
        }
    }
}

/// Phong 材质参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Vec3<f32>,
    pub specular: Vec3<f32>,
    pub shininess: f32,
}

impl Material {
    pub fn phong(color: Vec3<f32>) -> Self {
        Self {
            color,
            // 0x111111
            specular: Vec3::new(0x11 as f32 / 255.0, 0x11 as f32 / 255.0, 0x11 as f32 / 255.0),
            shininess: 30.0,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::phong(Vec3::new(1.0, 1.0, 1.0))
    }
}
