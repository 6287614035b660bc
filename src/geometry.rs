use cgmath::Vector3 as Vec3;

use crate::vertex::{ColoredVertex, Triangle};

/// 不可变的三角形集合，多个网格实例可通过 `Arc` 共享同一份
#[derive(Debug, Clone)]
pub struct Geometry {
    pub triangles: Vec<Triangle>,
}

impl Geometry {
    /// 以原点为中心的长方体，每个面两个三角形，从外侧看为逆时针
    pub fn cube(width: f32, height: f32, depth: f32) -> Self {
        let (hx, hy, hz) = (width / 2.0, height / 2.0, depth / 2.0);

        // (法线, 面内右方向, 面内上方向)
        let faces = [
            (Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 1.0, 0.0)),
            (Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 1.0, 0.0)),
            (Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0)),
            (Vec3::new(0.0, -1.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0)),
            (Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)),
            (Vec3::new(0.0, 0.0, -1.0), Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)),
        ];

        let half = Vec3::new(hx, hy, hz);
        let scale = |v: Vec3<f32>| Vec3::new(v.x * half.x, v.y * half.y, v.z * half.z);

        let mut triangles = Vec::with_capacity(12);
        for (normal, right, up) in faces {
            let center = scale(normal);
            let r = scale(right);
            let u = scale(up);

            let corner = |sr: f32, su: f32| ColoredVertex {
                pos: center + r * sr + u * su,
                normal,
                ..ColoredVertex::default()
            };
            let v0 = corner(-1.0, -1.0);
            let v1 = corner(1.0, -1.0);
            let v2 = corner(1.0, 1.0);
            let v3 = corner(-1.0, 1.0);

            triangles.push(Triangle::new(v0, v1, v2));
            triangles.push(Triangle::new(v2, v3, v0));
        }

        Self { triangles }
    }
}
