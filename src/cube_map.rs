//! 等距柱状投影（equirectangular）全景图到立方体贴图的转换。
//!
//! 面的顺序为 +X, -X, +Y, -Y, +Z, -Z。每个面是 `face_size × face_size`
//! 的 ARGB 纹素，行优先存储，第 0 行在上。

use cgmath::{InnerSpace, Vector2 as Vec2, Vector3 as Vec3};
use rayon::prelude::*;
use std::f32::consts::PI;

use crate::framebuffer::pack_argb;
use crate::texture::Texture;

pub struct CubeMap {
    pub face_size: usize,
    pub faces: [Vec<u32>; 6],
}

impl CubeMap {
    /// 按全景图高度决定面大小
    pub fn from_equirectangular(texture: &Texture) -> Self {
        Self::from_equirectangular_sized(texture, texture.height)
    }

    pub fn from_equirectangular_sized(texture: &Texture, face_size: usize) -> Self {
        let face_size = face_size.max(1);
        let faces: Vec<Vec<u32>> = (0..6)
            .into_par_iter()
            .map(|face| {
                let mut data = vec![0u32; face_size * face_size];
                data.par_chunks_mut(face_size)
                    .enumerate()
                    .for_each(|(y, row)| {
                        for (x, texel) in row.iter_mut().enumerate() {
                            let dir = texel_to_direction(face, x, y, face_size);
                            let color = texture.sample_bilinear(direction_to_equirect(dir));
                            *texel = pack_argb(color);
                        }
                    });
                data
            })
            .collect();

        let faces: [Vec<u32>; 6] = match faces.try_into() {
            Ok(faces) => faces,
            Err(_) => unreachable!("固定生成 6 个面"),
        };

        Self { face_size, faces }
    }

    /// 按世界空间方向采样（最近邻）
    pub fn sample_argb(&self, dir: Vec3<f32>) -> u32 {
        let (face, u, v) = direction_to_face(dir);
        let size = self.face_size as f32;
        let x = (((u + 1.0) * 0.5 * size) as usize).min(self.face_size - 1);
        let y = (((v + 1.0) * 0.5 * size) as usize).min(self.face_size - 1);
        self.faces[face][y * self.face_size + x]
    }
}

/// 面上纹素中心对应的方向（未归一化）
fn texel_to_direction(face: usize, x: usize, y: usize, size: usize) -> Vec3<f32> {
    let u = (x as f32 + 0.5) / size as f32 * 2.0 - 1.0;
    let v = (y as f32 + 0.5) / size as f32 * 2.0 - 1.0;

    match face {
        0 => Vec3::new(1.0, -v, -u),
        1 => Vec3::new(-1.0, -v, u),
        2 => Vec3::new(u, 1.0, v),
        3 => Vec3::new(u, -1.0, -v),
        4 => Vec3::new(u, -v, 1.0),
        _ => Vec3::new(-u, -v, -1.0),
    }
}

/// texel_to_direction 的逆映射：返回 (面, u, v)，u/v 在 [-1, 1]
fn direction_to_face(dir: Vec3<f32>) -> (usize, f32, f32) {
    let (ax, ay, az) = (dir.x.abs(), dir.y.abs(), dir.z.abs());

    if ax >= ay && ax >= az && ax > 0.0 {
        if dir.x > 0.0 {
            (0, -dir.z / ax, -dir.y / ax)
        } else {
            (1, dir.z / ax, -dir.y / ax)
        }
    } else if ay >= az && ay > 0.0 {
        if dir.y > 0.0 {
            (2, dir.x / ay, dir.z / ay)
        } else {
            (3, dir.x / ay, -dir.z / ay)
        }
    } else if az > 0.0 {
        if dir.z > 0.0 {
            (4, dir.x / az, -dir.y / az)
        } else {
            (5, -dir.x / az, -dir.y / az)
        }
    } else {
        // 零向量
        (4, 0.0, 0.0)
    }
}

/// 方向 -> 全景图 UV，V 向上
fn direction_to_equirect(dir: Vec3<f32>) -> Vec2<f32> {
    let dir = dir.normalize();
    let u = dir.z.atan2(dir.x) / (2.0 * PI) + 0.5;
    let v = dir.y.clamp(-1.0, 1.0).asin() / PI + 0.5;
    Vec2::new(u, v)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 上半部分红色、下半部分蓝色的全景图
    fn sky_and_ground(width: usize, height: usize) -> Texture {
        let mut tex = Texture::new(width, height);
        for y in 0..height {
            let color = if y < height / 2 { 0xFFFF0000 } else { 0xFF0000FF };
            tex.data[y * width..(y + 1) * width].fill(color);
        }
        tex
    }

    #[test]
    fn face_size_follows_image_height() {
        let cube = CubeMap::from_equirectangular(&sky_and_ground(16, 8));
        assert_eq!(cube.face_size, 8);
        assert!(cube.faces.iter().all(|f| f.len() == 64));
    }

    #[test]
    fn up_is_sky_and_down_is_ground() {
        let cube = CubeMap::from_equirectangular(&sky_and_ground(32, 16));
        assert_eq!(cube.sample_argb(Vec3::new(0.0, 1.0, 0.0)), 0xFFFF0000);
        assert_eq!(cube.sample_argb(Vec3::new(0.1, -1.0, 0.2)), 0xFF0000FF);
        assert_eq!(cube.sample_argb(Vec3::new(1.0, 0.3, 0.0)), 0xFFFF0000);
        assert_eq!(cube.sample_argb(Vec3::new(0.0, -0.3, -1.0)), 0xFF0000FF);
    }

    #[test]
    fn face_lookup_inverts_texel_direction() {
        let size = 8;
        for face in 0..6 {
            for (x, y) in [(0, 0), (3, 5), (7, 7)] {
                let dir = texel_to_direction(face, x, y, size);
                let (f, u, v) = direction_to_face(dir);
                assert_eq!(f, face);
                let tx = ((u + 1.0) * 0.5 * size as f32) as usize;
                let ty = ((v + 1.0) * 0.5 * size as f32) as usize;
                assert_eq!((tx, ty), (x, y), "face {face}");
            }
        }
    }

    #[test]
    fn equirect_uv_of_axes() {
        let up = direction_to_equirect(Vec3::new(0.0, 1.0, 0.0));
        assert!((up.y - 1.0).abs() < 1e-6);
        let horizon = direction_to_equirect(Vec3::new(1.0, 0.0, 0.0));
        assert!((horizon.x - 0.5).abs() < 1e-6);
        assert!((horizon.y - 0.5).abs() < 1e-6);
    }
}
