use cgmath::{Vector2 as Vec2, Vector3 as Vec3};
use std::path::Path;

use crate::error::{Error, Result};
use crate::framebuffer::unpack_argb;

/// 纹素按 ARGB8888 存储，与帧缓冲一致
pub struct Texture {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u32>,
}

impl Texture {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0xFFFFFFFF; width * height],
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let img = image::open(path)
            .map_err(|source| Error::Image {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::EmptyTexture);
        }

        let data = img
            .pixels()
            .map(|pixel| {
                ((pixel[3] as u32) << 24)
                    | ((pixel[0] as u32) << 16)
                    | ((pixel[1] as u32) << 8)
                    | (pixel[2] as u32)
            })
            .collect();

        Ok(Texture {
            width: width as usize,
            height: height as usize,
            data,
        })
    }

    /// 双线性采样，UV(0,0) 对应纹理左下角。U 方向环绕，V 方向夹紧
    pub fn sample_bilinear(&self, uv: Vec2<f32>) -> Vec3<f32> {
        let u = uv.x.rem_euclid(1.0);
        let v = uv.y.clamp(0.0, 1.0);

        let x = u * self.width as f32 - 0.5;
        let y = (1.0 - v) * self.height as f32 - 0.5;

        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;

        let wrap_x = |x: f32| (x as i64).rem_euclid(self.width as i64) as usize;
        let clamp_y = |y: f32| (y.max(0.0) as usize).min(self.height - 1);

        let (xa, xb) = (wrap_x(x0), wrap_x(x0 + 1.0));
        let (ya, yb) = (clamp_y(y0), clamp_y(y0 + 1.0));

        let c00 = self.get_pixel_color(xa, ya);
        let c10 = self.get_pixel_color(xb, ya);
        let c01 = self.get_pixel_color(xa, yb);
        let c11 = self.get_pixel_color(xb, yb);

        let top = c00 * (1.0 - fx) + c10 * fx;
        let bottom = c01 * (1.0 - fx) + c11 * fx;
        top * (1.0 - fy) + bottom * fy
    }

    fn get_pixel_color(&self, x: usize, y: usize) -> Vec3<f32> {
        unpack_argb(self.data[y * self.width + x])
    }
}
