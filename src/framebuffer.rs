use cgmath::Vector3 as Vec3;
use std::path::Path;

use crate::error::Result;

/// 深度缓冲的清除值，对应 NDC 深度映射到 [0, 1] 之后的远平面
pub const FAR_DEPTH: f32 = 1.0;

#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u32>,
    pub depth: Vec<f32>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        FrameBuffer {
            width,
            height,
            data: vec![0; width * height],
            depth: vec![FAR_DEPTH; width * height],
        }
    }

    pub fn clear(&mut self, color: u32) {
        self.data.fill(color);
        self.depth.fill(FAR_DEPTH);
    }

    pub fn clear_depth(&mut self) {
        self.depth.fill(FAR_DEPTH);
    }

    /// 重新分配缓冲区，内容被丢弃
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.data = vec![0; width * height];
        self.depth = vec![FAR_DEPTH; width * height];
    }

    pub fn put_pixel(&mut self, x: usize, y: usize, color: u32, depth: f32) {
        if x < self.width && y < self.height {
            let idx = y * self.width + x;
            if depth < self.depth[idx] {
                self.data[idx] = color;
                self.depth[idx] = depth;
            }
        }
    }

    #[cfg(test)]
    pub fn get_pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.data[y * self.width + x])
        } else {
            None
        }
    }

    pub fn save_to_image(&self, filepath: &Path) -> Result<()> {
        use image::{ImageBuffer, Rgba};

        let mut img = ImageBuffer::new(self.width as u32, self.height as u32);

        for y in 0..self.height {
            for x in 0..self.width {
                let color = self.data[y * self.width + x];
                let a = ((color >> 24) & 0xFF) as u8;
                let r = ((color >> 16) & 0xFF) as u8;
                let g = ((color >> 8) & 0xFF) as u8;
                let b = (color & 0xFF) as u8;

                img.put_pixel(x as u32, y as u32, Rgba([r, g, b, a]));
            }
        }

        img.save(filepath)?;
        Ok(())
    }
}

/// 0.0~1.0 的 RGB 打包为 ARGB8888（A 固定为 FF）
pub fn pack_argb(color: Vec3<f32>) -> u32 {
    let r = (color.x.clamp(0.0, 1.0) * 255.0).round() as u32;
    let g = (color.y.clamp(0.0, 1.0) * 255.0).round() as u32;
    let b = (color.z.clamp(0.0, 1.0) * 255.0).round() as u32;
    0xFF000000 | r << 16 | g << 8 | b
}

pub fn unpack_argb(color: u32) -> Vec3<f32> {
    Vec3::new(
        ((color >> 16) & 0xFF) as f32 / 255.0,
        ((color >> 8) & 0xFF) as f32 / 255.0,
        (color & 0xFF) as f32 / 255.0,
    )
}
