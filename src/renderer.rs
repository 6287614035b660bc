pub mod clip;
pub mod fragment_shader;
pub mod vertex_shader;

use cgmath::{InnerSpace, Matrix, Matrix4 as Mat4, SquareMatrix, Vector2 as Vec2};
use rayon::prelude::*;
use serde::Deserialize;

use crate::camera::PerspectiveCamera;
use crate::cube_map::CubeMap;
use crate::framebuffer::{FrameBuffer, pack_argb};
use crate::rasterizer;
use crate::scene::Scene;
use crate::vertex::{ClipSpaceVertex, Material, RasterPoint, RasterTriangle, Triangle};

use self::clip::{Clipper, NearPlaneClipper};
use self::fragment_shader::{FragmentData, FragmentShader, NormalDebugShader, PhongShader};
use self::vertex_shader::{DefaultVertexShader, VertexShader, VertexShaderUniforms};

pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shading {
    #[default]
    Phong,
    Normal,
}

pub struct Renderer {
    pub(crate) framebuffer: FrameBuffer,
    pub(crate) viewport: Viewport,
    pub shading: Shading,
}

impl Renderer {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            framebuffer: FrameBuffer::new(w, h),
            viewport: Viewport {
                x: 0,
                y: 0,
                w: w as i32,
                h: h as i32,
            },
            shading: Shading::default(),
        }
    }

    /// 内部缓冲区尺寸
    pub fn size(&self) -> (usize, usize) {
        (self.framebuffer.width, self.framebuffer.height)
    }

    pub fn set_size(&mut self, w: usize, h: usize) {
        self.framebuffer.resize(w, h);
        self.viewport = Viewport {
            x: 0,
            y: 0,
            w: w as i32,
            h: h as i32,
        };
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    pub fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) {
        match &scene.background {
            Some(cube_map) => self.draw_background(cube_map, camera),
            None => self.framebuffer.clear(scene.clear_color),
        }
        self.framebuffer.clear_depth();

        let fragment_shader: Box<dyn FragmentShader + '_> = match self.shading {
            Shading::Phong => Box::new(PhongShader {
                lights: &scene.lights,
                ambient: scene.ambient,
            }),
            Shading::Normal => Box::new(NormalDebugShader),
        };

        let view_proj = camera.get_view_proj_mat();
        for mesh in &scene.meshes {
            let model = mesh.model_matrix();
            self.draw_mesh(
                &mesh.geometry.triangles,
                &model,
                &view_proj,
                &mesh.material,
                camera,
                &*fragment_shader,
            );
        }
    }

    // 按视线方向逐像素采样立方体贴图
    fn draw_background(&mut self, cube_map: &CubeMap, camera: &PerspectiveCamera) {
        let width = self.framebuffer.width;
        let height = self.framebuffer.height;
        if width == 0 || height == 0 {
            return;
        }

        self.framebuffer
            .data
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                let ndc_y = 1.0 - (y as f32 + 0.5) / height as f32 * 2.0;
                for (x, pixel) in row.iter_mut().enumerate() {
                    let ndc_x = (x as f32 + 0.5) / width as f32 * 2.0 - 1.0;
                    *pixel = cube_map.sample_argb(camera.ray_direction(ndc_x, ndc_y));
                }
            });
    }

    fn draw_mesh(
        &mut self,
        triangles: &[Triangle],
        model: &Mat4<f32>,
        view_proj: &Mat4<f32>,
        material: &Material,
        camera: &PerspectiveCamera,
        fragment_shader: &dyn FragmentShader,
    ) {
        // 缩放为 0 之类的不可逆矩阵，网格不可见
        let Some(inverse) = model.invert() else {
            return;
        };
        let normal_matrix = inverse.transpose();
        let mvp_matrix = view_proj * model;

        let vertex_shader = DefaultVertexShader;
        let clipper = NearPlaneClipper { near: camera.near };
        let uniforms = VertexShaderUniforms {
            model_matrix: model,
            mvp_matrix: &mvp_matrix,
            normal_matrix: &normal_matrix,
        };

        for triangle in triangles {
            // 阶段 1: 背面剔除
            let world_pos = (uniforms.model_matrix * triangle.vertices[0].pos.extend(1.0)).truncate();
            let view_dir = camera.position - world_pos;
            let tri_normal = (uniforms.normal_matrix * triangle.normal.extend(0.0)).truncate();
            if view_dir.dot(tri_normal) <= 0.0 {
                continue;
            }

            // 阶段 2: 顶点着色
            let clip_space_triangle = vertex_shader.shade_triangle(triangle, &uniforms);

            // 阶段 3: 裁剪
            for clipped in clipper.clip_triangle(&clip_space_triangle) {
                // 阶段 4: 屏幕映射
                let raster_triangle = self.viewport_transform(&clipped);

                // 阶段 5: 光栅化和像素着色
                self.rasterize_triangle(&raster_triangle, material, camera, fragment_shader);
            }
        }
    }

    fn viewport_transform(&self, clip_triangle: &[ClipSpaceVertex; 3]) -> RasterTriangle {
        let vertices = clip_triangle.map(|clip_v| {
            // 透视除法
            let ndc_pos = clip_v.position / clip_v.position.w;

            let screen_x = (ndc_pos.x + 1.0) * 0.5 * self.viewport.w as f32 + self.viewport.x as f32;
            let screen_y = self.viewport.h as f32 - (ndc_pos.y + 1.0) * 0.5 * self.viewport.h as f32
                + self.viewport.y as f32;

            RasterPoint {
                pos: Vec2::new(screen_x, screen_y),
                z: (ndc_pos.z + 1.0) * 0.5,
                world_pos: clip_v.world_pos,
                normal: clip_v.normal,
                color: clip_v.color,
            }
        });

        RasterTriangle { vertices }
    }

    fn rasterize_triangle(
        &mut self,
        triangle: &RasterTriangle,
        material: &Material,
        camera: &PerspectiveCamera,
        shader: &dyn FragmentShader,
    ) {
        let points = &triangle.vertices;
        let screen = [points[0].pos, points[1].pos, points[2].pos];
        let (min_x, min_y, max_x, max_y) = rasterizer::get_box(&screen);

        // 包围盒限制在缓冲区内
        let min_x = min_x.max(0);
        let min_y = min_y.max(0);
        let max_x = max_x.min(self.framebuffer.width as i32 - 1);
        let max_y = max_y.min(self.framebuffer.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                if !rasterizer::is_inside_triangle(&screen, &p) {
                    continue;
                }
                let Some(bary) = rasterizer::get_barycentric_coords(&screen, &p) else {
                    continue;
                };

                let depth = rasterizer::interpolate_depth(points, bary);
                if !(0.0..1.0).contains(&depth) {
                    continue;
                }
                // 提前深度测试，避免无用的着色
                let idx = y as usize * self.framebuffer.width + x as usize;
                if depth >= self.framebuffer.depth[idx] {
                    continue;
                }

                let fragment_data = FragmentData {
                    world_pos: rasterizer::interpolate_world_pos(points, bary),
                    normal: rasterizer::interpolate_normal(points, bary),
                    color: rasterizer::interpolate_color(points, bary),
                    material,
                    camera_pos: camera.position,
                };
                let color = pack_argb(shader.shade(fragment_data));

                self.framebuffer.put_pixel(x as usize, y as usize, color, depth);
            }
        }
    }
}
