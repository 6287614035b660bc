//! 帧循环驱动：每帧检测尺寸变化、更新立方体旋转、渲染场景。

use cgmath::Vector3 as Vec3;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::camera::PerspectiveCamera;
use crate::config::{Config, parse_hex_color};
use crate::cube_map::CubeMap;
use crate::error::Result;
use crate::framebuffer::pack_argb;
use crate::geometry::Geometry;
use crate::loader::BackgroundLoad;
use crate::renderer::Renderer;
use crate::scene::{DirectionalLight, Mesh, MeshId, Scene};
use crate::surface::Surface;
use crate::vertex::Material;

/// 第 index 个立方体在 seconds 时刻的旋转角（弧度）
pub fn rotation_for(index: usize, seconds: f32) -> f32 {
    let speed = 1.0 + index as f32 * 0.1;
    seconds * speed
}

/// 显示尺寸与缓冲区尺寸不同则调整缓冲区和相机宽高比。
/// 返回是否发生了调整；显示尺寸为 0 时跳过。
pub fn resize_renderer_to_display_size(
    renderer: &mut Renderer,
    camera: &mut PerspectiveCamera,
    display: (usize, usize),
) -> bool {
    let (width, height) = display;
    if width == 0 || height == 0 {
        return false;
    }
    if renderer.size() == (width, height) {
        return false;
    }

    renderer.set_size(width, height);
    camera.aspect = width as f32 / height as f32;
    camera.update_projection_matrix();
    tracing::debug!(width, height, aspect = camera.aspect, "渲染尺寸已调整");
    true
}

/// 循环的时间来源，返回自循环开始以来的毫秒数
pub enum Ticker {
    /// 真实时间，节奏由窗口的目标帧率决定
    Realtime(Option<Instant>),
    /// 固定步长，第 n 帧的时间戳为 n * step_ms
    Fixed { step_ms: f64, frame: u64 },
}

impl Ticker {
    pub fn realtime() -> Self {
        Ticker::Realtime(None)
    }

    pub fn fixed(step_ms: f64) -> Self {
        Ticker::Fixed { step_ms, frame: 0 }
    }

    pub fn next_timestamp(&mut self) -> f64 {
        match self {
            Ticker::Realtime(start) => {
                let start = *start.get_or_insert_with(Instant::now);
                start.elapsed().as_secs_f64() * 1000.0
            }
            Ticker::Fixed { step_ms, frame } => {
                let t = *frame as f64 * *step_ms;
                *frame += 1;
                t
            }
        }
    }
}

/// 可跨线程共享的取消标志
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// 应用上下文：场景图、相机、渲染器以及待应用的背景加载
pub struct App {
    pub renderer: Renderer,
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub cubes: Vec<MeshId>,
    pub background: Option<BackgroundLoad>,
}

impl App {
    /// 按配置搭建场景，背景贴图在后台开始加载
    pub fn from_config(config: &Config) -> Result<Self> {
        let window = &config.window;
        let cam = &config.camera;
        let mut camera = PerspectiveCamera::new(
            cam.fov,
            window.width as f32 / window.height.max(1) as f32,
            cam.near,
            cam.far,
        );
        camera.set_position(cam.position.into());
        camera.look_at(cam.target.into());

        let mut scene = Scene::new();
        scene.ambient = parse_hex_color(&config.ambient)?;
        scene.clear_color = pack_argb(parse_hex_color(&config.clear_color)?);

        let mut light = DirectionalLight::new(parse_hex_color(&config.light.color)?, config.light.intensity);
        light.position = config.light.position.into();
        light.target = config.light.target.into();
        scene.add_light(light);

        let [w, h, d] = config.cube_size;
        let geometry = Arc::new(Geometry::cube(w, h, d));
        tracing::debug!(triangles = geometry.triangles.len(), "立方体几何体已创建");
        let mut cubes = Vec::with_capacity(config.cubes.len());
        for cube in &config.cubes {
            let color = parse_hex_color(&cube.color)?;
            cubes.push(make_instance(&mut scene, &geometry, color, cube.x));
        }

        let mut renderer = Renderer::new(window.width, window.height);
        renderer.shading = config.shading;

        let background = config
            .skybox
            .path
            .as_ref()
            .map(|path| {
                tracing::info!(path = %path.display(), "开始后台加载天空盒");
                BackgroundLoad::spawn(path.clone(), config.skybox.face_size)
            });

        Ok(Self {
            renderer,
            scene,
            camera,
            cubes,
            background,
        })
    }

    /// 背景加载完成后，在当前线程上把结果写入场景。每次加载只生效一次
    pub fn apply_background(&mut self) {
        let Some(load) = self.background.as_mut() else {
            return;
        };
        if let Some(result) = load.poll() {
            self.install_background(result);
        }
    }

    /// 阻塞等待背景加载，超时则保持无背景继续
    pub fn wait_for_background(&mut self, timeout: Duration) {
        let Some(load) = self.background.as_mut() else {
            return;
        };
        match load.wait(timeout) {
            Some(result) => self.install_background(result),
            None => tracing::warn!(?timeout, "等待天空盒超时"),
        }
    }

    fn install_background(&mut self, result: Result<CubeMap>) {
        self.background = None;
        match result {
            Ok(cube_map) => {
                tracing::info!(face_size = cube_map.face_size, "天空盒已就绪");
                self.scene.background = Some(cube_map);
            }
            Err(err) => tracing::warn!("天空盒加载失败: {err}"),
        }
    }

    pub fn update_rotations(&mut self, seconds: f32) {
        for (index, &id) in self.cubes.iter().enumerate() {
            if let Some(mesh) = self.scene.mesh_mut(id) {
                let angle = rotation_for(index, seconds);
                mesh.rotation.x = angle;
                mesh.rotation.y = angle;
            }
        }
    }

    /// 单帧：应用背景 -> 调整尺寸 -> 更新旋转 -> 渲染并呈现
    pub fn tick<S: Surface>(&mut self, surface: &mut S, timestamp_ms: f64) -> Result<()> {
        let seconds = (timestamp_ms / 1000.0) as f32;

        self.apply_background();
        resize_renderer_to_display_size(&mut self.renderer, &mut self.camera, surface.display_size());
        self.update_rotations(seconds);

        self.renderer.render(&self.scene, &self.camera);
        surface.present(self.renderer.framebuffer())
    }

    /// 运行直到取消、窗口关闭或达到帧数上限，返回渲染的帧数
    pub fn run<S: Surface>(
        &mut self,
        surface: &mut S,
        ticker: &mut Ticker,
        cancel: &CancelFlag,
        max_frames: Option<u64>,
    ) -> Result<u64> {
        let mut frames = 0;
        while !cancel.is_cancelled() && surface.is_open() {
            if max_frames.is_some_and(|max| frames >= max) {
                break;
            }
            let t = ticker.next_timestamp();
            self.tick(surface, t)?;
            frames += 1;
            tracing::trace!(frame = frames, t, "帧完成");

            if surface.cancel_requested() {
                tracing::info!("收到退出请求");
                cancel.cancel();
            }
        }
        tracing::info!(frames, "帧循环结束");
        Ok(frames)
    }
}

fn make_instance(scene: &mut Scene, geometry: &Arc<Geometry>, color: Vec3<f32>, x: f32) -> MeshId {
    let mut mesh = Mesh::new(Arc::clone(geometry), Material::phong(color));
    mesh.position.x = x;
    scene.add_mesh(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::HeadlessSurface;
    use crate::texture::Texture;
    use std::sync::mpsc;

    fn config_without_skybox() -> Config {
        let mut config = Config::default();
        config.skybox.path = None;
        config.window.width = 64;
        config.window.height = 32;
        config
    }

    fn rotations(app: &App) -> Vec<(f32, f32)> {
        app.cubes
            .iter()
            .map(|&id| {
                let r = app.scene.mesh(id).unwrap().rotation;
                (r.x, r.y)
            })
            .collect()
    }

    #[test]
    fn rotation_speeds() {
        assert_eq!(rotation_for(0, 1.0), 1.0);
        assert_eq!(rotation_for(1, 1.0), 1.1);
        assert_eq!(rotation_for(2, 1.0), 1.2);
        assert_eq!(rotation_for(2, 0.0), 0.0);
    }

    #[test]
    fn resize_is_idempotent() {
        let mut renderer = Renderer::new(10, 10);
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 100.0);

        assert!(resize_renderer_to_display_size(&mut renderer, &mut camera, (800, 400)));
        assert_eq!(camera.aspect, 2.0);
        assert_eq!(renderer.size(), (800, 400));
        assert!(!camera.needs_projection_update());

        // 第二次不应有任何修改
        camera.aspect = 5.0;
        assert!(!resize_renderer_to_display_size(&mut renderer, &mut camera, (800, 400)));
        assert_eq!(camera.aspect, 5.0);
        assert_eq!(renderer.size(), (800, 400));
    }

    #[test]
    fn zero_sized_surface_skips_resize() {
        let mut renderer = Renderer::new(10, 10);
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 100.0);
        assert!(!resize_renderer_to_display_size(&mut renderer, &mut camera, (0, 400)));
        assert!(!resize_renderer_to_display_size(&mut renderer, &mut camera, (0, 0)));
        assert_eq!(renderer.size(), (10, 10));
        assert_eq!(camera.aspect, 1.0);
    }

    #[test]
    fn frames_rotate_cubes_over_time() {
        let mut app = App::from_config(&config_without_skybox()).unwrap();
        let xs: Vec<f32> = app
            .cubes
            .iter()
            .map(|&id| app.scene.mesh(id).unwrap().position.x)
            .collect();
        assert_eq!(xs, vec![0.0, -2.0, 2.0]);

        let mut surface = HeadlessSurface::new(64, 32);
        app.tick(&mut surface, 0.0).unwrap();
        assert_eq!(rotations(&app), vec![(0.0, 0.0); 3]);

        app.tick(&mut surface, 1000.0).unwrap();
        assert_eq!(rotations(&app), vec![(1.0, 1.0), (1.1, 1.1), (1.2, 1.2)]);
        assert_eq!(surface.presented, 2);
    }

    #[test]
    fn tick_resizes_before_rendering() {
        let mut app = App::from_config(&config_without_skybox()).unwrap();
        let mut surface = HeadlessSurface::new(800, 400).keeping_last_frame();

        app.tick(&mut surface, 16.0).unwrap();
        assert_eq!(app.camera.aspect, 2.0);
        let frame = surface.last_frame().unwrap();
        assert_eq!((frame.width, frame.height), (800, 400));

        surface.set_display_size(0, 0);
        app.tick(&mut surface, 32.0).unwrap();
        assert_eq!(app.renderer.size(), (800, 400));
    }

    /// 反复推进帧直到背景加载任务结束
    fn tick_until_loaded(app: &mut App, surface: &mut HeadlessSurface, t: &mut f64) {
        let start = std::time::Instant::now();
        while app.background.is_some() {
            assert!(start.elapsed() < Duration::from_secs(5));
            app.tick(surface, *t).unwrap();
            *t += 16.0;
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn background_is_applied_once_after_load() {
        let mut app = App::from_config(&config_without_skybox()).unwrap();
        let (release, gate) = mpsc::channel::<()>();
        app.background = Some(BackgroundLoad::from_fn(move || {
            gate.recv().ok();
            let mut tex = Texture::new(8, 4);
            tex.data.fill(0xFF336699);
            Ok(CubeMap::from_equirectangular(&tex))
        }));

        let mut surface = HeadlessSurface::new(64, 32).keeping_last_frame();
        let mut t = 0.0;
        for _ in 0..3 {
            app.tick(&mut surface, t).unwrap();
            t += 16.0;
        }
        assert!(app.scene.background.is_none());
        assert!(app.background.is_some());
        assert_eq!(surface.last_frame().unwrap().get_pixel(0, 0), Some(app.scene.clear_color));

        release.send(()).unwrap();
        tick_until_loaded(&mut app, &mut surface, &mut t);
        assert!(app.scene.background.is_some());

        for _ in 0..3 {
            app.tick(&mut surface, t).unwrap();
            t += 16.0;
        }
        assert!(app.background.is_none());
        assert_eq!(surface.last_frame().unwrap().get_pixel(0, 0), Some(0xFF336699));
    }

    #[test]
    fn failed_load_leaves_scene_without_background() {
        let mut config = config_without_skybox();
        config.skybox.path = Some("does/not/exist.jpg".into());
        let mut app = App::from_config(&config).unwrap();
        assert!(app.background.is_some());

        let mut surface = HeadlessSurface::new(64, 32);
        let mut t = 0.0;
        tick_until_loaded(&mut app, &mut surface, &mut t);

        app.tick(&mut surface, t).unwrap();
        assert!(app.scene.background.is_none());
        assert!(app.background.is_none());
    }

    #[test]
    fn waiting_installs_background_before_first_frame() {
        let mut app = App::from_config(&config_without_skybox()).unwrap();
        app.background = Some(BackgroundLoad::from_fn(|| {
            Ok(CubeMap::from_equirectangular(&Texture::new(8, 4)))
        }));

        app.wait_for_background(Duration::from_secs(5));
        assert!(app.background.is_none());
        assert!(app.scene.background.is_some());

        let mut surface = HeadlessSurface::new(64, 32).keeping_last_frame();
        app.tick(&mut surface, 0.0).unwrap();
        assert_eq!(surface.last_frame().unwrap().get_pixel(0, 0), Some(0xFFFFFFFF));
    }

    #[test]
    fn run_stops_at_frame_limit_or_cancel() {
        let mut app = App::from_config(&config_without_skybox()).unwrap();
        let mut surface = HeadlessSurface::new(64, 32);
        let cancel = CancelFlag::new();

        let frames = app
            .run(&mut surface, &mut Ticker::fixed(1000.0), &cancel, Some(3))
            .unwrap();
        assert_eq!(frames, 3);
        // 最后一帧的时间戳为 2000ms
        assert_eq!(rotations(&app)[0], (2.0, 2.0));

        cancel.cancel();
        let frames = app
            .run(&mut surface, &mut Ticker::fixed(16.0), &cancel, None)
            .unwrap();
        assert_eq!(frames, 0);
    }

    /// 呈现指定帧数后请求退出，相当于窗口里按下 Escape
    struct QuitAfter {
        inner: HeadlessSurface,
        frames: usize,
    }

    impl Surface for QuitAfter {
        fn display_size(&self) -> (usize, usize) {
            self.inner.display_size()
        }

        fn is_open(&self) -> bool {
            self.inner.is_open()
        }

        fn present(&mut self, framebuffer: &crate::framebuffer::FrameBuffer) -> Result<()> {
            self.inner.present(framebuffer)
        }

        fn cancel_requested(&self) -> bool {
            self.inner.presented >= self.frames
        }
    }

    #[test]
    fn quit_request_sets_cancel_flag() {
        let mut app = App::from_config(&config_without_skybox()).unwrap();
        let mut surface = QuitAfter {
            inner: HeadlessSurface::new(64, 32),
            frames: 2,
        };
        let cancel = CancelFlag::new();

        let frames = app
            .run(&mut surface, &mut Ticker::fixed(16.0), &cancel, None)
            .unwrap();
        assert_eq!(frames, 2);
        assert!(cancel.is_cancelled());
        assert_eq!(surface.inner.presented, 2);
    }

    #[test]
    fn invalid_cube_color_is_rejected() {
        let mut config = config_without_skybox();
        config.cubes[1].color = "purple".into();
        assert!(App::from_config(&config).is_err());
    }
}
