mod camera;
mod config;
mod cube_map;
mod error;
mod frame_loop;
mod framebuffer;
mod geometry;
mod loader;
mod rasterizer;
mod renderer;
mod scene;
mod surface;
mod texture;
mod vertex;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::frame_loop::{App, CancelFlag, Ticker};
use crate::surface::{HeadlessSurface, WindowSurface};

#[derive(Parser)]
#[command(name = "skybox-cubes", about = "三个旋转的立方体 + 全景天空盒")]
struct Cli {
    /// 场景配置（JSON），缺省使用内置参数
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 不开窗口，离屏渲染
    #[arg(long)]
    headless: bool,

    /// 渲染指定帧数后退出（离屏模式缺省 60）
    #[arg(long)]
    frames: Option<u64>,

    /// 离屏模式下把最后一帧保存为图片
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 离屏模式下先等天空盒加载完成再开始
    #[arg(long)]
    wait_skybox: bool,

    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,
}

const HEADLESS_FRAMES: u64 = 60;
const HEADLESS_STEP_MS: f64 = 1000.0 / 60.0;
const SKYBOX_TIMEOUT: Duration = Duration::from_secs(60);

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("无法读取配置 {}", path.display()))?,
        None => Config::default(),
    };
    tracing::info!(cubes = config.cubes.len(), "配置加载完成");

    let mut app = App::from_config(&config).context("场景初始化失败")?;
    let cancel = CancelFlag::new();

    if cli.headless {
        run_headless(&cli, &config, &mut app, &cancel)
    } else {
        let window = &config.window;
        let mut surface = WindowSurface::new(&window.title, window.width, window.height, window.target_fps)
            .context("无法创建窗口")?;
        app.run(&mut surface, &mut Ticker::realtime(), &cancel, cli.frames)?;
        Ok(())
    }
}

fn run_headless(cli: &Cli, config: &Config, app: &mut App, cancel: &CancelFlag) -> Result<()> {
    if cli.wait_skybox {
        app.wait_for_background(SKYBOX_TIMEOUT);
    }

    let mut surface = HeadlessSurface::new(config.window.width, config.window.height);
    if cli.output.is_some() {
        surface = surface.keeping_last_frame();
    }

    let frames = cli.frames.unwrap_or(HEADLESS_FRAMES);
    app.run(&mut surface, &mut Ticker::fixed(HEADLESS_STEP_MS), cancel, Some(frames))?;

    if let (Some(path), Some(frame)) = (&cli.output, surface.last_frame()) {
        frame
            .save_to_image(path)
            .with_context(|| format!("无法保存 {}", path.display()))?;
        tracing::info!(path = %path.display(), "已保存最后一帧");
    }
    Ok(())
}
