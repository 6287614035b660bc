//! JSON 场景配置。所有字段都有默认值，缺省时退回到演示场景的原始参数。

use cgmath::Vector3 as Vec3;
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};

use crate::error::{Error, Result};
use crate::renderer::Shading;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub light: LightConfig,
    /// 环境光，原始场景没有环境光
    pub ambient: String,
    pub clear_color: String,
    pub shading: Shading,
    pub cube_size: [f32; 3],
    pub cubes: Vec<CubeConfig>,
    pub skybox: SkyboxConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: usize,
    pub height: usize,
    pub target_fps: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub color: String,
    pub intensity: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

#[derive(Debug, Clone, Deserialize)]
pub struct CubeConfig {
    pub color: String,
    pub x: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SkyboxConfig {
    pub path: Option<PathBuf>,
    /// 立方体贴图面大小，缺省为全景图高度
    pub face_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            light: LightConfig::default(),
            ambient: "#000000".into(),
            clear_color: "#000000".into(),
            shading: Shading::Phong,
            cube_size: [1.0, 1.0, 1.0],
            cubes: vec![
                CubeConfig { color: "#44aa88".into(), x: 0.0 },
                CubeConfig { color: "#8844aa".into(), x: -2.0 },
                CubeConfig { color: "#aa8844".into(), x: 2.0 },
            ],
            skybox: SkyboxConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "skybox-cubes".into(),
            width: 800,
            height: 400,
            target_fps: 60,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 100.0,
            position: [0.0, 0.0, 3.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            color: "#ffffff".into(),
            intensity: 1.0,
            position: [-1.0, 2.0, 4.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

impl Default for SkyboxConfig {
    fn default() -> Self {
        Self {
            path: Some(PathBuf::from("./image/tears_of_steel_bridge_2k.jpg")),
            face_size: None,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// "#rrggbb" 或 "rrggbb" -> 0.0~1.0 的 RGB
pub fn parse_hex_color(s: &str) -> Result<Vec3<f32>> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::InvalidColor(s.to_string()));
    }
    let value = u32::from_str_radix(hex, 16).map_err(|_| Error::InvalidColor(s.to_string()))?;
    Ok(Vec3::new(
        ((value >> 16) & 0xFF) as f32 / 255.0,
        ((value >> 8) & 0xFF) as f32 / 255.0,
        (value & 0xFF) as f32 / 255.0,
    ))
}
