/// Viewer configuration
///
/// Read from `meshview.toml` in the working directory, or from the file
/// given with `--config`. Every section is optional.
use meshview_core::{Camera, TransformSpeeds};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::framebuffer::ColorMode;

/// Config file looked up when none is given explicitly.
pub const DEFAULT_CONFIG_FILE: &str = "meshview.toml";

/// Spacing between models given on the command line.
pub const OBJECT_SPACING: f32 = 3.0;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// All viewer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub speeds: TransformSpeeds,
    pub light: LightConfig,
    pub camera: CameraConfig,
    pub render: RenderConfig,
    pub input: InputConfig,
    /// Write logs here instead of stderr.
    pub log_file: Option<PathBuf>,
    pub objects: Vec<ObjectConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub target_fps: u32,
    pub color: ColorMode,
    /// How long the help overlay stays up.
    pub help_seconds: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Terminals without release events: how long a key counts as held
    /// after its last press or autorepeat.
    pub hold_window_ms: u64,
}

/// One model to load at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub position: [f32; 3],
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            speeds: TransformSpeeds::default(),
            light: LightConfig::default(),
            camera: CameraConfig::default(),
            render: RenderConfig::default(),
            input: InputConfig::default(),
            log_file: None,
            objects: vec![
                ObjectConfig {
                    path: PathBuf::from("assets/cube.obj"),
                    position: [-1.5, 0.0, 0.0],
                },
                ObjectConfig {
                    path: PathBuf::from("assets/pyramid.obj"),
                    position: [1.5, 0.0, 0.0],
                },
            ],
        }
    }
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            position: [5.0, 5.0, 5.0],
            color: [1.0, 1.0, 1.0],
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 5.0],
            target: [0.0, 0.0, 0.0],
            fov_degrees: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            target_fps: 30,
            color: ColorMode::default(),
            help_seconds: 6.0,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { hold_window_ms: 200 }
    }
}

impl ViewerConfig {
    /// Load `path`, or `meshview.toml` if present, or the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Replace the object list with `paths`, spaced along X and centred.
    pub fn set_objects_from_paths(&mut self, paths: Vec<PathBuf>) {
        let count = paths.len();
        let first = -(count.saturating_sub(1) as f32) * OBJECT_SPACING / 2.0;
        self.objects = paths
            .into_iter()
            .enumerate()
            .map(|(i, path)| ObjectConfig {
                path,
                position: [first + i as f32 * OBJECT_SPACING, 0.0, 0.0],
            })
            .collect();
    }
}

impl LightConfig {
    pub fn position(&self) -> Vector3<f32> {
        Vector3::from(self.position)
    }

    pub fn color(&self) -> Vector3<f32> {
        Vector3::from(self.color)
    }
}

impl CameraConfig {
    /// A camera for a viewport of `width` x `height` square pixels.
    pub fn camera(&self, width: u32, height: u32) -> Camera {
        let mut camera = Camera::new(width, height);
        camera.position = Point3::from(self.position);
        camera.target = Point3::from(self.target);
        camera.fov = self.fov_degrees.to_radians();
        camera.near = self.near;
        camera.far = self.far;
        camera
    }
}

impl RenderConfig {
    pub fn frame_time(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.target_fps.max(1) as f32)
    }

    pub fn help_duration(&self) -> Duration {
        Duration::from_secs_f32(self.help_seconds.max(0.0))
    }
}

impl InputConfig {
    pub fn hold_window(&self) -> Duration {
        Duration::from_millis(self.hold_window_ms)
    }
}

impl ObjectConfig {
    pub fn position(&self) -> Vector3<f32> {
        Vector3::from(self.position)
    }
}
