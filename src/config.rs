use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use anyhow::{bail, Context, Result};
use image::Rgba;

use crate::gaze::{GazeNormalizer, GazePolicy};
use crate::mapper::ScreenMapper;
use crate::overlay::parse_hex;
use crate::types::Size;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tracking: TrackingConfig,
    pub gaze: GazeConfig,
    pub landmarks: LandmarkConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub tick_interval_ms: u64,
    pub detection_timeout_ms: u64, // 0 = wait forever
    pub not_ready_warn_after: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GazeConfig {
    pub policy: GazePolicy,
    pub hysteresis_margin: f32,
    pub capture_width: u32,
    pub capture_height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkConfig {
    pub eye_contour: String,
    pub iris: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub dot_width: f32,
    pub dot_height: f32,
    pub dot_color_hex: String,
    pub background_hex: String,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 60,
            detection_timeout_ms: 500,
            not_ready_warn_after: 50,
        }
    }
}

impl Default for GazeConfig {
    fn default() -> Self {
        Self {
            policy: GazePolicy::BoxRelative,
            hysteresis_margin: GazeNormalizer::DEFAULT_HYSTERESIS_MARGIN,
            capture_width: 720,
            capture_height: 720,
        }
    }
}

impl Default for LandmarkConfig {
    fn default() -> Self {
        Self {
            eye_contour: "eye-contour".to_string(),
            iris: "iris".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dot_width: 2.0,
            dot_height: 2.0,
            dot_color_hex: "#FF0000".to_string(),
            background_hex: "#00000000".to_string(),
        }
    }
}

impl TrackingConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn detection_timeout(&self) -> Option<Duration> {
        (self.detection_timeout_ms > 0).then(|| Duration::from_millis(self.detection_timeout_ms))
    }
}

impl GazeConfig {
    pub fn capture(&self) -> Size {
        Size::new(self.capture_width, self.capture_height)
    }

    pub fn normalizer(&self) -> GazeNormalizer {
        GazeNormalizer::new(self.policy, self.hysteresis_margin, self.capture())
    }
}

impl RenderConfig {
    pub fn mapper(&self) -> ScreenMapper {
        ScreenMapper::new(self.dot_width, self.dot_height)
    }

    pub fn dot_color(&self) -> Rgba<u8> {
        parse_hex(&self.dot_color_hex, Rgba([255, 0, 0, 255])) // Default Red
    }

    pub fn background(&self) -> Rgba<u8> {
        parse_hex(&self.background_hex, Rgba([0, 0, 0, 0]))
    }
}

impl AppConfig {
    pub const PATH: &'static str = "gaze-trail.json";

    /// Loads [`Self::PATH`], creating it with defaults when missing.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::PATH)
    }

    /// Reads `path`, falling back to defaults on a missing or unparsable file,
    /// then writes the result back so new fields show up in the file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            // Missing fields fall back to Default through #[serde(default)]
            match serde_json::from_str::<AppConfig>(&content) {
                Ok(c) => {
                    log::info!("Loaded configuration from {}", path.display());
                    c
                }
                Err(e) => {
                    log::warn!("Error parsing config {}: {}. Loading defaults.", path.display(), e);
                    Self::default()
                }
            }
        } else {
            log::info!("Configuration file not found. Creating default at {}", path.display());
            Self::default()
        };

        config.validate()?;
        config.save_to(path)?;

        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.tracking.tick_interval_ms == 0 {
            bail!("tracking.tick_interval_ms must be greater than zero");
        }
        if self.gaze.capture_width == 0 || self.gaze.capture_height == 0 {
            bail!(
                "gaze capture size must be non-zero, got {}x{}",
                self.gaze.capture_width,
                self.gaze.capture_height
            );
        }
        if !(self.render.dot_width > 0.0 && self.render.dot_height > 0.0) {
            bail!("render dot size must be positive");
        }
        if self.landmarks.eye_contour.is_empty() || self.landmarks.iris.is_empty() {
            bail!("landmark group names must not be empty");
        }
        Ok(())
    }
}
