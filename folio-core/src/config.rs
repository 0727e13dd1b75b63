/// Viewer configuration
///
/// Every field has a default matching the stock hero viewer, so a config
/// file only needs to name what it overrides.
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Distance from the origin along +Z
    pub distance: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 50.0,
            near: 0.1,
            far: 1000.0,
            distance: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// 0xRRGGBB, shared by all three lights
    pub color: u32,
    pub ambient_intensity: f32,
    pub key_intensity: f32,
    pub key_position: [f32; 3],
    pub fill_intensity: f32,
    pub fill_position: [f32; 3],
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            color: 0xffffff,
            ambient_intensity: 0.8,
            key_intensity: 1.0,
            key_position: [5.0, 5.0, 5.0],
            fill_intensity: 0.5,
            fill_position: [-5.0, 5.0, -5.0],
        }
    }
}

/// Idle spin-and-bob animation.
///
/// Time advances by `time_step` per frame, not by wall-clock delta, so the
/// animation runs faster on high refresh-rate displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub time_step: f32,
    /// Radians of Y rotation per unit of time
    pub spin_rate: f32,
    pub bob_amplitude: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            time_step: 0.01,
            spin_rate: 0.3,
            bob_amplitude: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub camera: CameraConfig,
    pub lighting: LightingConfig,
    pub animation: AnimationConfig,
    /// Largest dimension of a normalized model
    pub target_size: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            lighting: LightingConfig::default(),
            animation: AnimationConfig::default(),
            target_size: 3.0,
        }
    }
}

impl ViewerConfig {
    /// Read a JSON config file and validate it
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let camera = &self.camera;
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.fov_degrees must be in (0, 180), got {}",
                camera.fov_degrees
            )));
        }
        if !(camera.near > 0.0 && camera.far > camera.near) {
            return Err(ConfigError::Invalid(format!(
                "camera clip planes must satisfy 0 < near < far, got near={} far={}",
                camera.near, camera.far
            )));
        }
        if !(self.target_size > 0.0 && self.target_size.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "target_size must be positive, got {}",
                self.target_size
            )));
        }
        if !(self.animation.time_step >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "animation.time_step must not be negative, got {}",
                self.animation.time_step
            )));
        }
        let lighting = &self.lighting;
        for (name, value) in [
            ("ambient_intensity", lighting.ambient_intensity),
            ("key_intensity", lighting.key_intensity),
            ("fill_intensity", lighting.fill_intensity),
        ] {
            if !(value >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "lighting.{name} must not be negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ViewerConfig::from_json(r#"{ "camera": { "fov_degrees": 35.0 } }"#).unwrap();
        assert_eq!(config.camera.fov_degrees, 35.0);
        assert_eq!(config.camera.distance, 5.0);
        assert_eq!(config.lighting, LightingConfig::default());
        assert_eq!(config.target_size, 3.0);
    }

    #[test]
    fn rejects_inverted_clip_planes() {
        let err = ViewerConfig::from_json(r#"{ "camera": { "near": 10.0, "far": 1.0 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_target_size() {
        let err = ViewerConfig::from_json(r#"{ "target_size": 0.0 }"#).unwrap_err();
        assert!(err.to_string().contains("target_size"));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "animation": {{ "spin_rate": 1.5 }} }}"#).unwrap();

        let config = ViewerConfig::load(file.path()).unwrap();
        assert_eq!(config.animation.spin_rate, 1.5);
        assert_eq!(config.animation.time_step, 0.01);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ViewerConfig::load(Path::new("/nonexistent/folio.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
