/// Light sources and Lambert shading
use nalgebra::Vector3;

use crate::config::LightingConfig;

/// Linear RGB color, channels nominally in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// From a packed 0xRRGGBB value
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self::new(channel(16), channel(8), channel(0))
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.r * factor, self.g * factor, self.b * factor)
    }

    pub fn luminance(&self) -> f32 {
        0.2126 * self.r + 0.7152 * self.g + 0.0722 * self.b
    }
}

impl std::ops::Add for Color {
    type Output = Color;

    fn add(self, other: Color) -> Color {
        Color::new(self.r + other.r, self.g + other.g, self.b + other.b)
    }
}

/// A light in the scene.
///
/// Directional lights shine from `position` toward the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Ambient {
        color: Color,
        intensity: f32,
    },
    Directional {
        color: Color,
        intensity: f32,
        position: Vector3<f32>,
    },
}

impl Light {
    /// Ambient fill plus a key light and a weaker fill light on the opposite side
    pub fn rig(config: &LightingConfig) -> Vec<Light> {
        let color = Color::from_hex(config.color);
        vec![
            Light::Ambient {
                color,
                intensity: config.ambient_intensity,
            },
            Light::Directional {
                color,
                intensity: config.key_intensity,
                position: Vector3::from(config.key_position),
            },
            Light::Directional {
                color,
                intensity: config.fill_intensity,
                position: Vector3::from(config.fill_position),
            },
        ]
    }

    pub fn intensity(&self) -> f32 {
        match *self {
            Light::Ambient { intensity, .. } | Light::Directional { intensity, .. } => intensity,
        }
    }

    /// Light arriving at a surface with unit `normal`
    pub fn irradiance(&self, normal: &Vector3<f32>) -> Color {
        match *self {
            Light::Ambient { color, intensity } => color.scaled(intensity),
            Light::Directional {
                color,
                intensity,
                position,
            } => {
                let Some(direction) = position.try_normalize(1e-12) else {
                    return Color::BLACK;
                };
                color.scaled(intensity * normal.dot(&direction).max(0.0))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_rig_has_ambient_and_two_directionals() {
        let lights = Light::rig(&LightingConfig::default());
        assert_eq!(lights.len(), 3);
        assert!(matches!(lights[0], Light::Ambient { intensity, .. } if intensity == 0.8));

        let (key, fill) = match (lights[1], lights[2]) {
            (
                Light::Directional { intensity: a, position: pa, .. },
                Light::Directional { intensity: b, position: pb, .. },
            ) => ((a, pa), (b, pb)),
            _ => panic!("expected two directional lights"),
        };
        assert_eq!(key.0, 1.0);
        assert_eq!(fill.0, 0.5);
        // Opposing sides on the horizontal plane
        assert!(key.1.x * fill.1.x < 0.0 && key.1.z * fill.1.z < 0.0);
    }

    #[test]
    fn directional_light_ignores_back_faces() {
        let light = Light::Directional {
            color: Color::WHITE,
            intensity: 1.0,
            position: Vector3::new(0.0, 0.0, 5.0),
        };
        assert_relative_eq!(light.irradiance(&Vector3::z()).r, 1.0);
        assert_eq!(light.irradiance(&-Vector3::z()), Color::BLACK);
    }

    #[test]
    fn hex_white_is_unit() {
        assert_eq!(Color::from_hex(0xffffff), Color::WHITE);
        assert_relative_eq!(Color::WHITE.luminance(), 1.0, epsilon = 1e-6);
    }
}
