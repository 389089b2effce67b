//! Scene lighting for the 3D preview
//!
//! The preview uses a fixed studio setup: soft ambient light plus a key
//! light from the upper front-right and a dimmer fill from the opposite side.
//! Shading is flat (one normal per triangle), which reads well on coin scans.

use cgmath::{InnerSpace, Vector3};

/// Ambient light intensity
const AMBIENT_INTENSITY: f32 = 0.6;

/// A light infinitely far away, shining along a fixed direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Unit vector pointing from the scene towards the light
    pub direction: Vector3<f32>,
    pub intensity: f32,
}

impl DirectionalLight {
    /// A light placed at `position`, aimed at the origin
    pub fn at(position: Vector3<f32>, intensity: f32) -> Self {
        Self {
            direction: position.normalize(),
            intensity,
        }
    }
}

/// Ambient term plus two directional lights
#[derive(Debug, Clone, PartialEq)]
pub struct Lighting {
    pub ambient: f32,
    pub lights: [DirectionalLight; 2],
}

impl Lighting {
    /// Key light from (1, 1, 1), fill light from (-1, -1, -1)
    pub fn studio() -> Self {
        Self {
            ambient: AMBIENT_INTENSITY,
            lights: [
                DirectionalLight::at(Vector3::new(1.0, 1.0, 1.0), 0.8),
                DirectionalLight::at(Vector3::new(-1.0, -1.0, -1.0), 0.4),
            ],
        }
    }

    /// Lambert-shade a base colour for a surface facing `normal`
    pub fn shade(&self, normal: Vector3<f32>, base: [f32; 3]) -> [f32; 3] {
        let diffuse: f32 = self
            .lights
            .iter()
            .map(|light| normal.dot(light.direction).max(0.0) * light.intensity)
            .sum();
        let intensity = self.ambient + diffuse;

        base.map(|channel| (channel * intensity).clamp(0.0, 1.0))
    }
}

impl Default for Lighting {
    fn default() -> Self {
        Self::studio()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_facing_away_gets_ambient_only() {
        let lighting = Lighting {
            ambient: 0.5,
            lights: [
                DirectionalLight::at(Vector3::new(0.0, 0.0, 1.0), 1.0),
                DirectionalLight::at(Vector3::new(0.0, 0.0, 1.0), 0.0),
            ],
        };

        let lit = lighting.shade(Vector3::new(0.0, 0.0, -1.0), [0.8, 0.4, 0.2]);
        assert_eq!(lit, [0.4, 0.2, 0.1]);
    }

    #[test]
    fn test_shading_is_clamped() {
        let lighting = Lighting::studio();
        let toward_key = Vector3::new(1.0, 1.0, 1.0).normalize();

        let lit = lighting.shade(toward_key, [1.0, 1.0, 1.0]);
        assert_eq!(lit, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_key_light_is_brighter_than_fill() {
        let lighting = Lighting::studio();
        let key_side = lighting.shade(Vector3::new(1.0, 1.0, 1.0).normalize(), [0.3, 0.3, 0.3]);
        let fill_side = lighting.shade(Vector3::new(-1.0, -1.0, -1.0).normalize(), [0.3, 0.3, 0.3]);
        assert!(key_side[0] > fill_side[0]);
    }
}
