//! Positioned lights with radial, angular and normal-based falloff.
//! A `PointLight` with an angular width of 0 is omnidirectional; with
//! a width in (0, π] it becomes a cone opening along its direction
//! angle.

// std
use std::f32::consts::PI;
// pbrt
use crate::core::delight::{Float, Spectrum};
use crate::core::error::Error;
use crate::core::falloff::{angular_falloff, aspect_adjust, lambert_falloff, radial_falloff};
use crate::core::geometry::{pnt2_distance, vec2_from_angle, Normal2f, Point2f, Point2i, Vector2f};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointLight {
    /// Position in pixel coordinates of the low-resolution buffers.
    pub position: Point2f,
    /// Influence radius in pixels; scales the radial falloff.
    pub radius: Float,
    pub color: Spectrum,
    pub intensity: Float,
    /// Glow added regardless of distance, angle and surface normal.
    pub volumetric_intensity: Float,
    /// Facing angle in radians.
    pub direction: Float,
    /// Full cone width in radians, in [0, π]. 0 means
    /// omnidirectional.
    pub angular_width: Float,
}

impl PointLight {
    pub fn new(position: Point2f, radius: Float) -> Self {
        PointLight {
            position,
            radius,
            color: Spectrum::new(1.0),
            intensity: 1.0,
            volumetric_intensity: 0.5,
            direction: 0.0,
            angular_width: 0.4,
        }
    }
    pub fn with_color(mut self, color: Spectrum) -> Self {
        self.color = color;
        self
    }
    pub fn with_intensity(mut self, intensity: Float) -> Self {
        self.intensity = intensity;
        self
    }
    pub fn with_volumetric_intensity(mut self, volumetric_intensity: Float) -> Self {
        self.volumetric_intensity = volumetric_intensity;
        self
    }
    pub fn with_direction(mut self, direction: Float) -> Self {
        self.direction = direction;
        self
    }
    pub fn with_angular_width(mut self, angular_width: Float) -> Self {
        self.angular_width = angular_width;
        self
    }
    /// Range-check every field. Out-of-range values are reported,
    /// never clamped.
    pub fn validate(&self) -> Result<(), Error> {
        if self.position.has_nans() {
            return Err(Error::InvalidParameter {
                name: "position",
                value: Float::NAN,
            });
        }
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(Error::InvalidParameter {
                name: "radius",
                value: self.radius,
            });
        }
        if self.color.has_nans() {
            return Err(Error::InvalidParameter {
                name: "color",
                value: Float::NAN,
            });
        }
        if !self.intensity.is_finite() || self.intensity < 0.0 {
            return Err(Error::InvalidParameter {
                name: "intensity",
                value: self.intensity,
            });
        }
        if !self.volumetric_intensity.is_finite() || self.volumetric_intensity < 0.0 {
            return Err(Error::InvalidParameter {
                name: "volumetric_intensity",
                value: self.volumetric_intensity,
            });
        }
        if !self.direction.is_finite() {
            return Err(Error::InvalidParameter {
                name: "direction",
                value: self.direction,
            });
        }
        if !self.angular_width.is_finite() || self.angular_width < 0.0 || self.angular_width > PI {
            return Err(Error::InvalidParameter {
                name: "angular_width",
                value: self.angular_width,
            });
        }
        Ok(())
    }
}

/// Per-light parameter block the accumulation loop consumes: position
/// normalized to the buffer and aspect-adjusted, direction resolved
/// to a unit vector, radius normalized by buffer width. Built once
/// per light per frame.
#[derive(Debug, Copy, Clone)]
pub struct PackedLight {
    p: Point2f,
    color: Spectrum,
    intensity: Float,
    volumetric_intensity: Float,
    dir: Vector2f,
    angular_width: Float,
    radius: Float,
}

impl PackedLight {
    pub fn pack(light: &PointLight, resolution: Point2i) -> Self {
        let aspect_ratio: Float = resolution.x as Float / resolution.y as Float;
        let p: Point2f = Point2f {
            x: light.position.x / resolution.x as Float,
            y: light.position.y / resolution.y as Float,
        };
        PackedLight {
            p: aspect_adjust(&p, aspect_ratio),
            color: light.color,
            intensity: light.intensity,
            volumetric_intensity: light.volumetric_intensity,
            dir: vec2_from_angle(light.direction),
            angular_width: light.angular_width,
            radius: light.radius / resolution.x as Float,
        }
    }
    /// Light arriving at a pixel: the Lambertian surface term plus
    /// the unconditional volumetric glow. `p` is the pixel position
    /// in aspect-adjusted normalized space, `n` and `presence` come
    /// out of the normal buffer.
    pub fn contribution(
        &self,
        p: &Point2f,
        color_sample: &Spectrum,
        n: &Normal2f,
        presence: Float,
    ) -> Spectrum {
        // the glow is independent of every falloff term, so an
        // intensity of 0 still leaves a visible volume
        let mut l: Spectrum = self.color * self.volumetric_intensity;
        let dist: Float = pnt2_distance(&self.p, p);
        let radial: Float = radial_falloff(dist, self.radius);
        let angular: Float;
        let lambert: Float;
        if dist > 0.0 as Float {
            let to_light: Vector2f = (self.p - p) / dist;
            angular = angular_falloff(&self.dir, &-to_light, self.angular_width);
            lambert = lambert_falloff(n, &to_light);
        } else {
            // the pixel sits on the light itself, direction is
            // undefined
            angular = 1.0 as Float;
            lambert = 1.0 as Float;
        }
        let final_intensity: Float = self.intensity * radial * angular;
        l += self.color * final_intensity * *color_sample * (lambert * presence);
        l
    }
}
