//! Pure attenuation math turning light/pixel geometry into factors in
//! [0, 1]. All functions are stateless; positions are expected in
//! aspect-adjusted normalized space (see [`aspect_adjust`]).

// pbrt
use crate::core::delight::{smoothstep, Float, INV_PI};
use crate::core::geometry::{nrm2_dot_vec2, vec2_dot, Normal2f, Point2f, Vector2f};

/// Rescale the y axis so that distances measured between adjusted
/// points are isotropic in screen pixels. Without this a radial
/// falloff turns elliptical on non-square displays. Must be applied
/// uniformly to light and pixel positions before any distance or
/// direction is taken.
pub fn aspect_adjust(p: &Point2f, aspect_ratio: Float) -> Point2f {
    Point2f {
        x: p.x,
        y: p.y * (1.0 as Float / aspect_ratio),
    }
}

/// Quadratic radial attenuation: 1 at the light position, 0 at and
/// beyond `radius`, monotonically non-increasing in between. Both
/// `dist` and `radius` are in normalized units; a non-positive radius
/// extinguishes the light everywhere.
pub fn radial_falloff(dist: Float, radius: Float) -> Float {
    if radius <= 0.0 as Float {
        return 0.0 as Float;
    }
    let d: Float = (1.0 as Float - dist / radius).max(0.0 as Float);
    d * d
}

/// Smooth angular cutoff for a cone light. `facing` is the light's
/// facing unit vector, `from_light` the unit direction from the light
/// towards the pixel; the cone opens along `facing` with full width
/// `angular_width` radians. A width of 0 means omnidirectional.
pub fn angular_falloff(facing: &Vector2f, from_light: &Vector2f, angular_width: Float) -> Float {
    if angular_width == 0.0 as Float {
        return 1.0 as Float;
    }
    let cos_theta: Float = vec2_dot(facing, from_light);
    smoothstep(
        1.0 as Float - angular_width * INV_PI,
        1.0 as Float,
        cos_theta,
    )
}

/// Lambertian term: how squarely the surface faces the light.
/// `to_light` is the unit direction from the pixel towards the light.
/// The normal is used as sampled; a zero normal yields 0.
pub fn lambert_falloff(n: &Normal2f, to_light: &Vector2f) -> Float {
    nrm2_dot_vec2(n, to_light).max(0.0 as Float)
}
