//! In order for objects in a scene to be visible, there must be a
//! source of illumination so that some light is reflected from them
//! to the camera sensor.
//!
//! - GlobalLight
//! - PointLight
//!
//! The **LightAccumulator** owns the active light set and turns a
//! color buffer plus a normal buffer into a lit output buffer: every
//! pixel sums the ambient term and the contribution of every active
//! light, additively, so the result does not depend on the order the
//! lights were added in.
//!
//! ```rust
//! use rs_delight::core::delight::Spectrum;
//! use rs_delight::core::geometry::Point2f;
//! use rs_delight::lights::point::PointLight;
//! use rs_delight::lights::LightAccumulator;
//!
//!     let mut accumulator = LightAccumulator::new();
//!     accumulator.set_global_light(Spectrum::rgb(1.0, 0.9, 0.8), 0.1).unwrap();
//!     let handle = accumulator
//!         .add_point_light(
//!             PointLight::new(Point2f { x: 140.0, y: 130.0 }, 150.0)
//!                 .with_color(Spectrum::rgb(1.0, 0.75, 0.5))
//!                 .with_intensity(2.0)
//!                 .with_angular_width(0.6),
//!         )
//!         .unwrap();
//!     println!("active lights: {:?}", accumulator.len());
//!     accumulator.remove_light(handle);
//! ```

pub mod ambient;
pub mod point;

// others
use smallvec::SmallVec;
// pbrt
use crate::blockqueue::TileQueue;
use crate::core::delight::{Float, Spectrum};
use crate::core::error::Error;
use crate::core::falloff::aspect_adjust;
use crate::core::film::Film;
use crate::core::geometry::{Point2f, Point2i};
use crate::core::texture::Texture;
use crate::lights::ambient::GlobalLight;
use crate::lights::point::{PackedLight, PointLight};

/// Upper bound on simultaneously active point lights. Adding beyond
/// it fails with [`Error::CapacityExceeded`].
pub const MAX_POINT_LIGHTS: usize = 10;

const TILE_SIZE: i32 = 16;

/// Opaque ticket identifying an added light, for later removal or
/// mutation. Handles are never reused within one accumulator.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LightHandle(u32);

pub struct LightAccumulator {
    global_light: Option<GlobalLight>,
    lights: SmallVec<[(LightHandle, PointLight); MAX_POINT_LIGHTS]>,
    next_id: u32,
}

impl Default for LightAccumulator {
    fn default() -> Self {
        LightAccumulator::new()
    }
}

impl LightAccumulator {
    pub fn new() -> Self {
        LightAccumulator {
            global_light: None,
            lights: SmallVec::new(),
            next_id: 0,
        }
    }
    /// Replace the ambient term.
    pub fn set_global_light(&mut self, color: Spectrum, intensity: Float) -> Result<(), Error> {
        if color.has_nans() {
            return Err(Error::InvalidParameter {
                name: "color",
                value: Float::NAN,
            });
        }
        if !intensity.is_finite() || intensity < 0.0 {
            return Err(Error::InvalidParameter {
                name: "intensity",
                value: intensity,
            });
        }
        self.global_light = Some(GlobalLight::new(color, intensity));
        Ok(())
    }
    pub fn clear_global_light(&mut self) {
        self.global_light = None;
    }
    pub fn global_light(&self) -> Option<&GlobalLight> {
        self.global_light.as_ref()
    }
    /// Validate and append a light to the active set. On failure the
    /// set is left unchanged.
    pub fn add_point_light(&mut self, light: PointLight) -> Result<LightHandle, Error> {
        light.validate()?;
        if self.lights.len() >= MAX_POINT_LIGHTS {
            return Err(Error::CapacityExceeded {
                max: MAX_POINT_LIGHTS,
            });
        }
        let handle: LightHandle = LightHandle(self.next_id);
        self.next_id += 1;
        self.lights.push((handle, light));
        Ok(handle)
    }
    /// Remove a light from the active set. Returns false if the
    /// handle is not active (a benign no-op, not an error).
    pub fn remove_light(&mut self, handle: LightHandle) -> bool {
        let before: usize = self.lights.len();
        self.lights.retain(|(h, _)| *h != handle);
        self.lights.len() != before
    }
    pub fn light(&self, handle: LightHandle) -> Option<&PointLight> {
        self.lights
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, light)| light)
    }
    /// Mutable access for per-frame host updates, e.g. animating the
    /// direction angle.
    pub fn light_mut(&mut self, handle: LightHandle) -> Option<&mut PointLight> {
        self.lights
            .iter_mut()
            .find(|(h, _)| *h == handle)
            .map(|(_, light)| light)
    }
    pub fn len(&self) -> usize {
        self.lights.len()
    }
    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }
    /// Accumulate the ambient term and every active light over the
    /// color/normal buffer pair into a fresh film of the same size.
    /// `num_threads` of 0 uses all cores. The accumulator itself is
    /// not mutated.
    pub fn render(
        &self,
        color: &Texture,
        normal: &Texture,
        num_threads: u8,
    ) -> Result<Film, Error> {
        if color.resolution != normal.resolution {
            return Err(Error::DimensionMismatch {
                first: color.resolution,
                second: normal.resolution,
            });
        }
        let resolution: Point2i = color.resolution;
        let aspect_ratio: Float = resolution.x as Float / resolution.y as Float;
        let film: Film = Film::new(resolution);
        let packed: Vec<PackedLight> = self
            .lights
            .iter()
            .map(|(_, light)| PackedLight::pack(light, resolution))
            .collect();
        let global_light: Option<GlobalLight> = self.global_light;
        let num_cores: usize;
        if num_threads == 0_u8 {
            num_cores = num_cpus::get();
        } else {
            num_cores = num_threads as usize;
        }
        log::debug!(
            "Lighting {}x{} with {} point light(s) on {} thread(s)",
            resolution.x,
            resolution.y,
            packed.len(),
            num_cores
        );
        {
            let tile_queue = TileQueue::new(resolution, TILE_SIZE);
            let tq = &tile_queue;
            let film = &film;
            let packed = &packed;
            crossbeam::scope(|scope| {
                let (tile_tx, tile_rx) = crossbeam_channel::bounded(num_cores);
                // spawn worker threads
                for _ in 0..num_cores {
                    let tile_tx = tile_tx.clone();
                    scope.spawn(move |_| {
                        while let Some(tile_bounds) = tq.next() {
                            let mut film_tile = film.get_film_tile(&tile_bounds);
                            for pixel in &tile_bounds {
                                let uv: Point2f = Point2f {
                                    x: (pixel.x as Float + 0.5) / resolution.x as Float,
                                    y: (pixel.y as Float + 0.5) / resolution.y as Float,
                                };
                                let p: Point2f = aspect_adjust(&uv, aspect_ratio);
                                let color_sample: Spectrum = color.rgb_at(pixel);
                                let (n, presence) = normal.normal_at(pixel);
                                let mut l: Spectrum = Spectrum::default();
                                if let Some(ref global) = global_light {
                                    l += global.contribution(&color_sample);
                                }
                                for light in packed.iter() {
                                    l += light.contribution(&p, &color_sample, &n, presence);
                                }
                                film_tile.add_sample(&pixel, &l);
                            }
                            // send the tile through the channel to the collector
                            tile_tx.send(film_tile).expect("Failed to send tile");
                        }
                    });
                }
                // collect tiles and merge them into the film
                scope.spawn(move |_| {
                    for _ in 0..tq.len() {
                        let film_tile = tile_rx.recv().unwrap();
                        film.merge_film_tile(&film_tile);
                    }
                });
            })
            .unwrap();
        }
        Ok(film)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::{vec2_normalize, Normal2f, Vector2f};
    use crate::core::texture::FLAT_NORMAL_TEXEL;

    fn assert_close(a: Spectrum, b: Spectrum, eps: Float) {
        for c in 0..3 {
            assert!(
                (a.c[c] - b.c[c]).abs() < eps,
                "channel {} differs: {:?} vs {:?}",
                c,
                a,
                b
            );
        }
    }

    /// Color buffer with a gradient, normal buffer with every normal
    /// facing the given light position and full presence.
    fn lit_scene(resolution: Point2i, light_pos: Point2f) -> (Texture, Texture) {
        let mut color = Texture::new(resolution);
        let mut normal = Texture::filled(resolution, FLAT_NORMAL_TEXEL);
        for y in 0..resolution.y {
            for x in 0..resolution.x {
                let p = Point2i { x, y };
                color.set_texel(
                    p,
                    [
                        (x as Float + 1.0) / resolution.x as Float,
                        (y as Float + 1.0) / resolution.y as Float,
                        0.5,
                        1.0,
                    ],
                );
                let to_light = Vector2f {
                    x: light_pos.x - (x as Float + 0.5),
                    y: light_pos.y - (y as Float + 0.5),
                };
                if to_light.length() > 0.0 {
                    let v = vec2_normalize(&to_light);
                    normal.set_normal(p, &Normal2f { x: v.x, y: v.y }, 1.0);
                }
            }
        }
        (color, normal)
    }

    #[test]
    fn global_light_alone_passes_color_through() {
        // white unit ambient, no point lights
        let resolution = Point2i { x: 8, y: 8 };
        let (color, normal) = lit_scene(resolution, Point2f { x: 4.0, y: 4.0 });
        let mut accumulator = LightAccumulator::new();
        accumulator.set_global_light(Spectrum::new(1.0), 1.0).unwrap();
        let film = accumulator.render(&color, &normal, 2).unwrap();
        for y in 0..resolution.y {
            for x in 0..resolution.x {
                let p = Point2i { x, y };
                assert_eq!(film.get_pixel(&p), color.rgb_at(p));
            }
        }
    }

    #[test]
    fn volumetric_term_survives_zero_intensity() {
        // presence-0 background, intensity 0, only the unconditional
        // glow remains
        let resolution = Point2i { x: 6, y: 6 };
        let color = Texture::new(resolution);
        let normal = Texture::filled(resolution, FLAT_NORMAL_TEXEL);
        let tint = Spectrum::rgb(1.0, 0.5, 0.25);
        let mut accumulator = LightAccumulator::new();
        accumulator
            .add_point_light(
                PointLight::new(Point2f { x: 3.0, y: 3.0 }, 6.0)
                    .with_color(tint)
                    .with_intensity(0.0)
                    .with_volumetric_intensity(0.3),
            )
            .unwrap();
        let film = accumulator.render(&color, &normal, 1).unwrap();
        let expected = tint * 0.3;
        for y in 0..resolution.y {
            for x in 0..resolution.x {
                assert_eq!(film.get_pixel(&Point2i { x, y }), expected);
            }
        }
    }

    #[test]
    fn capacity_is_enforced_explicitly() {
        let mut accumulator = LightAccumulator::new();
        for i in 0..MAX_POINT_LIGHTS {
            accumulator
                .add_point_light(PointLight::new(
                    Point2f {
                        x: i as Float,
                        y: 0.0,
                    },
                    100.0,
                ))
                .unwrap();
        }
        assert_eq!(accumulator.len(), MAX_POINT_LIGHTS);
        let overflow =
            accumulator.add_point_light(PointLight::new(Point2f { x: 0.0, y: 0.0 }, 100.0));
        match overflow {
            Err(Error::CapacityExceeded { max }) => assert_eq!(max, MAX_POINT_LIGHTS),
            other => panic!("expected CapacityExceeded, got {:?}", other.map(|_| ())),
        }
        assert_eq!(accumulator.len(), MAX_POINT_LIGHTS);
    }

    #[test]
    fn invalid_parameters_are_rejected_not_clamped() {
        let mut accumulator = LightAccumulator::new();
        let bad = PointLight::new(Point2f { x: 0.0, y: 0.0 }, 100.0).with_intensity(-2.0);
        match accumulator.add_point_light(bad) {
            Err(Error::InvalidParameter { name, value }) => {
                assert_eq!(name, "intensity");
                assert_eq!(value, -2.0);
            }
            other => panic!("expected InvalidParameter, got {:?}", other.map(|_| ())),
        }
        assert!(accumulator.is_empty());
        assert!(accumulator
            .set_global_light(Spectrum::new(1.0), -1.0)
            .is_err());
        assert!(accumulator.global_light().is_none());
    }

    #[test]
    fn two_identical_lights_double_one() {
        let resolution = Point2i { x: 9, y: 9 };
        let (color, normal) = lit_scene(resolution, Point2f { x: 4.5, y: 4.5 });
        let light = PointLight::new(Point2f { x: 4.5, y: 4.5 }, 9.0)
            .with_intensity(1.5)
            .with_volumetric_intensity(0.2)
            .with_angular_width(0.0);
        let mut one = LightAccumulator::new();
        one.add_point_light(light).unwrap();
        let film_one = one.render(&color, &normal, 2).unwrap();
        let mut two = LightAccumulator::new();
        two.add_point_light(light).unwrap();
        two.add_point_light(light).unwrap();
        let film_two = two.render(&color, &normal, 2).unwrap();
        for y in 0..resolution.y {
            for x in 0..resolution.x {
                let p = Point2i { x, y };
                assert_close(film_two.get_pixel(&p), film_one.get_pixel(&p) * 2.0, 1e-5);
            }
        }
    }

    #[test]
    fn output_is_invariant_under_light_permutation() {
        let resolution = Point2i { x: 8, y: 8 };
        let (color, normal) = lit_scene(resolution, Point2f { x: 4.0, y: 4.0 });
        let lights = vec![
            PointLight::new(Point2f { x: 1.0, y: 1.0 }, 8.0)
                .with_color(Spectrum::rgb(1.0, 0.2, 0.2)),
            PointLight::new(Point2f { x: 7.0, y: 2.0 }, 5.0)
                .with_color(Spectrum::rgb(0.2, 1.0, 0.2))
                .with_angular_width(1.2),
            PointLight::new(Point2f { x: 4.0, y: 7.0 }, 6.0)
                .with_color(Spectrum::rgb(0.2, 0.2, 1.0))
                .with_intensity(2.0),
        ];
        let mut forward = LightAccumulator::new();
        for light in lights.iter() {
            forward.add_point_light(*light).unwrap();
        }
        let mut backward = LightAccumulator::new();
        for light in lights.iter().rev() {
            backward.add_point_light(*light).unwrap();
        }
        let film_f = forward.render(&color, &normal, 2).unwrap();
        let film_b = backward.render(&color, &normal, 2).unwrap();
        for y in 0..resolution.y {
            for x in 0..resolution.x {
                let p = Point2i { x, y };
                assert_close(film_f.get_pixel(&p), film_b.get_pixel(&p), 1e-5);
            }
        }
    }

    #[test]
    fn cone_opens_along_facing_direction() {
        // a light in the middle of a square buffer facing +x must
        // illuminate the +x side and leave the -x side dark
        let resolution = Point2i { x: 9, y: 9 };
        let (color, normal) = lit_scene(resolution, Point2f { x: 4.5, y: 4.5 });
        let mut accumulator = LightAccumulator::new();
        accumulator
            .add_point_light(
                PointLight::new(Point2f { x: 4.5, y: 4.5 }, 9.0)
                    .with_direction(0.0)
                    .with_angular_width(1.0)
                    .with_volumetric_intensity(0.0),
            )
            .unwrap();
        let film = accumulator.render(&color, &normal, 1).unwrap();
        let ahead = film.get_pixel(&Point2i { x: 7, y: 4 });
        let behind = film.get_pixel(&Point2i { x: 1, y: 4 });
        assert!(!ahead.is_black());
        assert!(behind.is_black());
    }

    #[test]
    fn mismatched_buffers_are_refused() {
        let color = Texture::new(Point2i { x: 8, y: 8 });
        let normal = Texture::new(Point2i { x: 8, y: 4 });
        let accumulator = LightAccumulator::new();
        match accumulator.render(&color, &normal, 1) {
            Err(Error::DimensionMismatch { first, second }) => {
                assert_eq!(first, Point2i { x: 8, y: 8 });
                assert_eq!(second, Point2i { x: 8, y: 4 });
            }
            _ => panic!("expected DimensionMismatch"),
        }
    }

    #[test]
    fn handles_remove_and_mutate() {
        let mut accumulator = LightAccumulator::new();
        let h1 = accumulator
            .add_point_light(PointLight::new(Point2f { x: 1.0, y: 1.0 }, 10.0))
            .unwrap();
        let h2 = accumulator
            .add_point_light(PointLight::new(Point2f { x: 2.0, y: 2.0 }, 10.0))
            .unwrap();
        assert_ne!(h1, h2);
        accumulator.light_mut(h2).unwrap().direction += 0.01;
        assert!((accumulator.light(h2).unwrap().direction - 0.01).abs() < 1e-6);
        assert!(accumulator.remove_light(h1));
        assert!(!accumulator.remove_light(h1));
        assert_eq!(accumulator.len(), 1);
        assert!(accumulator.light(h1).is_none());
        // a freed slot never resurrects an old handle
        let h3 = accumulator
            .add_point_light(PointLight::new(Point2f { x: 3.0, y: 3.0 }, 10.0))
            .unwrap();
        assert_ne!(h3, h1);
        assert_ne!(h3, h2);
    }

    #[test]
    fn render_does_not_mutate_the_accumulator() {
        let resolution = Point2i { x: 4, y: 4 };
        let color = Texture::new(resolution);
        let normal = Texture::filled(resolution, FLAT_NORMAL_TEXEL);
        let mut accumulator = LightAccumulator::new();
        accumulator
            .add_point_light(PointLight::new(Point2f { x: 2.0, y: 2.0 }, 4.0))
            .unwrap();
        let first = accumulator.render(&color, &normal, 1).unwrap();
        let second = accumulator.render(&color, &normal, 1).unwrap();
        assert_eq!(accumulator.len(), 1);
        for y in 0..resolution.y {
            for x in 0..resolution.x {
                let p = Point2i { x, y };
                assert_eq!(first.get_pixel(&p), second.get_pixel(&p));
            }
        }
    }
}
