//! The **Film** is the buffer light contributions accumulate into.
//! Worker threads fill disjoint **FilmTile**s and a collector merges
//! them into the film; when the frame is done the film is upscaled
//! and converted to an 8-bit image for presentation.

// std
use std::path::Path;
use std::sync::RwLock;
// others
use image;
// pbrt
use crate::core::delight::{clamp_t, gamma_correct, Float, Spectrum};
use crate::core::error::Error;
use crate::core::geometry::{Bounds2i, Point2i};

pub struct Film {
    pub full_resolution: Point2i,
    pixels: RwLock<Vec<Spectrum>>,
}

#[derive(Debug, Clone)]
pub struct FilmTile {
    pub pixel_bounds: Bounds2i,
    pixels: Vec<Spectrum>,
}

impl FilmTile {
    pub fn new(pixel_bounds: Bounds2i) -> Self {
        FilmTile {
            pixel_bounds,
            pixels: vec![Spectrum::default(); pixel_bounds.area().max(0) as usize],
        }
    }
    fn offset(&self, p: &Point2i) -> usize {
        let width: i32 = self.pixel_bounds.p_max.x - self.pixel_bounds.p_min.x;
        ((p.y - self.pixel_bounds.p_min.y) * width + (p.x - self.pixel_bounds.p_min.x)) as usize
    }
    /// Accumulate a contribution additively into the tile.
    pub fn add_sample(&mut self, p: &Point2i, l: &Spectrum) {
        let offset: usize = self.offset(p);
        self.pixels[offset] += *l;
    }
    pub fn get_pixel(&self, p: &Point2i) -> Spectrum {
        self.pixels[self.offset(p)]
    }
}

impl Film {
    pub fn new(resolution: Point2i) -> Self {
        assert!(
            resolution.x > 0 && resolution.y > 0,
            "Film with non-positive resolution {:?}",
            resolution
        );
        Film {
            full_resolution: resolution,
            pixels: RwLock::new(vec![
                Spectrum::default();
                (resolution.x * resolution.y) as usize
            ]),
        }
    }
    pub fn get_film_tile(&self, pixel_bounds: &Bounds2i) -> FilmTile {
        FilmTile::new(*pixel_bounds)
    }
    /// Merge a finished tile into the film. Tiles handed out by the
    /// tile queue are disjoint, so merging is additive into pixels
    /// that start at zero.
    pub fn merge_film_tile(&self, tile: &FilmTile) {
        let mut pixels = self.pixels.write().unwrap();
        for p in &tile.pixel_bounds {
            let offset: usize = (p.y * self.full_resolution.x + p.x) as usize;
            pixels[offset] += tile.get_pixel(&p);
        }
    }
    pub fn get_pixel(&self, p: &Point2i) -> Spectrum {
        let pixels = self.pixels.read().unwrap();
        pixels[(p.y * self.full_resolution.x + p.x) as usize]
    }
    /// Nearest-neighbor magnification by an integer factor, the
    /// upscale that preserves the pixel-art look.
    pub fn upscale(&self, factor: u32) -> Film {
        assert!(factor >= 1);
        let factor: i32 = factor as i32;
        let resolution: Point2i = Point2i {
            x: self.full_resolution.x * factor,
            y: self.full_resolution.y * factor,
        };
        let pixels = self.pixels.read().unwrap();
        let mut scaled: Vec<Spectrum> = Vec::with_capacity((resolution.x * resolution.y) as usize);
        for y in 0..resolution.y {
            for x in 0..resolution.x {
                let offset: usize = ((y / factor) * self.full_resolution.x + x / factor) as usize;
                scaled.push(pixels[offset]);
            }
        }
        Film {
            full_resolution: resolution,
            pixels: RwLock::new(scaled),
        }
    }
    /// Convert to 8-bit sRGB, the way 8-bit image files are written
    /// (see WriteImage(...) in imageio.cpp).
    pub fn to_srgb8(&self) -> Vec<u8> {
        let pixels = self.pixels.read().unwrap();
        let mut buffer: Vec<u8> = vec![0_u8; 3 * pixels.len()];
        for (i, pixel) in pixels.iter().enumerate() {
            for c in 0..3 {
                buffer[3 * i + c] = clamp_t(
                    255.0 as Float * gamma_correct(pixel.c[c]) + 0.5,
                    0.0 as Float,
                    255.0 as Float,
                ) as u8;
            }
        }
        buffer
    }
    pub fn to_rgb_image(&self) -> image::RgbImage {
        let width: u32 = self.full_resolution.x as u32;
        let height: u32 = self.full_resolution.y as u32;
        let buffer: Vec<u8> = self.to_srgb8();
        image::ImageBuffer::from_fn(width, height, |x, y| {
            let offset: usize = 3 * (y * width + x) as usize;
            image::Rgb([buffer[offset], buffer[offset + 1], buffer[offset + 2]])
        })
    }
    pub fn write_image(&self, path: &Path) -> Result<(), Error> {
        image::save_buffer(
            path,
            &self.to_srgb8(),
            self.full_resolution.x as u32,
            self.full_resolution.y as u32,
            image::ColorType::Rgb8,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiles_merge_into_film() {
        let film = Film::new(Point2i { x: 4, y: 4 });
        let bounds = Bounds2i::new(Point2i { x: 2, y: 0 }, Point2i { x: 4, y: 2 });
        let mut tile = film.get_film_tile(&bounds);
        tile.add_sample(&Point2i { x: 3, y: 1 }, &Spectrum::rgb(0.25, 0.5, 0.75));
        tile.add_sample(&Point2i { x: 3, y: 1 }, &Spectrum::rgb(0.25, 0.0, 0.0));
        film.merge_film_tile(&tile);
        assert_eq!(
            film.get_pixel(&Point2i { x: 3, y: 1 }),
            Spectrum::rgb(0.5, 0.5, 0.75)
        );
        assert_eq!(film.get_pixel(&Point2i { x: 0, y: 0 }), Spectrum::default());
    }

    #[test]
    fn upscale_replicates_source_pixels() {
        let film = Film::new(Point2i { x: 2, y: 1 });
        let bounds = Bounds2i::new(Point2i { x: 0, y: 0 }, Point2i { x: 2, y: 1 });
        let mut tile = film.get_film_tile(&bounds);
        tile.add_sample(&Point2i { x: 0, y: 0 }, &Spectrum::rgb(1.0, 0.0, 0.0));
        tile.add_sample(&Point2i { x: 1, y: 0 }, &Spectrum::rgb(0.0, 1.0, 0.0));
        film.merge_film_tile(&tile);
        let up = film.upscale(3);
        assert_eq!(up.full_resolution, Point2i { x: 6, y: 3 });
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(up.get_pixel(&Point2i { x, y }), Spectrum::rgb(1.0, 0.0, 0.0));
                assert_eq!(
                    up.get_pixel(&Point2i { x: x + 3, y }),
                    Spectrum::rgb(0.0, 1.0, 0.0)
                );
            }
        }
    }

    #[test]
    fn srgb_conversion_clamps_overbright() {
        let film = Film::new(Point2i { x: 1, y: 1 });
        let bounds = Bounds2i::new(Point2i { x: 0, y: 0 }, Point2i { x: 1, y: 1 });
        let mut tile = film.get_film_tile(&bounds);
        tile.add_sample(&Point2i { x: 0, y: 0 }, &Spectrum::rgb(2.0, 1.0, 0.0));
        film.merge_film_tile(&tile);
        let buffer = film.to_srgb8();
        assert_eq!(buffer, vec![255, 255, 0]);
    }
}
