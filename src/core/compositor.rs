//! The per-frame pipeline: rasterize sprite color and normal images
//! into the two low-resolution targets, run the light pass over
//! them, then upscale the lit result for presentation. The stages of
//! a frame run strictly in order on the calling thread; a failing
//! stage aborts the frame (the caller logs and skips presentation)
//! and the next frame starts from freshly cleared targets.

// others
use image;
// pbrt
use crate::core::delight::Spectrum;
use crate::core::error::Error;
use crate::core::film::Film;
use crate::core::geometry::Point2i;
use crate::core::texture::{Texture, FLAT_NORMAL_TEXEL};
use crate::lights::LightAccumulator;

/// One positioned sprite: a color image and a normal image of the
/// same size, placed by their top-left corner. The images are
/// borrowed from the host for the duration of the frame.
#[derive(Debug, Copy, Clone)]
pub struct Sprite<'a> {
    pub color: &'a Texture,
    pub normal: &'a Texture,
    pub position: Point2i,
}

pub struct Compositor {
    resolution: Point2i,
    pixel_size: u32,
    background: Spectrum,
    num_threads: u8,
    color_target: Texture,
    normal_target: Texture,
}

impl Compositor {
    /// Set up the render targets for a low-resolution buffer of
    /// `resolution`, presented at `resolution * pixel_size`.
    pub fn new(resolution: Point2i, pixel_size: u32) -> Result<Self, Error> {
        if resolution.x <= 0 || resolution.y <= 0 {
            return Err(Error::ResourceInitFailure(format!(
                "display resolution {:?} must be positive",
                resolution
            )));
        }
        if pixel_size == 0 {
            return Err(Error::ResourceInitFailure(String::from(
                "pixel size must be at least 1",
            )));
        }
        Ok(Compositor {
            resolution,
            pixel_size,
            background: Spectrum::default(),
            num_threads: 0_u8,
            color_target: Texture::new(resolution),
            normal_target: Texture::new(resolution),
        })
    }
    pub fn with_background(mut self, background: Spectrum) -> Self {
        self.background = background;
        self
    }
    pub fn with_num_threads(mut self, num_threads: u8) -> Self {
        self.num_threads = num_threads;
        self
    }
    pub fn resolution(&self) -> Point2i {
        self.resolution
    }
    pub fn presented_resolution(&self) -> Point2i {
        Point2i {
            x: self.resolution.x * self.pixel_size as i32,
            y: self.resolution.y * self.pixel_size as i32,
        }
    }
    /// The color buffer as written by the last rasterize stage, for
    /// diagnostics dumps.
    pub fn color_target(&self) -> &Texture {
        &self.color_target
    }
    /// The normal buffer as written by the last rasterize stage, for
    /// diagnostics dumps.
    pub fn normal_target(&self) -> &Texture {
        &self.normal_target
    }
    /// Stage 1 and 2: clear both targets and blit every sprite's
    /// color and normal image at its position. Sprites are validated
    /// up front so a bad pair fails the frame before anything is
    /// drawn over.
    pub fn rasterize(&mut self, sprites: &[Sprite]) -> Result<(), Error> {
        for sprite in sprites.iter() {
            if sprite.color.resolution != sprite.normal.resolution {
                log::warn!(
                    "Skipping frame: sprite color {:?} vs normal {:?}",
                    sprite.color.resolution,
                    sprite.normal.resolution
                );
                return Err(Error::DimensionMismatch {
                    first: sprite.color.resolution,
                    second: sprite.normal.resolution,
                });
            }
        }
        self.color_target.clear([
            self.background.c[0],
            self.background.c[1],
            self.background.c[2],
            1.0,
        ]);
        self.normal_target.clear(FLAT_NORMAL_TEXEL);
        for sprite in sprites.iter() {
            self.color_target.blit(sprite.color, sprite.position);
            self.normal_target.blit(sprite.normal, sprite.position);
        }
        Ok(())
    }
    /// Stage 3: accumulate all active lights over the rasterized
    /// targets.
    pub fn illuminate(&self, lights: &LightAccumulator) -> Result<Film, Error> {
        lights.render(&self.color_target, &self.normal_target, self.num_threads)
    }
    /// Stage 4: nearest-neighbor upscale to the presented resolution
    /// and conversion to an 8-bit image, ready for the host to show
    /// or save.
    pub fn present(&self, film: &Film) -> image::RgbImage {
        film.upscale(self.pixel_size).to_rgb_image()
    }
    /// Run one whole frame. On error nothing is presented; state left
    /// in the targets is overwritten by the next frame.
    pub fn compose(
        &mut self,
        sprites: &[Sprite],
        lights: &LightAccumulator,
    ) -> Result<image::RgbImage, Error> {
        self.rasterize(sprites)?;
        let film: Film = self.illuminate(lights)?;
        Ok(self.present(&film))
    }
}
