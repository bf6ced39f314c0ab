//! CPU-side RGBA textures. The frame pipeline reads and writes two of
//! them per frame: a color buffer (RGB plus opacity) and a normal
//! buffer (encoded surface direction plus geometry presence mask).
//!
//! The normal encoding maps each of the first two channels from
//! [-1, 1] to [0, 1]; the green channel is flipped on decode because
//! normal maps are authored y-up while the buffers are y-down. The
//! blue channel is reserved. Alpha is 0 where no geometry was drawn.

// std
use std::path::Path;
// others
use image;
// pbrt
use crate::core::delight::{clamp_t, Float, Spectrum};
use crate::core::error::Error;
use crate::core::geometry::{Normal2f, Point2i};

/// Clear value encoding a zero normal with no geometry presence.
pub const FLAT_NORMAL_TEXEL: [Float; 4] = [0.5, 0.5, 0.0, 0.0];

#[derive(Debug, Clone)]
pub struct Texture {
    pub resolution: Point2i,
    texels: Vec<[Float; 4]>,
}

impl Texture {
    /// Create a texture filled with transparent black. Panics on
    /// non-positive dimensions; sizing is a programmer decision, not
    /// runtime input (see `Compositor::new` for the validated path).
    pub fn new(resolution: Point2i) -> Self {
        assert!(
            resolution.x > 0 && resolution.y > 0,
            "Texture with non-positive resolution {:?}",
            resolution
        );
        Texture {
            resolution,
            texels: vec![[0.0 as Float; 4]; (resolution.x * resolution.y) as usize],
        }
    }
    pub fn filled(resolution: Point2i, value: [Float; 4]) -> Self {
        let mut t: Texture = Texture::new(resolution);
        t.clear(value);
        t
    }
    pub fn clear(&mut self, value: [Float; 4]) {
        for texel in self.texels.iter_mut() {
            *texel = value;
        }
    }
    fn offset(&self, p: Point2i) -> usize {
        assert!(p.x >= 0 && p.x < self.resolution.x && p.y >= 0 && p.y < self.resolution.y);
        (p.y * self.resolution.x + p.x) as usize
    }
    pub fn texel(&self, p: Point2i) -> [Float; 4] {
        self.texels[self.offset(p)]
    }
    pub fn set_texel(&mut self, p: Point2i, value: [Float; 4]) {
        let offset: usize = self.offset(p);
        self.texels[offset] = value;
    }
    pub fn rgb_at(&self, p: Point2i) -> Spectrum {
        let t: [Float; 4] = self.texel(p);
        Spectrum::rgb(t[0], t[1], t[2])
    }
    pub fn alpha_at(&self, p: Point2i) -> Float {
        self.texel(p)[3]
    }
    /// Decode the stored surface direction and the geometry presence
    /// mask at a texel. The direction is returned as sampled, without
    /// re-normalization.
    pub fn normal_at(&self, p: Point2i) -> (Normal2f, Float) {
        let t: [Float; 4] = self.texel(p);
        let n: Normal2f = Normal2f {
            x: t[0] * 2.0 as Float - 1.0 as Float,
            y: (t[1] * 2.0 as Float - 1.0 as Float) * -1.0 as Float,
        };
        (n, t[3])
    }
    /// Encode a surface direction into a texel, inverse of
    /// [`Texture::normal_at`].
    pub fn set_normal(&mut self, p: Point2i, n: &Normal2f, presence: Float) {
        self.set_texel(
            p,
            [
                (n.x + 1.0 as Float) * 0.5 as Float,
                (-n.y + 1.0 as Float) * 0.5 as Float,
                0.0 as Float,
                presence,
            ],
        );
    }
    /// Alpha-over blit of `src` with its top-left corner at `pos`,
    /// clipped against the edges of `self`.
    pub fn blit(&mut self, src: &Texture, pos: Point2i) {
        let x0: i32 = std::cmp::max(0, pos.x);
        let y0: i32 = std::cmp::max(0, pos.y);
        let x1: i32 = std::cmp::min(self.resolution.x, pos.x + src.resolution.x);
        let y1: i32 = std::cmp::min(self.resolution.y, pos.y + src.resolution.y);
        for y in y0..y1 {
            for x in x0..x1 {
                let s: [Float; 4] = src.texel(Point2i {
                    x: x - pos.x,
                    y: y - pos.y,
                });
                let dst_offset: usize = self.offset(Point2i { x, y });
                let d: [Float; 4] = self.texels[dst_offset];
                let a: Float = s[3];
                let inv_a: Float = 1.0 as Float - a;
                self.texels[dst_offset] = [
                    s[0] * a + d[0] * inv_a,
                    s[1] * a + d[1] * inv_a,
                    s[2] * a + d[2] * inv_a,
                    a + d[3] * inv_a,
                ];
            }
        }
    }
    /// Import an 8-bit RGBA image; channels map straight to [0, 1]
    /// with no transfer function (normal maps must not be
    /// gamma-decoded, and pixel-art color sprites go through the
    /// pipeline the way they were painted).
    pub fn from_image(img: &image::RgbaImage) -> Texture {
        let resolution: Point2i = Point2i {
            x: img.width() as i32,
            y: img.height() as i32,
        };
        let mut t: Texture = Texture::new(resolution);
        for (x, y, pixel) in img.enumerate_pixels() {
            t.set_texel(
                Point2i {
                    x: x as i32,
                    y: y as i32,
                },
                [
                    pixel[0] as Float / 255.0,
                    pixel[1] as Float / 255.0,
                    pixel[2] as Float / 255.0,
                    pixel[3] as Float / 255.0,
                ],
            );
        }
        t
    }
    /// Dump the raw texel values as an 8-bit RGBA file, for
    /// diagnostics. No transfer function is applied.
    pub fn write_image(&self, path: &Path) -> Result<(), Error> {
        let width: u32 = self.resolution.x as u32;
        let height: u32 = self.resolution.y as u32;
        let mut buffer: Vec<u8> = vec![0_u8; (4 * self.resolution.x * self.resolution.y) as usize];
        for (i, texel) in self.texels.iter().enumerate() {
            for c in 0..4 {
                buffer[4 * i + c] =
                    clamp_t(255.0 as Float * texel[c] + 0.5, 0.0 as Float, 255.0 as Float) as u8;
            }
        }
        image::save_buffer(path, &buffer, width, height, image::ColorType::Rgba8)?;
        Ok(())
    }
}
