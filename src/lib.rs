//! # delight
//!
//! [Rust][rust] crate implementing deferred dynamic lighting for 2D
//! pixel-art scenes. A low-resolution color buffer and a matching
//! normal buffer are composited per frame, a global ambient light
//! plus up to ten cone/point lights are accumulated additively over
//! them, and the lit result is upscaled to the display with
//! nearest-neighbor filtering.
//!
//! The per-frame pipeline lives in
//! [Compositor](core/compositor/struct.Compositor.html), the light
//! set and the accumulation loop in
//! [LightAccumulator](lights/struct.LightAccumulator.html), and the
//! attenuation math in [falloff](core/falloff/index.html).
//!
//! [rust]: https://www.rust-lang.org

#[macro_use]
extern crate impl_ops;

pub mod blockqueue;
pub mod core;
pub mod lights;
