//! Everything that can go wrong while building a light set or
//! running the frame pipeline, as one error type. Per-frame failures
//! (`DimensionMismatch`) are recoverable by skipping the frame;
//! `ResourceInitFailure` is fatal at startup.

// pbrt
use crate::core::delight::Float;
use crate::core::geometry::Point2i;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid light parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: Float },
    #[error("Light capacity exceeded ({max} active lights)")]
    CapacityExceeded { max: usize },
    #[error("Texture dimensions differ: {first:?} vs {second:?}")]
    DimensionMismatch { first: Point2i, second: Point2i },
    #[error("Failed to initialize render resources: {0}")]
    ResourceInitFailure(String),
    #[error("Image write error: {0}")]
    ImageWrite(#[from] image::ImageError),
}
