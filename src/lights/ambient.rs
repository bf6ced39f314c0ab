//! A global light deposits the same ambient illumination at every
//! point of the scene, with no falloff of any kind.

// pbrt
use crate::core::delight::{Float, Spectrum};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlobalLight {
    pub color: Spectrum,
    pub intensity: Float,
}

impl GlobalLight {
    pub fn new(color: Spectrum, intensity: Float) -> Self {
        GlobalLight { color, intensity }
    }
    /// Ambient term at a pixel. Scales the color sample only, so
    /// texels where nothing was drawn (black) stay black.
    pub fn contribution(&self, color_sample: &Spectrum) -> Spectrum {
        *color_sample * self.color * self.intensity
    }
}

impl Default for GlobalLight {
    fn default() -> Self {
        // warm low-level ambient
        GlobalLight {
            color: Spectrum::rgb(1.0, 0.9, 0.8),
            intensity: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_unit_ambient_is_identity() {
        let light = GlobalLight::new(Spectrum::new(1.0), 1.0);
        let sample = Spectrum::rgb(0.1, 0.4, 0.9);
        assert_eq!(light.contribution(&sample), sample);
    }

    #[test]
    fn ambient_scales_by_tint_and_intensity() {
        let light = GlobalLight::new(Spectrum::rgb(1.0, 0.5, 0.0), 0.5);
        let sample = Spectrum::new(1.0);
        assert_eq!(light.contribution(&sample), Spectrum::rgb(0.5, 0.25, 0.0));
    }

    #[test]
    fn ambient_leaves_black_black() {
        let light = GlobalLight::default();
        assert!(light.contribution(&Spectrum::default()).is_black());
    }
}
