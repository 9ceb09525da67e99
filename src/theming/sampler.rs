use image::{imageops::FilterType, DynamicImage};

use crate::error::{OverlayError, Result};

pub const DEFAULT_SAMPLE_SIZE: u32 = 100;

/// One RGBA point read from the working-resolution artwork.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelSample {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl PixelSample {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Reads a fixed grid of pixels out of an image.
///
/// Kept as a trait so the quantize/select/adjust stages can be driven from
/// tests or other hosts without an actual decoded picture.
pub trait PixelSampler {
    fn sample(&self, image: &DynamicImage) -> Result<Vec<PixelSample>>;
}

/// Resamples the whole image down to `size`×`size` and reads it row by row.
#[derive(Debug, Clone, Copy)]
pub struct ResizeSampler {
    size: u32,
}

impl Default for ResizeSampler {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_SIZE)
    }
}

impl ResizeSampler {
    pub fn new(size: u32) -> Self {
        Self { size: size.max(1) }
    }

    pub fn size(&self) -> u32 {
        self.size
    }
}

impl PixelSampler for ResizeSampler {
    fn sample(&self, image: &DynamicImage) -> Result<Vec<PixelSample>> {
        if image.width() == 0 || image.height() == 0 {
            return Err(OverlayError::sample("artwork has no pixels"));
        }

        let rgba = image.to_rgba8();
        let resized = image::imageops::resize(&rgba, self.size, self.size, FilterType::Triangle);

        Ok(resized
            .pixels()
            .map(|pixel| {
                let [r, g, b, a] = pixel.0;
                PixelSample::new(r, g, b, a)
            })
            .collect())
    }
}

/// Decodes encoded artwork bytes (PNG, JPEG, ...) into an image.
pub fn decode_artwork(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes)
        .map_err(|e| OverlayError::sample(format!("Failed to decode artwork: {e}")))
}
