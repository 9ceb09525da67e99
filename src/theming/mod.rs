//! Album-art driven color theming.
//!
//! Artwork is downsampled, bucketed into a frequency histogram, and the most
//! frequent usable colors become a background/foreground [`ColorPair`].

mod color;
mod contrast;
mod palette;
mod quantize;
mod sampler;

pub use color::Rgb;
pub use contrast::{ColorPair, ContrastAdjuster};
pub use palette::{Palette, PaletteSelector, Selection};
pub use quantize::{ColorQuantizer, Histogram, QuantizedColor};
pub use sampler::{decode_artwork, PixelSample, PixelSampler, ResizeSampler, DEFAULT_SAMPLE_SIZE};

use image::DynamicImage;
use tracing::debug;

use crate::error::Result;

/// Pair used whenever artwork is missing or yields no usable color.
pub const FALLBACK_PAIR: ColorPair = ColorPair {
    background: Rgb::new(128, 128, 128),
    foreground: Rgb::WHITE,
};

/// Every tunable threshold of the theming passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemeThresholds {
    pub sample_size: u32,
    pub bucket_width: u8,
    pub alpha_cutoff: u8,
    pub near_black_cutoff: u8,
    pub variance_threshold: u8,
    pub candidate_distance: f64,
    pub contrast_distance: f64,
    pub light_luminance: f64,
    pub lightness_shift: u8,
}

impl Default for ThemeThresholds {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            bucket_width: 5,
            alpha_cutoff: 200,
            near_black_cutoff: 15,
            variance_threshold: 15,
            candidate_distance: 60.0,
            contrast_distance: 120.0,
            light_luminance: 0.5,
            lightness_shift: 100,
        }
    }
}

/// Runs sample → quantize → select → adjust for one image at a time.
#[derive(Debug, Clone)]
pub struct ThemeEngine<S = ResizeSampler> {
    sampler: S,
    quantizer: ColorQuantizer,
    selector: PaletteSelector,
    adjuster: ContrastAdjuster,
}

impl Default for ThemeEngine {
    fn default() -> Self {
        Self::new(ThemeThresholds::default())
    }
}

impl ThemeEngine {
    pub fn new(thresholds: ThemeThresholds) -> Self {
        Self::with_sampler(ResizeSampler::new(thresholds.sample_size), thresholds)
    }
}

impl<S: PixelSampler> ThemeEngine<S> {
    pub fn with_sampler(sampler: S, thresholds: ThemeThresholds) -> Self {
        Self {
            sampler,
            quantizer: ColorQuantizer {
                bucket_width: thresholds.bucket_width,
                alpha_cutoff: thresholds.alpha_cutoff,
                near_black_cutoff: thresholds.near_black_cutoff,
            },
            selector: PaletteSelector {
                variance_threshold: thresholds.variance_threshold,
                candidate_distance: thresholds.candidate_distance,
            },
            adjuster: ContrastAdjuster {
                contrast_distance: thresholds.contrast_distance,
                light_luminance: thresholds.light_luminance,
                lightness_shift: thresholds.lightness_shift,
            },
        }
    }

    /// Derives a pair from a decoded image, falling back when it can't be sampled.
    pub fn color_pair(&self, image: &DynamicImage) -> ColorPair {
        self.color_pair_from(self.sampler.sample(image))
    }

    /// Derives a pair from encoded artwork bytes.
    pub fn color_pair_for_bytes(&self, bytes: &[u8]) -> ColorPair {
        self.color_pair_from(decode_artwork(bytes).and_then(|image| self.sampler.sample(&image)))
    }

    pub fn color_pair_from(&self, samples: Result<Vec<PixelSample>>) -> ColorPair {
        match samples {
            Ok(samples) => self.color_pair_for_samples(&samples),
            Err(err) => {
                debug!(%err, "artwork unavailable, using fallback colors");
                self.fallback_pair()
            }
        }
    }

    pub fn color_pair_for_samples(&self, samples: &[PixelSample]) -> ColorPair {
        let palette = Palette::from(self.quantizer.quantize(samples));
        match self.selector.select(&palette) {
            Some(selection) => self.adjuster.resolve(selection.background, selection.foreground),
            None => {
                debug!(samples = samples.len(), "no usable colors in artwork");
                self.fallback_pair()
            }
        }
    }

    pub fn fallback_pair(&self) -> ColorPair {
        self.adjuster
            .resolve(FALLBACK_PAIR.background, Some(FALLBACK_PAIR.foreground))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OverlayError;

    fn repeat(color: [u8; 4], count: usize) -> Vec<PixelSample> {
        vec![PixelSample::new(color[0], color[1], color[2], color[3]); count]
    }

    #[test]
    fn unavailable_sample_yields_fallback_pair() {
        let engine = ThemeEngine::default();
        let pair = engine.color_pair_from(Err(OverlayError::sample("cross-origin")));
        assert_eq!(pair, FALLBACK_PAIR);
        assert_eq!(pair.background, Rgb::new(128, 128, 128));
        assert_eq!(pair.foreground, Rgb::WHITE);
    }

    #[test]
    fn fully_filtered_artwork_yields_fallback_pair() {
        let engine = ThemeEngine::default();
        let mut samples = repeat([0, 0, 0, 255], 50);
        samples.extend(repeat([250, 10, 10, 20], 50));
        assert_eq!(engine.color_pair_for_samples(&samples), FALLBACK_PAIR);
    }

    #[test]
    fn two_color_artwork_uses_both_colors() {
        let engine = ThemeEngine::default();
        let mut samples = repeat([200, 40, 40, 255], 10);
        samples.extend(repeat([20, 200, 220, 255], 3));
        let pair = engine.color_pair_for_samples(&samples);
        assert_eq!(pair.background, Rgb::new(200, 40, 40));
        assert_eq!(pair.foreground, Rgb::new(20, 200, 220));
    }

    #[test]
    fn garbage_bytes_yield_fallback_pair() {
        let engine = ThemeEngine::default();
        assert_eq!(engine.color_pair_for_bytes(b"not an image"), FALLBACK_PAIR);
    }

    #[test]
    fn custom_sampler_feeds_the_pipeline() {
        struct Fixed(Vec<PixelSample>);
        impl PixelSampler for Fixed {
            fn sample(&self, _image: &DynamicImage) -> Result<Vec<PixelSample>> {
                Ok(self.0.clone())
            }
        }

        let engine = ThemeEngine::with_sampler(
            Fixed(repeat([240, 230, 200, 255], 4)),
            ThemeThresholds::default(),
        );
        let pair = engine.color_pair(&DynamicImage::new_rgba8(1, 1));
        assert_eq!(pair.background, Rgb::new(240, 230, 200));
        assert_eq!(pair.foreground, Rgb::BLACK);
    }
}
