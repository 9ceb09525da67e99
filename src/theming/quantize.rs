use std::collections::HashMap;

use super::{color::Rgb, sampler::PixelSample};

/// A bucketed color and how many samples fell into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantizedColor {
    pub color: Rgb,
    pub count: usize,
}

/// Frequency histogram over bucketed colors, remembering first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Histogram {
    slots: HashMap<Rgb, usize>,
    buckets: Vec<QuantizedColor>,
}

impl Histogram {
    fn record(&mut self, color: Rgb) {
        match self.slots.get(&color) {
            Some(&slot) => self.buckets[slot].count += 1,
            None => {
                self.slots.insert(color, self.buckets.len());
                self.buckets.push(QuantizedColor { color, count: 1 });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn count_of(&self, color: Rgb) -> usize {
        self.slots
            .get(&color)
            .map(|&slot| self.buckets[slot].count)
            .unwrap_or(0)
    }

    /// Buckets in the order their first sample was seen.
    pub fn buckets(&self) -> &[QuantizedColor] {
        &self.buckets
    }

    pub(crate) fn into_buckets(self) -> Vec<QuantizedColor> {
        self.buckets
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColorQuantizer {
    pub bucket_width: u8,
    pub alpha_cutoff: u8,
    pub near_black_cutoff: u8,
}

impl Default for ColorQuantizer {
    fn default() -> Self {
        Self {
            bucket_width: 5,
            alpha_cutoff: 200,
            near_black_cutoff: 15,
        }
    }
}

impl ColorQuantizer {
    /// Bucket for a single sample, or `None` when the sample is filtered out.
    pub fn bucket(&self, sample: PixelSample) -> Option<Rgb> {
        if sample.a < self.alpha_cutoff {
            return None;
        }

        let width = self.bucket_width.max(1);
        let round = |channel: u8| (channel / width) * width;
        let color = Rgb::new(round(sample.r), round(sample.g), round(sample.b));

        let cutoff = self.near_black_cutoff;
        if color.r < cutoff && color.g < cutoff && color.b < cutoff {
            return None;
        }

        Some(color)
    }

    pub fn quantize(&self, samples: &[PixelSample]) -> Histogram {
        let mut histogram = Histogram::default();
        for &sample in samples {
            if let Some(color) = self.bucket(sample) {
                histogram.record(color);
            }
        }
        histogram
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opaque(r: u8, g: u8, b: u8) -> PixelSample {
        PixelSample::new(r, g, b, 255)
    }

    #[test]
    fn channels_round_down_to_bucket_width() {
        let quantizer = ColorQuantizer::default();
        assert_eq!(quantizer.bucket(opaque(124, 59, 201)), Some(Rgb::new(120, 55, 200)));
        assert_eq!(quantizer.bucket(opaque(255, 255, 255)), Some(Rgb::new(255, 255, 255)));
    }

    #[test]
    fn translucent_samples_are_dropped() {
        let quantizer = ColorQuantizer::default();
        let histogram = quantizer.quantize(&[PixelSample::new(200, 40, 40, 150)]);
        assert!(histogram.is_empty());
        assert!(quantizer.bucket(PixelSample::new(200, 40, 40, 199)).is_none());
        assert!(quantizer.bucket(PixelSample::new(200, 40, 40, 200)).is_some());
    }

    #[test]
    fn near_black_samples_are_dropped() {
        let quantizer = ColorQuantizer::default();
        assert!(quantizer.quantize(&[opaque(5, 5, 5)]).is_empty());
        // 19 buckets down to 15 which is no longer below the cutoff
        assert_eq!(quantizer.bucket(opaque(14, 14, 19)), Some(Rgb::new(10, 10, 15)));
    }

    #[test]
    fn near_identical_shades_share_a_bucket() {
        let quantizer = ColorQuantizer::default();
        let histogram =
            quantizer.quantize(&[opaque(101, 102, 103), opaque(104, 100, 100), opaque(99, 0, 250)]);
        assert_eq!(histogram.len(), 2);
        assert_eq!(histogram.count_of(Rgb::new(100, 100, 100)), 2);
        assert_eq!(histogram.count_of(Rgb::new(95, 0, 250)), 1);
        assert!(histogram.buckets().iter().all(|bucket| bucket.count >= 1));
    }

    #[test]
    fn buckets_keep_first_seen_order() {
        let quantizer = ColorQuantizer::default();
        let histogram =
            quantizer.quantize(&[opaque(50, 60, 70), opaque(200, 10, 10), opaque(50, 60, 70)]);
        let order: Vec<Rgb> = histogram.buckets().iter().map(|b| b.color).collect();
        assert_eq!(order, vec![Rgb::new(50, 60, 70), Rgb::new(200, 10, 10)]);
    }
}
