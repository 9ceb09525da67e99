use super::{
    color::Rgb,
    quantize::{Histogram, QuantizedColor},
};

/// Quantized colors ordered from most to least frequent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<QuantizedColor>,
}

impl Palette {
    pub fn colors(&self) -> &[QuantizedColor] {
        &self.colors
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn most_frequent(&self) -> Option<Rgb> {
        self.colors.first().map(|entry| entry.color)
    }
}

impl From<Histogram> for Palette {
    fn from(histogram: Histogram) -> Self {
        let mut colors = histogram.into_buckets();
        // stable: equal counts keep first-seen order
        colors.sort_by(|a, b| b.count.cmp(&a.count));
        Palette { colors }
    }
}

/// Outcome of picking colors from a palette, before contrast adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub background: Rgb,
    pub foreground: Option<Rgb>,
}

#[derive(Debug, Clone, Copy)]
pub struct PaletteSelector {
    pub variance_threshold: u8,
    pub candidate_distance: f64,
}

impl Default for PaletteSelector {
    fn default() -> Self {
        Self {
            variance_threshold: 15,
            candidate_distance: 60.0,
        }
    }
}

impl PaletteSelector {
    /// Most frequent colorful entry, or the most frequent entry of all for
    /// near-monochrome artwork.
    pub fn background(&self, palette: &Palette) -> Option<Rgb> {
        palette
            .colors()
            .iter()
            .map(|entry| entry.color)
            .find(|color| color.channel_variance() > self.variance_threshold)
            .or_else(|| palette.most_frequent())
    }

    pub fn foreground_candidates<'a>(
        &'a self,
        palette: &'a Palette,
        background: Rgb,
    ) -> impl Iterator<Item = Rgb> + 'a {
        palette
            .colors()
            .iter()
            .map(|entry| entry.color)
            .filter(move |color| !color.is_similar(background, self.candidate_distance))
    }

    pub fn select(&self, palette: &Palette) -> Option<Selection> {
        let background = self.background(palette)?;
        let foreground = self.foreground_candidates(palette, background).next();
        Some(Selection {
            background,
            foreground,
        })
    }
}
