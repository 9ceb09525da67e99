use super::color::Rgb;

/// Background and foreground chosen for one piece of artwork.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPair {
    pub background: Rgb,
    pub foreground: Rgb,
}

#[derive(Debug, Clone, Copy)]
pub struct ContrastAdjuster {
    pub contrast_distance: f64,
    pub light_luminance: f64,
    pub lightness_shift: u8,
}

impl Default for ContrastAdjuster {
    fn default() -> Self {
        Self {
            contrast_distance: 120.0,
            light_luminance: 0.5,
            lightness_shift: 100,
        }
    }
}

impl ContrastAdjuster {
    pub fn is_light(&self, color: Rgb) -> bool {
        color.luminance() > self.light_luminance
    }

    /// Black on light backgrounds, white on dark ones.
    pub fn contrast_color(&self, background: Rgb) -> Rgb {
        if self.is_light(background) {
            Rgb::BLACK
        } else {
            Rgb::WHITE
        }
    }

    /// Pushes `candidate` away from `background` when the two are still too
    /// close to read. The result never equals `background`.
    pub fn adjust(&self, candidate: Rgb, background: Rgb) -> Rgb {
        if candidate != background && !candidate.is_similar(background, self.contrast_distance) {
            return candidate;
        }

        let shift = i16::from(self.lightness_shift);
        let adjusted = if self.is_light(background) {
            candidate.shifted(-shift)
        } else {
            candidate.shifted(shift)
        };

        if adjusted == background {
            self.distinct_contrast_color(background)
        } else {
            adjusted
        }
    }

    /// Like [`Self::contrast_color`], but picks the other extreme when the
    /// luminance rule lands on the background itself.
    fn distinct_contrast_color(&self, background: Rgb) -> Rgb {
        match self.contrast_color(background) {
            color if color != background => color,
            Rgb::WHITE => Rgb::BLACK,
            _ => Rgb::WHITE,
        }
    }

    /// Final pair for a background and an optional palette candidate.
    pub fn resolve(&self, background: Rgb, candidate: Option<Rgb>) -> ColorPair {
        let candidate = candidate.unwrap_or_else(|| self.contrast_color(background));
        ColorPair {
            background,
            foreground: self.adjust(candidate, background),
        }
    }
}
