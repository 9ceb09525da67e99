use std::fmt;

/// Opaque 8-bit RGB color used throughout the theming engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Largest pairwise channel difference; near zero for grays.
    pub fn channel_variance(self) -> u8 {
        let r = i16::from(self.r);
        let g = i16::from(self.g);
        let b = i16::from(self.b);
        let spread = (r - g).abs().max((r - b).abs()).max((g - b).abs());
        spread as u8
    }

    /// Weighted Euclidean distance, heavier on green than red and red than blue.
    pub fn distance(self, other: Rgb) -> f64 {
        let dr = f64::from(self.r) - f64::from(other.r);
        let dg = f64::from(self.g) - f64::from(other.g);
        let db = f64::from(self.b) - f64::from(other.b);
        (2.0 * dr * dr + 4.0 * dg * dg + db * db).sqrt()
    }

    pub fn is_similar(self, other: Rgb, threshold: f64) -> bool {
        self.distance(other) < threshold
    }

    /// Relative brightness in `0.0..=1.0`.
    pub fn luminance(self) -> f64 {
        (0.299 * f64::from(self.r) + 0.587 * f64::from(self.g) + 0.114 * f64::from(self.b))
            / 255.0
    }

    /// Adds `delta` to every channel, saturating at the channel bounds.
    pub fn shifted(self, delta: i16) -> Rgb {
        let shift = |channel: u8| (i16::from(channel) + delta).clamp(0, 255) as u8;
        Rgb::new(shift(self.r), shift(self.g), shift(self.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.r, self.g, self.b)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Rgb::new(r, g, b)
    }
}
