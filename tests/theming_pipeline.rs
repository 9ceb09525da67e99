use image::{DynamicImage, Rgba, RgbaImage};
use now_playing_overlay::theming::{
    ColorQuantizer, ContrastAdjuster, Palette, PaletteSelector, PixelSample, Rgb, ThemeEngine,
    ThemeThresholds, FALLBACK_PAIR,
};
use now_playing_overlay::{config::Config, OverlayError};

fn opaque(r: u8, g: u8, b: u8) -> PixelSample {
    PixelSample::new(r, g, b, 255)
}

fn samples(entries: &[(PixelSample, usize)]) -> Vec<PixelSample> {
    entries
        .iter()
        .flat_map(|&(sample, count)| std::iter::repeat(sample).take(count))
        .collect()
}

#[test]
fn most_frequent_colorful_bucket_becomes_background() {
    let pixels = samples(&[(opaque(40, 90, 200), 3), (opaque(200, 60, 20), 10)]);
    let palette = Palette::from(ColorQuantizer::default().quantize(&pixels));
    assert_eq!(
        PaletteSelector::default().background(&palette),
        Some(Rgb::new(200, 60, 20))
    );
}

#[test]
fn filtered_samples_never_reach_the_palette() {
    let pixels = vec![
        PixelSample::new(220, 40, 90, 150),
        PixelSample::new(5, 5, 5, 255),
        opaque(220, 40, 90),
    ];
    let histogram = ColorQuantizer::default().quantize(&pixels);
    assert_eq!(histogram.len(), 1);
    assert_eq!(histogram.count_of(Rgb::new(220, 40, 90)), 1);
    assert_eq!(histogram.count_of(Rgb::new(5, 5, 5)), 0);
}

#[test]
fn light_background_darkens_close_foreground() {
    let adjuster = ContrastAdjuster::default();
    let candidate = Rgb::new(240, 235, 250);
    assert!(candidate.distance(Rgb::WHITE) < 120.0);
    let adjusted = adjuster.adjust(candidate, Rgb::WHITE);
    assert_eq!(
        adjusted,
        Rgb::new(
            candidate.r.saturating_sub(100),
            candidate.g.saturating_sub(100),
            candidate.b.saturating_sub(100),
        )
    );
}

#[test]
fn sampling_failure_gives_gray_and_white() {
    let engine = ThemeEngine::default();
    let pair = engine.color_pair_from(Err(OverlayError::sample("cross-origin image")));
    assert_eq!(pair, FALLBACK_PAIR);
    assert_eq!(pair.background, Rgb::new(128, 128, 128));
    assert_eq!(pair.foreground, Rgb::new(255, 255, 255));
}

#[test]
fn two_tone_artwork_is_themed_from_its_own_colors() {
    // left two thirds orange, right third teal
    let mut art = RgbaImage::from_pixel(300, 300, Rgba([232, 122, 32, 255]));
    for y in 0..300 {
        for x in 200..300 {
            art.put_pixel(x, y, Rgba([22, 152, 142, 255]));
        }
    }

    let pair = ThemeEngine::default().color_pair(&DynamicImage::ImageRgba8(art));
    assert_eq!(pair.background, Rgb::new(230, 120, 30));
    assert_eq!(pair.foreground, Rgb::new(20, 150, 140));
}

#[test]
fn monochrome_artwork_gets_readable_foreground() {
    let art = RgbaImage::from_pixel(64, 64, Rgba([242, 242, 242, 255]));
    let pair = ThemeEngine::default().color_pair(&DynamicImage::ImageRgba8(art));
    assert_eq!(pair.background, Rgb::new(240, 240, 240));
    assert_eq!(pair.foreground, Rgb::BLACK);
    assert_ne!(pair.background, pair.foreground);
}

#[test]
fn thresholds_are_configurable() {
    let thresholds = ThemeThresholds {
        variance_threshold: 250,
        ..ThemeThresholds::default()
    };
    let engine = ThemeEngine::new(thresholds);
    let pixels = samples(&[(opaque(100, 100, 100), 5), (opaque(250, 20, 20), 2)]);
    let pair = engine.color_pair_for_samples(&pixels);
    assert_eq!(pair.background, Rgb::new(100, 100, 100));
    assert_eq!(pair.foreground, Rgb::new(250, 20, 20));
}

#[test]
fn identical_input_gives_identical_pair() {
    let pixels = samples(&[
        (opaque(10, 200, 90), 7),
        (opaque(180, 30, 160), 7),
        (opaque(90, 90, 250), 4),
    ]);
    let engine = ThemeEngine::default();
    let first = engine.color_pair_for_samples(&pixels);
    for _ in 0..5 {
        assert_eq!(engine.color_pair_for_samples(&pixels), first);
    }
    assert_eq!(first.background, Rgb::new(10, 200, 90));
}

#[test]
fn white_artwork_never_gets_white_text_whatever_the_config() {
    let art = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, Rgba([255, 255, 255, 255])));
    for document in [
        "[theming]\nlight_luminance = 1.0\n",
        "[theming]\nlight_luminance = nan\n",
        "[theming]\ncontrast_distance = 0.0\nlightness_shift = 0\n",
    ] {
        let config = Config::parse(document).unwrap();
        let pair = ThemeEngine::new(config.theming).color_pair(&art);
        assert_eq!(pair.background, Rgb::WHITE, "{document}");
        assert_ne!(pair.foreground, pair.background, "{document}");
    }
}

#[test]
fn distance_thresholds_are_inclusive_at_their_edges() {
    let background = Rgb::new(200, 40, 40);
    let at_candidate_edge = Rgb::new(200, 40, 100);
    assert_eq!(at_candidate_edge.distance(background), 60.0);

    let palette = Palette::from(ColorQuantizer::default().quantize(&samples(&[
        (opaque(200, 40, 40), 10),
        (opaque(200, 40, 100), 4),
    ])));
    let selector = PaletteSelector::default();
    assert_eq!(selector.background(&palette), Some(background));
    let candidates: Vec<Rgb> = selector.foreground_candidates(&palette, background).collect();
    assert_eq!(candidates, vec![at_candidate_edge]);

    let at_contrast_edge = Rgb::new(200, 40, 160);
    assert_eq!(at_contrast_edge.distance(background), 120.0);
    assert_eq!(
        ContrastAdjuster::default().adjust(at_contrast_edge, background),
        at_contrast_edge
    );
}

#[test]
fn variance_of_exactly_fifteen_is_not_colorful() {
    let pixels = samples(&[(opaque(115, 100, 100), 9), (opaque(200, 40, 40), 2)]);
    let palette = Palette::from(ColorQuantizer::default().quantize(&pixels));
    assert_eq!(Rgb::new(115, 100, 100).channel_variance(), 15);
    assert_eq!(
        PaletteSelector::default().background(&palette),
        Some(Rgb::new(200, 40, 40))
    );

    let muted_only = samples(&[(opaque(115, 100, 100), 9), (opaque(60, 60, 60), 2)]);
    let palette = Palette::from(ColorQuantizer::default().quantize(&muted_only));
    assert_eq!(
        PaletteSelector::default().background(&palette),
        Some(Rgb::new(115, 100, 100))
    );
}
