use anyhow::Context;
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{playback::DEFAULT_POLL_INTERVAL, theming::ThemeThresholds};

const MAX_LIGHT_LUMINANCE: f64 = 0.99;

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theming: ThemeThresholds,
    pub playback: PlaybackConfig,
    pub window: WindowConfig,
}

impl Config {
    /// Loads the first config file found next to the working directory or the
    /// executable, or the defaults when there is none.
    pub fn load() -> anyhow::Result<Self> {
        for path in Self::candidates() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(Config::default())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&data).with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub fn parse(data: &str) -> anyhow::Result<Self> {
        let doc: ConfigDocument = toml::from_str(data)?;
        Ok(doc.into())
    }

    fn candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Ok(current_dir) = env::current_dir() {
            candidates.push(current_dir.join("config.toml"));
            candidates.push(current_dir.join("config").join("config.toml"));
            candidates.push(current_dir.join("config").join("overlay.toml"));
        }

        if let Ok(exe) = env::current_exe() {
            if let Some(dir) = exe.parent() {
                candidates.push(dir.join("config.toml"));
                candidates.push(dir.join("config").join("config.toml"));
                candidates.push(dir.join("config").join("overlay.toml"));
            }
        }

        candidates
    }
}

/// Which player the overlay mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// The system media session on Windows, Spotify elsewhere.
    #[default]
    Auto,
    Spotify,
    System,
}

impl BackendKind {
    pub fn platform_default() -> Self {
        if cfg!(target_os = "windows") {
            BackendKind::System
        } else {
            BackendKind::Spotify
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    pub poll_interval: Duration,
    pub transition: Duration,
    pub source: BackendKind,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            transition: Duration::from_millis(500),
            source: BackendKind::Auto,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub always_on_top: bool,
    pub width: f32,
    pub height: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            always_on_top: true,
            width: 360.0,
            height: 120.0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    theming: ThemingSection,
    #[serde(default)]
    playback: PlaybackSection,
    #[serde(default)]
    window: WindowSection,
}

impl From<ConfigDocument> for Config {
    fn from(value: ConfigDocument) -> Self {
        let defaults = ThemeThresholds::default();
        let t = value.theming;
        let theming = ThemeThresholds {
            sample_size: t.sample_size.unwrap_or(defaults.sample_size).clamp(8, 512),
            bucket_width: t.bucket_width.unwrap_or(defaults.bucket_width).max(1),
            alpha_cutoff: t.alpha_cutoff.unwrap_or(defaults.alpha_cutoff),
            near_black_cutoff: t.near_black_cutoff.unwrap_or(defaults.near_black_cutoff),
            variance_threshold: t.variance_threshold.unwrap_or(defaults.variance_threshold),
            candidate_distance: t
                .candidate_distance
                .unwrap_or(defaults.candidate_distance)
                .max(0.0),
            contrast_distance: t
                .contrast_distance
                .unwrap_or(defaults.contrast_distance)
                .max(0.0),
            // below 1.0 so white always counts as light
            light_luminance: t
                .light_luminance
                .filter(|v| v.is_finite())
                .unwrap_or(defaults.light_luminance)
                .clamp(0.0, MAX_LIGHT_LUMINANCE),
            lightness_shift: t.lightness_shift.unwrap_or(defaults.lightness_shift),
        };

        let playback_defaults = PlaybackConfig::default();
        let p = value.playback;
        let playback = PlaybackConfig {
            poll_interval: p
                .poll_interval_ms
                .map(|ms| Duration::from_millis(ms.clamp(100, 10_000)))
                .unwrap_or(playback_defaults.poll_interval),
            transition: p
                .transition_ms
                .map(|ms| Duration::from_millis(ms.min(5_000)))
                .unwrap_or(playback_defaults.transition),
            source: p.source.unwrap_or(playback_defaults.source),
        };

        let window_defaults = WindowConfig::default();
        let w = value.window;
        let window = WindowConfig {
            always_on_top: w.always_on_top.unwrap_or(window_defaults.always_on_top),
            width: w.width.unwrap_or(window_defaults.width).max(200.0),
            height: w.height.unwrap_or(window_defaults.height).max(80.0),
        };

        Config {
            theming,
            playback,
            window,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ThemingSection {
    sample_size: Option<u32>,
    bucket_width: Option<u8>,
    alpha_cutoff: Option<u8>,
    near_black_cutoff: Option<u8>,
    variance_threshold: Option<u8>,
    candidate_distance: Option<f64>,
    contrast_distance: Option<f64>,
    light_luminance: Option<f64>,
    lightness_shift: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
struct PlaybackSection {
    poll_interval_ms: Option<u64>,
    transition_ms: Option<u64>,
    source: Option<BackendKind>,
}

#[derive(Debug, Default, Deserialize)]
struct WindowSection {
    always_on_top: Option<bool>,
    width: Option<f32>,
    height: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.theming, ThemeThresholds::default());
        assert_eq!(config.playback.poll_interval, Duration::from_millis(800));
        assert_eq!(config.playback.transition, Duration::from_millis(500));
        assert_eq!(config.playback.source, BackendKind::Auto);
        assert!(config.window.always_on_top);
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::parse(
            r#"
            [theming]
            bucket_width = 8
            candidate_distance = 75.5

            [playback]
            poll_interval_ms = 1000
            source = "spotify"

            [window]
            always_on_top = false
            "#,
        )
        .unwrap();

        assert_eq!(config.theming.bucket_width, 8);
        assert_eq!(config.theming.candidate_distance, 75.5);
        assert_eq!(config.theming.alpha_cutoff, 200);
        assert_eq!(config.playback.poll_interval, Duration::from_millis(1000));
        assert_eq!(config.playback.source, BackendKind::Spotify);
        assert!(!config.window.always_on_top);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let config = Config::parse(
            r#"
            [theming]
            bucket_width = 0
            light_luminance = 3.0
            sample_size = 1

            [playback]
            poll_interval_ms = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.theming.bucket_width, 1);
        assert_eq!(config.theming.light_luminance, 0.99);
        assert_eq!(config.theming.sample_size, 8);
        assert_eq!(config.playback.poll_interval, Duration::from_millis(100));
    }

    #[test]
    fn light_luminance_keeps_white_light() {
        let at_top = Config::parse("[theming]\nlight_luminance = 1.0\n").unwrap();
        assert_eq!(at_top.theming.light_luminance, 0.99);

        let not_a_number = Config::parse("[theming]\nlight_luminance = nan\n").unwrap();
        assert_eq!(
            not_a_number.theming.light_luminance,
            ThemeThresholds::default().light_luminance
        );
    }

    #[test]
    fn unknown_source_is_rejected() {
        assert!(Config::parse("[playback]\nsource = \"winamp\"").is_err());
    }

    #[test]
    fn load_from_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[theming\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));

        fs::write(&path, "[window]\nwidth = 500.0\n").unwrap();
        assert_eq!(Config::load_from(&path).unwrap().window.width, 500.0);
    }
}
