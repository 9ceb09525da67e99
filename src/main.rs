use eframe::egui::{
    self, Color32, ColorImage, CornerRadius, RichText, TextureHandle, TextureOptions,
    ViewportBuilder, ViewportCommand, WindowLevel,
};
use now_playing_overlay::{
    artwork::ArtworkPipeline,
    config::Config,
    playback::{
        format_timestamp, open_backend, PlaybackSnapshot, PlaybackState, PlaybackWorker,
        TransportAction,
    },
    theming::{ColorPair, Rgb, ThemeEngine},
};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const ARTWORK_SIZE: f32 = 96.0;
const TRANSITION_ALPHA: f32 = 0.35;
const PROGRESS_HEIGHT: f32 = 4.0;
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

fn to_color32(color: Rgb) -> Color32 {
    Color32::from_rgb(color.r, color.g, color.b)
}

fn with_alpha(color: Rgb, alpha: f32) -> Color32 {
    let alpha = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgba_unmultiplied(color.r, color.g, color.b, alpha)
}

/// Themed background, or the stock panel fill while no player is running.
fn panel_fill(stock: Color32, pair: ColorPair, snapshot: &PlaybackSnapshot) -> Color32 {
    if snapshot.is_running() {
        to_color32(pair.background)
    } else {
        stock
    }
}

struct App {
    playback: PlaybackState,
    worker: PlaybackWorker,
    artwork: ArtworkPipeline,
    pair: ColorPair,
    artwork_texture: Option<TextureHandle>,
    artwork_alpha: f32,
}

impl App {
    fn new(config: Config) -> Self {
        let source = config.playback.source;
        let worker =
            PlaybackWorker::spawn(config.playback.poll_interval, move || open_backend(source));

        let engine = ThemeEngine::new(config.theming);
        let pair = engine.fallback_pair();
        let mut artwork = ArtworkPipeline::new(engine);
        artwork.request("");

        Self {
            playback: PlaybackState::new(config.playback.transition),
            worker,
            artwork,
            pair,
            artwork_texture: None,
            artwork_alpha: 1.0,
        }
    }

    fn sync_playback(&mut self, now: Instant) {
        for event in self.worker.drain() {
            let outcome = self.playback.apply(event, now);
            if let Some(uri) = outcome.artwork_changed {
                self.artwork.request(&uri);
            }
        }
        self.worker.tick(now);
    }

    fn sync_artwork(&mut self, ctx: &egui::Context) {
        let Some(result) = self.artwork.poll() else {
            return;
        };

        self.pair = result.pair;
        self.artwork_texture = result.image.map(|image| {
            let size = [image.width() as usize, image.height() as usize];
            let color_image = ColorImage::from_rgba_unmultiplied(size, image.as_raw());
            ctx.load_texture("now_playing.artwork", color_image, TextureOptions::LINEAR)
        });
    }

    fn adjust_artwork_alpha(&mut self, now: Instant) -> bool {
        let target = if self.playback.is_transitioning(now) {
            TRANSITION_ALPHA
        } else {
            1.0
        };
        self.artwork_alpha = egui::lerp(self.artwork_alpha..=target, 0.2);
        (self.artwork_alpha - target).abs() > 0.01
    }

    fn desired_repaint_interval(&self, now: Instant, animating: bool) -> Duration {
        if animating || self.playback.is_transitioning(now) || self.artwork.is_loading() {
            return FRAME_INTERVAL;
        }
        self.worker
            .until_next_tick(now)
            .clamp(FRAME_INTERVAL, self.worker.interval())
    }

    fn render_artwork(&self, ui: &mut egui::Ui) {
        let size = egui::vec2(ARTWORK_SIZE, ARTWORK_SIZE);
        let rounding = CornerRadius::same(6);
        match &self.artwork_texture {
            Some(texture) => {
                let image = egui::Image::new((texture.id(), size))
                    .fit_to_exact_size(size)
                    .corner_radius(rounding)
                    .tint(Color32::from_white_alpha(
                        (self.artwork_alpha * 255.0).round() as u8,
                    ));
                ui.add(image);
            }
            None => {
                let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
                ui.painter().rect_filled(
                    rect,
                    rounding,
                    with_alpha(self.pair.foreground, 0.15 * self.artwork_alpha),
                );
            }
        }
    }

    fn render_progress(&self, ui: &mut egui::Ui) {
        let width = ui.available_width().max(1.0);
        let (rect, _) =
            ui.allocate_exact_size(egui::vec2(width, PROGRESS_HEIGHT), egui::Sense::hover());
        let rounding = CornerRadius::same(2);
        let painter = ui.painter();
        painter.rect_filled(rect, rounding, with_alpha(self.pair.foreground, 0.3));

        let fraction = self.playback.snapshot().progress_fraction();
        if fraction > 0.0 {
            let mut filled = rect;
            filled.set_width(rect.width() * fraction);
            painter.rect_filled(filled, rounding, to_color32(self.pair.foreground));
        }
    }

    fn render_controls(&mut self, ui: &mut egui::Ui) {
        let fg = to_color32(self.pair.foreground);
        let play_pause = if self.playback.snapshot().is_playing {
            (TransportAction::Pause, "⏸")
        } else {
            (TransportAction::Play, "⏵")
        };
        let buttons = [
            (TransportAction::Previous, "⏮"),
            play_pause,
            (TransportAction::Next, "⏭"),
        ];

        ui.horizontal(|row| {
            row.spacing_mut().item_spacing.x = 12.0;
            for (action, icon) in buttons {
                let button = egui::Button::new(RichText::new(icon).color(fg).size(18.0)).frame(false);
                if row.add(button).on_hover_text(action.as_str()).clicked() {
                    self.worker.transport(action);
                }
            }
        });
    }

    fn render_now_playing(&mut self, ui: &mut egui::Ui) {
        let fg = to_color32(self.pair.foreground);
        let snapshot = self.playback.snapshot().clone();

        ui.horizontal(|row| {
            row.spacing_mut().item_spacing.x = 12.0;
            self.render_artwork(row);

            row.vertical(|col| {
                col.spacing_mut().item_spacing.y = 4.0;
                col.add(
                    egui::Label::new(
                        RichText::new(&snapshot.track_name)
                            .color(fg)
                            .strong()
                            .size(16.0),
                    )
                    .truncate(),
                );
                if !snapshot.artist.is_empty() {
                    col.add(
                        egui::Label::new(RichText::new(&snapshot.artist).color(fg).size(13.0))
                            .truncate(),
                    );
                }

                self.render_progress(col);

                col.horizontal(|times| {
                    let played = snapshot.time_played.unwrap_or(0.0);
                    let total = snapshot.total_time.unwrap_or(0.0);
                    times.label(RichText::new(format_timestamp(played)).color(fg).size(11.0));
                    times.with_layout(egui::Layout::right_to_left(egui::Align::Center), |right| {
                        right.label(RichText::new(format_timestamp(total)).color(fg).size(11.0));
                    });
                });

                self.render_controls(col);
            });
        });
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.sync_playback(now);
        self.sync_artwork(ctx);
        let animating = self.adjust_artwork_alpha(now);

        let mut panel_frame = egui::Frame::central_panel(&ctx.style());
        panel_frame.fill = panel_fill(panel_frame.fill, self.pair, self.playback.snapshot());

        egui::CentralPanel::default()
            .frame(panel_frame)
            .show(ctx, |ui| {
                let drag = ui.interact(
                    ui.max_rect(),
                    ui.id().with("overlay.drag"),
                    egui::Sense::drag(),
                );
                if drag.drag_started() {
                    ctx.send_viewport_cmd(ViewportCommand::StartDrag);
                }

                self.render_now_playing(ui);
            });

        ctx.request_repaint_after(self.desired_repaint_interval(now, animating));
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Config::load().unwrap_or_else(|err| {
        warn!("{err:#}; using default configuration");
        Config::default()
    });
    info!(source = ?config.playback.source, "starting overlay");

    let window_level = if config.window.always_on_top {
        WindowLevel::AlwaysOnTop
    } else {
        WindowLevel::Normal
    };
    let native_options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([config.window.width, config.window.height])
            .with_decorations(false)
            .with_resizable(false)
            .with_window_level(window_level),
        ..Default::default()
    };

    let run_res = eframe::run_native(
        "Now Playing",
        native_options,
        Box::new(
            move |_cc| -> std::result::Result<
                Box<dyn eframe::App>,
                Box<dyn std::error::Error + Send + Sync>,
            > { Ok(Box::new(App::new(config))) },
        ),
    );
    if let Err(e) = run_res {
        return Err(Box::new(e));
    }

    Ok(())
}
