//! Loading album art and running the theming pass over it.
//!
//! Every load happens on its own thread and is tagged with a request id; only
//! the result for the most recent request is ever handed back.

use std::{
    fs,
    path::PathBuf,
    sync::mpsc::{self, Receiver, TryRecvError},
    thread,
    time::Duration,
};

use image::RgbaImage;
use tracing::{debug, warn};

use crate::{
    error::{OverlayError, Result},
    theming::{decode_artwork, ColorPair, ThemeEngine},
};

pub const SESSION_THUMBNAIL_SCHEME: &str = "session-thumbnail";

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the bytes for an `album_art` URI come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtworkSource {
    Placeholder,
    Remote(String),
    File(PathBuf),
    SessionThumbnail,
}

impl ArtworkSource {
    pub fn from_uri(uri: &str) -> Self {
        let uri = uri.trim();
        if uri.is_empty() {
            return ArtworkSource::Placeholder;
        }
        if uri.starts_with("http://") || uri.starts_with("https://") {
            return ArtworkSource::Remote(uri.to_string());
        }
        if let Some(path) = uri.strip_prefix("file://") {
            return ArtworkSource::File(PathBuf::from(path));
        }
        if uri
            .strip_prefix(SESSION_THUMBNAIL_SCHEME)
            .is_some_and(|rest| rest.starts_with("://"))
        {
            return ArtworkSource::SessionThumbnail;
        }
        ArtworkSource::File(PathBuf::from(uri))
    }

    /// Encoded image bytes, or `None` for the placeholder.
    pub fn load(&self) -> Result<Option<Vec<u8>>> {
        match self {
            ArtworkSource::Placeholder => Ok(None),
            ArtworkSource::Remote(url) => fetch_remote(url).map(Some),
            ArtworkSource::File(path) => fs::read(path).map(Some).map_err(|e| {
                OverlayError::sample(format!("Failed to read {}: {e}", path.display()))
            }),
            #[cfg(target_os = "windows")]
            ArtworkSource::SessionThumbnail => crate::playback::load_session_thumbnail(),
            #[cfg(not(target_os = "windows"))]
            ArtworkSource::SessionThumbnail => Err(OverlayError::sample(
                "session thumbnails are only available on Windows",
            )),
        }
    }
}

fn fetch_remote(url: &str) -> Result<Vec<u8>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|e| OverlayError::sample(format!("Failed to build HTTP client: {e}")))?;

    let response = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .map_err(|e| OverlayError::sample(format!("Failed to fetch {url}: {e}")))?;

    let bytes = response
        .bytes()
        .map_err(|e| OverlayError::sample(format!("Failed to read {url}: {e}")))?;
    Ok(bytes.to_vec())
}

/// Decoded artwork plus the colors derived from it.
#[derive(Debug, Clone)]
pub struct ArtworkResult {
    pub request_id: u64,
    pub uri: String,
    /// `None` when the placeholder is shown.
    pub image: Option<RgbaImage>,
    pub pair: ColorPair,
}

/// Loads artwork and themes it, synchronously.
pub fn load_and_theme(engine: &ThemeEngine, uri: &str) -> (Option<RgbaImage>, ColorPair) {
    let source = ArtworkSource::from_uri(uri);
    let decoded = source
        .load()
        .and_then(|bytes| bytes.map(|bytes| decode_artwork(&bytes)).transpose());

    match decoded {
        Ok(Some(image)) => {
            let pair = engine.color_pair(&image);
            (Some(image.to_rgba8()), pair)
        }
        Ok(None) => {
            debug!("no artwork, showing placeholder");
            (None, engine.fallback_pair())
        }
        Err(err) => {
            warn!(%err, uri, "artwork unavailable");
            (None, engine.fallback_pair())
        }
    }
}

/// Hands artwork loads to background threads, keeping only the newest.
pub struct ArtworkPipeline {
    engine: ThemeEngine,
    next_request_id: u64,
    inflight: Option<(u64, Receiver<ArtworkResult>)>,
}

impl ArtworkPipeline {
    pub fn new(engine: ThemeEngine) -> Self {
        Self {
            engine,
            next_request_id: 1,
            inflight: None,
        }
    }

    pub fn engine(&self) -> &ThemeEngine {
        &self.engine
    }

    pub fn is_loading(&self) -> bool {
        self.inflight.is_some()
    }

    /// Starts loading `uri`, superseding any load still in progress.
    pub fn request(&mut self, uri: &str) -> u64 {
        let request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);

        let (tx, rx) = mpsc::channel();
        self.inflight = Some((request_id, rx));

        let engine = self.engine.clone();
        let uri = uri.to_string();
        thread::spawn(move || {
            let (image, pair) = load_and_theme(&engine, &uri);
            let _ = tx.send(ArtworkResult {
                request_id,
                uri,
                image,
                pair,
            });
        });

        request_id
    }

    /// Result of the newest request once it is ready.
    pub fn poll(&mut self) -> Option<ArtworkResult> {
        let (request_id, received) = {
            let (request_id, rx) = self.inflight.as_ref()?;
            (*request_id, rx.try_recv())
        };
        match received {
            Ok(result) if result.request_id == request_id => {
                self.inflight = None;
                Some(result)
            }
            Ok(_) | Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                warn!(request_id, "artwork loader exited without a result");
                self.inflight = None;
                None
            }
        }
    }
}
