use std::{
    collections::hash_map::DefaultHasher,
    future::IntoFuture,
    hash::{Hash, Hasher},
};

use futures::executor::block_on;
use tracing::debug;
use windows::{
    core::Result as WinResult,
    Foundation::TimeSpan,
    Media::Control::{
        GlobalSystemMediaTransportControlsSession,
        GlobalSystemMediaTransportControlsSessionManager,
        GlobalSystemMediaTransportControlsSessionPlaybackStatus,
    },
    Storage::Streams::{DataReader, IRandomAccessStreamReference, InputStreamOptions},
    Win32::{
        Foundation::RPC_E_CHANGED_MODE,
        System::Com::{CoInitializeEx, CoUninitialize, COINIT_MULTITHREADED},
    },
};

use super::{PlaybackSnapshot, SnapshotSource, TransportAction, TransportControl};
use crate::{
    artwork::SESSION_THUMBNAIL_SCHEME,
    error::{OverlayError, Result},
};

const TICKS_PER_SECOND: f64 = 10_000_000.0;

/// Keeps COM initialized for as long as the owning thread needs it.
struct ComGuard {
    initialized: bool,
}

impl ComGuard {
    fn new() -> Result<Self> {
        let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
        if hr.is_ok() {
            Ok(Self { initialized: true })
        } else if hr == RPC_E_CHANGED_MODE {
            Ok(Self { initialized: false })
        } else {
            Err(OverlayError::fetch(format!("COM init failed: {hr:?}")))
        }
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        if self.initialized {
            unsafe {
                CoUninitialize();
            }
        }
    }
}

/// The Windows global media session (whatever app currently owns playback).
pub struct SystemSession {
    _com: ComGuard,
}

impl SystemSession {
    pub fn new() -> Result<Self> {
        Ok(Self {
            _com: ComGuard::new()?,
        })
    }
}

impl SnapshotSource for SystemSession {
    fn fetch(&mut self) -> Result<PlaybackSnapshot> {
        fetch_session_snapshot().map_err(|e| OverlayError::fetch(format!("{e:?}")))
    }
}

impl TransportControl for SystemSession {
    fn send(&mut self, action: TransportAction) -> Result<()> {
        let accepted = current_session()
            .and_then(|session| match action {
                TransportAction::Previous => block_on_operation(session.TrySkipPreviousAsync()?),
                TransportAction::Play => block_on_operation(session.TryPlayAsync()?),
                TransportAction::Pause => block_on_operation(session.TryPauseAsync()?),
                TransportAction::Next => block_on_operation(session.TrySkipNextAsync()?),
            })
            .map_err(|e| OverlayError::command(action.as_str(), format!("{e:?}")))?;

        if accepted {
            debug!(%action, "sent transport command");
            Ok(())
        } else {
            Err(OverlayError::command(
                action.as_str(),
                "rejected by the media session",
            ))
        }
    }
}

/// Reads the current session's thumbnail, initializing COM on the calling thread.
pub fn load_session_thumbnail() -> Result<Option<Vec<u8>>> {
    let _com = ComGuard::new().map_err(|e| OverlayError::sample(e.to_string()))?;
    fetch_thumbnail_bytes().map_err(|e| OverlayError::sample(format!("{e:?}")))
}

fn time_span_to_secs(span: TimeSpan) -> f64 {
    span.Duration as f64 / TICKS_PER_SECOND
}

fn block_on_operation<O, T>(operation: O) -> WinResult<T>
where
    O: IntoFuture<Output = WinResult<T>>,
{
    block_on(operation.into_future())
}

fn current_session() -> WinResult<GlobalSystemMediaTransportControlsSession> {
    let manager =
        block_on_operation(GlobalSystemMediaTransportControlsSessionManager::RequestAsync()?)?;
    manager.GetCurrentSession()
}

fn fetch_session_snapshot() -> WinResult<PlaybackSnapshot> {
    let session = current_session()?;

    let props = block_on_operation(session.TryGetMediaPropertiesAsync()?)?;
    let status = session.GetPlaybackInfo()?.PlaybackStatus()?;

    let track_name = props.Title()?.to_string_lossy();
    let artist = props.Artist()?.to_string_lossy();
    let album = props.AlbumTitle()?.to_string_lossy();

    let timeline = session.GetTimelineProperties()?;
    let start = time_span_to_secs(timeline.StartTime()?);
    let end = time_span_to_secs(timeline.EndTime()?);
    let position = time_span_to_secs(timeline.Position()?);

    let album_art = if props.Thumbnail().is_ok() {
        thumbnail_uri(&track_name, &artist, &album)
    } else {
        String::new()
    };

    Ok(PlaybackSnapshot {
        track_name,
        artist,
        album_art,
        is_playing: status == GlobalSystemMediaTransportControlsSessionPlaybackStatus::Playing,
        time_played: Some(position - start),
        total_time: Some(end - start),
    })
}

/// The session exposes artwork as a stream, not a URI; key it by track identity
/// so a new track produces a new URI.
fn thumbnail_uri(track_name: &str, artist: &str, album: &str) -> String {
    let mut hasher = DefaultHasher::new();
    (track_name, artist, album).hash(&mut hasher);
    format!("{SESSION_THUMBNAIL_SCHEME}://{:016x}", hasher.finish())
}

fn fetch_thumbnail_bytes() -> WinResult<Option<Vec<u8>>> {
    let session = current_session()?;
    let props = block_on_operation(session.TryGetMediaPropertiesAsync()?)?;

    let reference: IRandomAccessStreamReference = match props.Thumbnail() {
        Ok(reference) => reference,
        Err(_) => return Ok(None),
    };

    let stream = block_on_operation(reference.OpenReadAsync()?)?;
    let input_stream = stream.GetInputStreamAt(0)?;
    let reader = DataReader::CreateDataReader(&input_stream)?;
    reader.SetInputStreamOptions(InputStreamOptions::Partial)?;

    let mut buffer = Vec::new();
    const CHUNK: u32 = 64 * 1024;

    loop {
        let loaded = block_on_operation(reader.LoadAsync(CHUNK)?)?;
        if loaded == 0 {
            break;
        }
        let mut chunk = vec![0u8; loaded as usize];
        reader.ReadBytes(&mut chunk)?;
        buffer.extend_from_slice(&chunk);
        if loaded < CHUNK {
            break;
        }
    }

    Ok(Some(buffer))
}
