use std::process::Command;

use tracing::debug;

use super::{PlaybackSnapshot, SnapshotSource, TransportAction, TransportControl};
use crate::error::{OverlayError, Result};

const NOW_PLAYING_SCRIPT: &str = r#"
on run
    if application "Spotify" is running then
        tell application "Spotify"
            set track_id to current track's name
            set artist_name to artist of current track
            set art_url to artwork url of current track
            set track_duration to duration of current track
            set player_pos to player position
            set player_state to player state as string
            return track_id & "|" & artist_name & "|" & art_url & "|" & player_state & "|" & track_duration & "|" & (player_pos * 1000 as integer)
        end tell
    else
        return "Not Running|None||stopped|0|0"
    end if
end run
"#;

/// Talks to the Spotify desktop client through `osascript`.
#[derive(Debug, Clone)]
pub struct SpotifyScript {
    program: String,
}

impl Default for SpotifyScript {
    fn default() -> Self {
        Self {
            program: "osascript".to_string(),
        }
    }
}

impl SpotifyScript {
    fn run(&self, script: &str) -> std::io::Result<std::process::Output> {
        Command::new(&self.program).arg("-e").arg(script).output()
    }
}

impl SnapshotSource for SpotifyScript {
    fn fetch(&mut self) -> Result<PlaybackSnapshot> {
        let output = self
            .run(NOW_PLAYING_SCRIPT)
            .map_err(|e| OverlayError::fetch(format!("Failed to launch {}: {e}", self.program)))?;

        if !output.status.success() {
            return Err(OverlayError::fetch(format!(
                "AppleScript exited with {}",
                output.status
            )));
        }

        parse_script_output(&String::from_utf8_lossy(&output.stdout))
    }
}

impl TransportControl for SpotifyScript {
    fn send(&mut self, action: TransportAction) -> Result<()> {
        let script = match action {
            TransportAction::Play => r#"tell application "Spotify" to play"#,
            TransportAction::Pause => r#"tell application "Spotify" to pause"#,
            TransportAction::Next => r#"tell application "Spotify" to next track"#,
            TransportAction::Previous => r#"tell application "Spotify" to previous track"#,
        };

        let output = self
            .run(script)
            .map_err(|e| OverlayError::command(action.as_str(), e.to_string()))?;

        if !output.status.success() {
            return Err(OverlayError::command(
                action.as_str(),
                format!("AppleScript exited with {}", output.status),
            ));
        }

        debug!(%action, "sent transport command");
        Ok(())
    }
}

/// Parses `name|artist|artwork|state|duration_ms|position_ms`.
pub(crate) fn parse_script_output(output: &str) -> Result<PlaybackSnapshot> {
    let parts: Vec<&str> = output.trim().split('|').collect();
    if parts.len() < 6 {
        return Err(OverlayError::fetch(format!(
            "Invalid output format from AppleScript: expected 6 fields, got {}",
            parts.len()
        )));
    }

    let millis_to_secs = |field: &str| field.trim().parse::<f64>().ok().map(|ms| ms / 1000.0);

    Ok(PlaybackSnapshot {
        track_name: parts[0].to_string(),
        artist: parts[1].to_string(),
        album_art: parts[2].to_string(),
        is_playing: parts[3] == "playing",
        total_time: millis_to_secs(parts[4]),
        time_played: millis_to_secs(parts[5]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_playing_track() {
        let snapshot =
            parse_script_output("Song|Band|https://i.scdn.co/image/abc|playing|240000|60000\n")
                .unwrap();
        assert_eq!(snapshot.track_name, "Song");
        assert_eq!(snapshot.artist, "Band");
        assert_eq!(snapshot.album_art, "https://i.scdn.co/image/abc");
        assert!(snapshot.is_playing);
        assert_eq!(snapshot.total_time, Some(240.0));
        assert_eq!(snapshot.time_played, Some(60.0));
        assert_eq!(snapshot.percentage(), 25_000);
    }

    #[test]
    fn closed_player_maps_to_not_running() {
        let snapshot = parse_script_output("Not Running|None||stopped|0|0").unwrap();
        assert!(!snapshot.is_running());
        assert!(!snapshot.is_playing);
        assert!(snapshot.album_art.is_empty());
        assert_eq!(snapshot.percentage(), 0);
    }

    #[test]
    fn unparsable_numbers_mean_no_progress() {
        let snapshot = parse_script_output("Song|Band||paused|missing value|12000").unwrap();
        assert_eq!(snapshot.total_time, None);
        assert_eq!(snapshot.percentage(), 0);
    }

    #[test]
    fn short_output_is_a_fetch_failure() {
        let result = parse_script_output("Song|Band");
        assert!(matches!(result, Err(OverlayError::SnapshotFetchFailed(_))));
    }

    #[test]
    fn missing_program_fails_fetch_and_command() {
        let mut script = SpotifyScript {
            program: "definitely-not-osascript".to_string(),
        };
        assert!(matches!(
            script.fetch(),
            Err(OverlayError::SnapshotFetchFailed(_))
        ));
        assert!(matches!(
            script.send(TransportAction::Play),
            Err(OverlayError::CommandFailed { .. })
        ));
    }
}
