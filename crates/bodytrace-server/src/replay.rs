//! Replay of recorded sensor messages.
//!
//! Recordings are raw message bodies saved as `frame.<epoch_ms>.json`. The
//! replay driver feeds them through the same processing path a live sensor
//! would, pacing messages by the deltas between their recorded timestamps
//! and looping back to the first file at the end. Useful for developing the
//! visualization layer without a sensor on the network.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ingest::process_and_broadcast;
use crate::state::SceneState;
use crate::ServerError;

/// One recorded message on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayFile {
    /// Path to the recording
    pub path: PathBuf,
    /// Capture time parsed from the filename, epoch milliseconds
    pub timestamp: i64,
}

/// Parses `frame.<epoch_ms>.json` into its timestamp.
#[must_use]
pub fn parse_frame_timestamp(file_name: &str) -> Option<i64> {
    let rest = file_name.strip_prefix("frame.")?;
    let stamp = rest.strip_suffix(".json")?;
    stamp.parse().ok()
}

/// Scans a directory for recordings, ordered by capture time.
///
/// Files that do not follow the recording naming scheme are ignored.
///
/// # Errors
///
/// Fails when the directory cannot be read or holds no recordings at all,
/// since replaying nothing forever would only mask a misconfigured path.
pub fn scan_recordings(dir: &Path) -> Result<Vec<ReplayFile>, ServerError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(timestamp) = name.to_str().and_then(parse_frame_timestamp) else {
            continue;
        };
        files.push(ReplayFile {
            path: entry.path(),
            timestamp,
        });
    }

    if files.is_empty() {
        return Err(ServerError::EmptyReplayDir {
            path: dir.to_path_buf(),
        });
    }

    files.sort_by_key(|f| f.timestamp);
    Ok(files)
}

/// Delay before playing `current`, given the previously played recording.
#[must_use]
pub fn replay_delay(previous: Option<&ReplayFile>, current: &ReplayFile) -> Duration {
    match previous {
        Some(prev) if current.timestamp > prev.timestamp => {
            Duration::from_millis((current.timestamp - prev.timestamp) as u64)
        }
        // First file, or a wrap back to the start of the loop.
        _ => Duration::ZERO,
    }
}

/// Replays the directory's recordings through the scene forever.
///
/// # Errors
///
/// Fails on startup when the directory is unreadable or empty; individual
/// unreadable recordings are skipped with a warning once running.
pub async fn run(state: SceneState, dir: PathBuf) -> Result<(), ServerError> {
    let files = scan_recordings(&dir)?;
    tracing::info!(
        recordings = files.len(),
        dir = %dir.display(),
        "replaying recorded frames"
    );

    let mut previous: Option<&ReplayFile> = None;
    loop {
        for file in &files {
            tokio::time::sleep(replay_delay(previous, file)).await;
            previous = Some(file);

            let body = match tokio::fs::read_to_string(&file.path).await {
                Ok(body) => body,
                Err(err) => {
                    tracing::warn!(error = %err, path = %file.path.display(), "skipping unreadable recording");
                    continue;
                }
            };
            process_and_broadcast(&state, &body);
        }
    }
}
