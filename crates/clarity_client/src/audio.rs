//! Playback of synthesized replies. The agent sends MP3 clips as base64.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::debug;

use crate::error::PlaybackError;

pub trait AudioSink {
    fn play(&mut self, payload: &str) -> Result<(), PlaybackError>;
}

/// Validates clips and discards them.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn play(&mut self, payload: &str) -> Result<(), PlaybackError> {
        let clip = STANDARD.decode(payload)?;
        debug!(bytes = clip.len(), "audio clip discarded");
        Ok(())
    }
}

/// Writes each clip to `dir/reply-NNNN.mp3` for an external player.
#[derive(Debug, Clone)]
pub struct SpoolSink {
    dir: PathBuf,
    next: u32,
}

impl SpoolSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            next: 1,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl AudioSink for SpoolSink {
    fn play(&mut self, payload: &str) -> Result<(), PlaybackError> {
        let clip = STANDARD.decode(payload)?;
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("reply-{:04}.mp3", self.next));
        std::fs::write(&path, &clip)?;
        self.next += 1;
        debug!(path = %path.display(), bytes = clip.len(), "audio clip spooled");
        Ok(())
    }
}

/// `data:` URI form of a clip, for players that take a URL.
pub fn data_uri(payload: &str) -> String {
    format!("data:audio/mp3;base64,{payload}")
}
