use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use darta::errors::{DartaError, DartaResult};
use darta::recorder::CaptureDevice;

const CHUNK_SIZE: usize = 32 * 1024;

/// Capture device backed by an audio file on disk, standing in for a live
/// microphone. Acquisition fails like a denied device when the file cannot
/// be opened.
pub struct FileCaptureDevice {
    path: PathBuf,
    reader: Option<BufReader<File>>,
}

impl FileCaptureDevice {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            reader: None,
        }
    }
}

#[async_trait]
impl CaptureDevice for FileCaptureDevice {
    async fn acquire(&mut self) -> DartaResult<()> {
        let file = File::open(&self.path).map_err(|e| {
            DartaError::DeviceUnavailable(format!("{}: {}", self.path.display(), e))
        })?;
        self.reader = Some(BufReader::new(file));
        Ok(())
    }

    async fn read_chunk(&mut self) -> DartaResult<Option<Vec<u8>>> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| DartaError::Internal("device not acquired".to_string()))?;

        let mut buffer = vec![0u8; CHUNK_SIZE];
        let read = reader
            .read(&mut buffer)
            .map_err(|e| DartaError::DeviceUnavailable(e.to_string()))?;
        if read == 0 {
            return Ok(None);
        }
        buffer.truncate(read);
        Ok(Some(buffer))
    }

    fn mime_type(&self) -> String {
        audio_mime_for(&self.path).to_string()
    }

    fn release(&mut self) {
        self.reader = None;
    }
}

fn audio_mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .as_deref()
    {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        Some("m4a") => "audio/mp4",
        _ => "audio/webm",
    }
}
