use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::attachment::Attachment;
use crate::errors::{DartaError, DartaResult};

/// Abstraction over a microphone-style capture source. `acquire` must
/// succeed before any chunk is read; `release` stops the underlying tracks
/// and must be safe to call more than once.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CaptureDevice: Send {
    async fn acquire(&mut self) -> DartaResult<()>;

    /// Next buffered chunk, or `None` once the source is exhausted.
    async fn read_chunk(&mut self) -> DartaResult<Option<Vec<u8>>>;

    fn mime_type(&self) -> String;

    fn release(&mut self);
}

enum RecorderState {
    Idle,
    Recording {
        device: Box<dyn CaptureDevice>,
        chunks: Vec<Vec<u8>>,
    },
}

/// Two-state recording machine: `Idle -> Recording -> Idle`. The device is
/// exclusively owned for the duration of one recording and released on every
/// exit path from `Recording`.
pub struct Recorder {
    state: RecorderState,
}

impl Recorder {
    pub fn new() -> Self {
        Recorder {
            state: RecorderState::Idle,
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording { .. })
    }

    /// Acquire the device and enter `Recording`. Denied or missing hardware
    /// surfaces as `DeviceUnavailable` and the recorder stays `Idle`.
    pub async fn start(&mut self, mut device: Box<dyn CaptureDevice>) -> DartaResult<()> {
        if self.is_recording() {
            return Err(DartaError::Internal(
                "a recording is already in progress".to_string(),
            ));
        }
        device.acquire().await?;
        self.state = RecorderState::Recording {
            device,
            chunks: Vec::new(),
        };
        Ok(())
    }

    /// Flush buffered chunks into one audio attachment and release the device.
    pub async fn stop(&mut self) -> DartaResult<Attachment> {
        match std::mem::replace(&mut self.state, RecorderState::Idle) {
            RecorderState::Idle => Err(DartaError::Internal(
                "no recording in progress".to_string(),
            )),
            RecorderState::Recording {
                mut device,
                mut chunks,
            } => {
                loop {
                    match device.read_chunk().await {
                        Ok(Some(chunk)) => chunks.push(chunk),
                        Ok(None) => break,
                        Err(e) => {
                            device.release();
                            return Err(e);
                        }
                    }
                }
                let mime_type = device.mime_type();
                device.release();
                let buffer: Vec<u8> = chunks.concat();
                Ok(Attachment::audio(&buffer, mime_type))
            }
        }
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if let RecorderState::Recording { device, .. } = &mut self.state {
            device.release();
        }
    }
}
