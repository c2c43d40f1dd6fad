pub mod mock;
#[cfg(feature = "audio")]
pub mod rodio_backend;

use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::AudioError;

/// An ambience drone plus one clip slot.
pub trait AudioOutput {
    fn resume(&mut self) -> Result<(), AudioError>;
    fn is_suspended(&self) -> bool;
    fn set_gain(&mut self, gain: f32);
    fn set_frequency(&mut self, hz: f32);
    fn play_clip(&mut self, asset: &Path) -> Result<(), AudioError>;
    /// Stops the clip and rewinds it.
    fn stop_clip(&mut self);
}

pub trait AudioDevice {
    fn open(&mut self) -> Result<Box<dyn AudioOutput>, AudioError>;
}

/// Device for builds without an audio backend. Opening it always fails, which
/// sends the bed straight to `Unavailable`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentDevice;

impl AudioDevice for SilentDevice {
    fn open(&mut self) -> Result<Box<dyn AudioOutput>, AudioError> {
        Err(AudioError::Unsupported(
            "built without the `audio` feature".to_string(),
        ))
    }
}

pub fn default_device() -> Box<dyn AudioDevice> {
    #[cfg(feature = "audio")]
    {
        Box::new(rodio_backend::RodioDevice)
    }
    #[cfg(not(feature = "audio"))]
    {
        Box::new(SilentDevice)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioState {
    Uninitialized,
    Initializing,
    Ready,
    Unavailable,
}

/// Opened lazily on the first user gesture. Once `Unavailable`, every call is a no-op.
pub struct AudioBed {
    device: Option<Box<dyn AudioDevice>>,
    output: Option<Box<dyn AudioOutput>>,
    state: AudioState,
}

impl std::fmt::Debug for AudioBed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioBed").field("state", &self.state).finish()
    }
}

impl AudioBed {
    pub fn new(device: Box<dyn AudioDevice>) -> Self {
        Self {
            device: Some(device),
            output: None,
            state: AudioState::Uninitialized,
        }
    }

    pub fn disabled() -> Self {
        Self {
            device: None,
            output: None,
            state: AudioState::Unavailable,
        }
    }

    pub fn state(&self) -> AudioState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == AudioState::Ready
    }

    pub fn initialize(&mut self) -> AudioState {
        if self.state != AudioState::Uninitialized {
            return self.state;
        }

        self.state = AudioState::Initializing;
        let opened = match self.device.take() {
            Some(mut device) => device.open(),
            None => Err(AudioError::Unsupported("no audio device".to_string())),
        };

        match opened {
            Ok(output) => {
                info!("audio ready");
                self.output = Some(output);
                self.state = AudioState::Ready;
            }
            Err(err) => {
                warn!(error = %err, "audio unavailable, continuing silently");
                self.state = AudioState::Unavailable;
            }
        }
        self.state
    }

    /// A failed resume disables audio for good.
    pub fn resume(&mut self) {
        let Some(output) = self.output.as_mut() else {
            return;
        };
        if !output.is_suspended() {
            return;
        }
        if let Err(err) = output.resume() {
            warn!(error = %err, "audio resume failed, disabling audio");
            self.output = None;
            self.state = AudioState::Unavailable;
        }
    }

    pub fn set_levels(&mut self, gain: f32, frequency: f32) {
        if let Some(output) = self.output.as_mut() {
            output.set_gain(gain.clamp(0.0, 1.0));
            output.set_frequency(frequency);
        }
    }

    /// Playback failures are logged and otherwise ignored.
    pub fn play_clip(&mut self, asset: &Path) {
        let Some(output) = self.output.as_mut() else {
            debug!(asset = %asset.display(), "no audio, skipping clip");
            return;
        };
        match output.play_clip(asset) {
            Ok(()) => info!(asset = %asset.display(), "clip playing"),
            Err(err) => warn!(error = %err, "clip playback failed"),
        }
    }

    pub fn stop_clip(&mut self) {
        if let Some(output) = self.output.as_mut() {
            output.stop_clip();
        }
    }
}
