use std::f32::consts::TAU;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use super::{AudioDevice, AudioOutput};
use crate::error::AudioError;

const SAMPLE_RATE: u32 = 44_100;
const DRONE_AMPLITUDE: f32 = 0.25;

/// Default output device through rodio.
#[derive(Debug, Default, Clone, Copy)]
pub struct RodioDevice;

impl AudioDevice for RodioDevice {
    fn open(&mut self) -> Result<Box<dyn AudioOutput>, AudioError> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| AudioError::Device(e.to_string()))?;
        let bed = Sink::try_new(&handle).map_err(|e| AudioError::Device(e.to_string()))?;

        let frequency = Arc::new(AtomicU32::new(55.0_f32.to_bits()));
        bed.set_volume(0.0);
        bed.append(Drone::new(frequency.clone()));

        Ok(Box::new(RodioOutput {
            _stream: stream,
            handle,
            bed,
            frequency,
            clip: None,
        }))
    }
}

struct RodioOutput {
    // dropping the stream silences every sink
    _stream: OutputStream,
    handle: OutputStreamHandle,
    bed: Sink,
    frequency: Arc<AtomicU32>,
    clip: Option<Sink>,
}

impl AudioOutput for RodioOutput {
    fn resume(&mut self) -> Result<(), AudioError> {
        if self.bed.is_paused() {
            self.bed.play();
        }
        Ok(())
    }

    fn is_suspended(&self) -> bool {
        self.bed.is_paused()
    }

    fn set_gain(&mut self, gain: f32) {
        self.bed.set_volume(gain);
    }

    fn set_frequency(&mut self, hz: f32) {
        self.frequency.store(hz.to_bits(), Ordering::Relaxed);
    }

    fn play_clip(&mut self, asset: &Path) -> Result<(), AudioError> {
        self.stop_clip();

        let file = File::open(asset)?;
        let source = Decoder::new(BufReader::new(file)).map_err(|e| AudioError::Playback {
            asset: asset.to_path_buf(),
            reason: e.to_string(),
        })?;
        let sink = Sink::try_new(&self.handle).map_err(|e| AudioError::Playback {
            asset: asset.to_path_buf(),
            reason: e.to_string(),
        })?;
        sink.append(source);
        self.clip = Some(sink);
        Ok(())
    }

    fn stop_clip(&mut self) {
        // a fresh decoder is built on the next play, which rewinds the clip
        if let Some(sink) = self.clip.take() {
            sink.stop();
        }
    }
}

/// Endless sine whose pitch follows a shared atomic.
struct Drone {
    frequency: Arc<AtomicU32>,
    phase: f32,
}

impl Drone {
    fn new(frequency: Arc<AtomicU32>) -> Self {
        Self {
            frequency,
            phase: 0.0,
        }
    }
}

impl Iterator for Drone {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let hz = f32::from_bits(self.frequency.load(Ordering::Relaxed));
        self.phase = (self.phase + hz / SAMPLE_RATE as f32).fract();
        Some((self.phase * TAU).sin() * DRONE_AMPLITUDE)
    }
}

impl Source for Drone {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}
