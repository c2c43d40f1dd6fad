use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::audio::{AudioBed, AudioState};
use crate::timer::Millis;

pub const INTENSITY_FLOOR: f32 = 0.2;
pub const INTENSITY_CEILING: f32 = 1.0;
pub const RAMP_MS: Millis = 500;
/// Muting for an interstitial is faster than an ordinary ramp.
pub const MUTE_RAMP_MS: Millis = 100;
pub const FLASH_MS: Millis = 200;
pub const BASE_FREQUENCY_HZ: f32 = 55.0;

/// Progress through the script mapped onto [floor, ceiling]; 0 on interstitials.
pub fn intensity_for(index: usize, len: usize, is_ad: bool) -> f32 {
    if is_ad || len == 0 {
        return 0.0;
    }
    (index as f32 / len as f32).clamp(INTENSITY_FLOOR, INTENSITY_CEILING)
}

pub fn frequency_for(intensity: f32) -> f32 {
    BASE_FREQUENCY_HZ + BASE_FREQUENCY_HZ * intensity
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Ramp {
    from: f32,
    to: f32,
    start: Millis,
    duration: Millis,
}

impl Ramp {
    fn settled(value: f32) -> Self {
        Self {
            from: value,
            to: value,
            start: 0,
            duration: 0,
        }
    }

    fn value_at(&self, now: Millis) -> f32 {
        if self.duration == 0 || now >= self.start + self.duration {
            return self.to;
        }
        let progress = now.saturating_sub(self.start) as f32 / self.duration as f32;
        self.from + (self.to - self.from) * progress
    }

    fn retarget(&mut self, now: Millis, to: f32, duration: Millis) {
        *self = Self {
            from: self.value_at(now),
            to,
            start: now,
            duration,
        };
    }
}

#[derive(Debug)]
pub struct Ambience {
    bed: AudioBed,
    volume: f32,
    reduced_motion: bool,
    intensity: f32,
    on_ad: bool,
    // clip of the interstitial on screen, if it has one
    clip: Option<PathBuf>,
    flash: bool,
    gain: Ramp,
    frequency: Ramp,
}

impl Ambience {
    pub fn new(bed: AudioBed, volume: f32, reduced_motion: bool) -> Self {
        Self {
            bed,
            volume: volume.clamp(0.0, 1.0),
            reduced_motion,
            intensity: 0.0,
            on_ad: false,
            clip: None,
            flash: false,
            gain: Ramp::settled(0.0),
            frequency: Ramp::settled(BASE_FREQUENCY_HZ),
        }
    }

    pub fn silent() -> Self {
        Self::new(AudioBed::disabled(), 0.0, false)
    }

    /// Any key press counts as the gesture that unlocks audio.
    pub fn on_user_gesture(&mut self, now: Millis) {
        if self.bed.state() != AudioState::Uninitialized {
            return;
        }
        if self.bed.initialize() == AudioState::Ready {
            // the bed was silent until now, so fade in from nothing
            self.gain = Ramp::settled(0.0);
            let duration = if self.on_ad { MUTE_RAMP_MS } else { RAMP_MS };
            self.ramp_to_target(now, duration);
            // the interstitial was entered while audio was still locked
            if let Some(clip) = &self.clip {
                self.bed.play_clip(clip);
            }
        }
    }

    /// Returns true when an entry flash was started.
    pub fn enter_screen(
        &mut self,
        now: Millis,
        index: usize,
        len: usize,
        is_ad: bool,
        clip: Option<&Path>,
    ) -> bool {
        let was_ad = std::mem::replace(&mut self.on_ad, is_ad);
        self.intensity = intensity_for(index, len, is_ad);
        debug!(index, intensity = self.intensity, is_ad, "ambience target");

        if was_ad {
            self.bed.stop_clip();
        }
        self.clip = clip.filter(|_| is_ad).map(Path::to_path_buf);

        if is_ad {
            self.ramp_to_target(now, MUTE_RAMP_MS);
            if let Some(clip) = &self.clip {
                self.bed.play_clip(clip);
            }
            if !self.reduced_motion {
                self.flash = true;
                return true;
            }
            return false;
        }

        self.ramp_to_target(now, RAMP_MS);
        false
    }

    pub fn end_flash(&mut self) {
        self.flash = false;
    }

    fn ramp_to_target(&mut self, now: Millis, duration: Millis) {
        self.bed.resume();
        let gain = self.intensity * self.volume;
        self.gain.retarget(now, gain, duration);
        self.frequency
            .retarget(now, frequency_for(self.intensity), duration);
    }

    pub fn update(&mut self, now: Millis) {
        if !self.bed.is_ready() {
            return;
        }
        let (gain, frequency) = (self.gain.value_at(now), self.frequency.value_at(now));
        self.bed.set_levels(gain, frequency);
    }

    pub fn teardown(&mut self) {
        self.bed.stop_clip();
        self.bed.set_levels(0.0, BASE_FREQUENCY_HZ);
        self.clip = None;
        self.flash = false;
        info!("ambience stopped");
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn gain_at(&self, now: Millis) -> f32 {
        self.gain.value_at(now)
    }

    pub fn audio_state(&self) -> AudioState {
        self.bed.state()
    }

    pub fn flash(&self) -> bool {
        self.flash && !self.reduced_motion
    }

    pub fn grain(&self) -> f32 {
        if self.reduced_motion {
            0.0
        } else {
            self.intensity
        }
    }

    pub fn vignette(&self) -> f32 {
        self.intensity
    }
}
