use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::{AudioDevice, AudioOutput};
use crate::error::AudioError;

/// Everything the mock output was asked to do.
#[derive(Debug, Default)]
pub struct AudioLog {
    pub opens: usize,
    pub resumes: usize,
    pub gains: Vec<f32>,
    pub frequencies: Vec<f32>,
    pub clips: Vec<PathBuf>,
    pub clip_stops: usize,
    pub suspended: bool,
    pub fail_open: bool,
    pub fail_resume: bool,
    pub fail_clips: bool,
}

impl AudioLog {
    pub fn last_gain(&self) -> Option<f32> {
        self.gains.last().copied()
    }
}

pub type SharedLog = Rc<RefCell<AudioLog>>;

/// Recording device for headless tests.
#[derive(Debug, Clone)]
pub struct MockDevice {
    log: SharedLog,
}

impl MockDevice {
    pub fn new() -> (Self, SharedLog) {
        let log = SharedLog::default();
        (Self { log: log.clone() }, log)
    }

    pub fn failing() -> (Self, SharedLog) {
        let (device, log) = Self::new();
        log.borrow_mut().fail_open = true;
        (device, log)
    }
}

impl AudioDevice for MockDevice {
    fn open(&mut self) -> Result<Box<dyn AudioOutput>, AudioError> {
        let mut log = self.log.borrow_mut();
        log.opens += 1;
        if log.fail_open {
            return Err(AudioError::Device("mock device refused to open".into()));
        }
        Ok(Box::new(MockOutput {
            log: self.log.clone(),
        }))
    }
}

struct MockOutput {
    log: SharedLog,
}

impl AudioOutput for MockOutput {
    fn resume(&mut self) -> Result<(), AudioError> {
        let mut log = self.log.borrow_mut();
        if log.fail_resume {
            return Err(AudioError::Device("mock resume failed".into()));
        }
        log.resumes += 1;
        log.suspended = false;
        Ok(())
    }

    fn is_suspended(&self) -> bool {
        self.log.borrow().suspended
    }

    fn set_gain(&mut self, gain: f32) {
        self.log.borrow_mut().gains.push(gain);
    }

    fn set_frequency(&mut self, hz: f32) {
        self.log.borrow_mut().frequencies.push(hz);
    }

    fn play_clip(&mut self, asset: &Path) -> Result<(), AudioError> {
        let mut log = self.log.borrow_mut();
        log.clips.push(asset.to_path_buf());
        if log.fail_clips {
            return Err(AudioError::Playback {
                asset: asset.to_path_buf(),
                reason: "mock playback failure".into(),
            });
        }
        Ok(())
    }

    fn stop_clip(&mut self) {
        self.log.borrow_mut().clip_stops += 1;
    }
}
