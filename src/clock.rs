use chrono::{DateTime, Duration as ChronoDuration, Local};

use crate::timer::Millis;

pub const HEARTBEAT_MS: Millis = 1000;

/// Wall-clock heartbeat. Only display values are derived from it; it never
/// drives the sequence.
#[derive(Debug, Clone)]
pub struct Clock {
    started_at: DateTime<Local>,
    last_beat: Millis,
}

impl Clock {
    pub fn new(started_at: DateTime<Local>) -> Self {
        Self {
            started_at,
            last_beat: 0,
        }
    }

    pub fn beat(&mut self, now: Millis) {
        self.last_beat = self.last_beat.max(now);
    }

    pub fn last_beat(&self) -> Millis {
        self.last_beat
    }

    pub fn wall_time(&self) -> DateTime<Local> {
        let offset = i64::try_from(self.last_beat).unwrap_or(i64::MAX);
        self.started_at + ChronoDuration::milliseconds(offset)
    }
}

/// A heartbeat that predates the phase start counts as zero.
pub fn elapsed_secs(phase_start: Millis, beat: Millis) -> u64 {
    beat.saturating_sub(phase_start) / 1000
}

/// `MM:SS`; minutes keep growing past 99.
pub fn format_elapsed(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub fn format_date(time: &DateTime<Local>) -> String {
    time.format("%m/%d/%Y").to_string()
}

pub fn format_time(time: &DateTime<Local>) -> String {
    time.format("%H:%M:%S").to_string()
}
