use chrono::{DateTime, Local};

use crate::script::AdCreative;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoseReading<'a> {
    pub administered: u64,
    pub total: u64,
    pub unit: &'a str,
}

/// Read-only view of a session handed to the renderer.
#[derive(Debug, Clone)]
pub struct Snapshot<'a> {
    pub current_screen_index: usize,
    pub screen_content_lines: &'a [String],
    pub visible_line_indices: Vec<usize>,
    pub fading: bool,
    pub acknowledgment_required: bool,
    pub acknowledged: bool,
    pub acknowledge_label: &'a str,
    pub is_ad: bool,
    pub ad: Option<&'a AdCreative>,
    pub ad_countdown_remaining: u64,
    pub cannot_skip_notice: bool,
    pub refused_attempts: u32,
    pub ambience_intensity: f32,
    pub grain: f32,
    pub vignette: f32,
    pub flash: bool,
    pub administering: bool,
    pub elapsed_display: String,
    pub dose: Option<DoseReading<'a>>,
    pub status_label: &'a str,
    pub wall_time: DateTime<Local>,
    pub complete: bool,
    pub complete_label: &'a str,
}

impl Snapshot<'_> {
    pub fn is_line_visible(&self, line: usize) -> bool {
        self.visible_line_indices.contains(&line)
    }

    pub fn visible_lines(&self) -> impl Iterator<Item = &str> + '_ {
        self.visible_line_indices
            .iter()
            .filter_map(|&i| self.screen_content_lines.get(i))
            .map(String::as_str)
    }
}
