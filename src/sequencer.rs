use chrono::{DateTime, Local};
use tracing::{debug, info, trace};

use crate::ad_gate::{AdGate, COUNTDOWN_STEP_MS, NOTICE_MS};
use crate::ambience::{Ambience, FLASH_MS};
use crate::clock::{self, Clock, HEARTBEAT_MS};
use crate::reveal::LineRevealer;
use crate::script::{Advance, Screen, Script};
use crate::snapshot::{DoseReading, Snapshot};
use crate::timer::{Millis, Tenure, TimerId, TimerKind, TimerQueue};

pub const FADE_MS: Millis = 1000;
pub const SETTLE_MS: Millis = 500;

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub current_index: usize,
    pub fading: bool,
    pub acknowledged: bool,
    pub phase_start: Option<Millis>,
    pub revealer: LineRevealer,
    pub ad_gate: AdGate,
}

/// Owns the index and every timer that can move it. A transition is a fade
/// followed by the screen change; `advance` is rejected while a fade runs.
#[derive(Debug)]
pub struct Sequencer {
    script: Script,
    state: SessionState,
    timers: TimerQueue,
    clock: Clock,
    ambience: Ambience,
    now: Millis,
    epoch: u64,
    auto_timer: Option<TimerId>,
    notice_timer: Option<TimerId>,
    transitions: usize,
    started: bool,
    torn_down: bool,
}

impl Sequencer {
    pub fn new(script: Script, ambience: Ambience, started_at: DateTime<Local>) -> Self {
        Self {
            script,
            state: SessionState::default(),
            timers: TimerQueue::new(),
            clock: Clock::new(started_at),
            ambience,
            now: 0,
            epoch: 0,
            auto_timer: None,
            notice_timer: None,
            transitions: 0,
            started: false,
            torn_down: false,
        }
    }

    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        info!(
            script = self.script.name(),
            screens = self.script.len(),
            "session started"
        );
        self.timers
            .repeating(self.now, HEARTBEAT_MS, TimerKind::ClockTick, Tenure::Session);
        self.enter_screen();
        self.advance_to(self.now);
    }

    /// Fires every timer due at or before `now`, in deadline order.
    pub fn advance_to(&mut self, now: Millis) {
        if !self.started || self.torn_down {
            return;
        }
        while let Some(fired) = self.timers.pop_due(now) {
            self.now = self.now.max(fired.due);
            trace!(kind = ?fired.kind, at = fired.due, "timer fired");
            self.fire(fired.kind);
            if self.torn_down {
                return;
            }
        }
        self.now = self.now.max(now);
        self.ambience.update(self.now);
    }

    fn fire(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::AutoAdvance => {
                self.auto_timer = None;
                self.advance();
            }
            TimerKind::AcknowledgeSettle => {
                self.advance();
            }
            TimerKind::FadeComplete => self.complete_fade(),
            TimerKind::RevealLine(line) => {
                self.state.revealer.reveal(line);
            }
            TimerKind::AdCountdown => {
                self.state.ad_gate.tick();
            }
            TimerKind::NoticeDismiss => {
                self.notice_timer = None;
                self.state.ad_gate.dismiss_notice();
            }
            TimerKind::FlashEnd => self.ambience.end_flash(),
            TimerKind::ClockTick => self.clock.beat(self.now),
        }
    }

    // the only way the index moves
    fn advance(&mut self) -> bool {
        let index = self.state.current_index;
        if self.torn_down || self.state.fading || self.script.is_terminal(index) {
            debug!(index, fading = self.state.fading, "advance rejected");
            return false;
        }

        self.state.fading = true;
        if let Some(id) = self.auto_timer.take() {
            self.timers.cancel(id);
        }
        self.timers
            .once(self.now, FADE_MS, TimerKind::FadeComplete, Tenure::Session);
        debug!(index, at = self.now, "fade started");
        true
    }

    fn complete_fade(&mut self) {
        let cancelled = self.timers.cancel_tenure(Tenure::Screen(self.epoch));
        self.auto_timer = None;
        self.notice_timer = None;

        let from = self.state.current_index;
        self.state.current_index = (from + 1).min(self.script.last_index());
        self.state.fading = false;
        self.state.acknowledged = false;
        self.epoch += 1;
        self.transitions += 1;

        info!(
            from,
            to = self.state.current_index,
            at = self.now,
            cancelled,
            "screen changed"
        );
        self.enter_screen();
    }

    fn enter_screen(&mut self) {
        let index = self.state.current_index;
        let tenure = Tenure::Screen(self.epoch);
        let Some(screen) = self.script.screen(index) else {
            return;
        };
        let advance = screen.advance();
        let line_count = screen.lines().len();
        let ad_id = screen.ad_id.filter(|_| screen.is_ad);

        if self.script.is_administering(index) && self.state.phase_start.is_none() {
            self.state.phase_start = Some(self.now);
            info!(index, at = self.now, "administration phase started");
        }

        match (ad_id, advance) {
            (Some(ad_id), Advance::Auto(delay)) => {
                self.state.revealer.clear();
                self.state.ad_gate.enter(ad_id, delay);
                self.timers
                    .repeating(self.now, COUNTDOWN_STEP_MS, TimerKind::AdCountdown, tenure);
                info!(index, ad_id, delay_ms = delay, "interstitial started");
            }
            _ => {
                self.state.ad_gate.leave();
                let plan: Vec<(usize, Millis)> = self.state.revealer.restart(line_count).collect();
                for (line, delay) in plan {
                    self.timers
                        .once(self.now, delay, TimerKind::RevealLine(line), tenure);
                }
            }
        }

        let clip = ad_id
            .and_then(|id| self.script.ad(id))
            .and_then(|creative| creative.audio.as_deref());
        let len = self.script.len();
        let flashed = self
            .ambience
            .enter_screen(self.now, index, len, ad_id.is_some(), clip);
        if flashed {
            self.timers
                .once(self.now, FLASH_MS, TimerKind::FlashEnd, Tenure::Session);
        }

        match advance {
            Advance::Auto(delay) => {
                self.auto_timer = Some(self.timers.once(
                    self.now,
                    delay,
                    TimerKind::AutoAdvance,
                    tenure,
                ));
                debug!(index, delay_ms = delay, "auto-advance armed");
            }
            Advance::Acknowledge => debug!(index, "waiting for acknowledgment"),
            Advance::Terminal => info!(index, at = self.now, "session complete"),
        }
    }

    /// Accepted once per screen; the fade starts after [`SETTLE_MS`].
    pub fn acknowledge(&mut self) -> bool {
        let index = self.state.current_index;
        let gated = self
            .script
            .screen(index)
            .is_some_and(|s| s.advance() == Advance::Acknowledge);
        if !self.started
            || self.torn_down
            || !gated
            || self.state.fading
            || self.state.acknowledged
        {
            debug!(index, "acknowledge ignored");
            return false;
        }

        self.state.acknowledged = true;
        self.timers.once(
            self.now,
            SETTLE_MS,
            TimerKind::AcknowledgeSettle,
            Tenure::Screen(self.epoch),
        );
        info!(index, at = self.now, "acknowledged");
        true
    }

    /// Never skips the interstitial, only raises the refusal notice.
    pub fn attempt_dismiss(&mut self) -> bool {
        if self.torn_down || !self.state.ad_gate.attempt_dismiss() {
            return false;
        }
        if let Some(id) = self.notice_timer.take() {
            self.timers.cancel(id);
        }
        self.notice_timer = Some(self.timers.once(
            self.now,
            NOTICE_MS,
            TimerKind::NoticeDismiss,
            Tenure::Screen(self.epoch),
        ));
        info!(
            index = self.state.current_index,
            attempts = self.state.ad_gate.refused_attempts(),
            "interstitial cannot be skipped"
        );
        true
    }

    pub fn dismiss_notice(&mut self) -> bool {
        if let Some(id) = self.notice_timer.take() {
            self.timers.cancel(id);
        }
        self.state.ad_gate.dismiss_notice()
    }

    pub fn user_gesture(&mut self) {
        if !self.torn_down {
            self.ambience.on_user_gesture(self.now);
        }
    }

    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        let cancelled = self.timers.cancel_all();
        self.auto_timer = None;
        self.notice_timer = None;
        self.ambience.teardown();
        self.torn_down = true;
        info!(
            index = self.state.current_index,
            cancelled, "session torn down"
        );
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn is_complete(&self) -> bool {
        self.script.is_terminal(self.state.current_index)
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn transitions(&self) -> usize {
        self.transitions
    }

    pub fn ambience(&self) -> &Ambience {
        &self.ambience
    }

    pub fn armed_timers(&self) -> usize {
        self.timers.armed_count()
    }

    pub fn has_timer(&self, kind: TimerKind) -> bool {
        self.timers.has_kind(kind)
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.timers.next_due()
    }

    fn elapsed_secs(&self) -> Option<u64> {
        self.state
            .phase_start
            .map(|start| clock::elapsed_secs(start, self.clock.last_beat()))
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        let index = self.state.current_index;
        let screen = self.script.screen(index);
        let is_ad = self.state.ad_gate.is_active();
        let elapsed = self.elapsed_secs();

        Snapshot {
            current_screen_index: index,
            screen_content_lines: screen.map(Screen::lines).unwrap_or_default(),
            visible_line_indices: self.state.revealer.visible_lines(),
            fading: self.state.fading,
            acknowledgment_required: screen.is_some_and(|s| s.advance() == Advance::Acknowledge),
            acknowledged: self.state.acknowledged,
            acknowledge_label: self.script.acknowledge_label(),
            is_ad,
            ad: self.state.ad_gate.ad_id().and_then(|id| self.script.ad(id)),
            ad_countdown_remaining: self.state.ad_gate.countdown(),
            cannot_skip_notice: self.state.ad_gate.notice_visible(),
            refused_attempts: self.state.ad_gate.refused_attempts(),
            ambience_intensity: self.ambience.intensity(),
            grain: self.ambience.grain(),
            vignette: self.ambience.vignette(),
            flash: self.ambience.flash(),
            administering: self.script.is_administering(index),
            elapsed_display: clock::format_elapsed(elapsed.unwrap_or(0)),
            dose: self.script.dose().map(|dose| DoseReading {
                administered: dose.administered(elapsed.unwrap_or(0)),
                total: dose.total,
                unit: &dose.unit,
            }),
            status_label: self.script.status_label(index),
            wall_time: self.clock.wall_time(),
            complete: self.is_complete(),
            complete_label: self.script.complete_label(),
        }
    }
}
