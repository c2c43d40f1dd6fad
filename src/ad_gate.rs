use crate::timer::Millis;

pub const COUNTDOWN_STEP_MS: Millis = 1000;
pub const NOTICE_MS: Millis = 3000;

/// The countdown is display-only and dismissal always refuses.
#[derive(Debug, Default, Clone)]
pub struct AdGate {
    ad_id: Option<u32>,
    countdown: u64,
    notice: bool,
    refused: u32,
}

impl AdGate {
    pub fn new() -> Self {
        Self::default()
    }

    // rounded up so 0 never shows before the screen advances
    pub fn enter(&mut self, ad_id: u32, delay_ms: Millis) {
        self.ad_id = Some(ad_id);
        self.countdown = delay_ms.div_ceil(COUNTDOWN_STEP_MS);
        self.notice = false;
        self.refused = 0;
    }

    pub fn leave(&mut self) {
        *self = Self::default();
    }

    pub fn is_active(&self) -> bool {
        self.ad_id.is_some()
    }

    pub fn ad_id(&self) -> Option<u32> {
        self.ad_id
    }

    pub fn tick(&mut self) -> u64 {
        self.countdown = self.countdown.saturating_sub(1);
        self.countdown
    }

    pub fn countdown(&self) -> u64 {
        self.countdown
    }

    pub fn attempt_dismiss(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.notice = true;
        self.refused += 1;
        true
    }

    pub fn dismiss_notice(&mut self) -> bool {
        std::mem::replace(&mut self.notice, false)
    }

    pub fn notice_visible(&self) -> bool {
        self.notice
    }

    pub fn refused_attempts(&self) -> u32 {
        self.refused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_starts_from_delay() {
        let mut gate = AdGate::new();
        gate.enter(1, 30_000);
        assert_eq!(gate.countdown(), 30);

        gate.enter(2, 2500);
        assert_eq!(gate.countdown(), 3);
    }

    #[test]
    fn test_countdown_holds_at_zero() {
        let mut gate = AdGate::new();
        gate.enter(1, 2000);
        assert_eq!(gate.tick(), 1);
        assert_eq!(gate.tick(), 0);
        assert_eq!(gate.tick(), 0);
    }

    #[test]
    fn test_dismiss_always_refuses() {
        let mut gate = AdGate::new();
        gate.enter(1, 5000);

        assert!(gate.attempt_dismiss());
        assert!(gate.notice_visible());
        assert!(gate.attempt_dismiss());
        assert_eq!(gate.refused_attempts(), 2);
        assert_eq!(gate.countdown(), 5);

        assert!(gate.dismiss_notice());
        assert!(!gate.notice_visible());
        assert!(!gate.dismiss_notice());

        // re-arms for the next attempt
        assert!(gate.attempt_dismiss());
        assert!(gate.notice_visible());
    }

    #[test]
    fn test_inactive_gate_ignores_attempts() {
        let mut gate = AdGate::new();
        assert!(!gate.attempt_dismiss());
        assert!(!gate.notice_visible());
    }

    #[test]
    fn test_enter_resets_previous_interstitial() {
        let mut gate = AdGate::new();
        gate.enter(1, 3000);
        gate.attempt_dismiss();
        gate.tick();

        gate.enter(2, 3000);
        assert_eq!(gate.ad_id(), Some(2));
        assert_eq!(gate.countdown(), 3);
        assert_eq!(gate.refused_attempts(), 0);
        assert!(!gate.notice_visible());

        gate.leave();
        assert!(!gate.is_active());
    }
}
