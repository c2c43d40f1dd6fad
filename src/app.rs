use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use crate::sequencer::Sequencer;
use crate::timer::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Terminal-facing wrapper around a running sequencer.
#[derive(Debug)]
pub struct App {
    pub sequencer: Sequencer,
}

impl App {
    pub fn new(mut sequencer: Sequencer) -> Self {
        sequencer.start();
        Self { sequencer }
    }

    pub fn on_tick(&mut self, now: Millis) {
        self.sequencer.advance_to(now);
    }

    /// Catches up to `now` first so the key lands on the screen being shown.
    pub fn on_key(&mut self, key: KeyEvent, now: Millis) -> Flow {
        self.sequencer.advance_to(now);
        self.sequencer.user_gesture();

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return self.quit(),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return self.quit()
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.sequencer.acknowledge();
            }
            KeyCode::Char('x') | KeyCode::Char('X') => {
                self.sequencer.attempt_dismiss();
            }
            KeyCode::Backspace => {
                self.sequencer.dismiss_notice();
            }
            other => debug!(key = ?other, "unbound key"),
        }
        Flow::Continue
    }

    fn quit(&mut self) -> Flow {
        self.sequencer.teardown();
        Flow::Quit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ambience::Ambience;
    use crate::script::{AdCreative, Screen, ScriptDef};
    use chrono::Local;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        let script = ScriptDef::new(vec![
            Screen::acknowledge("consent"),
            Screen::ad(1, 5000),
            Screen::terminal(""),
        ])
        .ad(1, AdCreative::default())
        .build()
        .unwrap();
        App::new(Sequencer::new(script, Ambience::silent(), Local::now()))
    }

    #[test]
    fn test_enter_acknowledges() {
        let mut app = app();
        assert_eq!(app.on_key(key(KeyCode::Enter), 100), Flow::Continue);
        assert!(app.sequencer.state().acknowledged);
        app.on_tick(1600);
        assert_eq!(app.sequencer.current_index(), 1);
    }

    #[test]
    fn test_space_twice_is_one_transition() {
        let mut app = app();
        app.on_key(key(KeyCode::Char(' ')), 0);
        app.on_key(key(KeyCode::Char(' ')), 10);
        app.on_tick(10_000);
        assert_eq!(app.sequencer.transitions(), 2);
        assert!(app.sequencer.is_complete());
    }

    #[test]
    fn test_x_on_interstitial_shows_notice() {
        let mut app = app();
        app.on_key(key(KeyCode::Enter), 0);
        app.on_tick(1500);
        assert!(app.sequencer.snapshot().is_ad);

        app.on_key(key(KeyCode::Char('x')), 2000);
        assert!(app.sequencer.snapshot().cannot_skip_notice);
        assert_eq!(app.sequencer.current_index(), 1);

        app.on_key(key(KeyCode::Backspace), 2100);
        assert!(!app.sequencer.snapshot().cannot_skip_notice);
    }

    #[test]
    fn test_quit_keys_tear_down() {
        let mut app = app();
        assert_eq!(app.on_key(key(KeyCode::Esc), 0), Flow::Quit);
        assert!(app.sequencer.is_torn_down());

        let mut app = self::app();
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(app.on_key(ctrl_c, 0), Flow::Quit);

        let mut app = self::app();
        assert_eq!(app.on_key(key(KeyCode::Char('c')), 0), Flow::Continue);
    }
}
