use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use stagehand::{
    ambience::Ambience,
    app::{App, Flow},
    app_dirs::AppDirs,
    audio::{self, AudioBed},
    config::{Config, ConfigStore, FileConfigStore},
    runtime::{CrosstermEventSource, Runner, SessionClock},
    script::{Advance, BuiltinScript, Script},
    sequencer::Sequencer,
    ScriptError,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// timed full-screen message sequencer with unskippable interstitials
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Plays a scripted sequence of full-screen messages with timed screens, \
                  acknowledgment gates and interstitials you cannot skip."
)]
pub struct Cli {
    /// script file to play instead of a built-in one
    #[clap(short = 's', long)]
    script: Option<PathBuf>,

    /// built-in script to play
    #[clap(short = 'b', long, value_enum)]
    builtin: Option<BuiltinScript>,

    /// no grain or flash (also set by STAGEHAND_REDUCED_MOTION)
    #[clap(long)]
    reduced_motion: bool,

    /// disable audio
    #[clap(long)]
    mute: bool,

    /// master volume between 0 and 1
    #[clap(long, value_parser = parse_volume)]
    volume: Option<f32>,

    /// UI tick interval in milliseconds
    #[clap(long = "tick-rate")]
    tick_rate: Option<u64>,

    /// validate the script, print a summary and exit
    #[clap(long)]
    check: bool,

    /// persist the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

fn parse_volume(s: &str) -> Result<f32, String> {
    let volume: f32 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if (0.0..=1.0).contains(&volume) {
        Ok(volume)
    } else {
        Err(format!("volume must be between 0 and 1, got {volume}"))
    }
}

impl Cli {
    /// Layers the command line over the stored config.
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(builtin) = self.builtin {
            cfg.builtin = builtin.to_string().to_lowercase();
            cfg.script = None;
        }
        if let Some(path) = &self.script {
            cfg.script = Some(path.clone());
        }
        cfg.reduced_motion |= self.reduced_motion;
        if self.mute {
            cfg.audio = false;
        }
        if let Some(volume) = self.volume {
            cfg.volume = volume;
        }
        if let Some(tick_rate) = self.tick_rate {
            cfg.tick_rate_ms = tick_rate;
        }
        cfg
    }
}

fn load_script(cfg: &Config) -> Result<Script, ScriptError> {
    match &cfg.script {
        Some(path) => Script::from_path(path),
        None => BuiltinScript::from_name(&cfg.builtin)?.load(),
    }
}

fn summarize(script: &Script) -> String {
    let screens = script.screens();
    let acknowledgments = screens
        .iter()
        .filter(|s| s.advance() == Advance::Acknowledge)
        .count();
    let interstitials = screens.iter().filter(|s| s.is_ad).count();
    let timed_ms: u64 = screens
        .iter()
        .filter_map(|s| match s.advance() {
            Advance::Auto(delay) => Some(delay),
            _ => None,
        })
        .sum();

    format!(
        "{}: {} screens, {} acknowledgment, {} interstitial, {}s timed",
        script.name(),
        script.len(),
        acknowledgments,
        interstitials,
        timed_ms / 1000
    )
}

/// The terminal belongs to the UI, so logs go to a file unless `to_stderr`.
fn init_logging(to_stderr: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if to_stderr {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init();
        return;
    }

    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.check);

    let store = FileConfigStore::new();
    let cfg = cli.apply(store.load());
    if cli.save_config {
        store.save(&cfg)?;
        info!(path = %store.path().display(), "config saved");
    }

    // script errors surface before the terminal changes mode
    let script = load_script(&cfg)?;
    if cli.check {
        println!("{}", summarize(&script));
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let bed = if cfg.audio {
        AudioBed::new(audio::default_device())
    } else {
        AudioBed::disabled()
    };
    let ambience = Ambience::new(bed, cfg.volume, cfg.reduced_motion_from_env());

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(Sequencer::new(script, ambience, Local::now()));
    let frame = Duration::from_millis(cfg.tick_rate_ms.max(1));
    let result = start_tui(&mut terminal, &mut app, frame);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        warn!(error = %err, "session ended with an error");
    }
    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    frame: Duration,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), SessionClock::start(), frame);

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        if runner.step(app) == Flow::Quit {
            break;
        }
    }

    app.sequencer.teardown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use clap::Parser;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["stagehand"]);

        assert_eq!(cli.script, None);
        assert_eq!(cli.builtin, None);
        assert!(!cli.reduced_motion);
        assert!(!cli.mute);
        assert_eq!(cli.volume, None);
        assert_eq!(cli.tick_rate, None);
        assert!(!cli.check);
    }

    #[test]
    fn test_cli_script_and_builtin() {
        let cli = Cli::parse_from(["stagehand", "-s", "show.json"]);
        assert_eq!(cli.script, Some(PathBuf::from("show.json")));

        let cli = Cli::parse_from(["stagehand", "--builtin", "brief"]);
        assert_eq!(cli.builtin, Some(BuiltinScript::Brief));

        assert!(Cli::try_parse_from(["stagehand", "-b", "nope"]).is_err());
    }

    #[test]
    fn test_cli_volume_range() {
        let cli = Cli::parse_from(["stagehand", "--volume", "0.3"]);
        assert_eq!(cli.volume, Some(0.3));

        assert!(Cli::try_parse_from(["stagehand", "--volume", "1.5"]).is_err());
        assert!(Cli::try_parse_from(["stagehand", "--volume", "loud"]).is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let stored = Config {
            builtin: "update".into(),
            script: Some(PathBuf::from("/tmp/old.json")),
            ..Config::default()
        };

        let cli = Cli::parse_from([
            "stagehand",
            "-b",
            "brief",
            "--mute",
            "--reduced-motion",
            "--volume",
            "0.2",
            "--tick-rate",
            "20",
        ]);
        let cfg = cli.apply(stored.clone());
        assert_eq!(cfg.builtin, "brief");
        assert_eq!(cfg.script, None);
        assert!(!cfg.audio);
        assert!(cfg.reduced_motion);
        assert_eq!(cfg.volume, 0.2);
        assert_eq!(cfg.tick_rate_ms, 20);

        let untouched = Cli::parse_from(["stagehand"]).apply(stored.clone());
        assert_eq!(untouched, stored);
    }

    #[test]
    fn test_load_builtin_scripts() {
        for name in ["update", "brief"] {
            let cfg = Config {
                builtin: name.into(),
                ..Config::default()
            };
            let script = load_script(&cfg).unwrap();
            assert_eq!(script.name(), name);
        }

        let cfg = Config {
            builtin: "missing".into(),
            ..Config::default()
        };
        assert_matches!(load_script(&cfg), Err(ScriptError::UnknownBuiltin(_)));
    }

    #[test]
    fn test_summarize_brief() {
        let script = BuiltinScript::Brief.load().unwrap();
        assert_eq!(
            summarize(&script),
            "brief: 5 screens, 1 acknowledgment, 1 interstitial, 12s timed"
        );
    }
}
