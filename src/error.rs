use std::path::PathBuf;

/// Raised at load time; a broken script never reaches the sequencer.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("script has no screens")]
    Empty,

    #[error("screen {index} auto-advances but declares no autoAdvanceDelay")]
    MissingDelay { index: usize },

    #[error("screen {index} declares an autoAdvanceDelay of 0 ms")]
    ZeroDelay { index: usize },

    #[error("screen {index} has no way to advance and is not the last screen")]
    NoAdvancement { index: usize },

    #[error("the last screen must be terminal (no autoAdvance, no requiresAcknowledgment)")]
    TerminalAdvances,

    #[error("ad screen {index} cannot require acknowledgment")]
    AdRequiresAcknowledgment { index: usize },

    #[error("ad screen {index} must auto-advance")]
    AdNotAutoAdvance { index: usize },

    #[error("ad screen {index} has no adId")]
    MissingAdId { index: usize },

    #[error("screen {index} references unknown ad {ad_id}")]
    UnknownAd { index: usize, ad_id: u32 },

    #[error("administrationStart {start} is outside a script of {len} screens")]
    AdministrationStartOutOfRange { start: usize, len: usize },

    #[error("phase '{label}' starts at {from}, outside a script of {len} screens")]
    PhaseOutOfRange {
        label: String,
        from: usize,
        len: usize,
    },

    #[error("no built-in script named '{0}'")]
    UnknownBuiltin(String),

    #[error("unable to parse script: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unable to read script: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("audio is not supported here: {0}")]
    Unsupported(String),

    #[error("audio device error: {0}")]
    Device(String),

    #[error("unable to play {}: {reason}", asset.display())]
    Playback { asset: PathBuf, reason: String },

    #[error("unable to open audio asset: {0}")]
    Asset(#[from] std::io::Error),
}
