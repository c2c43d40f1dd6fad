// Library surface for the binary and for headless/integration tests.
pub mod ad_gate;
pub mod ambience;
pub mod app;
pub mod app_dirs;
pub mod audio;
pub mod clock;
pub mod config;
pub mod error;
pub mod reveal;
pub mod runtime;
pub mod script;
pub mod sequencer;
pub mod snapshot;
pub mod timer;
pub mod ui;

pub use app::{App, Flow};
pub use error::{AudioError, ScriptError};
pub use script::{BuiltinScript, Script};
pub use sequencer::Sequencer;
