use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::ScriptError;
use crate::timer::Millis;

static SCRIPT_DIR: Dir = include_dir!("src/scripts");

const DEFAULT_PHASE_LABEL: &str = "IN PROGRESS";
const DEFAULT_COMPLETE_LABEL: &str = "COMPLETE";
const DEFAULT_ACKNOWLEDGE_LABEL: &str = "I Acknowledge";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Line(String),
    Lines(Vec<String>),
}

impl Content {
    pub fn lines(&self) -> &[String] {
        match self {
            Content::Line(line) => std::slice::from_ref(line),
            Content::Lines(lines) => lines,
        }
    }
}

impl Default for Content {
    fn default() -> Self {
        Content::Lines(Vec::new())
    }
}

impl From<&str> for Content {
    fn from(line: &str) -> Self {
        Content::Line(line.to_string())
    }
}

impl From<Vec<&str>> for Content {
    fn from(lines: Vec<&str>) -> Self {
        Content::Lines(lines.into_iter().map(str::to_string).collect())
    }
}

/// How a screen hands over to the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Auto(Millis),
    Acknowledge,
    Terminal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Screen {
    pub content: Content,
    pub requires_acknowledgment: bool,
    pub auto_advance: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_advance_delay: Option<Millis>,
    pub is_ad: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad_id: Option<u32>,
}

impl Screen {
    pub fn auto(content: impl Into<Content>, delay_ms: Millis) -> Self {
        Self {
            content: content.into(),
            auto_advance: true,
            auto_advance_delay: Some(delay_ms),
            ..Self::default()
        }
    }

    pub fn acknowledge(content: impl Into<Content>) -> Self {
        Self {
            content: content.into(),
            requires_acknowledgment: true,
            ..Self::default()
        }
    }

    pub fn terminal(content: impl Into<Content>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn ad(ad_id: u32, delay_ms: Millis) -> Self {
        Self {
            is_ad: true,
            ad_id: Some(ad_id),
            ..Self::auto(Content::default(), delay_ms)
        }
    }

    pub fn lines(&self) -> &[String] {
        self.content.lines()
    }

    /// Acknowledgment wins over auto-advance; a screen with neither is terminal.
    pub fn advance(&self) -> Advance {
        match (
            self.requires_acknowledgment,
            self.auto_advance,
            self.auto_advance_delay,
        ) {
            (true, _, _) => Advance::Acknowledge,
            (false, true, Some(delay)) => Advance::Auto(delay),
            _ => Advance::Terminal,
        }
    }

    fn validate(
        &self,
        index: usize,
        is_last: bool,
        ads: &BTreeMap<u32, AdCreative>,
    ) -> Result<(), ScriptError> {
        if self.auto_advance && !self.requires_acknowledgment {
            match self.auto_advance_delay {
                None => return Err(ScriptError::MissingDelay { index }),
                Some(0) => return Err(ScriptError::ZeroDelay { index }),
                Some(_) => {}
            }
        }

        if self.is_ad {
            if self.requires_acknowledgment {
                return Err(ScriptError::AdRequiresAcknowledgment { index });
            }
            if !self.auto_advance {
                return Err(ScriptError::AdNotAutoAdvance { index });
            }
            let ad_id = self.ad_id.ok_or(ScriptError::MissingAdId { index })?;
            if !ads.contains_key(&ad_id) {
                return Err(ScriptError::UnknownAd { index, ad_id });
            }
        }

        match (self.advance(), is_last) {
            (Advance::Terminal, false) => Err(ScriptError::NoAdvancement { index }),
            (Advance::Auto(_) | Advance::Acknowledge, true) => Err(ScriptError::TerminalAdvances),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub from: usize,
    pub label: String,
}

impl Phase {
    pub fn new(from: usize, label: impl Into<String>) -> Self {
        Self {
            from,
            label: label.into(),
        }
    }
}

/// Dose meter shown during the administration phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DoseMeter {
    pub total: u64,
    pub rate_per_minute: u64,
    pub unit: String,
}

impl Default for DoseMeter {
    fn default() -> Self {
        Self {
            total: 2000,
            rate_per_minute: 400,
            unit: "mg".to_string(),
        }
    }
}

impl DoseMeter {
    /// Amount delivered after `elapsed_secs`, capped at the total.
    pub fn administered(&self, elapsed_secs: u64) -> u64 {
        let delivered = elapsed_secs.saturating_mul(self.rate_per_minute) / 60;
        delivered.min(self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AdCreative {
    pub title: String,
    pub body: String,
    pub fine_print: String,
    pub call_to_action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<PathBuf>,
}

/// Raw script document; `build` turns it into a validated [`Script`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ScriptDef {
    pub name: String,
    pub administration_start: Option<usize>,
    pub phases: Vec<Phase>,
    pub dose: Option<DoseMeter>,
    pub complete_label: Option<String>,
    pub acknowledge_label: Option<String>,
    pub ads: BTreeMap<u32, AdCreative>,
    pub screens: Vec<Screen>,
}

impl ScriptDef {
    pub fn new(screens: Vec<Screen>) -> Self {
        Self {
            screens,
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn administration_start(mut self, index: usize) -> Self {
        self.administration_start = Some(index);
        self
    }

    pub fn phase(mut self, from: usize, label: impl Into<String>) -> Self {
        self.phases.push(Phase::new(from, label));
        self
    }

    pub fn dose(mut self, dose: DoseMeter) -> Self {
        self.dose = Some(dose);
        self
    }

    pub fn ad(mut self, ad_id: u32, creative: AdCreative) -> Self {
        self.ads.insert(ad_id, creative);
        self
    }

    pub fn build(self) -> Result<Script, ScriptError> {
        Script::try_from(self)
    }
}

/// Validated script. Construct through [`ScriptDef::build`] or the loaders.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    name: String,
    screens: Vec<Screen>,
    administration_start: Option<usize>,
    phases: Vec<Phase>,
    dose: Option<DoseMeter>,
    ads: BTreeMap<u32, AdCreative>,
    complete_label: String,
    acknowledge_label: String,
}

impl TryFrom<ScriptDef> for Script {
    type Error = ScriptError;

    fn try_from(def: ScriptDef) -> Result<Self, Self::Error> {
        let len = def.screens.len();
        if len == 0 {
            return Err(ScriptError::Empty);
        }

        for (index, screen) in def.screens.iter().enumerate() {
            screen.validate(index, index + 1 == len, &def.ads)?;
        }

        if let Some(start) = def.administration_start {
            if start >= len {
                return Err(ScriptError::AdministrationStartOutOfRange { start, len });
            }
        }

        if let Some(phase) = def.phases.iter().find(|p| p.from >= len) {
            return Err(ScriptError::PhaseOutOfRange {
                label: phase.label.clone(),
                from: phase.from,
                len,
            });
        }

        let mut phases: Vec<Phase> = def
            .phases
            .into_iter()
            .sorted_by_key(|p| p.from)
            .collect();
        if phases.first().map_or(true, |p| p.from > 0) {
            phases.insert(0, Phase::new(0, DEFAULT_PHASE_LABEL));
        }

        Ok(Self {
            name: def.name,
            screens: def.screens,
            administration_start: def.administration_start,
            phases,
            dose: def.dose,
            ads: def.ads,
            complete_label: def
                .complete_label
                .unwrap_or_else(|| DEFAULT_COMPLETE_LABEL.to_string()),
            acknowledge_label: def
                .acknowledge_label
                .unwrap_or_else(|| DEFAULT_ACKNOWLEDGE_LABEL.to_string()),
        })
    }
}

impl Script {
    pub fn new(screens: Vec<Screen>) -> Result<Self, ScriptError> {
        ScriptDef::new(screens).build()
    }

    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        let def: ScriptDef = serde_json::from_str(json)?;
        def.build()
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ScriptError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    pub fn screens(&self) -> &[Screen] {
        &self.screens
    }

    pub fn screen(&self, index: usize) -> Option<&Screen> {
        self.screens.get(index)
    }

    pub fn last_index(&self) -> usize {
        self.screens.len().saturating_sub(1)
    }

    pub fn is_terminal(&self, index: usize) -> bool {
        index >= self.last_index()
    }

    pub fn administration_start(&self) -> Option<usize> {
        self.administration_start
    }

    pub fn is_administering(&self, index: usize) -> bool {
        self.administration_start.is_some_and(|start| index >= start)
    }

    pub fn status_label(&self, index: usize) -> &str {
        self.phases
            .iter()
            .rev()
            .find(|phase| phase.from <= index)
            .map_or(DEFAULT_PHASE_LABEL, |phase| phase.label.as_str())
    }

    pub fn dose(&self) -> Option<&DoseMeter> {
        self.dose.as_ref()
    }

    pub fn ad(&self, ad_id: u32) -> Option<&AdCreative> {
        self.ads.get(&ad_id)
    }

    pub fn complete_label(&self) -> &str {
        &self.complete_label
    }

    pub fn acknowledge_label(&self) -> &str {
        &self.acknowledge_label
    }
}

/// Scripts bundled with the binary.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
pub enum BuiltinScript {
    Update,
    Brief,
}

impl BuiltinScript {
    pub fn load(&self) -> Result<Script, ScriptError> {
        let file_name = format!("{}.json", self.to_string().to_lowercase());
        let file = SCRIPT_DIR
            .get_file(&file_name)
            .ok_or_else(|| ScriptError::UnknownBuiltin(file_name.clone()))?;
        let json = file
            .contents_utf8()
            .ok_or_else(|| ScriptError::UnknownBuiltin(file_name.clone()))?;
        Script::from_json(json)
    }

    pub fn from_name(name: &str) -> Result<Self, ScriptError> {
        <Self as ValueEnum>::from_str(name, true)
            .map_err(|_| ScriptError::UnknownBuiltin(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn three_screens() -> Vec<Screen> {
        vec![
            Screen::auto("one", 2000),
            Screen::acknowledge("two"),
            Screen::terminal(""),
        ]
    }

    #[test]
    fn test_advance_modes() {
        let script = Script::new(three_screens()).unwrap();
        assert_eq!(script.screen(0).unwrap().advance(), Advance::Auto(2000));
        assert_eq!(script.screen(1).unwrap().advance(), Advance::Acknowledge);
        assert_eq!(script.screen(2).unwrap().advance(), Advance::Terminal);
    }

    #[test]
    fn test_acknowledgment_overrides_auto_advance() {
        let screen = Screen {
            requires_acknowledgment: true,
            auto_advance: true,
            auto_advance_delay: Some(1000),
            ..Screen::default()
        };
        assert_eq!(screen.advance(), Advance::Acknowledge);
    }

    #[test]
    fn test_empty_script_rejected() {
        assert_matches!(Script::new(vec![]), Err(ScriptError::Empty));
    }

    #[test]
    fn test_auto_advance_without_delay_rejected() {
        let screens = vec![
            Screen {
                auto_advance: true,
                ..Screen::default()
            },
            Screen::terminal(""),
        ];
        assert_matches!(
            Script::new(screens),
            Err(ScriptError::MissingDelay { index: 0 })
        );
    }

    #[test]
    fn test_zero_delay_rejected() {
        let screens = vec![Screen::auto("a", 0), Screen::terminal("")];
        assert_matches!(
            Script::new(screens),
            Err(ScriptError::ZeroDelay { index: 0 })
        );
    }

    #[test]
    fn test_stuck_screen_rejected() {
        let screens = vec![Screen::auto("a", 10), Screen::terminal("b"), Screen::terminal("")];
        assert_matches!(
            Script::new(screens),
            Err(ScriptError::NoAdvancement { index: 1 })
        );
    }

    #[test]
    fn test_last_screen_must_be_terminal() {
        let screens = vec![Screen::auto("a", 10), Screen::auto("b", 10)];
        assert_matches!(Script::new(screens), Err(ScriptError::TerminalAdvances));
    }

    #[test]
    fn test_ad_validation() {
        let missing = vec![Screen::ad(7, 1000), Screen::terminal("")];
        assert_matches!(
            Script::new(missing),
            Err(ScriptError::UnknownAd { index: 0, ad_id: 7 })
        );

        let no_id = vec![
            Screen {
                ad_id: None,
                ..Screen::ad(1, 1000)
            },
            Screen::terminal(""),
        ];
        assert_matches!(
            Script::new(no_id),
            Err(ScriptError::MissingAdId { index: 0 })
        );

        let gated = vec![
            Screen {
                requires_acknowledgment: true,
                ..Screen::ad(1, 1000)
            },
            Screen::terminal(""),
        ];
        assert_matches!(
            ScriptDef::new(gated).ad(1, AdCreative::default()).build(),
            Err(ScriptError::AdRequiresAcknowledgment { index: 0 })
        );

        let ok = vec![Screen::ad(1, 1000), Screen::terminal("")];
        assert!(ScriptDef::new(ok).ad(1, AdCreative::default()).build().is_ok());
    }

    #[test]
    fn test_administration_start_bounds() {
        assert_matches!(
            ScriptDef::new(three_screens()).administration_start(3).build(),
            Err(ScriptError::AdministrationStartOutOfRange { start: 3, len: 3 })
        );

        let script = ScriptDef::new(three_screens())
            .administration_start(1)
            .build()
            .unwrap();
        assert!(!script.is_administering(0));
        assert!(script.is_administering(1));
        assert!(script.is_administering(2));
    }

    #[test]
    fn test_status_label_from_phases() {
        let script = ScriptDef::new(three_screens())
            .phase(1, "AWAITING CONSENT")
            .phase(0, "PREPARATION")
            .phase(2, "DONE")
            .build()
            .unwrap();
        assert_eq!(script.status_label(0), "PREPARATION");
        assert_eq!(script.status_label(1), "AWAITING CONSENT");
        assert_eq!(script.status_label(2), "DONE");
    }

    #[test]
    fn test_status_label_defaults() {
        let script = ScriptDef::new(three_screens())
            .phase(1, "LATER")
            .build()
            .unwrap();
        assert_eq!(script.status_label(0), "IN PROGRESS");
        assert_eq!(script.status_label(2), "LATER");
    }

    #[test]
    fn test_phase_out_of_range() {
        assert_matches!(
            ScriptDef::new(three_screens()).phase(5, "LATE").build(),
            Err(ScriptError::PhaseOutOfRange { from: 5, .. })
        );
    }

    #[test]
    fn test_dose_meter() {
        let dose = DoseMeter::default();
        assert_eq!(dose.administered(0), 0);
        assert_eq!(dose.administered(59), 393);
        assert_eq!(dose.administered(60), 400);
        assert_eq!(dose.administered(150), 1000);
        assert_eq!(dose.administered(300), 2000);
        assert_eq!(dose.administered(10_000), 2000);
    }

    #[test]
    fn test_content_shapes_from_json() {
        let json = r#"{
            "ads": { "1": { "title": "Buy", "audio": "ads/one.ogg" } },
            "screens": [
                { "content": "single", "autoAdvance": true, "autoAdvanceDelay": 8000 },
                { "content": ["a", "b", ""], "requiresAcknowledgment": true },
                {
                    "content": [], "isAd": true, "adId": 1,
                    "autoAdvance": true, "autoAdvanceDelay": 30000
                },
                { "content": [""] }
            ]
        }"#;
        let script = Script::from_json(json).unwrap();
        assert_eq!(script.len(), 4);
        assert_eq!(script.screen(0).unwrap().lines(), ["single".to_string()]);
        assert_eq!(script.screen(1).unwrap().lines().len(), 3);
        assert!(script.screen(2).unwrap().lines().is_empty());
        assert_eq!(script.ad(1).unwrap().title, "Buy");
        assert_eq!(
            script.ad(1).unwrap().audio.as_deref(),
            Some(Path::new("ads/one.ogg"))
        );
        assert_eq!(script.complete_label(), "COMPLETE");
        assert!(script.is_terminal(3));
    }

    #[test]
    fn test_malformed_json() {
        assert_matches!(Script::from_json("{ nope"), Err(ScriptError::Parse(_)));
    }

    #[test]
    fn test_builtin_scripts_load() {
        for builtin in [BuiltinScript::Update, BuiltinScript::Brief] {
            let script = builtin.load().unwrap();
            assert!(script.len() > 1, "{} should have screens", builtin);
            assert!(script.is_terminal(script.last_index()));
        }
    }

    #[test]
    fn test_builtin_from_name() {
        assert_eq!(BuiltinScript::from_name("brief").unwrap(), BuiltinScript::Brief);
        assert_eq!(BuiltinScript::from_name("UPDATE").unwrap(), BuiltinScript::Update);
        assert_matches!(
            BuiltinScript::from_name("nope"),
            Err(ScriptError::UnknownBuiltin(_))
        );
    }
}
