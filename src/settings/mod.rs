//! Togglable node settings and the dirty-state bookkeeping shared by every
//! settings group on the page.

pub mod controller;
pub mod groups;
pub mod transport;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Flag(bool),
    /// Radio-style selection. `None` means nothing is selected.
    Choice(Option<String>),
    Text(String),
}

impl SettingValue {
    pub fn to_json(&self) -> Value {
        match self {
            SettingValue::Flag(on) => Value::Bool(*on),
            SettingValue::Choice(Some(value)) => Value::String(value.clone()),
            SettingValue::Choice(None) => Value::Null,
            SettingValue::Text(text) => Value::String(text.clone()),
        }
    }

    /// Whether the setting currently grants something. Used to classify
    /// transitions as turning a capability on or off. Text edits never
    /// remove anything.
    pub fn is_enabled(&self) -> bool {
        match self {
            SettingValue::Flag(on) => *on,
            SettingValue::Choice(choice) => choice.is_some(),
            SettingValue::Text(_) => true,
        }
    }

    pub fn as_choice(&self) -> Option<&str> {
        match self {
            SettingValue::Choice(choice) => choice.as_deref(),
            SettingValue::Flag(_) | SettingValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SettingValue::Text(text) => Some(text),
            SettingValue::Flag(_) | SettingValue::Choice(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOption {
    pub value: String,
    pub label: String,
}

impl ChoiceOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingKind {
    Boolean,
    Enumerated {
        options: Vec<ChoiceOption>,
        clearable: bool,
    },
    /// Free text. A required value may not be blank.
    Text { required: bool },
}

#[derive(Debug, Clone)]
pub struct Setting {
    pub key: String,
    pub label: String,
    pub kind: SettingKind,
    pub current: SettingValue,
    saved: SettingValue,
    /// Terms shown when the setting is switched on.
    pub capabilities: Option<String>,
}

impl Setting {
    pub fn flag(key: impl Into<String>, label: impl Into<String>, on: bool) -> Self {
        let value = SettingValue::Flag(on);
        Self {
            key: key.into(),
            label: label.into(),
            kind: SettingKind::Boolean,
            current: value.clone(),
            saved: value,
            capabilities: None,
        }
    }

    pub fn choice(
        key: impl Into<String>,
        label: impl Into<String>,
        options: Vec<ChoiceOption>,
        selected: Option<String>,
        clearable: bool,
    ) -> Self {
        let value = SettingValue::Choice(selected);
        Self {
            key: key.into(),
            label: label.into(),
            kind: SettingKind::Enumerated { options, clearable },
            current: value.clone(),
            saved: value,
            capabilities: None,
        }
    }

    pub fn text(
        key: impl Into<String>,
        label: impl Into<String>,
        value: impl Into<String>,
        required: bool,
    ) -> Self {
        let value = SettingValue::Text(value.into());
        Self {
            key: key.into(),
            label: label.into(),
            kind: SettingKind::Text { required },
            current: value.clone(),
            saved: value,
            capabilities: None,
        }
    }

    pub fn with_capabilities(mut self, capabilities: Option<String>) -> Self {
        self.capabilities = capabilities.filter(|text| !text.trim().is_empty());
        self
    }

    /// Last value acknowledged by the backend.
    pub fn saved(&self) -> &SettingValue {
        &self.saved
    }

    pub fn is_dirty(&self) -> bool {
        self.current != self.saved
    }

    pub fn label_for(&self, value: &SettingValue) -> String {
        match (&self.kind, value) {
            (SettingKind::Enumerated { options, .. }, SettingValue::Choice(Some(v))) => options
                .iter()
                .find(|option| &option.value == v)
                .map(|option| option.label.clone())
                .unwrap_or_else(|| v.clone()),
            (_, SettingValue::Choice(Some(v))) => v.clone(),
            (_, SettingValue::Choice(None)) => "None".to_string(),
            (_, SettingValue::Text(text)) => text.clone(),
            (_, SettingValue::Flag(true)) => "on".to_string(),
            (_, SettingValue::Flag(false)) => "off".to_string(),
        }
    }
}

/// Settings whose current value differs from the baseline, split by the
/// direction of the change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtySet {
    pub turned_off: Vec<String>,
    pub turned_on: Vec<String>,
    /// Enumerated settings that moved between two non-empty values.
    pub changed: Vec<String>,
}

impl DirtySet {
    pub fn from_settings(settings: &[Setting]) -> Self {
        let mut dirty = DirtySet::default();
        for setting in settings.iter().filter(|s| s.is_dirty()) {
            let key = setting.key.clone();
            match (setting.saved.is_enabled(), setting.current.is_enabled()) {
                (true, false) => dirty.turned_off.push(key),
                (false, true) => dirty.turned_on.push(key),
                _ => dirty.changed.push(key),
            }
        }
        dirty
    }

    pub fn is_empty(&self) -> bool {
        self.turned_off.is_empty() && self.turned_on.is_empty() && self.changed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.turned_off.len() + self.turned_on.len() + self.changed.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.turned_off
            .iter()
            .chain(&self.turned_on)
            .chain(&self.changed)
            .any(|k| k == key)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("A save is already in progress")]
    SubmissionInFlight,

    #[error("Answer the open prompt first")]
    PromptPending,

    #[error("Nothing is waiting for confirmation")]
    NoPendingConfirmation,

    #[error("Unknown setting '{0}'")]
    UnknownSetting(String),

    #[error("Setting '{0}' does not accept that kind of value")]
    KindMismatch(String),

    #[error("'{value}' is not an option for '{key}'")]
    InvalidChoice { key: String, value: String },

    #[error("{0} cannot be blank")]
    Blank(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_settings_are_clean() {
        let settings = vec![
            Setting::flag("wiki", "Wiki", true),
            Setting::choice("commentLevel", "Comments", vec![], Some("public".into()), false),
        ];
        assert!(DirtySet::from_settings(&settings).is_empty());
    }

    #[test]
    fn dirty_set_partitions_by_direction() {
        let mut wiki = Setting::flag("wiki", "Wiki", true);
        wiki.current = SettingValue::Flag(false);
        let mut dropbox = Setting::flag("dropbox", "Dropbox", false);
        dropbox.current = SettingValue::Flag(true);
        let mut level = Setting::choice("commentLevel", "Comments", vec![], Some("public".into()), false);
        level.current = SettingValue::Choice(Some("private".into()));
        let mut inst = Setting::choice("primaryInst", "Institution", vec![], Some("cos".into()), true);
        inst.current = SettingValue::Choice(None);

        let dirty = DirtySet::from_settings(&[wiki, dropbox, level, inst]);
        assert_eq!(dirty.turned_off, vec!["wiki", "primaryInst"]);
        assert_eq!(dirty.turned_on, vec!["dropbox"]);
        assert_eq!(dirty.changed, vec!["commentLevel"]);
        assert_eq!(dirty.len(), 4);
        assert!(dirty.contains("dropbox"));
        assert!(!dirty.contains("github"));
    }

    #[test]
    fn blank_capabilities_are_dropped() {
        let setting = Setting::flag("s3", "S3", false).with_capabilities(Some("  ".into()));
        assert!(setting.capabilities.is_none());
    }

    #[test]
    fn choice_labels_resolve_through_options() {
        let setting = Setting::choice(
            "commentLevel",
            "Comments",
            vec![ChoiceOption::new("public", "Anyone")],
            None,
            false,
        );
        assert_eq!(
            setting.label_for(&SettingValue::Choice(Some("public".into()))),
            "Anyone"
        );
        assert_eq!(setting.label_for(&SettingValue::Choice(None)), "None");
    }

    #[test]
    fn labels_cover_values_of_another_kind() {
        let setting = Setting::flag("wiki", "Wiki", true);
        assert_eq!(
            setting.label_for(&SettingValue::Choice(Some("public".into()))),
            "public"
        );
        assert_eq!(setting.label_for(&SettingValue::Flag(false)), "off");
    }

    #[test]
    fn text_edits_count_as_changes() {
        let mut title = Setting::text("title", "Title", "Demo", true);
        title.current = SettingValue::Text(String::new());
        let dirty = DirtySet::from_settings(&[title]);
        assert!(dirty.turned_off.is_empty());
        assert_eq!(dirty.changed, vec!["title"]);
    }
}
