//! Toggle, confirm, submit and reconcile cycle for one settings group.
//!
//! The controller never performs I/O. Callers feed it user input and
//! submission results and act on the steps it hands back: show a prompt,
//! send a [`SubmissionRequest`], show an alert, or reload the page state.

use super::groups::{DestructiveRule, GroupId, GroupSpec, NOTICE_TTL};
use super::transport::SubmissionRequest;
use super::{DirtySet, Setting, SettingKind, SettingValue, SettingsError};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Idle,
    AwaitingConfirmation,
    AwaitingCapabilityAck(String),
    Submitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Dirty,
    AwaitingConfirmation,
    Submitting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    DestructiveChange,
    Capabilities { key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationPrompt {
    pub group: GroupId,
    pub kind: PromptKind,
    pub title: String,
    pub message: String,
    /// Labels of the affected settings.
    pub items: Vec<String>,
    pub confirm_label: String,
}

/// Transient success message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub ttl: Duration,
}

/// Failure message that stays up until acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn request_failed(message: &str, support_email: &str) -> Self {
        Alert {
            title: "Request failed".to_string(),
            message: format!(
                "{} If this persists please contact {}.",
                message, support_email
            ),
        }
    }
}

/// Request to re-fetch the authoritative page state after `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadIntent {
    pub delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub notice: Option<Notice>,
    pub reload: ReloadIntent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveStep {
    /// Nothing differs from the baseline; no request is made.
    Unchanged(Option<Notice>),
    Confirm(ConfirmationPrompt),
    Submit(SubmissionRequest),
    /// The user declined; these settings were restored to their baseline.
    RolledBack(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    Updated,
    Prompt(ConfirmationPrompt),
    Save(SaveStep),
    /// Switching this on happens outside the client.
    Redirect(String),
}

#[derive(Debug, Clone)]
pub struct SettingsToggleController {
    spec: GroupSpec,
    settings: Vec<Setting>,
    phase: Phase,
}

impl SettingsToggleController {
    pub fn new(spec: GroupSpec, settings: Vec<Setting>) -> Self {
        let mut controller = Self {
            spec,
            settings,
            phase: Phase::Idle,
        };
        controller.capture_baseline();
        controller
    }

    pub fn id(&self) -> &GroupId {
        &self.spec.id
    }

    pub fn spec(&self) -> &GroupSpec {
        &self.spec
    }

    pub fn settings(&self) -> &[Setting] {
        &self.settings
    }

    pub fn setting(&self, key: &str) -> Option<&Setting> {
        self.settings.iter().find(|s| s.key == key)
    }

    pub fn state(&self) -> ControllerState {
        match self.phase {
            Phase::Submitting => ControllerState::Submitting,
            Phase::AwaitingConfirmation | Phase::AwaitingCapabilityAck(_) => {
                ControllerState::AwaitingConfirmation
            }
            Phase::Idle if self.compute_dirty_set().is_empty() => ControllerState::Idle,
            Phase::Idle => ControllerState::Dirty,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.phase == Phase::Submitting
    }

    pub fn capture_baseline(&mut self) {
        for setting in &mut self.settings {
            setting.saved = setting.current.clone();
        }
    }

    pub fn compute_dirty_set(&self) -> DirtySet {
        DirtySet::from_settings(&self.settings)
    }

    /// Flips a boolean setting.
    pub fn toggle(&mut self, key: &str) -> Result<ToggleOutcome, SettingsError> {
        self.ensure_editable()?;
        let idx = self.index_of(key)?;
        let SettingValue::Flag(on) = self.settings[idx].current else {
            return Err(SettingsError::KindMismatch(key.to_string()));
        };

        if !on {
            if let Some(url) = &self.spec.enable_url {
                return Ok(ToggleOutcome::Redirect(url.clone()));
            }
        }

        self.settings[idx].current = SettingValue::Flag(!on);

        let setting = &self.settings[idx];
        let newly_enabled = !on && !setting.saved.is_enabled();
        if let (true, Some(terms)) = (newly_enabled, &setting.capabilities) {
            let prompt = ConfirmationPrompt {
                group: self.spec.id.clone(),
                kind: PromptKind::Capabilities {
                    key: setting.key.clone(),
                },
                title: format!("Enable {}?", setting.label),
                message: terms.clone(),
                items: vec![setting.label.clone()],
                confirm_label: "Confirm".to_string(),
            };
            self.phase = Phase::AwaitingCapabilityAck(setting.key.clone());
            return Ok(ToggleOutcome::Prompt(prompt));
        }

        self.after_edit()
    }

    /// Picks an option of an enumerated setting. `None` clears it.
    pub fn select(
        &mut self,
        key: &str,
        value: Option<String>,
    ) -> Result<ToggleOutcome, SettingsError> {
        self.ensure_editable()?;
        let idx = self.index_of(key)?;
        let SettingKind::Enumerated { options, clearable } = &self.settings[idx].kind else {
            return Err(SettingsError::KindMismatch(key.to_string()));
        };

        match &value {
            Some(v) if !options.iter().any(|o| &o.value == v) => {
                return Err(SettingsError::InvalidChoice {
                    key: key.to_string(),
                    value: v.clone(),
                });
            }
            None if !clearable => {
                return Err(SettingsError::InvalidChoice {
                    key: key.to_string(),
                    value: "None".to_string(),
                });
            }
            _ => {}
        }

        self.settings[idx].current = SettingValue::Choice(value);
        self.after_edit()
    }

    /// Replaces the value of a text setting.
    pub fn edit_text(&mut self, key: &str, value: String) -> Result<ToggleOutcome, SettingsError> {
        self.ensure_editable()?;
        let idx = self.index_of(key)?;
        let SettingKind::Text { required } = self.settings[idx].kind else {
            return Err(SettingsError::KindMismatch(key.to_string()));
        };
        if required && value.trim().is_empty() {
            return Err(SettingsError::Blank(self.settings[idx].label.clone()));
        }

        self.settings[idx].current = SettingValue::Text(value);
        self.after_edit()
    }

    /// Answers the terms prompt opened by [`toggle`](Self::toggle). A
    /// refusal switches the setting back off.
    pub fn acknowledge_capabilities(
        &mut self,
        accepted: bool,
    ) -> Result<ToggleOutcome, SettingsError> {
        let Phase::AwaitingCapabilityAck(key) = &self.phase else {
            return Err(SettingsError::NoPendingConfirmation);
        };
        let key = key.clone();
        self.phase = Phase::Idle;

        if !accepted {
            let idx = self.index_of(&key)?;
            self.settings[idx].current = SettingValue::Flag(false);
            info!(group = %self.spec.id, setting = %key, "capabilities declined");
            return Ok(ToggleOutcome::Updated);
        }
        self.after_edit()
    }

    pub fn begin_save(&mut self) -> Result<SaveStep, SettingsError> {
        self.ensure_editable()?;
        let dirty = self.compute_dirty_set();

        if dirty.is_empty() {
            return Ok(SaveStep::Unchanged(self.success_notice()));
        }

        if self.spec.destructive == DestructiveRule::TurnedOff && !dirty.turned_off.is_empty() {
            self.phase = Phase::AwaitingConfirmation;
            return Ok(SaveStep::Confirm(self.destructive_prompt(&dirty)));
        }

        Ok(SaveStep::Submit(self.start_submission()))
    }

    pub fn resolve_confirmation(&mut self, confirmed: bool) -> Result<SaveStep, SettingsError> {
        if self.phase != Phase::AwaitingConfirmation {
            return Err(SettingsError::NoPendingConfirmation);
        }

        if confirmed {
            return Ok(SaveStep::Submit(self.start_submission()));
        }

        let declined = self.compute_dirty_set().turned_off;
        for setting in &mut self.settings {
            if declined.contains(&setting.key) {
                setting.current = setting.saved.clone();
            }
        }
        self.phase = Phase::Idle;
        warn!(group = %self.spec.id, settings = ?declined, "change declined, rolled back");
        Ok(SaveStep::RolledBack(declined))
    }

    /// Request carrying the complete current state of the group.
    pub fn submission_request(&self) -> SubmissionRequest {
        SubmissionRequest {
            group: self.spec.id.clone(),
            method: self.spec.method,
            endpoint: self.spec.endpoint.clone(),
            payload: self.spec.build_payload(&self.settings),
        }
    }

    pub fn on_submit_success(&mut self) -> SubmitOutcome {
        let notice = self.success_notice();
        self.capture_baseline();
        self.phase = Phase::Idle;
        info!(group = %self.spec.id, "settings saved");
        SubmitOutcome {
            notice,
            reload: ReloadIntent {
                delay: self.spec.reload_delay,
            },
        }
    }

    /// Leaves every edit in place so the user can retry.
    pub fn on_submit_failure(&mut self, reason: &str) -> Alert {
        self.phase = Phase::Idle;
        warn!(group = %self.spec.id, %reason, "settings not saved");
        self.failure_alert()
    }

    /// Alert for a failed save of the group's current values. Does not
    /// touch the controller state.
    pub fn failure_alert(&self) -> Alert {
        Alert::request_failed(
            &self.spec.failure_text(&self.settings),
            &self.spec.support_email,
        )
    }

    pub fn guard_unload(&self) -> Option<String> {
        if self.compute_dirty_set().is_empty() {
            None
        } else {
            Some(format!(
                "The changes on {} setting are not submitted!",
                self.spec.label
            ))
        }
    }

    pub fn ensure_editable(&self) -> Result<(), SettingsError> {
        match self.phase {
            Phase::Idle => Ok(()),
            Phase::Submitting => Err(SettingsError::SubmissionInFlight),
            Phase::AwaitingConfirmation | Phase::AwaitingCapabilityAck(_) => {
                Err(SettingsError::PromptPending)
            }
        }
    }

    fn index_of(&self, key: &str) -> Result<usize, SettingsError> {
        self.settings
            .iter()
            .position(|s| s.key == key)
            .ok_or_else(|| SettingsError::UnknownSetting(key.to_string()))
    }

    fn after_edit(&mut self) -> Result<ToggleOutcome, SettingsError> {
        if self.spec.submit_on_toggle {
            Ok(ToggleOutcome::Save(self.begin_save()?))
        } else {
            Ok(ToggleOutcome::Updated)
        }
    }

    fn start_submission(&mut self) -> SubmissionRequest {
        self.phase = Phase::Submitting;
        self.submission_request()
    }

    fn success_notice(&self) -> Option<Notice> {
        self.spec.success_text(&self.settings).map(|text| Notice {
            text,
            ttl: NOTICE_TTL,
        })
    }

    fn destructive_prompt(&self, dirty: &DirtySet) -> ConfirmationPrompt {
        let items = self
            .settings
            .iter()
            .filter(|s| dirty.turned_off.contains(&s.key))
            .map(|s| s.label.clone())
            .collect();
        ConfirmationPrompt {
            group: self.spec.id.clone(),
            kind: PromptKind::DestructiveChange,
            title: self.spec.confirm.title.clone(),
            message: String::new(),
            items,
            confirm_label: self.spec.confirm.confirm_label.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ChoiceOption;
    use crate::settings::groups::SubmitMethod;
    use serde_json::json;

    const NODE_API: &str = "https://osf.example/api/v1/project/abc12/";

    fn addons() -> SettingsToggleController {
        SettingsToggleController::new(
            GroupSpec::addons(NODE_API, "support@osf.io"),
            vec![
                Setting::flag("wiki", "Wiki", true),
                Setting::flag("dropbox", "Dropbox", false),
                Setting::flag("s3", "Amazon S3", false)
                    .with_capabilities(Some("S3 can read your bucket".into())),
            ],
        )
    }

    fn comments() -> SettingsToggleController {
        SettingsToggleController::new(
            GroupSpec::comments(NODE_API, "support@osf.io"),
            vec![Setting::choice(
                "commentLevel",
                "Commenting",
                vec![
                    ChoiceOption::new("public", "Public"),
                    ChoiceOption::new("private", "Private"),
                ],
                Some("public".into()),
                false,
            )],
        )
    }

    #[test]
    fn baseline_capture_clears_dirty_set() {
        let mut group = addons();
        group.toggle("wiki").unwrap();
        group.toggle("dropbox").unwrap();
        assert!(!group.compute_dirty_set().is_empty());

        group.capture_baseline();
        assert!(group.compute_dirty_set().is_empty());
        assert_eq!(group.state(), ControllerState::Idle);
    }

    #[test]
    fn local_toggles_never_move_the_baseline() {
        let mut group = addons();
        for _ in 0..3 {
            group.toggle("wiki").unwrap();
            group.toggle("dropbox").unwrap();
        }
        assert_eq!(group.setting("wiki").unwrap().saved(), &SettingValue::Flag(true));
        assert_eq!(group.setting("dropbox").unwrap().saved(), &SettingValue::Flag(false));
        assert_eq!(group.compute_dirty_set().turned_off, vec!["wiki"]);
        assert_eq!(group.compute_dirty_set().turned_on, vec!["dropbox"]);
    }

    #[test]
    fn turning_off_asks_for_confirmation_listing_labels() {
        let mut group = addons();
        group.toggle("wiki").unwrap();

        let SaveStep::Confirm(prompt) = group.begin_save().unwrap() else {
            panic!("expected a confirmation");
        };
        assert_eq!(prompt.items, vec!["Wiki"]);
        assert_eq!(prompt.kind, PromptKind::DestructiveChange);
        assert_eq!(prompt.confirm_label, "Remove");
        assert_eq!(group.state(), ControllerState::AwaitingConfirmation);
    }

    #[test]
    fn declining_restores_only_turned_off_settings() {
        let mut group = addons();
        group.toggle("wiki").unwrap();
        group.toggle("dropbox").unwrap();
        group.begin_save().unwrap();

        let step = group.resolve_confirmation(false).unwrap();
        assert_eq!(step, SaveStep::RolledBack(vec!["wiki".to_string()]));
        assert_eq!(group.setting("wiki").unwrap().current, SettingValue::Flag(true));
        assert_eq!(group.setting("dropbox").unwrap().current, SettingValue::Flag(true));
        assert_eq!(group.state(), ControllerState::Dirty);
    }

    #[test]
    fn confirming_submits_the_full_payload() {
        let mut group = addons();
        group.toggle("wiki").unwrap();
        group.begin_save().unwrap();

        let SaveStep::Submit(request) = group.resolve_confirmation(true).unwrap() else {
            panic!("expected a submission");
        };
        assert_eq!(request.method, SubmitMethod::Post);
        assert_eq!(request.endpoint, format!("{}settings/addons/", NODE_API));
        assert_eq!(
            request.payload,
            Some(json!({"wiki": false, "dropbox": false, "s3": false}))
        );
        assert!(group.is_in_flight());
    }

    #[test]
    fn turning_on_submits_without_prompt() {
        let mut group = addons();
        group.toggle("dropbox").unwrap();
        assert!(matches!(group.begin_save().unwrap(), SaveStep::Submit(_)));
    }

    #[test]
    fn saving_nothing_only_shows_the_notice() {
        let mut group = addons();
        let step = group.begin_save().unwrap();
        assert_eq!(
            step,
            SaveStep::Unchanged(Some(Notice {
                text: "Settings updated".to_string(),
                ttl: NOTICE_TTL,
            }))
        );
        assert!(!group.is_in_flight());
    }

    #[test]
    fn second_save_is_rejected_while_in_flight() {
        let mut group = addons();
        group.toggle("dropbox").unwrap();
        group.begin_save().unwrap();

        assert_eq!(group.begin_save(), Err(SettingsError::SubmissionInFlight));
        assert_eq!(group.toggle("wiki"), Err(SettingsError::SubmissionInFlight));
    }

    #[test]
    fn edits_wait_for_the_open_prompt() {
        let mut group = addons();
        group.toggle("wiki").unwrap();
        group.begin_save().unwrap();
        assert_eq!(group.toggle("dropbox"), Err(SettingsError::PromptPending));
        assert_eq!(group.begin_save(), Err(SettingsError::PromptPending));
    }

    #[test]
    fn success_moves_baseline_to_sent_values() {
        let mut group = addons();
        group.toggle("dropbox").unwrap();
        let SaveStep::Submit(request) = group.begin_save().unwrap() else {
            panic!("expected a submission");
        };

        let outcome = group.on_submit_success();
        assert_eq!(outcome.reload, ReloadIntent { delay: Duration::ZERO });
        assert_eq!(outcome.notice.unwrap().text, "Settings updated");
        assert!(group.compute_dirty_set().is_empty());

        let sent = request.payload.unwrap();
        for setting in group.settings() {
            assert_eq!(setting.saved().to_json(), sent[&setting.key]);
        }
    }

    #[test]
    fn failure_keeps_edits_and_names_support() {
        let mut group = addons();
        group.toggle("dropbox").unwrap();
        group.begin_save().unwrap();

        let alert = group.on_submit_failure("API request failed with status: 500 - oops");
        assert_eq!(alert.title, "Request failed");
        assert!(alert.message.contains("support@osf.io"));
        assert_eq!(group.setting("dropbox").unwrap().current, SettingValue::Flag(true));
        assert!(group.compute_dirty_set().contains("dropbox"));
        assert_eq!(group.state(), ControllerState::Dirty);
        assert!(group.begin_save().is_ok());
    }

    #[test]
    fn unload_guard_tracks_dirty_state() {
        let mut group = addons();
        assert_eq!(group.guard_unload(), None);

        group.toggle("dropbox").unwrap();
        assert_eq!(
            group.guard_unload().as_deref(),
            Some("The changes on addon setting are not submitted!")
        );

        group.toggle("dropbox").unwrap();
        assert_eq!(group.guard_unload(), None);
    }

    #[test]
    fn declining_capabilities_unchecks_the_addon() {
        let mut group = addons();
        let ToggleOutcome::Prompt(prompt) = group.toggle("s3").unwrap() else {
            panic!("expected capabilities prompt");
        };
        assert_eq!(prompt.message, "S3 can read your bucket");
        assert_eq!(prompt.kind, PromptKind::Capabilities { key: "s3".into() });

        assert_eq!(group.acknowledge_capabilities(false), Ok(ToggleOutcome::Updated));
        assert_eq!(group.setting("s3").unwrap().current, SettingValue::Flag(false));
        assert!(group.compute_dirty_set().is_empty());
    }

    #[test]
    fn accepting_capabilities_keeps_the_addon() {
        let mut group = addons();
        group.toggle("s3").unwrap();
        group.acknowledge_capabilities(true).unwrap();
        assert_eq!(group.compute_dirty_set().turned_on, vec!["s3"]);
        assert_eq!(
            group.acknowledge_capabilities(true),
            Err(SettingsError::NoPendingConfirmation)
        );
    }

    #[test]
    fn choice_changes_are_not_destructive() {
        let mut group = comments();
        group.select("commentLevel", Some("private".into())).unwrap();
        let SaveStep::Submit(request) = group.begin_save().unwrap() else {
            panic!("expected a submission");
        };
        assert_eq!(request.payload, Some(json!({"commentLevel": "private"})));
    }

    #[test]
    fn select_rejects_unknown_options_and_wrong_kinds() {
        let mut group = comments();
        assert!(matches!(
            group.select("commentLevel", Some("everyone".into())),
            Err(SettingsError::InvalidChoice { .. })
        ));
        assert!(matches!(
            group.select("commentLevel", None),
            Err(SettingsError::InvalidChoice { .. })
        ));
        assert_eq!(
            group.toggle("commentLevel"),
            Err(SettingsError::KindMismatch("commentLevel".into()))
        );
        assert_eq!(
            group.toggle("missing"),
            Err(SettingsError::UnknownSetting("missing".into()))
        );
    }

    #[test]
    fn wiki_toggle_goes_straight_to_save() {
        let mut wiki = SettingsToggleController::new(
            GroupSpec::wiki(NODE_API, "support@osf.io"),
            vec![Setting::flag("wiki", "Wiki", false)],
        );
        let ToggleOutcome::Save(SaveStep::Submit(request)) = wiki.toggle("wiki").unwrap() else {
            panic!("expected an immediate submission");
        };
        assert_eq!(request.payload, Some(json!({"wiki": true})));

        let outcome = wiki.on_submit_success();
        assert_eq!(outcome.notice.unwrap().text, "Wiki Enabled");
        assert_eq!(outcome.reload.delay, Duration::from_millis(1500));
    }

    #[test]
    fn disconnected_accounts_redirect_instead_of_toggling() {
        let url = "https://osf.example/api/v1/settings/figshare/oauth/";
        let mut account = SettingsToggleController::new(
            GroupSpec::account(url, "figshare", "figshare", "support@osf.io"),
            vec![Setting::flag("connected", "figshare", false)],
        );
        assert_eq!(
            account.toggle("connected"),
            Ok(ToggleOutcome::Redirect(url.to_string()))
        );
        assert!(account.compute_dirty_set().is_empty());
    }

    #[test]
    fn resolve_without_prompt_is_an_error() {
        let mut group = addons();
        assert_eq!(
            group.resolve_confirmation(true),
            Err(SettingsError::NoPendingConfirmation)
        );
    }

    #[test]
    fn text_edits_reject_blank_required_values() {
        let mut group = SettingsToggleController::new(
            GroupSpec::details("https://api.osf.example/v2/", "abc12", "support@osf.io"),
            vec![
                Setting::text("title", "Title", "Demo", true),
                Setting::text("description", "Description", "", false),
            ],
        );
        assert_eq!(
            group.edit_text("title", "  ".into()),
            Err(SettingsError::Blank("Title".to_string()))
        );
        assert_eq!(group.edit_text("description", "notes".into()), Ok(ToggleOutcome::Updated));
        assert_eq!(
            group.edit_text("missing", "x".into()),
            Err(SettingsError::UnknownSetting("missing".to_string()))
        );

        let SaveStep::Submit(request) = group.begin_save().unwrap() else {
            panic!("text edits are never destructive");
        };
        assert_eq!(request.method, SubmitMethod::Patch);
        assert_eq!(
            request.payload.unwrap()["data"]["attributes"],
            json!({"title": "Demo", "description": "notes"})
        );
    }
}
