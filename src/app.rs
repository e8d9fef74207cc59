use crate::api::osf::OsfClient;
use crate::api::osf::institutions::InstitutionsApi;
use crate::api::osf::project::ProjectApi;
use crate::api::osf::types::{InstitutionChoices, SubscriptionNode, WikiSettingsNode};
use crate::config::{ApiConfig, PageConfig};
use crate::event::{Event, EventHandler};
use crate::settings::controller::{
    Alert, ConfirmationPrompt, ControllerState, Notice, PromptKind, SaveStep,
    SettingsToggleController, ToggleOutcome,
};
use crate::settings::groups::{self, GroupId, PRIMARY_INSTITUTION_KEY};
use crate::settings::transport::{SubmissionRequest, request_submission};
use crate::settings::{SettingKind, SettingValue};
use crate::tui::Tui;
use crate::ui;
use anyhow::Result;
use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::widgets::TableState;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Details,
    Addons,
    Wiki,
    Comments,
    Institution,
    Accounts,
    Notifications,
}

impl Tab {
    pub const ALL: [Tab; 7] = [
        Tab::Details,
        Tab::Addons,
        Tab::Wiki,
        Tab::Comments,
        Tab::Institution,
        Tab::Accounts,
        Tab::Notifications,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Details => "Project",
            Tab::Addons => "Add-ons",
            Tab::Wiki => "Wiki",
            Tab::Comments => "Commenting",
            Tab::Institution => "Institution",
            Tab::Accounts => "Accounts",
            Tab::Notifications => "Notifications",
        }
    }

    fn index(self) -> usize {
        Tab::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    fn next(self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    fn prev(self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }

    /// Group saved by the `s` key on this tab.
    fn save_target(self) -> Option<GroupId> {
        match self {
            Tab::Details => Some(GroupId::Details),
            Tab::Addons => Some(GroupId::Addons),
            Tab::Comments => Some(GroupId::Comments),
            Tab::Institution => Some(GroupId::Institution),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitAction {
    Quit,
    Reload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    Confirm(ConfirmationPrompt),
    Alert(Alert),
    ExitGuard {
        warnings: Vec<String>,
        action: ExitAction,
    },
    Redirect(String),
    EditText {
        group: GroupId,
        key: String,
        label: String,
        buffer: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowAction {
    Toggle,
    Select(Option<String>),
    Edit,
}

/// One selectable line on a settings tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingRow {
    pub group: GroupId,
    pub key: String,
    pub action: RowAction,
    pub label: String,
    pub checked: bool,
    pub dirty: bool,
    pub busy: bool,
}

#[derive(Debug, Clone)]
pub struct PostedNotice {
    pub text: String,
    pub expires_at: Instant,
}

#[derive(Debug)]
pub struct App {
    pub should_quit: bool,
    pub client: Option<OsfClient>,
    pub api: ApiConfig,
    pub page: PageConfig,

    pub node_title: Option<String>,
    pub is_loading: bool,
    pub page_error: Option<String>,
    pub last_loaded: Option<DateTime<Local>>,
    pub groups: Vec<SettingsToggleController>,

    // Independently loaded areas, each with its own message line.
    pub notifications: Vec<SubscriptionNode>,
    pub notifications_message: Option<String>,
    pub wiki_settings: Vec<WikiSettingsNode>,
    pub wiki_message: Option<String>,
    pub institution_message: Option<String>,
    pub institution_href: Option<String>,

    pub notices: HashMap<GroupId, PostedNotice>,
    pub modals: VecDeque<Modal>,
    pub status: Option<String>,
    pub reload_at: Option<Instant>,

    pub current_tab: Tab,
    pub table_state: TableState,
}

impl App {
    pub fn new(client: Option<OsfClient>, api: ApiConfig, page: PageConfig) -> Self {
        Self {
            should_quit: false,
            client,
            api,
            page,
            node_title: None,
            is_loading: false,
            page_error: None,
            last_loaded: None,
            groups: Vec::new(),
            notifications: Vec::new(),
            notifications_message: None,
            wiki_settings: Vec::new(),
            wiki_message: None,
            institution_message: None,
            institution_href: None,
            notices: HashMap::new(),
            modals: VecDeque::new(),
            status: None,
            reload_at: None,
            current_tab: Tab::Details,
            table_state: TableState::default(),
        }
    }

    pub async fn run(&mut self, tui: &mut Tui, events: &mut EventHandler) -> Result<()> {
        if self.client.is_some() {
            self.reload(events.sender());
        } else {
            self.page_error = Some("API Client not initialized. Check .env config.".to_string());
        }

        while !self.should_quit {
            tui.draw(|f| {
                ui::render(self, f);
            })?;

            let event = events.next().await?;
            self.handle_event(event, events.sender());
        }
        Ok(())
    }

    pub fn handle_event(&mut self, event: Event, tx: UnboundedSender<Event>) {
        match event {
            Event::Tick => self.on_tick(Instant::now(), tx),
            Event::Key(key) => self.handle_key_event(key, tx),
            Event::Mouse(_) | Event::Resize(_, _) => {}
            Event::PageContextFetched(result) => {
                self.is_loading = false;
                match result {
                    Ok(ctx) => {
                        self.node_title = Some(ctx.node.title.clone());
                        let institution = self.take_group(&GroupId::Institution);
                        self.groups = groups::page_groups(&ctx, &self.api, &self.page);
                        self.groups.extend(institution);
                        self.last_loaded = Some(Local::now());
                        self.clamp_selection();
                    }
                    Err(e) => {
                        error!(error = %e, "Could not GET project settings.");
                        self.page_error = Some("Could not retrieve project settings.".to_string());
                    }
                }
            }
            Event::SubscriptionsFetched(result) => match result {
                Ok(tree) => self.notifications = tree,
                Err(e) => {
                    error!(error = %e, "Could not GET notification settings.");
                    self.notifications_message =
                        Some("Could not retrieve notification settings.".to_string());
                }
            },
            Event::WikiSettingsFetched(result) => match result {
                Ok(tree) => self.wiki_settings = tree,
                Err(e) => {
                    error!(error = %e, "Could not GET wiki settings.");
                    self.wiki_message = Some("Could not retrieve wiki settings.".to_string());
                }
            },
            Event::InstitutionsFetched(result) => match result {
                Ok(choices) => self.install_institutions(choices),
                Err(e) => {
                    error!(error = %e, "Could not GET institutions.");
                    self.institution_message =
                        Some("Could not retrieve institution settings.".to_string());
                }
            },
            Event::SettingsSubmitted { group, result } => {
                self.on_submission_settled(group, result, Instant::now())
            }
        }
    }

    fn install_institutions(&mut self, choices: InstitutionChoices) {
        self.institution_href = choices
            .primary
            .as_ref()
            .and_then(|inst| inst.links.html.clone());
        let controller = groups::institution_group(
            &choices.available,
            choices.primary.as_ref(),
            &self.api,
            &self.page,
        );
        self.take_group(&GroupId::Institution);
        self.groups.push(controller);
    }

    fn take_group(&mut self, id: &GroupId) -> Option<SettingsToggleController> {
        let idx = self.groups.iter().position(|g| g.id() == id)?;
        Some(self.groups.remove(idx))
    }

    pub fn group(&self, id: &GroupId) -> Option<&SettingsToggleController> {
        self.groups.iter().find(|g| g.id() == id)
    }

    fn group_mut(&mut self, id: &GroupId) -> Option<&mut SettingsToggleController> {
        self.groups.iter_mut().find(|g| g.id() == id)
    }

    pub fn notice_for(&self, id: &GroupId) -> Option<&str> {
        self.notices.get(id).map(|n| n.text.as_str())
    }

    /// Discards every controller and re-fetches the whole page.
    fn reload(&mut self, tx: UnboundedSender<Event>) {
        let Some(client) = self.client.clone() else {
            return;
        };
        info!("reloading settings page");
        self.reload_at = None;
        self.is_loading = true;
        self.page_error = None;
        self.notifications_message = None;
        self.wiki_message = None;
        self.institution_message = None;
        self.groups.clear();

        let page_client = client.clone();
        let page_tx = tx.clone();
        tokio::spawn(async move {
            let result = page_client
                .get_page_context()
                .await
                .map_err(|e| e.to_string());
            let _ = page_tx.send(Event::PageContextFetched(result));
        });

        let subs_client = client.clone();
        let subs_tx = tx.clone();
        tokio::spawn(async move {
            let result = subs_client
                .get_subscriptions()
                .await
                .map_err(|e| e.to_string());
            let _ = subs_tx.send(Event::SubscriptionsFetched(result));
        });

        let wiki_client = client.clone();
        let wiki_tx = tx.clone();
        tokio::spawn(async move {
            let result = wiki_client
                .get_wiki_settings()
                .await
                .map_err(|e| e.to_string());
            let _ = wiki_tx.send(Event::WikiSettingsFetched(result));
        });

        tokio::spawn(async move {
            let (available, primary) = tokio::join!(
                client.get_user_institutions(),
                client.get_primary_institution()
            );
            // A missing primary institution just shows as "None".
            let primary = primary.unwrap_or_else(|e| {
                warn!(error = %e, "could not load primary institution");
                None
            });
            let result = available
                .map(|available| InstitutionChoices { available, primary })
                .map_err(|e| e.to_string());
            let _ = tx.send(Event::InstitutionsFetched(result));
        });
    }

    fn spawn_submission(&mut self, request: SubmissionRequest, tx: UnboundedSender<Event>) {
        let Some(client) = self.client.clone() else {
            let group = request.group.clone();
            let _ = tx.send(Event::SettingsSubmitted {
                group,
                result: Err("API client not initialized".to_string()),
            });
            return;
        };
        tokio::spawn(async move {
            let result = request_submission(&client, &request)
                .await
                .map(|_| ())
                .map_err(|e| e.to_string());
            let _ = tx.send(Event::SettingsSubmitted {
                group: request.group,
                result,
            });
        });
    }

    pub(crate) fn on_submission_settled(
        &mut self,
        id: GroupId,
        result: Result<(), String>,
        now: Instant,
    ) {
        let Some(group) = self.group_mut(&id) else {
            warn!(group = %id, "submission settled for a group that is no longer loaded");
            match result {
                Ok(()) => self.schedule_reload(Duration::ZERO, now),
                Err(_) => {
                    let alert = Alert::request_failed(
                        "Sorry, we had trouble saving your settings.",
                        &self.page.support_email,
                    );
                    self.modals.push_back(Modal::Alert(alert));
                }
            }
            return;
        };

        if !group.is_in_flight() {
            // Page was rebuilt while the request was out. The server state is
            // authoritative on success; a failure is still reported.
            warn!(group = %id, "submission settled after reload");
            match result {
                Ok(()) => self.schedule_reload(Duration::ZERO, now),
                Err(reason) => {
                    error!(group = %id, %reason, "settings not saved");
                    let alert = group.failure_alert();
                    self.modals.push_back(Modal::Alert(alert));
                }
            }
            return;
        }

        match result {
            Ok(()) => {
                let outcome = group.on_submit_success();
                if let Some(notice) = outcome.notice {
                    self.post_notice(id, notice, now);
                }
                self.schedule_reload(outcome.reload.delay, now);
            }
            Err(reason) => {
                let alert = group.on_submit_failure(&reason);
                self.modals.push_back(Modal::Alert(alert));
            }
        }
    }

    fn post_notice(&mut self, id: GroupId, notice: Notice, now: Instant) {
        self.notices.insert(
            id,
            PostedNotice {
                text: notice.text,
                expires_at: now + notice.ttl,
            },
        );
    }

    fn schedule_reload(&mut self, delay: Duration, now: Instant) {
        let at = now + delay;
        self.reload_at = Some(match self.reload_at {
            Some(existing) if existing < at => existing,
            _ => at,
        });
    }

    pub(crate) fn on_tick(&mut self, now: Instant, tx: UnboundedSender<Event>) {
        self.notices.retain(|_, notice| notice.expires_at > now);

        let Some(at) = self.reload_at else {
            return;
        };
        // Wait for other saves to settle before rebuilding the page.
        if at > now || self.any_in_flight() {
            return;
        }
        self.reload_at = None;
        self.leave_page(ExitAction::Reload, tx);
    }

    fn any_in_flight(&self) -> bool {
        self.groups.iter().any(|g| g.is_in_flight())
    }

    /// Pushes a reload back to the tick loop while a save is out. Rebuilt
    /// controllers would lose track of the pending request.
    fn defer_reload_while_saving(&mut self) -> bool {
        if !self.any_in_flight() {
            return false;
        }
        info!("reload deferred until pending saves settle");
        self.status = Some("Reloading once pending saves finish".to_string());
        self.schedule_reload(Duration::ZERO, Instant::now());
        true
    }

    fn unsaved_warnings(&self) -> Vec<String> {
        self.groups.iter().filter_map(|g| g.guard_unload()).collect()
    }

    fn leave_page(&mut self, action: ExitAction, tx: UnboundedSender<Event>) {
        if action == ExitAction::Reload && self.defer_reload_while_saving() {
            return;
        }
        let warnings = self.unsaved_warnings();
        if !warnings.is_empty() {
            self.modals.push_back(Modal::ExitGuard { warnings, action });
            return;
        }
        self.finish_exit(action, tx);
    }

    fn finish_exit(&mut self, action: ExitAction, tx: UnboundedSender<Event>) {
        match action {
            ExitAction::Quit => self.should_quit = true,
            ExitAction::Reload => {
                if !self.defer_reload_while_saving() {
                    self.reload(tx);
                }
            }
        }
    }

    fn apply_step(&mut self, id: GroupId, step: SaveStep, tx: UnboundedSender<Event>) {
        match step {
            SaveStep::Unchanged(notice) => {
                if let Some(notice) = notice {
                    self.post_notice(id, notice, Instant::now());
                }
            }
            SaveStep::Confirm(prompt) => self.modals.push_back(Modal::Confirm(prompt)),
            SaveStep::Submit(request) => self.spawn_submission(request, tx),
            SaveStep::RolledBack(keys) => {
                self.status = Some(format!("Kept {}", keys.join(", ")));
            }
        }
    }

    fn apply_toggle(&mut self, id: GroupId, outcome: ToggleOutcome, tx: UnboundedSender<Event>) {
        match outcome {
            ToggleOutcome::Updated => {}
            ToggleOutcome::Prompt(prompt) => self.modals.push_back(Modal::Confirm(prompt)),
            ToggleOutcome::Save(step) => self.apply_step(id, step, tx),
            ToggleOutcome::Redirect(url) => self.modals.push_back(Modal::Redirect(url)),
        }
    }

    fn answer_modal(&mut self, accepted: bool, tx: UnboundedSender<Event>) {
        let Some(modal) = self.modals.pop_front() else {
            return;
        };
        match modal {
            Modal::Confirm(prompt) => {
                let id = prompt.group.clone();
                let Some(group) = self.group_mut(&id) else {
                    return;
                };
                match prompt.kind {
                    PromptKind::DestructiveChange => match group.resolve_confirmation(accepted) {
                        Ok(step) => self.apply_step(id, step, tx),
                        Err(e) => self.status = Some(e.to_string()),
                    },
                    PromptKind::Capabilities { .. } => {
                        match group.acknowledge_capabilities(accepted) {
                            Ok(outcome) => self.apply_toggle(id, outcome, tx),
                            Err(e) => self.status = Some(e.to_string()),
                        }
                    }
                }
            }
            Modal::ExitGuard { action, .. } => {
                if accepted {
                    self.finish_exit(action, tx);
                }
            }
            Modal::EditText {
                group, key, buffer, ..
            } => {
                if accepted {
                    self.commit_text(group, &key, buffer, tx);
                }
            }
            Modal::Alert(_) | Modal::Redirect(_) => {}
        }
    }

    fn commit_text(&mut self, id: GroupId, key: &str, value: String, tx: UnboundedSender<Event>) {
        let Some(group) = self.group_mut(&id) else {
            return;
        };
        match group.edit_text(key, value) {
            Ok(outcome) => {
                self.status = None;
                self.apply_toggle(id, outcome, tx);
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    pub fn current_rows(&self) -> Vec<SettingRow> {
        let ids: Vec<GroupId> = match self.current_tab {
            Tab::Details => vec![GroupId::Details],
            Tab::Addons => vec![GroupId::Addons],
            Tab::Wiki => vec![GroupId::Wiki],
            Tab::Comments => vec![GroupId::Comments],
            Tab::Institution => vec![GroupId::Institution],
            Tab::Accounts => self
                .groups
                .iter()
                .filter(|g| matches!(g.id(), GroupId::Account(_)))
                .map(|g| g.id().clone())
                .collect(),
            Tab::Notifications => Vec::new(),
        };

        let mut rows = Vec::new();
        for group in ids.iter().filter_map(|id| self.group(id)) {
            let busy = group.state() == ControllerState::Submitting;
            let dirty_set = group.compute_dirty_set();
            for setting in group.settings() {
                match &setting.kind {
                    SettingKind::Boolean => rows.push(SettingRow {
                        group: group.id().clone(),
                        key: setting.key.clone(),
                        action: RowAction::Toggle,
                        label: setting.label.clone(),
                        checked: setting.current == SettingValue::Flag(true),
                        dirty: dirty_set.contains(&setting.key),
                        busy,
                    }),
                    SettingKind::Text { .. } => rows.push(SettingRow {
                        group: group.id().clone(),
                        key: setting.key.clone(),
                        action: RowAction::Edit,
                        label: format!("{}: {}", setting.label, setting.label_for(&setting.current)),
                        checked: false,
                        dirty: dirty_set.contains(&setting.key),
                        busy,
                    }),
                    SettingKind::Enumerated { options, clearable } => {
                        let selected = setting.current.as_choice();
                        for option in options {
                            rows.push(SettingRow {
                                group: group.id().clone(),
                                key: setting.key.clone(),
                                action: RowAction::Select(Some(option.value.clone())),
                                label: option.label.clone(),
                                checked: selected == Some(option.value.as_str()),
                                dirty: dirty_set.contains(&setting.key),
                                busy,
                            });
                        }
                        if *clearable {
                            rows.push(SettingRow {
                                group: group.id().clone(),
                                key: setting.key.clone(),
                                action: RowAction::Select(None),
                                label: "None".to_string(),
                                checked: selected.is_none(),
                                dirty: dirty_set.contains(&setting.key),
                                busy,
                            });
                        }
                    }
                }
            }
        }
        rows
    }

    fn activate_row(&mut self, tx: UnboundedSender<Event>) {
        let rows = self.current_rows();
        let Some(row) = self.table_state.selected().and_then(|i| rows.get(i)).cloned() else {
            return;
        };
        let Some(group) = self.group_mut(&row.group) else {
            return;
        };
        let outcome = match row.action {
            RowAction::Toggle => group.toggle(&row.key),
            RowAction::Select(value) => group.select(&row.key, value),
            RowAction::Edit => {
                if let Err(e) = group.ensure_editable() {
                    self.status = Some(e.to_string());
                    return;
                }
                let Some(setting) = group.setting(&row.key) else {
                    return;
                };
                let modal = Modal::EditText {
                    group: row.group.clone(),
                    key: row.key.clone(),
                    label: setting.label.clone(),
                    buffer: setting.current.as_text().unwrap_or_default().to_string(),
                };
                self.modals.push_back(modal);
                return;
            }
        };
        match outcome {
            Ok(outcome) => {
                self.status = None;
                self.apply_toggle(row.group, outcome, tx);
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    fn save_current_tab(&mut self, tx: UnboundedSender<Event>) {
        let Some(id) = self.current_tab.save_target() else {
            return;
        };
        let Some(group) = self.group_mut(&id) else {
            return;
        };
        match group.begin_save() {
            Ok(step) => {
                self.status = None;
                self.apply_step(id, step, tx);
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent, tx: UnboundedSender<Event>) {
        if let Some(Modal::EditText { buffer, .. }) = self.modals.front_mut() {
            match key.code {
                KeyCode::Char(c) => {
                    buffer.push(c);
                    return;
                }
                KeyCode::Backspace => {
                    buffer.pop();
                    return;
                }
                _ => {}
            }
        }

        if let Some(modal) = self.modals.front() {
            let answers_question = matches!(modal, Modal::Confirm(_) | Modal::ExitGuard { .. });
            // Enter never discards edits from the unsaved-changes guard.
            let enter_accepts = matches!(modal, Modal::Confirm(_) | Modal::EditText { .. });
            match key.code {
                KeyCode::Char('y') if answers_question => self.answer_modal(true, tx),
                KeyCode::Enter => self.answer_modal(enter_accepts, tx),
                KeyCode::Char('n') | KeyCode::Esc => self.answer_modal(false, tx),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.leave_page(ExitAction::Quit, tx),
            KeyCode::Char('r') => self.leave_page(ExitAction::Reload, tx),
            KeyCode::Tab | KeyCode::Char('l') | KeyCode::Right => {
                self.current_tab = self.current_tab.next();
                self.table_state.select(Some(0));
                self.clamp_selection();
            }
            KeyCode::BackTab | KeyCode::Char('h') | KeyCode::Left => {
                self.current_tab = self.current_tab.prev();
                self.table_state.select(Some(0));
                self.clamp_selection();
            }
            KeyCode::Char('j') | KeyCode::Down => self.next_row(),
            KeyCode::Char('k') | KeyCode::Up => self.previous_row(),
            KeyCode::Char(' ') | KeyCode::Enter => self.activate_row(tx),
            KeyCode::Char('s') => self.save_current_tab(tx),
            _ => {}
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.current_rows().len();
        let selected = match self.table_state.selected() {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => Some(0),
        };
        self.table_state.select(selected);
    }

    fn next_row(&mut self) {
        let len = self.current_rows().len();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.table_state.select(Some(i));
    }

    fn previous_row(&mut self) {
        let len = self.current_rows().len();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }

    /// Primary institution as currently selected, for the header line.
    pub fn primary_institution_label(&self) -> String {
        self.group(&GroupId::Institution)
            .and_then(|g| g.setting(PRIMARY_INSTITUTION_KEY))
            .map(|s| s.label_for(s.saved()))
            .unwrap_or_else(|| "None".to_string())
    }
}
