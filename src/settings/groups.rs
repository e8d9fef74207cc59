//! The concrete settings groups on the page. Each group is a `GroupSpec`
//! value driving the same controller; none of them has its own code path.

use super::controller::SettingsToggleController;
use super::{ChoiceOption, Setting, SettingValue};
use crate::api::osf::types::{Institution, PageContext};
use crate::config::{ApiConfig, PageConfig};
use serde_json::{Map, Value, json};
use std::fmt;
use std::time::Duration;

pub const NOTICE_TTL: Duration = Duration::from_millis(5000);
const WIKI_RELOAD_DELAY: Duration = Duration::from_millis(1500);

pub const WIKI_KEY: &str = "wiki";
pub const COMMENT_LEVEL_KEY: &str = "commentLevel";
pub const PRIMARY_INSTITUTION_KEY: &str = "primaryInst";
pub const CONNECTED_KEY: &str = "connected";
pub const TITLE_KEY: &str = "title";
pub const DESCRIPTION_KEY: &str = "description";
pub const CATEGORY_KEY: &str = "category";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupId {
    Details,
    Addons,
    Wiki,
    Comments,
    Institution,
    Account(String),
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupId::Details => write!(f, "details"),
            GroupId::Addons => write!(f, "addons"),
            GroupId::Wiki => write!(f, "wiki"),
            GroupId::Comments => write!(f, "comments"),
            GroupId::Institution => write!(f, "institution"),
            GroupId::Account(provider) => write!(f, "account:{}", provider),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMethod {
    Post,
    Put,
    Patch,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadShape {
    /// `{key: value, ...}` for every setting in the group, changed or not.
    FlatMap,
    /// JSON:API relationship document built from the single choice setting.
    InstitutionRelationship,
    /// JSON:API node document with every setting as an attribute.
    NodeAttributes { node_id: String },
    /// No body.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestructiveRule {
    /// Switching anything off needs a confirmation.
    TurnedOff,
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuccessNotice {
    None,
    Text(String),
    /// Text depends on the value that was saved for `key`.
    FlagState {
        key: String,
        enabled: String,
        disabled: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureMessage {
    Text(String),
    /// Text depends on whether `key` was being set or cleared.
    ChoiceState {
        key: String,
        set: String,
        cleared: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmCopy {
    pub title: String,
    pub confirm_label: String,
}

#[derive(Debug, Clone)]
pub struct GroupSpec {
    pub id: GroupId,
    pub label: String,
    pub endpoint: String,
    pub method: SubmitMethod,
    pub payload: PayloadShape,
    pub destructive: DestructiveRule,
    pub confirm: ConfirmCopy,
    pub submit_on_toggle: bool,
    /// Where to send the user to switch the setting on when that cannot be
    /// done through the API.
    pub enable_url: Option<String>,
    pub notice: SuccessNotice,
    pub reload_delay: Duration,
    pub failure: FailureMessage,
    pub support_email: String,
}

impl GroupSpec {
    pub fn details(api_v2_prefix: &str, node_id: &str, support_email: &str) -> Self {
        Self {
            id: GroupId::Details,
            label: "project".to_string(),
            endpoint: format!("{}nodes/{}/", api_v2_prefix, node_id),
            method: SubmitMethod::Patch,
            payload: PayloadShape::NodeAttributes {
                node_id: node_id.to_string(),
            },
            destructive: DestructiveRule::Never,
            confirm: ConfirmCopy {
                title: "Update project?".to_string(),
                confirm_label: "Save".to_string(),
            },
            submit_on_toggle: false,
            enable_url: None,
            notice: SuccessNotice::Text("Settings updated".to_string()),
            reload_delay: Duration::ZERO,
            failure: FailureMessage::Text("Unable to update project settings.".to_string()),
            support_email: support_email.to_string(),
        }
    }

    pub fn addons(node_api: &str, support_email: &str) -> Self {
        Self {
            id: GroupId::Addons,
            label: "addon".to_string(),
            endpoint: format!("{}settings/addons/", node_api),
            method: SubmitMethod::Post,
            payload: PayloadShape::FlatMap,
            destructive: DestructiveRule::TurnedOff,
            confirm: ConfirmCopy {
                title: "Are you sure you want to remove the add-ons you have deselected?"
                    .to_string(),
                confirm_label: "Remove".to_string(),
            },
            submit_on_toggle: false,
            enable_url: None,
            notice: SuccessNotice::Text("Settings updated".to_string()),
            reload_delay: Duration::ZERO,
            failure: FailureMessage::Text(
                "Sorry, we had trouble saving your settings.".to_string(),
            ),
            support_email: support_email.to_string(),
        }
    }

    pub fn wiki(node_api: &str, support_email: &str) -> Self {
        Self {
            id: GroupId::Wiki,
            label: "wiki".to_string(),
            endpoint: format!("{}settings/addons/", node_api),
            method: SubmitMethod::Post,
            payload: PayloadShape::FlatMap,
            destructive: DestructiveRule::TurnedOff,
            confirm: ConfirmCopy {
                title: "Are you sure you want to disable the wiki?".to_string(),
                confirm_label: "Disable".to_string(),
            },
            submit_on_toggle: true,
            enable_url: None,
            notice: SuccessNotice::FlagState {
                key: WIKI_KEY.to_string(),
                enabled: "Wiki Enabled".to_string(),
                disabled: "Wiki Disabled".to_string(),
            },
            reload_delay: WIKI_RELOAD_DELAY,
            failure: FailureMessage::Text("Unable to update wiki".to_string()),
            support_email: support_email.to_string(),
        }
    }

    pub fn comments(node_api: &str, support_email: &str) -> Self {
        Self {
            id: GroupId::Comments,
            label: "commenting".to_string(),
            endpoint: format!("{}settings/comments/", node_api),
            method: SubmitMethod::Post,
            payload: PayloadShape::FlatMap,
            destructive: DestructiveRule::Never,
            confirm: ConfirmCopy {
                title: "Change commenting settings?".to_string(),
                confirm_label: "Confirm".to_string(),
            },
            submit_on_toggle: false,
            enable_url: None,
            notice: SuccessNotice::Text("Successfully updated settings.".to_string()),
            reload_delay: Duration::ZERO,
            failure: FailureMessage::Text(
                "Could not set commenting configuration. Please try again.".to_string(),
            ),
            support_email: support_email.to_string(),
        }
    }

    pub fn institution(api_v2_prefix: &str, node_id: &str, support_email: &str) -> Self {
        Self {
            id: GroupId::Institution,
            label: "institution".to_string(),
            endpoint: format!(
                "{}nodes/{}/relationships/institution/",
                api_v2_prefix, node_id
            ),
            method: SubmitMethod::Put,
            payload: PayloadShape::InstitutionRelationship,
            destructive: DestructiveRule::Never,
            confirm: ConfirmCopy {
                title: "Change affiliated institution?".to_string(),
                confirm_label: "Confirm".to_string(),
            },
            submit_on_toggle: false,
            enable_url: None,
            notice: SuccessNotice::None,
            reload_delay: Duration::ZERO,
            failure: FailureMessage::ChoiceState {
                key: PRIMARY_INSTITUTION_KEY.to_string(),
                set: "Unable to add institution to this node!".to_string(),
                cleared: "Unable to remove institution from this node!".to_string(),
            },
            support_email: support_email.to_string(),
        }
    }

    pub fn account(oauth_url: &str, provider: &str, label: &str, support_email: &str) -> Self {
        Self {
            id: GroupId::Account(provider.to_string()),
            label: format!("{} account", label),
            endpoint: oauth_url.to_string(),
            method: SubmitMethod::Delete,
            payload: PayloadShape::Empty,
            destructive: DestructiveRule::TurnedOff,
            confirm: ConfirmCopy {
                title: format!("Disconnect {} Account?", label),
                confirm_label: "Disconnect".to_string(),
            },
            submit_on_toggle: true,
            enable_url: Some(oauth_url.to_string()),
            notice: SuccessNotice::None,
            reload_delay: Duration::ZERO,
            failure: FailureMessage::Text(format!("Unable to disconnect {}.", label)),
            support_email: support_email.to_string(),
        }
    }

    pub fn build_payload(&self, settings: &[Setting]) -> Option<Value> {
        match &self.payload {
            PayloadShape::FlatMap => {
                let map: Map<String, Value> = settings
                    .iter()
                    .map(|s| (s.key.clone(), s.current.to_json()))
                    .collect();
                Some(Value::Object(map))
            }
            PayloadShape::InstitutionRelationship => {
                let selected = settings
                    .iter()
                    .find(|s| s.key == PRIMARY_INSTITUTION_KEY)
                    .and_then(|s| s.current.as_choice());
                let data = match selected {
                    Some(id) => json!({"type": "institutions", "id": id}),
                    None => Value::Null,
                };
                Some(json!({ "data": data }))
            }
            PayloadShape::NodeAttributes { node_id } => {
                let attributes: Map<String, Value> = settings
                    .iter()
                    .map(|s| (s.key.clone(), s.current.to_json()))
                    .collect();
                Some(json!({
                    "data": {"type": "nodes", "id": node_id, "attributes": attributes}
                }))
            }
            PayloadShape::Empty => None,
        }
    }

    pub fn success_text(&self, settings: &[Setting]) -> Option<String> {
        match &self.notice {
            SuccessNotice::None => None,
            SuccessNotice::Text(text) => Some(text.clone()),
            SuccessNotice::FlagState {
                key,
                enabled,
                disabled,
            } => {
                let on = settings
                    .iter()
                    .find(|s| &s.key == key)
                    .map(|s| s.current == SettingValue::Flag(true))?;
                Some(if on { enabled.clone() } else { disabled.clone() })
            }
        }
    }

    pub fn failure_text(&self, settings: &[Setting]) -> String {
        match &self.failure {
            FailureMessage::Text(text) => text.clone(),
            FailureMessage::ChoiceState { key, set, cleared } => {
                let selected = settings
                    .iter()
                    .find(|s| &s.key == key)
                    .and_then(|s| s.current.as_choice());
                if selected.is_some() {
                    set.clone()
                } else {
                    cleared.clone()
                }
            }
        }
    }
}

/// Title, description and category. Registrations have no editable details.
pub fn details_group(
    ctx: &PageContext,
    api: &ApiConfig,
    page: &PageConfig,
) -> Option<SettingsToggleController> {
    if ctx.node.is_registration {
        return None;
    }
    let mut settings = vec![
        Setting::text(TITLE_KEY, "Title", &ctx.node.title, true),
        Setting::text(DESCRIPTION_KEY, "Description", &ctx.node.description, false),
    ];
    if ctx.node.parent_exists {
        let options = ctx
            .categories
            .iter()
            .map(|(value, label)| ChoiceOption::new(value, label))
            .collect();
        settings.push(Setting::choice(
            CATEGORY_KEY,
            "Category",
            options,
            ctx.node.category.clone(),
            false,
        ));
    }
    Some(SettingsToggleController::new(
        GroupSpec::details(&api.api_v2_prefix, &page.node_id, &page.support_email),
        settings,
    ))
}

pub fn addons_group(ctx: &PageContext, api: &ApiConfig, page: &PageConfig) -> SettingsToggleController {
    let settings = ctx
        .addons
        .iter()
        .filter(|addon| addon.name != WIKI_KEY)
        .map(|addon| {
            Setting::flag(&addon.name, &addon.label, addon.enabled)
                .with_capabilities(addon.capabilities.clone())
        })
        .collect();
    SettingsToggleController::new(
        GroupSpec::addons(&api.node_api(&page.node_id), &page.support_email),
        settings,
    )
}

pub fn wiki_group(ctx: &PageContext, api: &ApiConfig, page: &PageConfig) -> SettingsToggleController {
    SettingsToggleController::new(
        GroupSpec::wiki(&api.node_api(&page.node_id), &page.support_email),
        vec![Setting::flag(WIKI_KEY, "Wiki", ctx.wiki.is_enabled)],
    )
}

pub fn comment_level_options() -> Vec<ChoiceOption> {
    vec![
        ChoiceOption::new("private", "Only contributors can post comments"),
        ChoiceOption::new(
            "public",
            "When the project is public, any user can post comments",
        ),
    ]
}

/// Registrations carry no comment level; the group is absent for them.
pub fn comments_group(
    ctx: &PageContext,
    api: &ApiConfig,
    page: &PageConfig,
) -> Option<SettingsToggleController> {
    let level = ctx.comment_level.clone()?;
    Some(SettingsToggleController::new(
        GroupSpec::comments(&api.node_api(&page.node_id), &page.support_email),
        vec![Setting::choice(
            COMMENT_LEVEL_KEY,
            "Commenting",
            comment_level_options(),
            Some(level),
            false,
        )],
    ))
}

pub fn account_groups(
    ctx: &PageContext,
    api: &ApiConfig,
    page: &PageConfig,
) -> Vec<SettingsToggleController> {
    ctx.accounts
        .iter()
        .map(|account| {
            SettingsToggleController::new(
                GroupSpec::account(
                    &api.oauth_url(&account.provider),
                    &account.provider,
                    &account.label,
                    &page.support_email,
                ),
                vec![Setting::flag(CONNECTED_KEY, &account.label, account.connected)],
            )
        })
        .collect()
}

pub fn institution_group(
    available: &[Institution],
    primary: Option<&Institution>,
    api: &ApiConfig,
    page: &PageConfig,
) -> SettingsToggleController {
    let mut options: Vec<ChoiceOption> = available
        .iter()
        .map(|inst| ChoiceOption::new(&inst.id, &inst.attributes.name))
        .collect();
    // The node may be affiliated with an institution the user is not part of.
    if let Some(current) = primary {
        if !options.iter().any(|o| o.value == current.id) {
            options.push(ChoiceOption::new(&current.id, &current.attributes.name));
        }
    }
    SettingsToggleController::new(
        GroupSpec::institution(&api.api_v2_prefix, &page.node_id, &page.support_email),
        vec![Setting::choice(
            PRIMARY_INSTITUTION_KEY,
            "Primary institution",
            options,
            primary.map(|inst| inst.id.clone()),
            true,
        )],
    )
}

/// Every group backed by the page context, in display order.
pub fn page_groups(
    ctx: &PageContext,
    api: &ApiConfig,
    page: &PageConfig,
) -> Vec<SettingsToggleController> {
    let mut groups: Vec<SettingsToggleController> =
        details_group(ctx, api, page).into_iter().collect();
    groups.push(addons_group(ctx, api, page));
    groups.push(wiki_group(ctx, api, page));
    groups.extend(comments_group(ctx, api, page));
    groups.extend(account_groups(ctx, api, page));
    groups
}
