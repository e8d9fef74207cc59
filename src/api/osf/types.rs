use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Server-rendered state of the settings page for one node.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PageContext {
    pub node: NodeSummary,
    #[serde(default)]
    pub addons: Vec<AddonState>,
    pub comment_level: Option<String>,
    #[serde(default)]
    pub wiki: WikiState,
    #[serde(default)]
    pub accounts: Vec<ExternalAccount>,
    /// Node category key to display name.
    #[serde(default)]
    pub categories: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NodeSummary {
    pub id: String,
    pub title: String,
    pub node_type: Option<String>,
    #[serde(default)]
    pub is_registration: bool,
    #[serde(default)]
    pub description: String,
    pub category: Option<String>,
    /// Only components may change category; top-level projects stay projects.
    #[serde(default)]
    pub parent_exists: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AddonState {
    pub name: String,
    pub label: String,
    pub enabled: bool,
    pub capabilities: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct WikiState {
    pub is_enabled: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ExternalAccount {
    pub provider: String,
    pub label: String,
    pub connected: bool,
}

// Notification and wiki settings are served as display trees. Only the
// fields the terminal renders are kept.

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TreeTarget {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionEvent {
    pub title: String,
    pub notification_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SubscriptionNode {
    pub node: Option<TreeTarget>,
    pub event: Option<SubscriptionEvent>,
    #[serde(default)]
    pub children: Vec<SubscriptionNode>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WikiPermission {
    pub permission: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct WikiSettingsNode {
    pub node: Option<TreeTarget>,
    pub select: Option<WikiPermission>,
    #[serde(default)]
    pub children: Vec<WikiSettingsNode>,
}

// JSON:API documents from the v2 API.

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Document<T> {
    pub data: T,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InstitutionAttributes {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ResourceLinks {
    pub html: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Institution {
    pub id: String,
    pub attributes: InstitutionAttributes,
    #[serde(default)]
    pub links: ResourceLinks,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserEmbeds {
    pub institutions: Document<Vec<Institution>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EmbeddedUser {
    pub embeds: UserEmbeds,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NodeEmbeds {
    pub primary_institution: Document<Option<Institution>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EmbeddedNode {
    pub embeds: NodeEmbeds,
}

/// Institutions the node can be affiliated with and the current one.
#[derive(Debug, Clone, Default)]
pub struct InstitutionChoices {
    pub available: Vec<Institution>,
    pub primary: Option<Institution>,
}
