use super::OsfClient;
use super::error::ApiError;
use super::types::{PageContext, SubscriptionNode, WikiSettingsNode};

pub(crate) trait ProjectApi {
    async fn get_page_context(&self) -> Result<PageContext, ApiError>;
    async fn get_subscriptions(&self) -> Result<Vec<SubscriptionNode>, ApiError>;
    async fn get_wiki_settings(&self) -> Result<Vec<WikiSettingsNode>, ApiError>;
}

impl ProjectApi for OsfClient {
    async fn get_page_context(&self) -> Result<PageContext, ApiError> {
        let url = format!("{}settings/", self.node_api());
        self.get_typed(&url, &[]).await
    }

    async fn get_subscriptions(&self) -> Result<Vec<SubscriptionNode>, ApiError> {
        let url = format!("{}subscriptions/", self.node_api());
        self.get_typed(&url, &[]).await
    }

    async fn get_wiki_settings(&self) -> Result<Vec<WikiSettingsNode>, ApiError> {
        let url = format!("{}wiki/settings/", self.node_api());
        self.get_typed(&url, &[]).await
    }
}
