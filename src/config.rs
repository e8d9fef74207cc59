use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

const DEFAULT_SUPPORT_EMAIL: &str = "support@osf.io";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub api_url: String,
    pub api_v2_prefix: String,
    pub token: String,
    pub timeout: Duration,
}

/// Identifiers the settings screen is rendered for. Built once at start-up
/// and handed to everything that needs it.
#[derive(Clone, Debug)]
pub struct PageConfig {
    pub node_id: String,
    pub user_id: String,
    pub support_email: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub api: ApiConfig,
    pub page: PageConfig,
    pub log_path: Option<String>,
}

impl ApiConfig {
    /// v1 API root for the node, always ending in a slash.
    pub fn node_api(&self, node_id: &str) -> String {
        format!("{}/api/v1/project/{}/", self.api_url, node_id)
    }

    pub fn oauth_url(&self, provider: &str) -> String {
        format!("{}/api/v1/settings/{}/oauth/", self.api_url, provider)
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_url = env::var("OSF_API_URL").context("OSF_API_URL must be set")?;
        let api_url = api_url.trim_end_matches('/').to_string();
        let api_v2_prefix =
            env::var("OSF_API_V2_PREFIX").unwrap_or_else(|_| format!("{}/v2/", api_url));
        let token = env::var("OSF_TOKEN").context("OSF_TOKEN must be set")?;
        let timeout = match env::var("OSF_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .context("OSF_HTTP_TIMEOUT_SECS must be a whole number of seconds")?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        let api = ApiConfig {
            api_url,
            api_v2_prefix: normalize_prefix(api_v2_prefix),
            token,
            timeout: Duration::from_secs(timeout),
        };

        let node_id = env::var("OSF_NODE_ID").context("OSF_NODE_ID must be set")?;
        let user_id = env::var("OSF_USER_ID").context("OSF_USER_ID must be set")?;
        let support_email =
            env::var("OSF_SUPPORT_EMAIL").unwrap_or_else(|_| DEFAULT_SUPPORT_EMAIL.to_string());

        let page = PageConfig {
            node_id,
            user_id,
            support_email,
        };

        Ok(Self {
            api,
            page,
            log_path: env::var("PROJECT_SETTINGS_LOG").ok(),
        })
    }
}

fn normalize_prefix(prefix: String) -> String {
    if prefix.ends_with('/') {
        prefix
    } else {
        format!("{}/", prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> ApiConfig {
        ApiConfig {
            api_url: "https://osf.example".to_string(),
            api_v2_prefix: "https://api.osf.example/v2/".to_string(),
            token: "t".to_string(),
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn node_api_ends_with_slash() {
        assert_eq!(
            api().node_api("abc12"),
            "https://osf.example/api/v1/project/abc12/"
        );
    }

    #[test]
    fn oauth_url_is_per_provider() {
        assert_eq!(
            api().oauth_url("figshare"),
            "https://osf.example/api/v1/settings/figshare/oauth/"
        );
    }

    #[test]
    fn prefix_gets_trailing_slash() {
        assert_eq!(normalize_prefix("https://x/v2".into()), "https://x/v2/");
        assert_eq!(normalize_prefix("https://x/v2/".into()), "https://x/v2/");
    }
}
