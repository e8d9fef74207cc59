use super::groups::{GroupId, SubmitMethod};
use crate::api::osf::error::ApiError;
use serde_json::Value;
use tracing::{error, info};

/// One save attempt for a group. Built fresh every time, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRequest {
    pub group: GroupId,
    pub method: SubmitMethod,
    pub endpoint: String,
    pub payload: Option<Value>,
}

pub(crate) trait SettingsTransport {
    async fn submit(&self, request: &SubmissionRequest) -> Result<Value, ApiError>;
}

/// Sends exactly one request. The result is delivered once; there is no
/// retry and no cancellation.
pub(crate) async fn request_submission<T: SettingsTransport>(
    transport: &T,
    request: &SubmissionRequest,
) -> Result<Value, ApiError> {
    info!(
        group = %request.group,
        method = ?request.method,
        endpoint = %request.endpoint,
        "submitting settings"
    );
    let result = transport.submit(request).await;
    if let Err(err) = &result {
        error!(group = %request.group, error = %err, "could not save settings");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::controller::{SaveStep, SettingsToggleController};
    use crate::settings::groups::GroupSpec;
    use crate::settings::{Setting, SettingValue};
    use serde_json::json;
    use std::sync::Mutex;

    const NODE_API: &str = "https://osf.example/api/v1/project/abc12/";

    /// Records every request and answers with a canned status.
    struct FakeTransport {
        sent: Mutex<Vec<SubmissionRequest>>,
        fail_with: Option<u16>,
    }

    impl FakeTransport {
        fn ok() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_with: None,
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_with: Some(status),
            }
        }

        fn sent(&self) -> Vec<SubmissionRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl SettingsTransport for FakeTransport {
        async fn submit(&self, request: &SubmissionRequest) -> Result<Value, ApiError> {
            self.sent.lock().unwrap().push(request.clone());
            match self.fail_with {
                Some(status) => Err(ApiError::Status {
                    status,
                    body: "{}".to_string(),
                }),
                None => Ok(json!({})),
            }
        }
    }

    fn addons(wiki: bool, dropbox: bool) -> SettingsToggleController {
        SettingsToggleController::new(
            GroupSpec::addons(NODE_API, "support@osf.io"),
            vec![
                Setting::flag("wiki", "Wiki", wiki),
                Setting::flag("dropbox", "Dropbox", dropbox),
            ],
        )
    }

    #[tokio::test]
    async fn disabling_wiki_confirmed_then_saved() {
        let transport = FakeTransport::ok();
        let mut group = addons(true, false);

        group.toggle("wiki").unwrap();
        let SaveStep::Confirm(prompt) = group.begin_save().unwrap() else {
            panic!("expected a confirmation");
        };
        assert_eq!(prompt.items, vec!["Wiki"]);

        let SaveStep::Submit(request) = group.resolve_confirmation(true).unwrap() else {
            panic!("expected a submission");
        };
        assert!(request_submission(&transport, &request).await.is_ok());
        let outcome = group.on_submit_success();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].endpoint, format!("{}settings/addons/", NODE_API));
        assert_eq!(sent[0].payload, Some(json!({"wiki": false, "dropbox": false})));
        assert_eq!(group.setting("wiki").unwrap().saved(), &SettingValue::Flag(false));
        assert!(group.compute_dirty_set().is_empty());
        assert_eq!(outcome.reload.delay, std::time::Duration::ZERO);
    }

    #[tokio::test]
    async fn disabling_wiki_declined_sends_nothing() {
        let transport = FakeTransport::ok();
        let mut group = addons(true, false);

        group.toggle("wiki").unwrap();
        group.begin_save().unwrap();
        let step = group.resolve_confirmation(false).unwrap();

        assert!(matches!(step, SaveStep::RolledBack(_)));
        assert_eq!(group.setting("wiki").unwrap().current, SettingValue::Flag(true));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn enabling_dropbox_fails_and_stays_dirty() {
        let transport = FakeTransport::failing(502);
        let mut group = addons(true, false);

        group.toggle("dropbox").unwrap();
        let SaveStep::Submit(request) = group.begin_save().unwrap() else {
            panic!("enabling should not need confirmation");
        };

        let err = request_submission(&transport, &request).await.unwrap_err();
        let alert = group.on_submit_failure(&err.to_string());

        assert_eq!(transport.sent().len(), 1);
        assert!(alert.message.contains("support@osf.io"));
        assert_eq!(group.setting("dropbox").unwrap().current, SettingValue::Flag(true));
        assert!(group.compute_dirty_set().contains("dropbox"));
        assert!(group.guard_unload().is_some());
    }
}
