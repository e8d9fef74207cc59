use super::OsfClient;
use super::error::ApiError;
use crate::settings::groups::SubmitMethod;
use crate::settings::transport::{SettingsTransport, SubmissionRequest};
use serde_json::Value;

impl SettingsTransport for OsfClient {
    async fn submit(&self, request: &SubmissionRequest) -> Result<Value, ApiError> {
        let url = request.endpoint.as_str();
        let builder = match request.method {
            SubmitMethod::Post => self.client.post(url),
            SubmitMethod::Put => self.client.put(url),
            SubmitMethod::Patch => self.client.patch(url),
            SubmitMethod::Delete => self.client.delete(url),
        };
        let builder = match &request.payload {
            Some(body) => builder.json(body),
            None => builder.header("Content-Type", "application/json"),
        };
        self.send_json(url, builder).await
    }
}
