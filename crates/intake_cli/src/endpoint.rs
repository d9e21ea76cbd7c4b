use std::time::Duration;

use async_trait::async_trait;
use intake::{Submission, SubmissionEndpoint, SubmissionError, SubmissionReply};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

/// JSON POST to the submission backend.
pub struct HttpEndpoint {
    client: Client,
    url: String,
}

impl HttpEndpoint {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl SubmissionEndpoint for HttpEndpoint {
    async fn submit(&self, submission: &Submission) -> Result<SubmissionReply, SubmissionError> {
        let response = self
            .client
            .post(&self.url)
            .json(submission)
            .send()
            .await
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;
        debug!(%status, url = %self.url, "submission reply");
        interpret(status, &body)
    }
}

/// The backend always answers with a JSON body; `message` is optional.
fn interpret(status: StatusCode, body: &str) -> Result<SubmissionReply, SubmissionError> {
    let json: Value =
        serde_json::from_str(body).map_err(|e| SubmissionError::MalformedReply(e.to_string()))?;
    let message = json
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string);
    Ok(SubmissionReply {
        accepted: status.is_success(),
        message,
    })
}
