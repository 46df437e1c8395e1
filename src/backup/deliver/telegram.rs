//! Telegram Bot API channel: `sendDocument` for the artifact, `sendMessage`
//! for the summary.

use crate::backup::deliver::Channel;
use crate::backup::redacted::RedactedString;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::AddMsg;
use getset::Getters;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub static DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Debug, Getters)]
#[getset(get = "pub")]
pub struct TelegramChannel {
    #[getset(skip)]
    client: Client,
    api_base_url: String,
    chat_id: i64,
    #[getset(skip)]
    token: RedactedString,
}

impl TelegramChannel {
    /// Builds a client with no request timeout; a stalled upload blocks the run.
    pub fn new<S: Into<String>>(api_base_url: S, token: RedactedString, chat_id: i64) -> Result<Self> {
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| Error::from(e.without_url()))?;
        Ok(Self {
            client,
            api_base_url: api_base_url.into().trim_end_matches('/').to_owned(),
            chat_id,
            token,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base_url, self.token.inner(), method)
    }

    fn call(&self, method: &str, request: RequestBuilder) -> Result<()> {
        // the token is part of the URL, keep it out of error text
        let response = request.send().map_err(|e| Error::from(e.without_url()))?;
        let status = response.status();
        let body = response.text().map_err(|e| Error::from(e.without_url()))?;
        check_response(method, status, &body)
    }
}

/// Turns a Bot API answer into a result, keeping the remote's description verbatim.
fn check_response(method: &str, status: StatusCode, body: &str) -> Result<()> {
    match serde_json::from_str::<ApiResponse>(body) {
        Ok(ApiResponse { ok: true, .. }) if status.is_success() => Ok(()),
        Ok(ApiResponse {
            description: Some(description),
            ..
        }) => Err(Error::delivery(format!(
            "{} returned {}: {}",
            method, status, description
        ))),
        _ => Err(Error::delivery(format!(
            "{} returned {}: {}",
            method,
            status,
            body.trim()
        ))),
    }
}

impl Channel for TelegramChannel {
    fn upload_document(&self, name: &str, file: &Path) -> Result<()> {
        let part = Part::file(file)
            .map_err(Error::from)
            .add_msg(format!("Cannot open {:?} for upload", file))?
            .file_name(name.to_owned())
            .mime_str("application/octet-stream")
            .map_err(|e| Error::from(e.without_url()))?;
        let form = Form::new()
            .text("chat_id", self.chat_id.to_string())
            .part("document", part);

        self.call(
            "sendDocument",
            self.client.post(self.method_url("sendDocument")).multipart(form),
        )
    }

    fn send_message(&self, text: &str) -> Result<()> {
        let body = SendMessage {
            chat_id: self.chat_id,
            text,
        };
        self.call(
            "sendMessage",
            self.client.post(self.method_url("sendMessage")).json(&body),
        )
    }
}
