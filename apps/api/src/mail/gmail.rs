//! Gmail REST client: alert link source and digest mailer.
//!
//! Lists unread messages, keeps the ones sent by the configured alert sender, extracts links from
//! their HTML body and marks them read. Digests go out through `messages/send` as a base64url
//! RFC 2822 message. Obtaining and refreshing the OAuth access token happens outside this service;
//! the token is taken from config as-is.

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD, URL_SAFE};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::mail::anchors::extract_links;
use crate::mail::{DigestMailer, LinkSource, MailError};

const GMAIL_API_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages";
const UNREAD_QUERY: &str = "is:unread";
const UNREAD_LABEL: &str = "UNREAD";
/// RFC 2045 line limit for base64 bodies.
const BODY_LINE_LEN: usize = 76;

/// Gmail bodies are base64url, with or without padding.
const BODY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Message {
    id: String,
    payload: MessagePart,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePart {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    headers: Vec<Header>,
    #[serde(default)]
    body: PartBody,
    #[serde(default)]
    parts: Vec<MessagePart>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

#[derive(Debug, Default, Deserialize)]
struct PartBody {
    data: Option<String>,
}

impl MessagePart {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Depth-first search for the first `text/html` part that carries data.
    fn html_body(&self) -> Option<&str> {
        if self.mime_type.eq_ignore_ascii_case("text/html") {
            if let Some(data) = self.body.data.as_deref() {
                return Some(data);
            }
        }
        self.parts.iter().find_map(MessagePart::html_body)
    }
}

/// Decodes a Gmail body payload. Invalid UTF-8 is replaced rather than rejected.
fn decode_body(data: &str) -> Option<String> {
    BODY_ENGINE
        .decode(data.trim())
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

/// Removes exact duplicates while keeping first-seen order.
pub fn dedup_preserving_order(links: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

/// Builds a plain-text UTF-8 message and returns it base64url-encoded, as `messages/send` expects.
pub fn build_raw_message(to: &str, subject: &str, body: &str) -> String {
    let encoded_body = STANDARD.encode(body);
    let body_lines: Vec<_> = encoded_body
        .as_bytes()
        .chunks(BODY_LINE_LEN)
        .map(String::from_utf8_lossy)
        .collect();

    let message = format!(
        "To: {}\r\nSubject: {}\r\nMIME-Version: 1.0\r\nContent-Type: text/plain; charset=\"utf-8\"\r\nContent-Transfer-Encoding: base64\r\n\r\n{}\r\n",
        single_line(to),
        encode_header_value(&single_line(subject)),
        body_lines.join("\r\n")
    );
    URL_SAFE.encode(message)
}

fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

/// RFC 2047 encoded-word for non-ASCII header values.
fn encode_header_value(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?utf-8?B?{}?=", STANDARD.encode(value))
    }
}

#[derive(Clone)]
pub struct GmailClient {
    client: Client,
    access_token: String,
    alert_sender: String,
}

impl GmailClient {
    pub fn new(access_token: String, alert_sender: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            access_token,
            alert_sender,
        }
    }

    async fn list_unread(&self) -> Result<Vec<String>, MailError> {
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(GMAIL_API_URL)
                .query(&[("q", UNREAD_QUERY)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: MessageList = self.send_json(request).await?;
            ids.extend(page.messages.into_iter().map(|m| m.id));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        info!("Found {} unread messages", ids.len());
        Ok(ids)
    }

    async fn get_message(&self, id: &str) -> Result<Message, MailError> {
        let request = self
            .client
            .get(format!("{GMAIL_API_URL}/{id}"))
            .query(&[("format", "full")]);
        self.send_json(request).await
    }

    async fn mark_read(&self, id: &str) -> Result<(), MailError> {
        let request = self
            .client
            .post(format!("{GMAIL_API_URL}/{id}/modify"))
            .json(&json!({ "removeLabelIds": [UNREAD_LABEL] }));
        self.send(request).await?;
        Ok(())
    }

    /// Links from one alert message, or `None` if it is not from the alert sender.
    fn links_from_message(&self, message: &Message) -> Option<Vec<String>> {
        let from = message.payload.header("From").unwrap_or_default();
        if !from.contains(&self.alert_sender) {
            debug!("Skipping message {} from {from:?}", message.id);
            return None;
        }

        let links = match message.payload.html_body().and_then(decode_body) {
            Some(html) => extract_links(&html),
            None => {
                warn!("Alert message {} has no decodable HTML body", message.id);
                Vec::new()
            }
        };
        Some(links)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, MailError> {
        let response = request.bearer_auth(&self.access_token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MailError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, MailError> {
        Ok(self.send(request).await?.json().await?)
    }
}

#[async_trait]
impl LinkSource for GmailClient {
    async fn collect_links(&self) -> Result<Vec<String>> {
        let mut all_links = Vec::new();

        for id in self.list_unread().await? {
            let message = self.get_message(&id).await?;
            let Some(links) = self.links_from_message(&message) else {
                continue;
            };

            debug!("Message {id}: {} links", links.len());
            all_links.extend(links);
            self.mark_read(&id).await?;
        }

        Ok(dedup_preserving_order(all_links))
    }
}

#[async_trait]
impl DigestMailer for GmailClient {
    async fn send_digest(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let request = self
            .client
            .post(format!("{GMAIL_API_URL}/send"))
            .json(&json!({ "raw": build_raw_message(to, subject, body) }));
        self.send(request).await?;
        info!("Digest emailed to {to}");
        Ok(())
    }
}
