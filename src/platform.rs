//! The messaging platform's two collaborators: the REST poster and the
//! streaming connection. Both are traits so the listener can be driven by
//! fakes in tests; reconnection and credential lifecycle stay outside.

use std::io::{BufRead, BufReader, Read};

use anyhow::Context;
use serde::Deserialize;

use crate::message::{self, IncomingMessage};

/// Fixed platform constants, consumed rather than computed. The short-URL
/// length comes from the posting collaborator's configuration at startup.
#[derive(Debug, Clone, Copy)]
pub struct PlatformLimits {
    pub max_message_len: usize,
    pub short_url_len: usize,
}

/// Who the bot is on the platform. Used to ignore its own messages.
#[derive(Debug, Clone)]
pub struct BotIdentity {
    pub id: u64,
    pub screen_name: String,
}

/// Write side: post one reply, threaded onto the triggering message.
/// Returns the platform's confirmation text, used only for logging.
pub trait ReplyPoster {
    fn configuration(&self) -> anyhow::Result<PlatformLimits>;
    fn verify_credentials(&self) -> anyhow::Result<BotIdentity>;
    fn post(&self, text: &str, in_reply_to: u64) -> anyhow::Result<String>;
}

/// Read side: the next message event, or `None` when the stream ends.
pub trait MessageStream {
    fn next_event(&mut self) -> anyhow::Result<Option<IncomingMessage>>;
}

// ---------------------------------------------------------------------------
// REST poster
// ---------------------------------------------------------------------------

pub struct RestPoster {
    agent: ureq::Agent,
    base_url: String,
    bearer_token: String,
    max_message_len: usize,
}

#[derive(Debug, Deserialize)]
struct RawConfiguration {
    short_url_length_https: usize,
}

#[derive(Debug, Deserialize)]
struct RawCredentials {
    id: u64,
    screen_name: String,
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    #[serde(alias = "full_text")]
    text: String,
}

impl RestPoster {
    pub fn new(base_url: impl Into<String>, bearer_token: impl Into<String>, max_message_len: usize) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            base_url: base_url.into(),
            bearer_token: bearer_token.into(),
            max_message_len,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }

    fn authorization(&self) -> String {
        format!("Bearer {}", self.bearer_token)
    }
}

impl ReplyPoster for RestPoster {
    fn configuration(&self) -> anyhow::Result<PlatformLimits> {
        let mut response = self
            .agent
            .get(&self.url("help/configuration.json"))
            .header("authorization", self.authorization())
            .call()
            .context("fetching platform configuration")?;
        let body = response.body_mut().read_to_string()?;
        let raw: RawConfiguration =
            serde_json::from_str(&body).context("parsing platform configuration")?;
        Ok(PlatformLimits {
            max_message_len: self.max_message_len,
            short_url_len: raw.short_url_length_https,
        })
    }

    fn verify_credentials(&self) -> anyhow::Result<BotIdentity> {
        let mut response = self
            .agent
            .get(&self.url("account/verify_credentials.json"))
            .header("authorization", self.authorization())
            .call()
            .context("verifying credentials")?;
        let body = response.body_mut().read_to_string()?;
        let raw: RawCredentials = serde_json::from_str(&body).context("parsing credentials")?;
        Ok(BotIdentity {
            id: raw.id,
            screen_name: raw.screen_name,
        })
    }

    fn post(&self, text: &str, in_reply_to: u64) -> anyhow::Result<String> {
        let reply_id = in_reply_to.to_string();
        let mut response = self
            .agent
            .post(&self.url("statuses/update.json"))
            .header("authorization", self.authorization())
            .send_form([("status", text), ("in_reply_to_status_id", reply_id.as_str())])
            .context("posting reply")?;
        let body = response.body_mut().read_to_string()?;
        let raw: RawStatus = serde_json::from_str(&body).context("parsing posted status")?;
        Ok(raw.text)
    }
}

// ---------------------------------------------------------------------------
// Streaming connection
// ---------------------------------------------------------------------------

/// Newline-delimited JSON event stream. Blank keep-alive lines and events
/// that are not messages (deletes, friend lists) are skipped.
pub struct JsonLineStream<R> {
    reader: R,
}

impl<R: BufRead> JsonLineStream<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> MessageStream for JsonLineStream<R> {
    fn next_event(&mut self) -> anyhow::Result<Option<IncomingMessage>> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = self
                .reader
                .read_line(&mut line)
                .context("reading from stream")?;
            if read == 0 {
                return Ok(None);
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(message) = message::parse_event(trimmed) {
                return Ok(Some(message));
            }
            tracing::debug!("skipping non-message stream event");
        }
    }
}

/// Open the long-lived streaming connection and wrap it as a line stream.
pub fn open_stream(
    stream_url: &str,
    bearer_token: &str,
) -> anyhow::Result<JsonLineStream<BufReader<Box<dyn Read>>>> {
    let agent = ureq::Agent::new_with_defaults();
    let response = agent
        .get(stream_url)
        .header("authorization", format!("Bearer {bearer_token}"))
        .call()
        .context("connecting to message stream")?;
    let reader: Box<dyn Read> = Box::new(response.into_body().into_reader());
    Ok(JsonLineStream::new(BufReader::new(reader)))
}
