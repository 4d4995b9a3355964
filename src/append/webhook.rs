// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Sink that forwards severe records to a chat webhook.
//!
//! Delivery is best-effort: one attempt per line, bounded by the transport timeout, with
//! failures returned to the logger (which hands them to its trap) and never retried.

use std::fmt;
use std::sync::Arc;
#[cfg(feature = "webhook")]
use std::time::Duration;

use serde::Serialize;

use crate::Error;
use crate::Level;
use crate::append::Append;
use crate::append::AppendKind;
use crate::config::InvalidEndpoint;
use crate::config::Settings;
use crate::config::WebhookUrl;

/// Chat webhooks reject messages longer than this many characters.
const MAX_CONTENT_CHARS: usize = 2000;
const ALERT_PREFIX: &str = "🚨 Error Alert:\n";

/// Why the alert sink could not be constructed.
///
/// This is a capability result, not a failure: the logger factory checks it and carries on
/// without the alert sink.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AlertUnavailable {
    #[error("no webhook endpoint configured")]
    NotConfigured,
    #[error("invalid webhook endpoint: {0}")]
    InvalidEndpoint(#[from] InvalidEndpoint),
    #[error("built without the `webhook` feature")]
    NotCompiled,
    #[error("failed to build webhook HTTP client: {0}")]
    Client(String),
}

/// The JSON body posted to the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertPayload {
    pub content: String,
}

impl AlertPayload {
    fn for_line(line: &str) -> Self {
        let mut content = String::with_capacity(ALERT_PREFIX.len() + line.len());
        content.push_str(ALERT_PREFIX);
        content.extend(line.chars().take(MAX_CONTENT_CHARS - ALERT_PREFIX.chars().count()));
        Self { content }
    }
}

/// Sends one payload to an endpoint and reports the HTTP status code.
pub trait Transport: fmt::Debug + Send + Sync + 'static {
    /// Post `payload` as JSON to `endpoint`.
    ///
    /// Return the response status, or an error if no response was received.
    fn send(&self, endpoint: &WebhookUrl, payload: &AlertPayload) -> Result<u16, Error>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, endpoint: &WebhookUrl, payload: &AlertPayload) -> Result<u16, Error> {
        (**self).send(endpoint, payload)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, endpoint: &WebhookUrl, payload: &AlertPayload) -> Result<u16, Error> {
        (**self).send(endpoint, payload)
    }
}

/// A [`Transport`] over a blocking HTTP client with a request timeout.
#[cfg(feature = "webhook")]
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "webhook")]
impl HttpTransport {
    /// Build a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, AlertUnavailable> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AlertUnavailable::Client(err.to_string()))?;
        Ok(Self { client })
    }
}

#[cfg(feature = "webhook")]
impl Transport for HttpTransport {
    fn send(&self, endpoint: &WebhookUrl, payload: &AlertPayload) -> Result<u16, Error> {
        let response = self
            .client
            .post(endpoint.as_str())
            .json(payload)
            .send()
            .map_err(|err| Error::new("failed to send webhook alert").with_source(err))?;
        Ok(response.status().as_u16())
    }
}

/// A sink that posts each accepted line to a webhook.
///
/// # Examples
///
/// ```
/// use fxlog::append::webhook::AlertUnavailable;
/// use fxlog::append::webhook::Webhook;
/// use fxlog::config::Settings;
///
/// let settings = Settings::default();
/// assert_eq!(
///     Webhook::from_settings(&settings).unwrap_err(),
///     AlertUnavailable::NotConfigured
/// );
/// ```
#[derive(Debug)]
pub struct Webhook {
    endpoint: WebhookUrl,
    level: Level,
    transport: Box<dyn Transport>,
}

impl Webhook {
    /// Create a webhook sink that only accepts ERROR and above.
    pub fn new(endpoint: WebhookUrl, transport: impl Transport) -> Self {
        Self {
            endpoint,
            level: Level::Error,
            transport: Box::new(transport),
        }
    }

    /// Validate a raw endpoint and create a webhook sink over `transport`.
    pub fn parse(raw: &str, transport: impl Transport) -> Result<Self, AlertUnavailable> {
        let endpoint = WebhookUrl::parse(raw)?;
        Ok(Self::new(endpoint, transport))
    }

    /// Create the webhook sink described by `settings`, using an HTTP transport.
    pub fn from_settings(settings: &Settings) -> Result<Self, AlertUnavailable> {
        let endpoint = settings
            .webhook
            .clone()
            .ok_or(AlertUnavailable::NotConfigured)?;
        let transport = http_transport(settings)?;
        Ok(Self::new(endpoint, transport).level(settings.alert_level))
    }

    /// Create the webhook sink described by `settings` over a caller-supplied transport.
    pub fn from_settings_with(
        settings: &Settings,
        transport: impl Transport,
    ) -> Result<Self, AlertUnavailable> {
        let endpoint = settings
            .webhook
            .clone()
            .ok_or(AlertUnavailable::NotConfigured)?;
        Ok(Self::new(endpoint, transport).level(settings.alert_level))
    }

    /// Set the minimum level a record must have to be alerted.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }
}

#[cfg(feature = "webhook")]
fn http_transport(settings: &Settings) -> Result<HttpTransport, AlertUnavailable> {
    HttpTransport::new(settings.alert_timeout)
}

#[cfg(not(feature = "webhook"))]
fn http_transport(_: &Settings) -> Result<Box<dyn Transport>, AlertUnavailable> {
    Err(AlertUnavailable::NotCompiled)
}

impl Append for Webhook {
    fn accepts(&self, level: Level) -> bool {
        level >= self.level
    }

    fn write(&self, line: &str) -> Result<(), Error> {
        let payload = AlertPayload::for_line(line);
        let status = self.transport.send(&self.endpoint, &payload)?;
        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(Error::new("webhook rejected alert").with_context("status", status))
        }
    }

    fn kind(&self) -> AppendKind {
        AppendKind::Webhook
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    const VALID_WEBHOOK: &str =
        "https://discord.com/api/webhooks/123456789012345678/abcdefghijklmnopqrstuvwxyz";

    #[derive(Debug)]
    struct Recording {
        status: u16,
        sent: Mutex<Vec<AlertPayload>>,
    }

    impl Recording {
        fn with_status(status: u16) -> Arc<Self> {
            Arc::new(Self {
                status,
                sent: Mutex::new(vec![]),
            })
        }
    }

    impl Transport for Recording {
        fn send(&self, _: &WebhookUrl, payload: &AlertPayload) -> Result<u16, Error> {
            self.sent.lock().unwrap().push(payload.clone());
            Ok(self.status)
        }
    }

    #[derive(Debug)]
    struct Unreachable;

    impl Transport for Unreachable {
        fn send(&self, _: &WebhookUrl, _: &AlertPayload) -> Result<u16, Error> {
            let err = std::io::Error::other("operation timed out");
            Err(Error::new("failed to send webhook alert").with_source(err))
        }
    }

    #[test]
    fn test_payload_shape() {
        let transport = Recording::with_status(204);
        let webhook = Webhook::parse(VALID_WEBHOOK, transport.clone()).unwrap();
        webhook.write("2024-08-11 | ERROR | main | boom").unwrap();

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            serde_json::to_value(&sent[0]).unwrap(),
            serde_json::json!({"content": "🚨 Error Alert:\n2024-08-11 | ERROR | main | boom"})
        );
    }

    #[test]
    fn test_long_lines_are_truncated() {
        let transport = Recording::with_status(200);
        let webhook = Webhook::parse(VALID_WEBHOOK, transport.clone()).unwrap();
        webhook.write(&"é".repeat(5000)).unwrap();

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent[0].content.chars().count(), MAX_CONTENT_CHARS);
    }

    #[test]
    fn test_non_success_status_is_failure() {
        for status in [199, 400, 404, 429, 500] {
            let webhook = Webhook::parse(VALID_WEBHOOK, Recording::with_status(status)).unwrap();
            let err = webhook.write("boom").unwrap_err();
            assert!(err.to_string().contains(&format!("status: {status}")), "{err}");
        }
        for status in [200, 201, 204, 299] {
            let webhook = Webhook::parse(VALID_WEBHOOK, Recording::with_status(status)).unwrap();
            assert!(webhook.write("boom").is_ok());
        }
    }

    #[test]
    fn test_transport_failure_is_returned() {
        let webhook = Webhook::parse(VALID_WEBHOOK, Unreachable).unwrap();
        let err = webhook.write("boom").unwrap_err();
        assert!(err.to_string().contains("operation timed out"));
    }

    #[test]
    fn test_invalid_endpoint_is_unavailable() {
        assert_eq!(
            Webhook::parse("http://short", Unreachable).unwrap_err(),
            AlertUnavailable::InvalidEndpoint(InvalidEndpoint::Scheme)
        );
    }

    #[test]
    fn test_level_threshold() {
        let webhook = Webhook::parse(VALID_WEBHOOK, Unreachable).unwrap();
        assert!(!webhook.accepts(Level::Warning));
        assert!(webhook.accepts(Level::Error));
        assert!(webhook.accepts(Level::Critical));

        let webhook = webhook.level(Level::Critical);
        assert!(!webhook.accepts(Level::Error));
    }

    #[cfg(feature = "webhook")]
    #[test]
    fn test_silent_endpoint_is_bounded_by_timeout() {
        use std::net::TcpListener;
        use std::time::Instant;

        // accepts the connection into its backlog and never answers
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let raw = format!(
            "https://127.0.0.1:{port}/api/webhooks/123456789012345678/abcdefghijklmnopqrstuvwxyz"
        );

        let transport = HttpTransport::new(Duration::from_secs(1)).unwrap();
        let webhook = Webhook::parse(&raw, transport).unwrap();

        let started = Instant::now();
        let result = webhook.write("2024-08-11 | ERROR | main | boom");
        let elapsed = started.elapsed();

        assert!(result.is_err());
        assert!(elapsed < Duration::from_secs(2), "{elapsed:?}");
        drop(listener);
    }

    #[test]
    fn test_from_settings() {
        let settings = Settings {
            webhook: Some(WebhookUrl::parse(VALID_WEBHOOK).unwrap()),
            alert_level: Level::Warning,
            ..Settings::default()
        };
        let webhook = Webhook::from_settings_with(&settings, Unreachable).unwrap();
        assert!(webhook.accepts(Level::Warning));
        assert_eq!(webhook.kind(), AppendKind::Webhook);

        #[cfg(feature = "webhook")]
        assert!(Webhook::from_settings(&settings).is_ok());
        #[cfg(not(feature = "webhook"))]
        assert_eq!(
            Webhook::from_settings(&settings).unwrap_err(),
            AlertUnavailable::NotCompiled
        );
    }
}
