use serde::Deserialize;
use tracing::debug;

use util::IdGenerator;

const TAG_PREFIX: &str = "wren";

/// Structured payload crossing the page-to-host bridge. Everything but
/// the kind is optional; the page side is untrusted input.
#[derive(Debug, Deserialize)]
pub struct NotificationMessage {
    pub r#type: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Host-side notification ready for system delivery. Terminal once
/// submitted; delivery reliability is the OS's responsibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    /// Identity/deduplication key, generated when the page omits one.
    pub tag: String,
    pub title: String,
    pub body: String,
}

/// Host half of the notification bridge: decodes raw bridge messages
/// into delivery-ready requests, defaulting missing fields.
#[derive(Debug)]
pub struct NotificationBridge {
    app_name: String,
    tags: IdGenerator,
}

impl NotificationBridge {
    pub fn new(app_name: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            tags: IdGenerator::default(),
        }
    }

    /// Decodes one raw message. Malformed payloads and kinds other
    /// than `show` are dropped silently; page input must never fault
    /// the host.
    pub fn handle(&self, raw: &str) -> Option<NotificationRequest> {
        let message: NotificationMessage = match serde_json::from_str(raw) {
            Ok(message) => message,
            Err(err) => {
                debug!(%err, "ignoring malformed bridge message");
                return None;
            }
        };

        if message.r#type != "show" {
            debug!(kind = %message.r#type, "ignoring bridge message of unknown kind");
            return None;
        }

        let tag = match message.tag.filter(|tag| !tag.is_empty()) {
            Some(tag) => tag,
            None => self.tags.next_tagged(TAG_PREFIX),
        };

        Some(NotificationRequest {
            tag,
            title: message
                .title
                .filter(|title| !title.is_empty())
                .unwrap_or_else(|| self.app_name.clone()),
            body: message.body.unwrap_or_default(),
        })
    }
}
