use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A board message. `parent_id == None` marks a top-level message, otherwise a reply.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub author_token: String,
}

/// Where a message sits in its lifecycle at a given instant.
///
/// `Purged` has no variant: a purged message is simply absent from the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageState {
    Active,
    SoftDeleted,
    Expired,
}

impl Message {
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Strictly older than `expiry`.
    pub fn is_expired(&self, now: DateTime<Utc>, expiry: Duration) -> bool {
        now - self.created_at > expiry
    }

    /// Inclusive bound: an edit at exactly `window` is still allowed.
    pub fn can_edit(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now - self.created_at <= window
    }

    pub fn state(&self, now: DateTime<Utc>, expiry: Duration) -> MessageState {
        if self.is_expired(now, expiry) {
            MessageState::Expired
        } else if self.deleted {
            MessageState::SoftDeleted
        } else {
            MessageState::Active
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>, expiry: Duration) -> bool {
        self.state(now, expiry) == MessageState::Active
    }
}

/// The persisted document: every message plus the time of the last cleanup pass.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageDocument {
    /// Required: a document without it is not ours and must take the malformed path.
    pub messages: Vec<Message>,
    #[serde(default)]
    pub last_cleanup: DateTime<Utc>,
}

impl MessageDocument {
    pub fn find(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }
}

/// A top-level message joined with its visible replies.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageThread {
    pub message: Message,
    pub replies: Vec<Message>,
}
