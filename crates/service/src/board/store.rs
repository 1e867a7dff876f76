use std::{collections::HashSet, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use configs::BoardConfig;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::errors::ServiceError;
use crate::pagination::{Page, Pagination};
use crate::storage::json_document_store::{JsonDocumentStore, Persist};

use super::commands::{CreateMessage, EditMessage};
use super::filter::WordFilter;
use super::model::{Message, MessageDocument, MessageThread};
use super::policy::BoardPolicy;
use super::repository::MessageRepository;
use super::sort::SortOrder;

/// File-backed message board.
///
/// Every operation takes the document lock, reads the file, applies the board rules and
/// writes the document back when something changed.
pub struct MessageStore {
    doc: Arc<JsonDocumentStore<MessageDocument>>,
    filter: WordFilter,
    policy: BoardPolicy,
    clock: Arc<dyn Clock>,
}

impl MessageStore {
    /// Open (or create) the document at `path` using the system clock.
    pub async fn new<P: Into<PathBuf>>(
        path: P,
        policy: BoardPolicy,
        filter: WordFilter,
    ) -> Result<Arc<Self>, ServiceError> {
        Self::with_clock(path, policy, filter, Arc::new(SystemClock)).await
    }

    pub async fn with_clock<P: Into<PathBuf>>(
        path: P,
        policy: BoardPolicy,
        filter: WordFilter,
        clock: Arc<dyn Clock>,
    ) -> Result<Arc<Self>, ServiceError> {
        let doc = JsonDocumentStore::<MessageDocument>::new(path).await?;
        Ok(Arc::new(Self { doc, filter, policy, clock }))
    }

    /// Open the store described by the `[board]` config section, loading its filter list.
    pub async fn from_config(cfg: &BoardConfig) -> Result<Arc<Self>, ServiceError> {
        let filter = WordFilter::load(&cfg.filter_words_path()).await;
        Self::new(cfg.messages_path(), BoardPolicy::from(cfg), filter).await
    }

    pub fn policy(&self) -> &BoardPolicy {
        &self.policy
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Active top-level messages, ordered and paginated.
    pub async fn list_active(&self, sort: SortOrder, pagination: Pagination) -> Page<Message> {
        let now = self.now();
        let expiry = self.policy.expiry;
        let pagination = pagination.normalize(self.policy.max_page_size);
        self.doc
            .read(|doc| Page::slice(top_level(doc, now, expiry, sort), pagination))
            .await
    }

    /// Same page as [`list_active`](Self::list_active) with each message's replies attached.
    pub async fn list_threads(&self, sort: SortOrder, pagination: Pagination) -> Page<MessageThread> {
        let now = self.now();
        let expiry = self.policy.expiry;
        let pagination = pagination.normalize(self.policy.max_page_size);
        self.doc
            .read(|doc| {
                Page::slice(top_level(doc, now, expiry, sort), pagination).map(|message| {
                    let replies = replies_of(doc, &message.id, now, expiry);
                    MessageThread { message, replies }
                })
            })
            .await
    }

    /// Active replies of `parent_id`, oldest first. Each call reads the document afresh.
    pub async fn list_replies(&self, parent_id: &str) -> Vec<Message> {
        let now = self.now();
        let expiry = self.policy.expiry;
        self.doc.read(|doc| replies_of(doc, parent_id, now, expiry)).await
    }

    pub async fn get(&self, id: &str) -> Option<Message> {
        let now = self.now();
        let expiry = self.policy.expiry;
        self.doc
            .read(|doc| doc.find(id).filter(|m| m.is_active(now, expiry)).cloned())
            .await
    }

    pub async fn create(&self, input: CreateMessage) -> Result<Message, ServiceError> {
        self.policy.check_content(&input.content)?;
        let content = self.filter.apply(&input.content);
        let now = self.now();
        let expiry = self.policy.expiry;

        let message = self
            .doc
            .update(|doc| {
                if let Some(parent_id) = input.parent_id.as_deref() {
                    let parent = doc
                        .find(parent_id)
                        .filter(|p| p.is_active(now, expiry))
                        .ok_or_else(|| ServiceError::not_found("parent message"))?;
                    if parent.is_reply() {
                        return Err(ServiceError::Validation("replies cannot be nested".into()));
                    }
                }
                let message = Message {
                    id: Uuid::new_v4().to_string(),
                    content,
                    created_at: now,
                    edited_at: None,
                    like_count: 0,
                    parent_id: input.parent_id,
                    deleted: false,
                    author_token: input.author_token,
                };
                doc.messages.push(message.clone());
                Ok(Persist::Write(message))
            })
            .await?;

        info!(id = %message.id, reply = message.is_reply(), "message created");
        Ok(message)
    }

    /// Replace the content of a message still inside its edit window.
    ///
    /// The author token is not compared against the message's author; only delete
    /// enforces ownership.
    pub async fn edit(&self, input: EditMessage) -> Result<Message, ServiceError> {
        let now = self.now();
        let policy = &self.policy;
        let filter = &self.filter;
        debug!(id = %input.id, author = %input.author_token, "edit requested");

        let message = self
            .doc
            .update(|doc| {
                let message = doc
                    .find_mut(&input.id)
                    .filter(|m| m.is_active(now, policy.expiry))
                    .ok_or_else(|| ServiceError::not_found("message"))?;
                if !message.can_edit(now, policy.edit_window) {
                    return Err(ServiceError::EditWindowExpired);
                }
                policy.check_content(&input.content)?;
                message.content = filter.apply(&input.content);
                message.edited_at = Some(now);
                Ok(Persist::Write(message.clone()))
            })
            .await?;

        info!(id = %message.id, "message edited");
        Ok(message)
    }

    /// Soft-delete a message owned by `author_token`.
    pub async fn delete_checked(&self, id: &str, author_token: &str) -> Result<(), ServiceError> {
        let now = self.now();
        let expiry = self.policy.expiry;
        self.doc
            .update(|doc| {
                let message = doc
                    .find_mut(id)
                    .filter(|m| m.is_active(now, expiry))
                    .ok_or_else(|| ServiceError::not_found("message"))?;
                if message.author_token != author_token {
                    return Err(ServiceError::OwnershipMismatch);
                }
                message.deleted = true;
                Ok(Persist::Write(()))
            })
            .await?;
        info!(%id, "message soft-deleted");
        Ok(())
    }

    /// Soft-delete; `false` when the message is unknown, inactive or owned by someone else.
    pub async fn delete(&self, id: &str, author_token: &str) -> Result<bool, ServiceError> {
        match self.delete_checked(id, author_token).await {
            Ok(()) => Ok(true),
            Err(ServiceError::NotFound(_)) => Ok(false),
            Err(ServiceError::OwnershipMismatch) => {
                warn!(%id, "delete rejected: author token mismatch");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn like(&self, id: &str) -> Result<bool, ServiceError> {
        self.adjust_likes(id, |count| Some(count.saturating_add(1))).await
    }

    /// No-op returning `false` once the counter is at zero.
    pub async fn unlike(&self, id: &str) -> Result<bool, ServiceError> {
        self.adjust_likes(id, |count| count.checked_sub(1)).await
    }

    async fn adjust_likes<F>(&self, id: &str, step: F) -> Result<bool, ServiceError>
    where
        F: FnOnce(u32) -> Option<u32>,
    {
        let now = self.now();
        let expiry = self.policy.expiry;
        let changed = self
            .doc
            .update(|doc| {
                let Some(message) = doc.find_mut(id).filter(|m| m.is_active(now, expiry)) else {
                    return Ok(Persist::Skip(false));
                };
                match step(message.like_count) {
                    Some(next) => {
                        message.like_count = next;
                        Ok(Persist::Write(true))
                    }
                    None => Ok(Persist::Skip(false)),
                }
            })
            .await?;
        debug!(%id, changed, "like counter adjusted");
        Ok(changed)
    }

    /// Case-insensitive substring search over active messages, newest first.
    /// A blank keyword lists every active message.
    pub async fn search(&self, keyword: &str) -> Vec<Message> {
        let now = self.now();
        let expiry = self.policy.expiry;
        let needle = keyword.to_lowercase();
        let blank = keyword.trim().is_empty();
        self.doc
            .read(|doc| {
                let mut found: Vec<Message> = doc
                    .messages
                    .iter()
                    .filter(|m| m.is_active(now, expiry))
                    .filter(|m| blank || m.content.to_lowercase().contains(&needle))
                    .cloned()
                    .collect();
                SortOrder::Newest.apply(&mut found);
                found
            })
            .await
    }

    /// Purge expired messages and the replies of expired messages; returns how many were removed.
    pub async fn cleanup_expired(&self) -> Result<usize, ServiceError> {
        let now = self.now();
        let expiry = self.policy.expiry;
        self.doc.update(|doc| Ok(purge_expired(doc, now, expiry))).await
    }

    /// Run [`cleanup_expired`](Self::cleanup_expired) only when the last pass is older than
    /// `min_interval`; `None` means the pass was skipped.
    ///
    /// With a non-zero interval every pass that runs stamps `lastCleanup`, even when nothing
    /// expired, so a quiet board costs at most one write per interval. A zero interval never
    /// writes unless something was purged.
    pub async fn cleanup_if_due(&self, min_interval: Duration) -> Result<Option<usize>, ServiceError> {
        let now = self.now();
        let expiry = self.policy.expiry;
        self.doc
            .update(|doc| {
                if now - doc.last_cleanup < min_interval {
                    return Ok(Persist::Skip(None));
                }
                Ok(match purge_expired(doc, now, expiry) {
                    Persist::Write(n) => Persist::Write(Some(n)),
                    Persist::Skip(n) if min_interval > Duration::zero() => {
                        doc.last_cleanup = now;
                        Persist::Write(Some(n))
                    }
                    Persist::Skip(n) => Persist::Skip(Some(n)),
                })
            })
            .await
    }

    pub async fn last_cleanup(&self) -> DateTime<Utc> {
        self.doc.read(|doc| doc.last_cleanup).await
    }
}

fn top_level(doc: &MessageDocument, now: DateTime<Utc>, expiry: Duration, sort: SortOrder) -> Vec<Message> {
    let mut items: Vec<Message> = doc
        .messages
        .iter()
        .filter(|m| !m.is_reply() && m.is_active(now, expiry))
        .cloned()
        .collect();
    sort.apply(&mut items);
    items
}

fn replies_of(doc: &MessageDocument, parent_id: &str, now: DateTime<Utc>, expiry: Duration) -> Vec<Message> {
    let mut replies: Vec<Message> = doc
        .messages
        .iter()
        .filter(|m| m.parent_id.as_deref() == Some(parent_id) && m.is_active(now, expiry))
        .cloned()
        .collect();
    SortOrder::Oldest.apply(&mut replies);
    replies
}

fn purge_expired(doc: &mut MessageDocument, now: DateTime<Utc>, expiry: Duration) -> Persist<usize> {
    let expired: HashSet<String> = doc
        .messages
        .iter()
        .filter(|m| m.is_expired(now, expiry))
        .map(|m| m.id.clone())
        .collect();
    if expired.is_empty() {
        return Persist::Skip(0);
    }

    let before = doc.messages.len();
    doc.messages.retain(|m| {
        !expired.contains(&m.id) && !m.parent_id.as_ref().is_some_and(|p| expired.contains(p))
    });
    let removed = before - doc.messages.len();
    doc.last_cleanup = now;
    info!(expired = expired.len(), removed, "expired messages purged");
    Persist::Write(removed)
}

#[async_trait]
impl MessageRepository for MessageStore {
    fn policy(&self) -> &BoardPolicy { self.policy() }
    async fn list_active(&self, sort: SortOrder, pagination: Pagination) -> Page<Message> { self.list_active(sort, pagination).await }
    async fn list_threads(&self, sort: SortOrder, pagination: Pagination) -> Page<MessageThread> { self.list_threads(sort, pagination).await }
    async fn list_replies(&self, parent_id: &str) -> Vec<Message> { self.list_replies(parent_id).await }
    async fn get(&self, id: &str) -> Option<Message> { self.get(id).await }
    async fn create(&self, input: CreateMessage) -> Result<Message, ServiceError> { self.create(input).await }
    async fn edit(&self, input: EditMessage) -> Result<Message, ServiceError> { self.edit(input).await }
    async fn delete(&self, id: &str, author_token: &str) -> Result<bool, ServiceError> { self.delete(id, author_token).await }
    async fn like(&self, id: &str) -> Result<bool, ServiceError> { self.like(id).await }
    async fn unlike(&self, id: &str) -> Result<bool, ServiceError> { self.unlike(id).await }
    async fn search(&self, keyword: &str) -> Vec<Message> { self.search(keyword).await }
    async fn cleanup_expired(&self) -> Result<usize, ServiceError> { self.cleanup_expired().await }
}
