use async_trait::async_trait;

use crate::errors::ServiceError;
use crate::pagination::{Page, Pagination};

use super::commands::{CreateMessage, EditMessage};
use super::model::{Message, MessageThread};
use super::policy::BoardPolicy;
use super::sort::SortOrder;

/// Trait abstraction for message board storage.
/// Reads never fail: storage read problems degrade to an empty board inside the implementation.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    fn policy(&self) -> &BoardPolicy;
    async fn list_active(&self, sort: SortOrder, pagination: Pagination) -> Page<Message>;
    async fn list_threads(&self, sort: SortOrder, pagination: Pagination) -> Page<MessageThread>;
    async fn list_replies(&self, parent_id: &str) -> Vec<Message>;
    async fn get(&self, id: &str) -> Option<Message>;
    async fn create(&self, input: CreateMessage) -> Result<Message, ServiceError>;
    async fn edit(&self, input: EditMessage) -> Result<Message, ServiceError>;
    async fn delete(&self, id: &str, author_token: &str) -> Result<bool, ServiceError>;
    async fn like(&self, id: &str) -> Result<bool, ServiceError>;
    async fn unlike(&self, id: &str) -> Result<bool, ServiceError>;
    async fn search(&self, keyword: &str) -> Vec<Message>;
    async fn cleanup_expired(&self) -> Result<usize, ServiceError>;
}
