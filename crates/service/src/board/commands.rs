//! Typed command boundary.
//!
//! Each board operation has its own request struct; `Command` tags them with `op` so a
//! transport can deserialize one JSON object per request. Commands are validated before
//! they reach the repository.

use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;
use crate::pagination::Page;

use super::model::{Message, MessageThread};
use super::policy::BoardPolicy;
use super::repository::MessageRepository;
use super::sort::SortOrder;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessage {
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub author_token: String,
}

impl CreateMessage {
    pub fn new(content: impl Into<String>, author_token: impl Into<String>) -> Self {
        Self { content: content.into(), parent_id: None, author_token: author_token.into() }
    }

    pub fn reply(parent_id: impl Into<String>, content: impl Into<String>, author_token: impl Into<String>) -> Self {
        Self { content: content.into(), parent_id: Some(parent_id.into()), author_token: author_token.into() }
    }

    pub fn validate(&self, policy: &BoardPolicy) -> Result<(), ServiceError> {
        policy.check_content(&self.content)?;
        require("authorToken", &self.author_token)?;
        if let Some(parent) = &self.parent_id {
            require("parentId", parent)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EditMessage {
    pub id: String,
    pub content: String,
    pub author_token: String,
}

impl EditMessage {
    pub fn new(id: impl Into<String>, content: impl Into<String>, author_token: impl Into<String>) -> Self {
        Self { id: id.into(), content: content.into(), author_token: author_token.into() }
    }

    pub fn validate(&self, policy: &BoardPolicy) -> Result<(), ServiceError> {
        require("id", &self.id)?;
        policy.check_content(&self.content)?;
        require("authorToken", &self.author_token)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMessage {
    pub id: String,
    pub author_token: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    pub id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchMessages {
    #[serde(default)]
    pub keyword: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ListActive {
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ListReplies {
    pub parent_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Command {
    Create(CreateMessage),
    Edit(EditMessage),
    Delete(DeleteMessage),
    Like(MessageRef),
    Unlike(MessageRef),
    Get(MessageRef),
    Search(SearchMessages),
    ListActive(ListActive),
    ListReplies(ListReplies),
    CleanupExpired,
}

impl Command {
    /// Boundary checks that need no document access.
    pub fn validate(&self, policy: &BoardPolicy) -> Result<(), ServiceError> {
        match self {
            Self::Create(c) => c.validate(policy),
            Self::Edit(e) => e.validate(policy),
            Self::Delete(d) => {
                require("id", &d.id)?;
                require("authorToken", &d.author_token)
            }
            Self::Like(r) | Self::Unlike(r) | Self::Get(r) => require("id", &r.id),
            Self::ListReplies(l) => require("parentId", &l.parent_id),
            Self::Search(_) | Self::ListActive(_) | Self::CleanupExpired => Ok(()),
        }
    }
}

fn require(field: &str, value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// Result of a dispatched command.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum Outcome {
    Message(Message),
    Found(Option<Message>),
    Messages(Vec<Message>),
    Threads(Page<MessageThread>),
    Accepted(bool),
    Removed(usize),
}

/// Validate `command` and route it to the repository.
pub async fn dispatch(repo: &dyn MessageRepository, command: Command) -> Result<Outcome, ServiceError> {
    command.validate(repo.policy())?;
    let outcome = match command {
        Command::Create(input) => Outcome::Message(repo.create(input).await?),
        Command::Edit(input) => Outcome::Message(repo.edit(input).await?),
        Command::Delete(d) => Outcome::Accepted(repo.delete(&d.id, &d.author_token).await?),
        Command::Like(r) => Outcome::Accepted(repo.like(&r.id).await?),
        Command::Unlike(r) => Outcome::Accepted(repo.unlike(&r.id).await?),
        Command::Get(r) => Outcome::Found(repo.get(&r.id).await),
        Command::Search(s) => Outcome::Messages(repo.search(&s.keyword).await),
        Command::ListActive(l) => {
            let sort = SortOrder::parse_lenient(l.sort.as_deref());
            let pagination = repo.policy().paginate(l.page, l.page_size);
            Outcome::Threads(repo.list_threads(sort, pagination).await)
        }
        Command::ListReplies(l) => Outcome::Messages(repo.list_replies(&l.parent_id).await),
        Command::CleanupExpired => Outcome::Removed(repo.cleanup_expired().await?),
    };
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{MessageStore, WordFilter};
    use serde_json::json;

    #[test]
    fn commands_deserialize_from_tagged_json() {
        let cmd: Command = serde_json::from_value(json!({
            "op": "create", "content": "hi", "parentId": "p1", "authorToken": "tok"
        }))
        .unwrap();
        assert_eq!(cmd, Command::Create(CreateMessage::reply("p1", "hi", "tok")));

        let cmd: Command = serde_json::from_value(json!({"op": "listActive", "sort": "popular"})).unwrap();
        assert_eq!(
            cmd,
            Command::ListActive(ListActive { sort: Some("popular".into()), page: None, page_size: None })
        );

        let cmd: Command = serde_json::from_value(json!({"op": "cleanupExpired"})).unwrap();
        assert_eq!(cmd, Command::CleanupExpired);

        assert!(serde_json::from_value::<Command>(json!({"op": "undelete", "id": "x"})).is_err());
    }

    #[test]
    fn validation_happens_at_the_boundary() {
        let policy = BoardPolicy::default();
        assert!(Command::Create(CreateMessage::new("ok", "tok")).validate(&policy).is_ok());
        assert!(matches!(
            Command::Create(CreateMessage::new("ok", " ")).validate(&policy),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            Command::Edit(EditMessage::new("id", "x".repeat(201), "tok")).validate(&policy),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            Command::Like(MessageRef { id: "".into() }).validate(&policy),
            Err(ServiceError::Validation(_))
        ));
        assert!(Command::Search(SearchMessages { keyword: "".into() }).validate(&policy).is_ok());
    }

    #[tokio::test]
    async fn dispatch_routes_to_store() -> Result<(), anyhow::Error> {
        let path = std::env::temp_dir().join(format!("board_dispatch_{}.json", uuid::Uuid::new_v4()));
        let store = MessageStore::new(&path, BoardPolicy::default(), WordFilter::default()).await?;
        let repo: &dyn MessageRepository = &*store;

        let Outcome::Message(created) = dispatch(repo, Command::Create(CreateMessage::new("hello", "tok"))).await? else {
            panic!("expected a message");
        };
        assert_eq!(
            dispatch(repo, Command::Like(MessageRef { id: created.id.clone() })).await?,
            Outcome::Accepted(true)
        );

        let Outcome::Threads(page) = dispatch(repo, Command::ListActive(ListActive::default())).await? else {
            panic!("expected threads");
        };
        assert_eq!(page.total_count, 1);
        assert_eq!(page.page_size, 10);
        assert_eq!(page.items[0].message.like_count, 1);

        let denied = dispatch(
            repo,
            Command::Delete(DeleteMessage { id: created.id.clone(), author_token: "other".into() }),
        )
        .await?;
        assert_eq!(denied, Outcome::Accepted(false));

        let err = dispatch(repo, Command::Create(CreateMessage::new("", "tok"))).await.unwrap_err();
        assert_eq!(err.code(), "validation");

        let outcome = serde_json::to_value(dispatch(repo, Command::CleanupExpired).await?)?;
        assert_eq!(outcome, json!({"kind": "removed", "data": 0}));

        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }
}
