use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::model::Message;

/// Ordering for top-level listings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Popular,
}

impl FromStr for SortOrder {
    type Err = std::convert::Infallible;

    /// Unknown names fall back to `Newest`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "oldest" => Self::Oldest,
            "popular" => Self::Popular,
            _ => Self::Newest,
        })
    }
}

impl SortOrder {
    pub fn parse_lenient(s: Option<&str>) -> Self {
        s.map(|s| s.parse().unwrap_or_default()).unwrap_or_default()
    }

    pub fn apply(self, messages: &mut [Message]) {
        match self {
            Self::Newest => messages.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            Self::Oldest => messages.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            Self::Popular => messages.sort_by(|a, b| {
                b.like_count.cmp(&a.like_count).then(b.created_at.cmp(&a.created_at))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn msg(id: &str, age_min: i64, likes: u32) -> Message {
        Message {
            id: id.into(),
            content: id.into(),
            created_at: Utc::now() - Duration::minutes(age_min),
            edited_at: None,
            like_count: likes,
            parent_id: None,
            deleted: false,
            author_token: "t".into(),
        }
    }

    fn ids(ms: &[Message]) -> Vec<&str> {
        ms.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn orders_by_each_key() {
        let mut ms = vec![msg("a", 30, 1), msg("b", 10, 5), msg("c", 20, 5)];
        SortOrder::Newest.apply(&mut ms);
        assert_eq!(ids(&ms), ["b", "c", "a"]);
        SortOrder::Oldest.apply(&mut ms);
        assert_eq!(ids(&ms), ["a", "c", "b"]);
        SortOrder::Popular.apply(&mut ms);
        assert_eq!(ids(&ms), ["b", "c", "a"]);
    }

    #[test]
    fn unknown_names_default_to_newest() {
        assert_eq!(SortOrder::parse_lenient(Some("POPULAR")), SortOrder::Popular);
        assert_eq!(SortOrder::parse_lenient(Some("random")), SortOrder::Newest);
        assert_eq!(SortOrder::parse_lenient(None), SortOrder::Newest);
    }
}
