use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::ServiceError;

/// Block-list settings as stored in `filter-words.json`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilterSettings {
    #[serde(default, alias = "FilteredWords")]
    pub filtered_words: Vec<String>,
    #[serde(default = "default_replacement", alias = "ReplacementChar")]
    pub replacement_char: String,
}

fn default_replacement() -> String { "***".into() }

impl Default for FilterSettings {
    fn default() -> Self {
        Self { filtered_words: Vec::new(), replacement_char: default_replacement() }
    }
}

/// Case-insensitive whole-word substitution against a block-list.
#[derive(Clone, Debug)]
pub struct WordFilter {
    pattern: Option<Regex>,
    replacement: String,
}

impl Default for WordFilter {
    fn default() -> Self {
        Self { pattern: None, replacement: default_replacement() }
    }
}

impl WordFilter {
    pub fn from_settings(settings: &FilterSettings) -> Result<Self, ServiceError> {
        let mut words: Vec<&str> = settings
            .filtered_words
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .collect();
        // longest first so overlapping entries prefer the longer match
        words.sort_by_key(|w| std::cmp::Reverse(w.chars().count()));
        words.dedup();

        let pattern = if words.is_empty() {
            None
        } else {
            let alternatives = words.iter().map(|w| word_pattern(w)).collect::<Vec<_>>().join("|");
            let re = Regex::new(&format!("(?i)(?:{alternatives})"))
                .map_err(|e| ServiceError::Validation(format!("invalid filter word list: {e}")))?;
            Some(re)
        };
        Ok(Self { pattern, replacement: settings.replacement_char.clone() })
    }

    /// Load settings from a JSON file. Missing or unusable files yield an empty filter.
    pub async fn load(path: &Path) -> Self {
        let settings = match tokio::fs::read(path).await {
            Ok(bytes) => match serde_json::from_slice::<FilterSettings>(&bytes) {
                Ok(s) => s,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "malformed filter word list; filtering disabled");
                    FilterSettings::default()
                }
            },
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no filter word list");
                FilterSettings::default()
            }
        };
        match Self::from_settings(&settings) {
            Ok(filter) => filter,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "filter word list rejected; filtering disabled");
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_none()
    }

    pub fn apply(&self, content: &str) -> String {
        match &self.pattern {
            Some(re) => re.replace_all(content, regex::NoExpand(&self.replacement)).into_owned(),
            None => content.to_string(),
        }
    }
}

/// Anchor with `\b` only on ends that are word characters, otherwise `\b` could never match.
fn word_pattern(word: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let lead = if word.chars().next().is_some_and(is_word) { r"\b" } else { "" };
    let tail = if word.chars().last().is_some_and(is_word) { r"\b" } else { "" };
    format!("{lead}{}{tail}", regex::escape(word))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(words: &[&str]) -> WordFilter {
        let settings = FilterSettings {
            filtered_words: words.iter().map(|w| w.to_string()).collect(),
            replacement_char: "***".into(),
        };
        WordFilter::from_settings(&settings).unwrap()
    }

    #[test]
    fn replaces_whole_words_case_insensitively() {
        let f = filter(&["darn"]);
        assert_eq!(f.apply("Darn it, DARN!"), "*** it, ***!");
    }

    #[test]
    fn leaves_words_containing_the_entry() {
        let f = filter(&["ass"]);
        assert_eq!(f.apply("a classic assessment"), "a classic assessment");
        assert_eq!(f.apply("you ass"), "you ***");
    }

    #[test]
    fn entries_are_literal_text() {
        let f = filter(&["a.b", "$x"]);
        assert_eq!(f.apply("axb a.b"), "axb ***");
        assert_eq!(f.apply("pay $x now"), "pay *** now");
    }

    #[test]
    fn replacement_is_not_expanded() {
        let settings = FilterSettings { filtered_words: vec!["bad".into()], replacement_char: "$0".into() };
        let f = WordFilter::from_settings(&settings).unwrap();
        assert_eq!(f.apply("bad"), "$0");
    }

    #[test]
    fn empty_list_passes_through() {
        let f = filter(&["", "  "]);
        assert!(f.is_empty());
        assert_eq!(f.apply("anything"), "anything");
    }

    #[tokio::test]
    async fn load_accepts_legacy_field_names() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("filter_words_{}.json", uuid::Uuid::new_v4()));
        let legacy = serde_json::json!({"FilteredWords": ["spam"], "ReplacementChar": "###"});
        tokio::fs::write(&tmp, serde_json::to_vec(&legacy)?).await?;
        let f = WordFilter::load(&tmp).await;
        assert_eq!(f.apply("no SPAM here"), "no ### here");

        let missing = WordFilter::load(&tmp.with_extension("missing")).await;
        assert!(missing.is_empty());

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }
}
