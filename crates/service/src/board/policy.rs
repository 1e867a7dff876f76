use chrono::Duration;
use configs::BoardConfig;

use crate::errors::ServiceError;
use crate::pagination::Pagination;

/// Limits and time windows the store enforces.
#[derive(Clone, Debug)]
pub struct BoardPolicy {
    pub max_content_chars: usize,
    pub edit_window: Duration,
    pub expiry: Duration,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for BoardPolicy {
    fn default() -> Self {
        Self {
            max_content_chars: 200,
            edit_window: Duration::minutes(10),
            expiry: Duration::hours(24),
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl From<&BoardConfig> for BoardPolicy {
    fn from(cfg: &BoardConfig) -> Self {
        Self {
            max_content_chars: cfg.max_content_chars,
            edit_window: Duration::seconds(cfg.edit_window_secs as i64),
            expiry: Duration::seconds(cfg.expiry_secs as i64),
            default_page_size: cfg.default_page_size,
            max_page_size: cfg.max_page_size,
        }
    }
}

impl BoardPolicy {
    /// Content must be non-blank and at most `max_content_chars` characters.
    pub fn check_content(&self, content: &str) -> Result<(), ServiceError> {
        if content.trim().is_empty() {
            return Err(ServiceError::Validation("content must not be empty".into()));
        }
        if content.chars().count() > self.max_content_chars {
            return Err(ServiceError::Validation(format!(
                "content must not exceed {} characters",
                self.max_content_chars
            )));
        }
        Ok(())
    }

    /// Fill a missing page size from the default and clamp the rest.
    pub fn paginate(&self, page: Option<u32>, page_size: Option<u32>) -> Pagination {
        Pagination::new(page.unwrap_or(1), page_size.unwrap_or(self.default_page_size))
            .normalize(self.max_page_size)
    }
}
