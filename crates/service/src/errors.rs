use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("edit window expired")]
    EditWindowExpired,
    #[error("ownership mismatch")]
    OwnershipMismatch,
    #[error("storage error: {0}")]
    Storage(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn storage(e: impl std::fmt::Display) -> Self { Self::Storage(e.to_string()) }

    /// Rejections a caller can show to the user as-is; storage failures are not.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }

    /// Stable machine-readable code for boundary responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::EditWindowExpired => "edit_window_expired",
            Self::OwnershipMismatch => "ownership_mismatch",
            Self::Storage(_) => "storage",
        }
    }
}
