//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` to keep binary crates importing
//! `service::runtime::ensure_env` without depending directly on `common`.

use configs::BoardConfig;

/// Ensure the data directory exists; warn on a missing filter word list.
pub async fn ensure_env(cfg: &BoardConfig) -> anyhow::Result<()> {
    common::env::ensure_env(&cfg.data_dir, &cfg.filter_words_path()).await
}
