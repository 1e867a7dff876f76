//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use std::path::Path;

use tracing::warn;

/// Ensure the data directory exists; warn when the optional filter word list is missing.
pub async fn ensure_env(data_dir: &Path, filter_words_file: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", data_dir.display()))?;
    if tokio::fs::metadata(filter_words_file).await.is_err() {
        warn!(path = %filter_words_file.display(), "filter word list not found; content will not be filtered");
    }
    Ok(())
}
