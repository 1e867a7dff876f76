use std::path::PathBuf;

use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoardConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_messages_file")]
    pub messages_file: String,
    #[serde(default = "default_filter_words_file")]
    pub filter_words_file: String,
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    #[serde(default = "default_edit_window_secs")]
    pub edit_window_secs: u64,
    #[serde(default = "default_expiry_secs")]
    pub expiry_secs: u64,
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
    /// Minimum gap between opportunistic cleanup passes; 0 runs one on every trigger.
    #[serde(default)]
    pub cleanup_interval_secs: u64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            messages_file: default_messages_file(),
            filter_words_file: default_filter_words_file(),
            max_content_chars: default_max_content_chars(),
            edit_window_secs: default_edit_window_secs(),
            expiry_secs: default_expiry_secs(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            cleanup_interval_secs: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub json: bool,
}

fn default_data_dir() -> PathBuf { PathBuf::from("data") }
fn default_messages_file() -> String { "messages.json".into() }
fn default_filter_words_file() -> String { "filter-words.json".into() }
fn default_max_content_chars() -> usize { 200 }
fn default_edit_window_secs() -> u64 { 10 * 60 }
fn default_expiry_secs() -> u64 { 24 * 60 * 60 }
fn default_page_size() -> u32 { 10 }
fn default_max_page_size() -> u32 { 100 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load from `CONFIG_PATH` (or `config.toml`); a missing file falls back to defaults.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_not_found(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        // 允许通过环境变量覆盖数据目录
        self.board.normalize_from_env();
        self.board.validate()?;
        Ok(())
    }
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

impl BoardConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(dir) = std::env::var("BOARD_DATA_DIR") {
            if !dir.trim().is_empty() {
                self.data_dir = PathBuf::from(dir);
            }
        }
        if self.data_dir.as_os_str().is_empty() {
            self.data_dir = default_data_dir();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.messages_file.trim().is_empty() {
            return Err(anyhow!("board.messages_file must not be empty"));
        }
        if self.max_content_chars == 0 {
            return Err(anyhow!("board.max_content_chars must be >= 1"));
        }
        if self.edit_window_secs == 0 || self.expiry_secs == 0 {
            return Err(anyhow!("board time windows must be positive seconds"));
        }
        if self.edit_window_secs > self.expiry_secs {
            return Err(anyhow!("board.edit_window_secs must not exceed board.expiry_secs"));
        }
        if self.default_page_size == 0 || self.max_page_size < self.default_page_size {
            return Err(anyhow!("board page sizes must satisfy 1 <= default_page_size <= max_page_size"));
        }
        Ok(())
    }

    pub fn messages_path(&self) -> PathBuf {
        self.data_dir.join(&self.messages_file)
    }

    pub fn filter_words_path(&self) -> PathBuf {
        self.data_dir.join(&self.filter_words_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.board.max_content_chars, 200);
        assert_eq!(cfg.board.edit_window_secs, 600);
        assert_eq!(cfg.board.expiry_secs, 86_400);
        assert_eq!(cfg.board.messages_path(), PathBuf::from("data/messages.json"));
        assert!(!cfg.logging.json);
        assert!(cfg.board.validate().is_ok());
    }

    #[test]
    fn board_section_overrides_defaults() {
        let cfg = parse(
            r#"
            [board]
            data_dir = "/var/lib/board"
            max_content_chars = 140
            default_page_size = 5

            [logging]
            json = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.board.max_content_chars, 140);
        assert_eq!(cfg.board.default_page_size, 5);
        assert_eq!(cfg.board.filter_words_path(), PathBuf::from("/var/lib/board/filter-words.json"));
        assert!(cfg.logging.json);
    }

    #[test]
    fn edit_window_longer_than_expiry_is_rejected() {
        let mut cfg = BoardConfig::default();
        cfg.edit_window_secs = cfg.expiry_secs + 1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let cfg = BoardConfig { default_page_size: 0, ..BoardConfig::default() };
        assert!(cfg.validate().is_err());
    }
}
