use std::sync::Arc;

use chrono::Duration;
use dotenvy::dotenv;
use serde_json::json;
use service::board::{dispatch, Command, MessageRepository, MessageStore};
use service::errors::ServiceError;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};
use uuid::Uuid;

fn main() -> std::process::ExitCode {
    // 提前加载 .env，使得 RUST_LOG / CONFIG_PATH 等环境变量生效
    dotenv().ok();

    let cfg = match configs::AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            common::utils::logging::init_logging_default();
            error!(service = "board", event = "config_invalid", error = %e, "failed to load configuration");
            return std::process::ExitCode::FAILURE;
        }
    };
    common::utils::logging::init_logging(cfg.logging.json);

    let session_id = Uuid::new_v4();
    let pid = std::process::id();

    std::panic::set_hook(Box::new(move |info| {
        error!(service = "board", event = "panic", %session_id, pid, message = %info, "unhandled panic occurred");
    }));

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "board", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return std::process::ExitCode::FAILURE;
        }
    };

    info!(
        service = "board",
        event = "start",
        %session_id,
        pid,
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %cfg.board.data_dir.display(),
        "board session starting"
    );

    rt.block_on(async move {
        tokio::select! {
            res = run(cfg) => match res {
                Ok(()) => {
                    info!(service = "board", event = "stop", %session_id, "input closed, session finished");
                    std::process::ExitCode::SUCCESS
                }
                Err(e) => {
                    error!(service = "board", event = "run_failed", error = %e, "board session failed");
                    std::process::ExitCode::FAILURE
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!(service = "board", event = "shutdown_signal", %session_id, "received Ctrl+C, shutting down");
                std::process::ExitCode::SUCCESS
            }
        }
    })
}

/// Read one JSON command per stdin line and answer with one JSON line on stdout.
async fn run(cfg: configs::AppConfig) -> anyhow::Result<()> {
    service::runtime::ensure_env(&cfg.board).await?;
    let store: Arc<MessageStore> = MessageStore::from_config(&cfg.board).await?;
    let cleanup_interval = Duration::seconds(cfg.board.cleanup_interval_secs as i64);

    // 启动时先清理一次过期留言
    if let Some(removed) = store.cleanup_if_due(Duration::zero()).await? {
        info!(removed, "startup cleanup finished");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = answer(&store, cleanup_interval, &line).await;
        let mut out = serde_json::to_vec(&response)?;
        out.push(b'\n');
        stdout.write_all(&out).await?;
        stdout.flush().await?;
    }
    Ok(())
}

/// Parse one command line and build its response line. Never fails the session.
async fn answer(store: &MessageStore, cleanup_interval: Duration, line: &str) -> serde_json::Value {
    let command = match serde_json::from_str::<Command>(line) {
        Ok(command) => command,
        Err(e) => {
            warn!(error = %e, "unparseable command");
            return json!({ "ok": false, "error": "invalid_command", "message": e.to_string() });
        }
    };
    // a listing is a page view: purge expired messages first
    if matches!(command, Command::ListActive(_)) {
        match store.cleanup_if_due(cleanup_interval).await {
            Ok(Some(removed)) => info!(removed, "page-view cleanup finished"),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "page-view cleanup failed; listing anyway"),
        }
    }
    let repo: &dyn MessageRepository = store;
    match dispatch(repo, command).await {
        Ok(outcome) => json!({ "ok": true, "result": outcome }),
        Err(e) => error_response(&e),
    }
}

fn error_response(e: &ServiceError) -> serde_json::Value {
    if e.is_user_facing() {
        json!({ "ok": false, "error": e.code(), "message": e.to_string() })
    } else {
        error!(error = %e, "command failed");
        json!({ "ok": false, "error": e.code(), "message": "storage unavailable" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use service::board::{BoardPolicy, CreateMessage, WordFilter};

    #[tokio::test]
    async fn listing_survives_failed_cleanup() -> anyhow::Result<()> {
        let path = std::env::temp_dir().join(format!("board_bin_{}.json", Uuid::new_v4()));
        let store = MessageStore::new(&path, BoardPolicy::default(), WordFilter::default()).await?;
        store.create(CreateMessage::new("still listed", "tok")).await?;

        // block the temp file so the cleanup write fails
        let mut blocker = path.as_os_str().to_owned();
        blocker.push(".tmp");
        let blocker = std::path::PathBuf::from(blocker);
        tokio::fs::create_dir(&blocker).await?;

        let resp = answer(&store, Duration::minutes(5), r#"{"op":"listActive"}"#).await;
        assert_eq!(resp["ok"], true);
        assert_eq!(resp["result"]["data"]["totalCount"], 1);

        let bad = answer(&store, Duration::minutes(5), "not json").await;
        assert_eq!(bad["error"], "invalid_command");

        let _ = tokio::fs::remove_dir(&blocker).await;
        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }
}
