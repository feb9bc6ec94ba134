use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::Session;

const SESSION_FILE: &str = "session.json";

/// Session as persisted between CLI invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub session: Session,
    pub saved_at: DateTime<Utc>,
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("OFICINA_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("oficina").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn load_stored_session() -> anyhow::Result<Option<StoredSession>> {
    let session_file = get_config_dir()?.join(SESSION_FILE);

    if !session_file.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(session_file)?;
    match serde_json::from_str(&content) {
        Ok(stored) => Ok(Some(stored)),
        Err(e) => {
            tracing::warn!("ignoring unreadable session file: {}", e);
            Ok(None)
        }
    }
}

pub fn load_session() -> anyhow::Result<Option<Session>> {
    Ok(load_stored_session()?.map(|stored| stored.session))
}

pub fn save_session(session: &Session) -> anyhow::Result<()> {
    let session_file = get_config_dir()?.join(SESSION_FILE);
    let stored = StoredSession {
        session: session.clone(),
        saved_at: Utc::now(),
    };

    let content = serde_json::to_string_pretty(&stored)?;
    fs::write(session_file, content)?;
    Ok(())
}

pub fn clear_session() -> anyhow::Result<()> {
    let session_file = get_config_dir()?.join(SESSION_FILE);
    if session_file.exists() {
        fs::remove_file(session_file)?;
    }
    Ok(())
}
