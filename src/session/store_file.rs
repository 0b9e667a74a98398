//! Persisted session file
//!
//! A small key-value JSON document holding the session token under a
//! fixed `token` key, stored in the per-user config directory so the
//! session survives process restarts. A missing file means "no session".

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const SESSION_FILE_NAME: &str = "session.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Default per-user location: `{config_dir}/portal-client/session.json`
    pub fn default_location() -> Result<Self> {
        let config_dir = dirs::config_dir().context("Failed to determine user config directory")?;
        Ok(Self::new(
            config_dir.join("portal-client").join(SESSION_FILE_NAME),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted token, if any.
    ///
    /// A corrupt session file is treated as "no session" rather than an
    /// error; recovery from bad local state is silent.
    pub fn load_token(&self) -> Result<Option<String>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(error).with_context(|| {
                    format!("Failed to read session file {}", self.path.display())
                })
            }
        };

        match serde_json::from_str::<SessionDocument>(&raw) {
            Ok(document) => Ok(document.token.filter(|t| !t.is_empty())),
            Err(error) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %error,
                    "Session file is corrupt; ignoring it"
                );
                Ok(None)
            }
        }
    }

    pub fn save_token(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create session directory {}", parent.display())
            })?;
        }

        let document = SessionDocument {
            token: Some(token.to_string()),
        };
        let raw = serde_json::to_string_pretty(&document)
            .context("Failed to serialize session document")?;
        fs::write(&self.path, raw)
            .with_context(|| format!("Failed to write session file {}", self.path.display()))
    }

    /// Remove the persisted session. Clearing an absent file is not an
    /// error; logout must be idempotent.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error).with_context(|| {
                format!("Failed to remove session file {}", self.path.display())
            }),
        }
    }
}
