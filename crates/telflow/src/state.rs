//! State management for tracked resources
//!
//! Manages the `.telflow/state.json` file which records every remote object
//! telflow created or imported, in the order it started tracking them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use telflow_provider::{ConfigStore, ResourceData, ResourceKind};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

const STATE_VERSION: u32 = 1;
pub const STATE_DIR: &str = ".telflow";
const STATE_FILE: &str = "state.json";
const STATE_BACKUP: &str = "state.json.backup";
const STATE_STAGING: &str = "state.json.tmp";
const LOCK_FILE: &str = "lock.json";

#[derive(Error, Debug)]
pub enum StateError {
    #[error("State file version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("State is locked by `telflow {command}` (pid {pid} on {holder}) since {since}")]
    Locked {
        holder: String,
        command: String,
        pid: u32,
        since: DateTime<Utc>,
    },

    #[error("Invalid state file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StateError>;

/// Every resource telflow tracks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalState {
    pub version: u32,

    pub updated_at: DateTime<Utc>,

    /// Tracking order; destroy walks it backwards
    #[serde(default)]
    pub resources: Vec<ResourceState>,
}

impl Default for GlobalState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: Utc::now(),
            resources: Vec::new(),
        }
    }
}

impl GlobalState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ResourceState> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Record the current state of `name`, keeping its position if tracked
    pub fn upsert(&mut self, name: &str, data: &ResourceData, id: &str) {
        let now = Utc::now();
        match self.resources.iter_mut().find(|r| r.name == name) {
            Some(existing) => {
                existing.kind = data.kind();
                existing.id = id.to_string();
                existing.attributes = data.attributes().clone();
                existing.updated_at = now;
            }
            None => self.resources.push(ResourceState {
                name: name.to_string(),
                kind: data.kind(),
                id: id.to_string(),
                attributes: data.attributes().clone(),
                created_at: now,
                updated_at: now,
            }),
        }
        self.updated_at = now;
    }

    pub fn remove(&mut self, name: &str) -> Option<ResourceState> {
        let index = self.resources.iter().position(|r| r.name == name)?;
        self.updated_at = Utc::now();
        Some(self.resources.remove(index))
    }
}

/// Last-known state of one remote object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceState {
    /// Name in the declared resources file
    pub name: String,

    pub kind: ResourceKind,

    /// Remote SID
    pub id: String,

    pub attributes: Map<String, Value>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl ResourceState {
    /// Record with no pending change
    pub fn to_data(&self) -> ResourceData {
        ResourceData::from_state(self.kind, self.id.clone(), self.attributes.clone())
    }
}

/// Reads and writes `.telflow/state.json` under a project root
pub struct StateManager {
    project_root: PathBuf,
}

impl StateManager {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    fn state_dir(&self) -> PathBuf {
        self.project_root.join(STATE_DIR)
    }

    pub fn state_path(&self) -> PathBuf {
        self.state_dir().join(STATE_FILE)
    }

    fn lock_path(&self) -> PathBuf {
        self.state_dir().join(LOCK_FILE)
    }

    /// Load the current state; an absent file is an empty state
    pub async fn load(&self) -> Result<GlobalState> {
        let path = self.state_path();
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No state file, starting empty");
                return Ok(GlobalState::new());
            }
            Err(e) => return Err(e.into()),
        };

        let state: GlobalState = serde_json::from_str(&content)?;
        if state.version > STATE_VERSION {
            return Err(StateError::UnsupportedVersion {
                found: state.version,
                supported: STATE_VERSION,
            });
        }

        tracing::debug!(resources = state.resources.len(), "Loaded state");
        Ok(state)
    }

    /// Write the state through a staging file, keeping the previous file as
    /// a backup.
    pub async fn save(&self, state: &GlobalState) -> Result<()> {
        let dir = self.state_dir();
        fs::create_dir_all(&dir).await?;

        let path = self.state_path();
        let staging = dir.join(STATE_STAGING);
        fs::write(&staging, serde_json::to_string_pretty(state)?).await?;

        if fs::try_exists(&path).await? {
            fs::copy(&path, dir.join(STATE_BACKUP)).await?;
        }
        fs::rename(&staging, &path).await?;

        tracing::debug!(resources = state.resources.len(), "Saved state");
        Ok(())
    }

    /// Take the project lock for `command`. The lock file is created
    /// exclusively; a lock older than an hour is taken over.
    pub async fn acquire_lock(&self, command: &str) -> Result<StateLock> {
        fs::create_dir_all(self.state_dir()).await?;
        let lock_path = self.lock_path();

        let info = LockInfo {
            holder: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            command: command.to_string(),
            pid: std::process::id(),
            acquired_at: Utc::now(),
        };
        let content = serde_json::to_string_pretty(&info)?;

        for _ in 0..2 {
            let created = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
                .await;
            match created {
                Ok(mut file) => {
                    file.write_all(content.as_bytes()).await?;
                    file.flush().await?;
                    tracing::debug!(command, "Acquired state lock");
                    return Ok(StateLock {
                        lock_path,
                        released: false,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    let held: LockInfo = serde_json::from_str(&fs::read_to_string(&lock_path).await?)?;
                    if Utc::now().signed_duration_since(held.acquired_at).num_hours() < 1 {
                        return Err(StateError::Locked {
                            holder: held.holder,
                            command: held.command,
                            pid: held.pid,
                            since: held.acquired_at,
                        });
                    }
                    tracing::warn!(
                        holder = %held.holder,
                        command = %held.command,
                        "Taking over stale state lock"
                    );
                    fs::remove_file(&lock_path).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StateError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            "state lock was re-taken while replacing a stale lock",
        )))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    #[serde(default)]
    command: String,
    #[serde(default)]
    pid: u32,
    acquired_at: DateTime<Utc>,
}

/// Held project lock; removed on release or drop
pub struct StateLock {
    lock_path: PathBuf,
    released: bool,
}

impl StateLock {
    pub async fn release(mut self) -> Result<()> {
        self.released = true;
        match fs::remove_file(&self.lock_path).await {
            Ok(()) => {
                tracing::debug!("Released state lock");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}
