//! Marketplace profile adapter.
//!
//! Registration is gated by a marker directory `<profiles_dir>/<profile_id>`.
//! The check and the registration run under an exclusive lock on
//! `<profiles_dir>/.register.lock`, so concurrent agents sharing the directory
//! register a profile at most once.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

use super::{AgentRegistration, MarketplaceSdk, TaskRequest};
use crate::config::ClaraConfig;

pub const DEFAULT_PROFILES_DIR: &str = "../profiles";
const LOCK_FILE: &str = ".register.lock";

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("Invalid profile id {0:?}")]
    InvalidProfileId(String),

    #[error("Failed to lock {}: {source}", .path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Marker directory {} unusable: {source}", .path.display())]
    Marker {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not create Clara profile for {profile_id}: {source}")]
    Registration {
        profile_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Could not reconnect Clara profile for {profile_id}: {source}")]
    ProfileLoad {
        profile_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Clara profile not connected; call init() first")]
    NotConnected,

    #[error("Task registration failed: {0}")]
    Task(#[source] anyhow::Error),
}

/// Exclusive lock held while checking and creating a marker.
struct RegistrationLock {
    file: File,
}

impl RegistrationLock {
    async fn acquire(dir: &Path) -> Result<Self, MarketError> {
        let path = dir.join(LOCK_FILE);
        let lock_path = path.clone();
        let result = tokio::task::spawn_blocking(move || {
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&lock_path)?;
            file.lock_exclusive()?;
            Ok::<_, std::io::Error>(file)
        })
        .await;

        match result {
            Ok(Ok(file)) => Ok(Self { file }),
            Ok(Err(source)) => Err(MarketError::Lock { path, source }),
            Err(join) => Err(MarketError::Lock {
                path,
                source: std::io::Error::new(std::io::ErrorKind::Other, join.to_string()),
            }),
        }
    }
}

impl Drop for RegistrationLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Connects an agent to its Clara marketplace profile.
pub struct ClaraMarket<S: MarketplaceSdk> {
    profile_id: String,
    config: ClaraConfig,
    sdk: S,
    profiles_dir: PathBuf,
    profile: Option<S::Profile>,
}

impl<S: MarketplaceSdk> ClaraMarket<S> {
    pub fn new(profile_id: impl Into<String>, config: ClaraConfig, sdk: S) -> Self {
        Self {
            profile_id: profile_id.into(),
            config,
            sdk,
            profiles_dir: PathBuf::from(DEFAULT_PROFILES_DIR),
            profile: None,
        }
    }

    pub fn with_profiles_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profiles_dir = dir.into();
        self
    }

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    pub fn profile(&self) -> Option<&S::Profile> {
        self.profile.as_ref()
    }

    fn marker_path(&self) -> Result<PathBuf, MarketError> {
        let id = &self.profile_id;
        if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
            return Err(MarketError::InvalidProfileId(id.clone()));
        }
        Ok(self.profiles_dir.join(id))
    }

    pub async fn init(&mut self) -> Result<(), MarketError> {
        self.connect_profile().await
    }

    /// Reconnect the registered profile, or register it on first run.
    pub async fn connect_profile(&mut self) -> Result<(), MarketError> {
        info!(
            "Connecting Clara profile {} ({} market)",
            self.profile_id, self.config.implementation
        );
        let marker = self.marker_path()?;
        tokio::fs::create_dir_all(&self.profiles_dir)
            .await
            .map_err(|source| MarketError::Marker {
                path: self.profiles_dir.clone(),
                source,
            })?;

        let _lock = RegistrationLock::acquire(&self.profiles_dir).await?;

        let profile = if tokio::fs::metadata(&marker)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            info!("Agent {} already registered, connecting", self.profile_id);
            self.sdk
                .load_profile(&self.config.wallet, &self.config.market_id)
                .map_err(|source| MarketError::ProfileLoad {
                    profile_id: self.profile_id.clone(),
                    source,
                })?
        } else {
            let registration = AgentRegistration::tweet_agent(&self.profile_id);
            let profile = self
                .sdk
                .register_agent(&self.config.wallet, &registration)
                .await
                .map_err(|source| {
                    error!("Could not create Clara profile {}: {}", self.profile_id, source);
                    MarketError::Registration {
                        profile_id: self.profile_id.clone(),
                        source,
                    }
                })?;
            tokio::fs::create_dir_all(&marker)
                .await
                .map_err(|source| MarketError::Marker {
                    path: marker.clone(),
                    source,
                })?;
            info!("Registered Clara profile {}", self.profile_id);
            profile
        };

        self.profile = Some(profile);
        Ok(())
    }

    /// Post a task from the connected profile.
    pub async fn register_task(&self, task: &TaskRequest) -> Result<serde_json::Value, MarketError> {
        let profile = self.profile.as_ref().ok_or(MarketError::NotConnected)?;
        let receipt = self
            .sdk
            .register_task(profile, task)
            .await
            .map_err(MarketError::Task)?;
        info!("Task registered on topic {}", task.topic);
        Ok(receipt)
    }
}
