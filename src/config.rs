use crate::{
    drag::TouchController,
    error::{BoardError, Result},
    store::{FileStore, HttpStore, MemoryStore, RemoteStore},
    sync::SyncPolicy,
};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio::fs;

/// Environment variable naming a JSON config file
pub const CONFIG_ENV_VAR: &str = "KANBAN_DRAG_CONFIG";

const MAX_TOUCH_DRAG_DELAY_MS: u64 = 5_000;

/// Where card moves are persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    #[serde(rename_all = "camelCase")]
    Http {
        base_url: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    File {
        root: PathBuf,
    },
    Memory,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Memory
    }
}

impl StoreConfig {
    pub fn build(&self) -> Result<Arc<dyn RemoteStore>> {
        Ok(match self {
            Self::Http {
                base_url,
                timeout_secs,
            } => Arc::new(HttpStore::with_timeout(
                base_url.as_str(),
                Duration::from_secs(*timeout_secs),
            )?),
            Self::File { root } => Arc::new(FileStore::new(root)),
            Self::Memory => Arc::new(MemoryStore::new()),
        })
    }
}

/// Engine settings; every field has a default so partial files are valid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// How long a touch must stay put before it becomes a drag
    pub touch_drag_delay_ms: u64,
    /// Finger travel that turns a pending touch into a scroll
    pub move_cancel_threshold_px: f64,
    pub sync_policy: SyncPolicy,
    pub store: StoreConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            touch_drag_delay_ms: 200,
            move_cancel_threshold_px: 10.0,
            sync_policy: SyncPolicy::default(),
            store: StoreConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a JSON config file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).await.map_err(|e| {
            BoardError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&contents)
    }

    /// Loads the file named by `KANBAN_DRAG_CONFIG`, or defaults when unset
    pub async fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(PathBuf::from(path)).await,
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.touch_drag_delay_ms == 0 || self.touch_drag_delay_ms > MAX_TOUCH_DRAG_DELAY_MS {
            return Err(BoardError::ConfigError(format!(
                "touchDragDelayMs must be between 1 and {MAX_TOUCH_DRAG_DELAY_MS}, got {}",
                self.touch_drag_delay_ms
            )));
        }
        if !self.move_cancel_threshold_px.is_finite() || self.move_cancel_threshold_px < 0.0 {
            return Err(BoardError::ConfigError(format!(
                "moveCancelThresholdPx must be a non-negative number, got {}",
                self.move_cancel_threshold_px
            )));
        }
        if let StoreConfig::Http { base_url, .. } = &self.store {
            if base_url.trim().is_empty() {
                return Err(BoardError::ConfigError("store baseUrl is empty".to_string()));
            }
        }
        Ok(())
    }

    pub fn touch_drag_delay(&self) -> Duration {
        Duration::from_millis(self.touch_drag_delay_ms)
    }

    pub fn touch_controller(&self) -> TouchController {
        TouchController::new(self.touch_drag_delay(), self.move_cancel_threshold_px)
    }
}
