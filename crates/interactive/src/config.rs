//! Client configuration
//!
//! Loaded from a TOML file; every field is optional and falls back to the
//! defaults below.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Interactive marker client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server topic namespace, e.g. `/basic_controls`
    pub topic: String,
    /// Stamped on every outbound feedback message
    pub client_id: String,
    /// Pose re-send period while a drag is active
    pub repeat_interval_ms: u64,
    /// Parallel-plane epsilon for rays built from pointer positions
    pub ray_precision: f32,
    /// Base path for `package://` mesh resources
    pub mesh_path: Option<String>,
    /// Upper bound on rendered elements of cube/sphere lists
    pub max_list_items: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            topic: "/basic_controls".to_string(),
            client_id: "interactive_markers_client".to_string(),
            repeat_interval_ms: 250,
            ray_precision: 1e-4,
            mesh_path: None,
            max_list_items: 1250,
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!("Loaded client config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn update_topic(&self) -> String {
        format!("{}/tunneled/update", self.topic)
    }

    pub fn feedback_topic(&self) -> String {
        format!("{}/feedback", self.topic)
    }

    pub fn init_service(&self) -> String {
        format!("{}/tunneled/get_init", self.topic)
    }

    pub fn repeat_interval(&self) -> Duration {
        Duration::from_millis(self.repeat_interval_ms)
    }

    /// Mesh base path with a trailing `/`, if configured.
    pub fn mesh_base(&self) -> Option<String> {
        self.mesh_path.as_ref().map(|path| {
            if path.ends_with('/') {
                path.clone()
            } else {
                format!("{}/", path)
            }
        })
    }
}
