use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{SpriteError, SpriteResult};

/// Default layer pool capacity.
pub const DEFAULT_MAX_LAYERS: u32 = 2048;
/// Default frame pool capacity.
pub const DEFAULT_MAX_FRAMES: u32 = 1024;
/// Default animation pool capacity.
pub const DEFAULT_MAX_ANIMATIONS: u32 = 64;

/// Pool capacities for an [`AnimationRuntime`](crate::AnimationRuntime).
///
/// Capacities are fixed when the runtime is built; pools never grow afterwards, so handles stay
/// valid for the lifetime of the runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Number of layer slots.
    pub max_layers: u32,
    /// Number of frame slots.
    pub max_frames: u32,
    /// Number of animation slots.
    pub max_animations: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_layers: DEFAULT_MAX_LAYERS,
            max_frames: DEFAULT_MAX_FRAMES,
            max_animations: DEFAULT_MAX_ANIMATIONS,
        }
    }
}

impl RuntimeConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> SpriteResult<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| SpriteError::config(format!("invalid runtime config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and parse a JSON config file.
    pub fn from_path(path: &Path) -> SpriteResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read runtime config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Reject capacities the pools cannot represent.
    pub fn validate(&self) -> SpriteResult<()> {
        for (name, cap) in [
            ("max_layers", self.max_layers),
            ("max_frames", self.max_frames),
            ("max_animations", self.max_animations),
        ] {
            if cap == 0 {
                return Err(SpriteError::config(format!("{name} must be > 0")));
            }
            if cap == u32::MAX {
                return Err(SpriteError::config(format!(
                    "{name} must be < {}",
                    u32::MAX
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
