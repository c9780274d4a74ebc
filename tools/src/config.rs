use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use codec::CodecConfig;

/// Limit values given on the command line, applied over the loaded config.
#[derive(Debug, Clone, Copy, Default)]
pub struct LimitOverrides {
    pub max_field_bytes: Option<usize>,
    pub max_list_items: Option<usize>,
}

impl LimitOverrides {
    pub fn apply(self, mut config: CodecConfig) -> CodecConfig {
        if let Some(max) = self.max_field_bytes {
            config.limits.max_field_bytes = max;
        }
        if let Some(max) = self.max_list_items {
            config.limits.max_list_items = max;
        }
        config
    }
}

/// Reads a JSON codec config (missing keys take their defaults) and applies
/// the overrides.
pub fn load_config(path: Option<&Path>, overrides: LimitOverrides) -> Result<CodecConfig> {
    let config = match path {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("read config {}", path.display()))?;
            serde_json::from_str(&contents).context("parse config json")?
        }
        None => CodecConfig::default(),
    };
    Ok(overrides.apply(config))
}
