use serde::Deserialize;
use std::path::Path;

/// Settings for the prompt engine, usually the `[prompt]` table of the host
/// configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptConfig {
    /// Release name (`1.12.2`) or protocol number (`340`) of the server.
    #[serde(default = "default_server_version")]
    pub server_version: String,
    #[serde(default = "default_anvil_title")]
    pub anvil_title: String,
    /// Y coordinate of the fabricated sign.
    #[serde(default)]
    pub sign_elevation: i32,
    /// Prefix for the pipeline stage names prompts install.
    #[serde(default = "default_filter_prefix")]
    pub filter_prefix: String,
    /// Stage the prompt filter is inserted in front of.
    #[serde(default = "default_dispatch_stage")]
    pub dispatch_stage: String,
}

fn default_server_version() -> String {
    "1.21.10".into()
}

fn default_anvil_title() -> String {
    "Repair & Name".into()
}

fn default_filter_prefix() -> String {
    "quill_prompt".into()
}

fn default_dispatch_stage() -> String {
    "packet_handler".into()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            server_version: default_server_version(),
            anvil_title: default_anvil_title(),
            sign_elevation: 0,
            filter_prefix: default_filter_prefix(),
            dispatch_stage: default_dispatch_stage(),
        }
    }
}

impl PromptConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: PromptConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::info!("No prompt config found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Same settings, different server version.
    pub fn for_version(version: impl Into<String>) -> Self {
        Self {
            server_version: version.into(),
            ..Self::default()
        }
    }
}
