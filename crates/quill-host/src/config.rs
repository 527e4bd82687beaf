use quill_prompt::PromptConfig;
use quill_types::BlockPos;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Milliseconds per simulation tick. 50 is vanilla's 20 TPS.
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
    /// Frame compression threshold; `None` leaves compression off.
    #[serde(default)]
    pub compression_threshold: Option<i32>,
    /// Where new players start. Movement is not decoded, so this is also
    /// where prompts anchor until something calls `set_position`.
    #[serde(default = "default_spawn")]
    pub spawn: BlockPos,
    #[serde(default)]
    pub prompt: PromptConfig,
}

fn default_bind() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    25565
}

fn default_tick_millis() -> u64 {
    50
}

fn default_spawn() -> BlockPos {
    BlockPos::new(0, 64, 0)
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            tick_millis: default_tick_millis(),
            compression_threshold: None,
            spawn: default_spawn(),
            prompt: PromptConfig::default(),
        }
    }
}

impl HostConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: HostConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::info!("No config file found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }
}
