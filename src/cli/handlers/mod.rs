mod init;
mod run;
mod source;
mod utils;

pub use init::handle_init;
pub use run::{RunArgs, handle_run};
pub use source::handle_source;

use crate::config::GroomConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Common context passed to all command handlers
pub struct CommandContext {
    pub config: GroomConfig,
    pub root: PathBuf,
}

impl CommandContext {
    pub fn new(config: GroomConfig, root: PathBuf) -> Self {
        Self { config, root }
    }

    /// Load `--config` when given, else search upward from the current
    /// directory, falling back to defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        match config_path {
            Some(path) => {
                let path = Path::new(path);
                let config = GroomConfig::load_from(path)
                    .with_context(|| format!("Failed to load config from {}", path.display()))?;
                let root = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                Ok(Self::new(config, root))
            }
            None => {
                let cwd = std::env::current_dir()?;
                let (config, root) = GroomConfig::load_or_default(&cwd)
                    .context("Failed to load groom configuration")?;
                Ok(Self::new(config, root))
            }
        }
    }
}
