#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "subtitle-clean")]
#[command(about = "Replay clean-mode commands against a captioning page snapshot")]
pub struct CliConfig {
    /// JSON page fixture to load
    #[arg(long)]
    pub page: String,

    /// TOML file overriding selectors, style ids, font and retry settings
    #[arg(long)]
    pub config: Option<String>,

    /// JSON preference file shared with the popup
    #[arg(long, default_value = "./prefs.json")]
    pub prefs: String,

    /// JSON file holding an array of popup messages, e.g. [{"action":"toggleState","value":true}]
    #[arg(long)]
    pub commands: Option<String>,

    /// Times the host re-inserts the suppressed chrome after the commands ran
    #[arg(long, default_value = "0")]
    pub rerender_rounds: usize,

    /// Virtual milliseconds to advance after each command
    #[arg(long, default_value = "0")]
    pub advance_ms: u64,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("page", &self.page)?;
        validation::validate_path("prefs", &self.prefs)?;
        if let Some(config) = &self.config {
            validation::validate_path("config", config)?;
        }
        if let Some(commands) = &self.commands {
            validation::validate_path("commands", commands)?;
        }
        // 虛擬時間只在指令或重繪之後推進
        if self.advance_ms > 0 && self.rerender_rounds == 0 {
            validation::validate_required_field("commands", &self.commands)?;
        }
        Ok(())
    }
}
