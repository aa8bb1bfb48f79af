pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::FilePreferenceStore, CliConfig};

pub use adapters::memory::{MemoryPage, MemoryPreferenceStore, PageFixture};
pub use config::toml_config::CleanerConfig;
pub use core::{coordinator::Coordinator, script::ContentScript};
pub use domain::model::{CleanState, Command, CommandAck, FontSize, UserPreferences};
pub use utils::error::{CleanerError, Result};
