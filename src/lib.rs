pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{InMemoryBackend, SupabaseClient};
pub use config::TomlConfig;
pub use core::engine::EnrollEngine;
pub use utils::error::{EnrollError, Result};
