use crate::config::toml_config::TomlConfig;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "edu-enroll")]
#[command(about = "Browse courses and manage enrollments from the terminal")]
pub struct CliConfig {
    #[arg(long, short = 'c', default_value = "edu-enroll.toml", help = "Path to the TOML configuration")]
    pub config: PathBuf,

    #[arg(long, short = 'v', help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl CliConfig {
    /// Loads and validates the configuration file, then applies flag overrides.
    pub fn load(&self) -> Result<TomlConfig> {
        let mut config = TomlConfig::from_file(&self.config)?;
        if self.json_logs {
            let logging = config.logging.get_or_insert_with(Default::default);
            logging.format = Some("json".to_string());
        }
        config.validate()?;
        Ok(config)
    }

    pub fn json_logs(&self, config: Option<&TomlConfig>) -> bool {
        self.json_logs || config.map(TomlConfig::json_logs).unwrap_or(false)
    }
}
