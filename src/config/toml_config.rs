use crate::core::ConfigProvider;
use crate::domain::model::Course;
use crate::utils::error::{EnrollError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

const LOG_FORMATS: [&str; 2] = ["compact", "json"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub backend: BackendConfig,
    pub logging: Option<LoggingConfig>,
    pub memory: Option<MemoryConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Supabase,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,
    pub url: Option<String>,
    pub anon_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub format: Option<String>,
}

/// Seed data for `kind = "memory"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub accounts: Vec<AccountSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSeed {
    pub email: String,
    pub password: String,
}

impl TomlConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EnrollError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses the configuration, substituting `${VAR}` references first.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EnrollError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Unset variables are left as written so validation can name them.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EnrollError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        if self.backend.kind == BackendKind::Supabase {
            let url = validation::validate_required_field("backend.url", &self.backend.url)?;
            validation::validate_resolved("backend.url", url)?;
            validation::validate_url("backend.url", url)?;

            let key = validation::validate_required_field("backend.anon_key", &self.backend.anon_key)?;
            validation::validate_resolved("backend.anon_key", key)?;
            validation::validate_non_empty_string("backend.anon_key", key)?;
        }

        if let Some(format) = self.logging.as_ref().and_then(|l| l.format.as_deref()) {
            validation::validate_one_of("logging.format", format, &LOG_FORMATS)?;
        }

        Ok(())
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.format.as_deref())
            .map(|f| f == "json")
            .unwrap_or(false)
    }

    pub fn memory_seed(&self) -> MemoryConfig {
        self.memory.clone().unwrap_or_default()
    }
}

impl ConfigProvider for TomlConfig {
    fn backend_url(&self) -> &str {
        self.backend.url.as_deref().unwrap_or_default()
    }

    fn anon_key(&self) -> &str {
        self.backend.anon_key.as_deref().unwrap_or_default()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
