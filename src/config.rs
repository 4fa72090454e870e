//! Configuration management for memberroster
//!
//! All configuration is loaded from `./config/memberroster.toml` when that
//! file exists; otherwise the embedded default template is used. The template
//! is the only place defaults exist in source form. `--init` writes it out so
//! an operator can edit the reference ID lists before a run.

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Configuration file path relative to working directory
pub const CONFIG_PATH: &str = "./config/memberroster.toml";

/// Default configuration file content
pub const DEFAULT_CONFIG: &str = include_str!("../config/memberroster.toml");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid URL in '{field}': {url}")]
    InvalidUrl { field: String, url: String },

    #[error("Configuration field '{field}' cannot be empty")]
    EmptyRequired { field: String },

    #[error("Configuration file already exists at {0}")]
    AlreadyExists(PathBuf),
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub portal: PortalConfig,
    pub http: HttpConfig,
    pub reference: ReferenceConfig,
}

/// Portal navigation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    /// Entry URL of the roster portal
    pub url: String,
    /// CSS class that identifies the login form on the entry page
    pub login_form_class: String,
    /// Visible-text prefix of roster download links
    pub link_prefix: String,
    /// Filename prefix of the combined roster text file inside the archive
    pub combined_file_prefix: String,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User agent sent with every request
    pub user_agent: String,
}

/// Reference ID lists used as classification keys. Static for the process
/// lifetime; edited only by an operator before a run.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceConfig {
    /// Top-parent IDs belonging to the SPG reference group
    pub spg_ids: Vec<String>,
    /// Top-parent IDs belonging to the LIDN reference group
    pub lidn_ids: Vec<String>,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if Url::parse(&self.portal.url).is_err() {
            return Err(ConfigError::InvalidUrl {
                field: "portal.url".to_string(),
                url: self.portal.url.clone(),
            });
        }

        let required = [
            ("portal.login_form_class", &self.portal.login_form_class),
            ("portal.link_prefix", &self.portal.link_prefix),
            ("portal.combined_file_prefix", &self.portal.combined_file_prefix),
            ("http.user_agent", &self.http.user_agent),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyRequired {
                    field: field.to_string(),
                });
            }
        }

        if self.reference.spg_ids.is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: "reference.spg_ids".to_string(),
            });
        }
        if self.reference.lidn_ids.is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: "reference.lidn_ids".to_string(),
            });
        }

        Ok(())
    }
}

/// Load configuration from the default path, falling back to the embedded
/// template when no file has been written yet.
pub fn load() -> Result<AppConfig, ConfigError> {
    load_from(Path::new(CONFIG_PATH))
}

/// Load configuration from an explicit path (for testing or path control).
pub fn load_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let raw = if path.exists() {
        fs::read_to_string(path)?
    } else {
        DEFAULT_CONFIG.to_string()
    };
    let config: AppConfig = toml::from_str(&raw)?;
    config.validate()?;
    Ok(config)
}

/// Write the default configuration template to `CONFIG_PATH`.
pub fn init_config() -> Result<PathBuf, ConfigError> {
    let path = PathBuf::from(CONFIG_PATH);
    if path.exists() {
        return Err(ConfigError::AlreadyExists(path));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, DEFAULT_CONFIG)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_parses_and_validates() {
        let config: AppConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        config.validate().unwrap();
        assert_eq!(config.portal.link_prefix, "Premier_HISCI_Roster_W_HIN_");
        assert!(config.reference.spg_ids.contains(&"635796".to_string()));
        assert!(!config.reference.lidn_ids.contains(&"OH2004".to_string()));
    }

    #[test]
    fn empty_reference_list_is_rejected() {
        let mut config: AppConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        config.reference.lidn_ids.clear();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::EmptyRequired { field } if field == "reference.lidn_ids"));
    }

    #[test]
    fn invalid_portal_url_is_rejected() {
        let mut config: AppConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        config.portal.url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl { .. })));
    }
}
