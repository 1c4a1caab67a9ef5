use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File name of the merged PDF download
pub const MERGED_PDF_NAME: &str = "merged.pdf";
/// File name of the merged Word download
pub const MERGED_WORD_NAME: &str = "merged.docx";
/// File name of the all-in-one PDF download (needs conversion)
pub const MERGED_COMBINED_NAME: &str = "merged-all.pdf";

/// Word-to-PDF converter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Allow conversion if an office suite is installed
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Explicit converter binary (defaults to `soffice`/`libreoffice` on PATH)
    pub program: Option<PathBuf>,

    /// Per-document conversion timeout
    #[serde(default = "default_convert_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_true() -> bool {
    true
}

const fn default_convert_timeout_secs() -> u64 {
    120
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: None,
            timeout_secs: default_convert_timeout_secs(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Request body limit for uploads, in megabytes
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,

    /// Sessions idle for longer than this are discarded
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// How often expired sessions are swept
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,

    /// Word-to-PDF conversion
    #[serde(default)]
    pub converter: ConverterConfig,
}

const fn default_max_upload_mb() -> usize {
    300
}

const fn default_session_ttl_secs() -> u64 {
    3600
}

const fn default_cleanup_interval_secs() -> u64 {
    300
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_upload_mb: default_max_upload_mb(),
            session_ttl_secs: default_session_ttl_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            converter: ConverterConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::error::Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::error::Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            crate::error::Error::ConfigLoad(format!("Failed to parse config: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations (~/.config/docmerge/config.toml, ./config.toml)
    pub fn load() -> Self {
        // Try user config
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("docmerge").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // Try local config
        let local_config = std::path::PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        // Return defaults
        tracing::debug!("No config file found, using defaults");
        Self::default()
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<(), crate::error::Error> {
        let invalid = |field: &str, reason: &str| crate::error::Error::ConfigInvalid {
            field: field.to_string(),
            reason: reason.to_string(),
        };

        if self.max_upload_mb == 0 {
            return Err(invalid("max_upload_mb", "must be greater than zero"));
        }
        if self.session_ttl_secs == 0 {
            return Err(invalid("session_ttl_secs", "must be greater than zero"));
        }
        if self.cleanup_interval_secs == 0 {
            return Err(invalid("cleanup_interval_secs", "must be greater than zero"));
        }
        if self.converter.timeout_secs == 0 {
            return Err(invalid("converter.timeout_secs", "must be greater than zero"));
        }
        Ok(())
    }

    /// Upload limit in bytes.
    pub const fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}
