//! Optional Word-to-PDF conversion through a headless office suite.
//!
//! Whether conversion is possible depends on the host, so it is detected once
//! at startup with [`detect_converter`]. Callers hold an
//! `Option<Arc<dyn PdfConverter>>`: `None` means the feature is disabled.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::ConverterConfig;
use crate::error::{Error, Result};

/// Binaries tried, in order, when no explicit program is configured.
const OFFICE_PROGRAMS: [&str; 2] = ["soffice", "libreoffice"];

/// Trait for Word-to-PDF backends
#[async_trait]
pub trait PdfConverter: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &'static str;

    /// Convert one Word document to PDF bytes
    async fn convert(&self, name: &str, docx: &[u8]) -> Result<Vec<u8>>;
}

/// LibreOffice in headless mode.
///
/// Every conversion runs in its own temporary directory with its own user
/// profile, so concurrent conversions do not fight over the profile lock.
/// The directory is removed when the conversion returns, on every path.
#[derive(Debug, Clone)]
pub struct OfficeConverter {
    program: PathBuf,
    timeout: Duration,
}

impl OfficeConverter {
    pub const fn new(program: PathBuf, timeout: Duration) -> Self {
        Self { program, timeout }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait]
impl PdfConverter for OfficeConverter {
    fn name(&self) -> &'static str {
        "libreoffice"
    }

    async fn convert(&self, name: &str, docx: &[u8]) -> Result<Vec<u8>> {
        let failed = |reason: String| Error::Conversion {
            name: name.to_string(),
            reason,
        };

        let workdir = tempfile::TempDir::new()?;
        let input = workdir.path().join("input.docx");
        let outdir = workdir.path().join("out");
        let profile = workdir.path().join("profile");
        tokio::fs::write(&input, docx).await?;

        let mut profile_arg = OsString::from("-env:UserInstallation=file://");
        profile_arg.push(profile.as_os_str());

        let mut command = Command::new(&self.program);
        command
            .arg(profile_arg)
            .args(["--headless", "--norestore", "--convert-to", "pdf", "--outdir"])
            .arg(&outdir)
            .arg(&input)
            .kill_on_drop(true);

        debug!("Converting {} with {}", name, self.program.display());
        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| failed(format!("timed out after {}s", self.timeout.as_secs())))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failed(format!("{}: {}", output.status, stderr.trim())));
        }

        tokio::fs::read(outdir.join("input.pdf"))
            .await
            .map_err(|e| failed(format!("no PDF produced: {e}")))
    }
}

/// Resolve the conversion capability once.
///
/// Returns `None` when conversion is disabled or no office binary exists.
pub fn detect_converter(config: &ConverterConfig) -> Option<Arc<dyn PdfConverter>> {
    if !config.enabled {
        info!("Word to PDF conversion disabled by configuration");
        return None;
    }

    let program = match &config.program {
        Some(explicit) if explicit.is_file() => Some(explicit.clone()),
        Some(explicit) => {
            warn!("Configured converter {} does not exist", explicit.display());
            None
        }
        None => OFFICE_PROGRAMS.iter().find_map(|p| find_in_path(p)),
    };

    match program {
        Some(program) => {
            info!("Word to PDF conversion available via {}", program.display());
            Some(Arc::new(OfficeConverter::new(
                program,
                Duration::from_secs(config.timeout_secs),
            )))
        }
        None => {
            info!("No office suite found; Word to PDF conversion disabled");
            None
        }
    }
}

/// Look up an executable on `PATH`.
fn find_in_path(program: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_config_detects_nothing() {
        let config = ConverterConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(detect_converter(&config).is_none());
    }

    #[test]
    fn test_missing_explicit_program_detects_nothing() {
        let config = ConverterConfig {
            program: Some(PathBuf::from("/definitely/not/here/soffice")),
            ..Default::default()
        };
        assert!(detect_converter(&config).is_none());
    }

    #[test]
    fn test_explicit_program_is_used() {
        let dir = tempfile::TempDir::new().unwrap();
        let program = dir.path().join("soffice");
        std::fs::write(&program, b"").unwrap();

        let config = ConverterConfig {
            program: Some(program),
            ..Default::default()
        };
        let converter = detect_converter(&config).unwrap();
        assert_eq!(converter.name(), "libreoffice");
    }

    #[tokio::test]
    async fn test_failing_program_reports_conversion_error() {
        // `false` exits non-zero without producing output
        let Some(program) = find_in_path("false") else {
            return;
        };
        let converter = OfficeConverter::new(program, Duration::from_secs(10));

        let err = converter.convert("x.docx", b"data").await.unwrap_err();
        assert!(matches!(err, Error::Conversion { ref name, .. } if name == "x.docx"));
    }
}
