//! External document-converter collaborator
//!
//! Successful runs optionally hand the sitemap to an external Python script
//! that turns every listed page into a Markdown document. The converter is a
//! black box to this crate: it gets the sitemap path and an output
//! directory, and reports success or failure through its exit status. Its
//! fixed dependency list is ensured before the first invocation.

use crate::config::ConvertConfig;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tokio::process::Command;

/// Errors raised while bootstrapping or running the converter
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Converter bootstrap failed: {0}")]
    Bootstrap(String),

    #[error("Converter script not found: {0}")]
    MissingScript(String),

    #[error("Converter exited with status {status}: {stderr}")]
    Failed { status: i32, stderr: String },

    #[error("Failed to launch converter: {0}")]
    Io(#[from] std::io::Error),
}

/// The interface the escalation controller needs from a converter
///
/// Kept as a trait so runs can be wired without conversion side effects in
/// tests; the production implementation shells out to Python.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Converts every page listed in the sitemap into documents
    async fn convert(&self, sitemap: &Path) -> Result<(), ConvertError>;
}

/// Python-based converter invocation
pub struct PythonConverter {
    config: ConvertConfig,
}

impl PythonConverter {
    pub fn new(config: ConvertConfig) -> Self {
        Self { config }
    }

    /// Ensures the converter's fixed package list is installed
    ///
    /// Runs `python -m pip install` over the configured packages. A failing
    /// bootstrap aborts the conversion; the sitemap output stays valid.
    async fn ensure_packages(&self) -> Result<(), ConvertError> {
        if self.config.packages.is_empty() {
            return Ok(());
        }

        tracing::info!(
            "Ensuring converter packages: {}",
            self.config.packages.join(", ")
        );

        let output = Command::new(&self.config.python)
            .arg("-m")
            .arg("pip")
            .arg("install")
            .arg("--quiet")
            .args(&self.config.packages)
            .output()
            .await?;

        if !output.status.success() {
            return Err(ConvertError::Bootstrap(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl Converter for PythonConverter {
    async fn convert(&self, sitemap: &Path) -> Result<(), ConvertError> {
        let script = Path::new(&self.config.script_path);
        if !script.exists() {
            return Err(ConvertError::MissingScript(
                script.display().to_string(),
            ));
        }

        self.ensure_packages().await?;

        tracing::info!(
            "Converting {} into {}",
            sitemap.display(),
            self.config.output_dir
        );

        let output = Command::new(&self.config.python)
            .arg(script)
            .arg("--sitemap")
            .arg(sitemap)
            .arg("--output")
            .arg(&self.config.output_dir)
            .output()
            .await?;

        if !output.status.success() {
            return Err(ConvertError::Failed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        tracing::info!("Conversion completed");
        Ok(())
    }
}
