//! Risk-score side artifact and its machine-readable report.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use solace_screening::RiskLevel;
use tracing::{info, warn};

use crate::error::ChatError;

/// Machine-readable summary: `{"overall_risk": "moderate"}` or
/// `{"overall_risk": null}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskReport {
    pub overall_risk: Option<String>,
}

impl RiskReport {
    pub fn new(level: Option<RiskLevel>) -> Self {
        Self {
            overall_risk: level.map(|l| l.as_str().to_string()),
        }
    }

    pub fn to_json(&self) -> String {
        // A struct of one optional string always serialises.
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"overall_risk":null}"#.to_string())
    }
}

/// Plain-text file holding the most recent overall risk level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskFile {
    path: PathBuf,
}

impl RiskFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the file with `level`.
    pub fn write(&self, level: RiskLevel) -> Result<(), ChatError> {
        let result = (|| -> std::io::Result<()> {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(&self.path, level.as_str())
        })();

        match result {
            Ok(()) => {
                info!(path = %self.path.display(), level = %level, "Risk score saved");
                Ok(())
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to save risk score");
                Err(ChatError::PersistenceFailure(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )))
            }
        }
    }

    /// Read the saved level. A missing file means no level has been saved.
    pub fn read(&self) -> Result<Option<RiskLevel>, ChatError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ChatError::PersistenceFailure(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        content
            .parse::<RiskLevel>()
            .map(Some)
            .map_err(|e| ChatError::PersistenceFailure(format!("{}: {}", self.path.display(), e)))
    }

    /// Build the report from whatever the file currently holds.
    pub fn report(&self) -> Result<RiskReport, ChatError> {
        Ok(RiskReport::new(self.read()?))
    }
}
