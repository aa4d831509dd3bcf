//! Wire types for the scanner's `--json test` output. The scanner evolves
//! independently of this crate, so decoding tolerates unknown fields and
//! unrecognized severity labels.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Severity scale reported by the scanner, ordered from least to most severe.
///
/// Labels the scanner may introduce later decode as `Unknown`, which sorts
/// below everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Unknown,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Map a scanner-reported label onto the scale, case-insensitively.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            "critical" => Self::Critical,
            _ => Self::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Ok(Self::parse(&label))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unknown => "Unknown",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        };
        write!(f, "{label}")
    }
}

/// One known vulnerability in a scanned dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub title: String,
    pub severity: Severity,
    pub package_name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
}

/// Decoded outcome of one scan.
///
/// `ok` tells the two response shapes apart: a successful scan carries
/// `issues`, a failed one carries `error_message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub ok: bool,
    #[serde(rename = "vulnerabilities", default)]
    pub issues: Vec<Issue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(rename = "error", default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ScanResult {
    /// Successful scan with the given findings.
    pub fn success(issues: Vec<Issue>) -> Self {
        Self {
            ok: true,
            issues,
            summary: None,
            error_message: None,
        }
    }

    /// Scan the tool itself reported as failed.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            issues: Vec::new(),
            summary: None,
            error_message: Some(message.into()),
        }
    }

    /// Successful scan with no findings.
    pub fn is_clean(&self) -> bool {
        self.ok && self.issues.is_empty()
    }

    /// Decode raw scanner stdout.
    ///
    /// A failure result must carry a non-blank error message; a success
    /// result never carries one. Findings attached to a failure result are
    /// dropped since a failed scan asserts nothing about the project.
    pub fn from_json(raw: &str) -> Result<Self, DecodeError> {
        let mut result: Self = serde_json::from_str(raw)?;
        if result.ok {
            result.error_message = None;
        } else {
            result.issues.clear();
            match &result.error_message {
                Some(message) if !message.trim().is_empty() => {}
                _ => return Err(DecodeError::MissingErrorMessage),
            }
        }
        Ok(result)
    }
}

/// Scanner output that could not be turned into a [`ScanResult`].
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("scanner output was not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("scan result reported failure without an error message")]
    MissingErrorMessage,
}
