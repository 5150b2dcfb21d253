//! Run report.
//!
//! A [`RunReport`] is the single structure behind both `--json` (printed to
//! stdout) and `--emit-report` (written to a file).

use crate::error::Result;
use crate::types::{LabelEncoders, PreprocessingOutput, PreprocessingSummary};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Everything worth keeping about one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Local time the report was built.
    pub generated_at: String,
    /// Path the input table was read from.
    pub input_file: String,
    /// Path the cleaned table was written to, if it was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    /// Cleaned table shape as `(rows, columns)`.
    pub output_shape: (usize, usize),
    /// Final column names in order.
    pub output_columns: Vec<String>,
    pub summary: PreprocessingSummary,
    /// Fitted label encodings.
    pub encoders: LabelEncoders,
}

impl RunReport {
    /// Build a report from a finished run.
    pub fn new(
        input_file: impl Into<String>,
        output_file: Option<String>,
        output: &PreprocessingOutput,
    ) -> Self {
        Self {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.into(),
            output_file,
            output_shape: output.data.shape(),
            output_columns: output
                .data
                .get_column_names()
                .into_iter()
                .map(|c| c.to_string())
                .collect(),
            summary: output.summary.clone(),
            encoders: output.encoders.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty-printed JSON, creating parent directories.
    pub fn write_report(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = File::create(path)?;
        file.write_all(self.to_json()?.as_bytes())?;

        info!("Report saved: {}", path.display());
        Ok(())
    }
}
