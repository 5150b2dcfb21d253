use crate::error::{PreprocessingError, Result};
use crate::pipeline::progress::PreprocessingStage;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Encoding Records
// ============================================================================

/// Value -> code record for one label-encoded column.
///
/// Categories are stored in code order: the category at index `i` was
/// assigned code `i`. Codes follow the ascending sort of the observed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnEncoding {
    /// Name of the encoded column.
    pub column: String,
    /// Observed categories, indexed by their code.
    pub categories: Vec<String>,
}

impl ColumnEncoding {
    /// Create a record from categories already in code order.
    pub fn new(column: impl Into<String>, categories: Vec<String>) -> Self {
        Self {
            column: column.into(),
            categories,
        }
    }

    /// Number of distinct categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Code assigned to `value`, if it was observed.
    pub fn code_of(&self, value: &str) -> Option<u32> {
        self.categories
            .iter()
            .position(|c| c == value)
            .map(|idx| idx as u32)
    }

    /// Category behind `code`.
    pub fn value_of(&self, code: u32) -> Option<&str> {
        self.categories.get(code as usize).map(String::as_str)
    }

    /// The record as a value -> code mapping.
    pub fn to_mapping(&self) -> BTreeMap<String, u32> {
        self.categories
            .iter()
            .enumerate()
            .map(|(code, value)| (value.clone(), code as u32))
            .collect()
    }

    /// Map an encoded column back to its original string values.
    ///
    /// Nulls stay null. A code outside the record is an error.
    pub fn decode_series(&self, codes: &Series) -> Result<Series> {
        let codes = codes.cast(&DataType::UInt32)?;
        let mut decoded: Vec<Option<&str>> = Vec::with_capacity(codes.len());
        for code in codes.u32()?.into_iter() {
            match code {
                Some(code) => {
                    let value = self.value_of(code).ok_or_else(|| {
                        PreprocessingError::Internal(format!(
                            "code {} is not defined for column '{}'",
                            code, self.column
                        ))
                    })?;
                    decoded.push(Some(value));
                }
                None => decoded.push(None),
            }
        }
        Ok(Series::new(codes.name().clone(), decoded))
    }
}

/// Encoding records for every column the label encoder touched, keyed by column.
pub type LabelEncoders = BTreeMap<String, ColumnEncoding>;

/// Flatten encoders into `column -> (value -> code)`.
pub fn encoder_mappings(encoders: &LabelEncoders) -> BTreeMap<String, BTreeMap<String, u32>> {
    encoders
        .iter()
        .map(|(column, encoding)| (column.clone(), encoding.to_mapping()))
        .collect()
}

// ============================================================================
// Per-column Step Outcomes
// ============================================================================

/// Why a column step was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The optional column is not in the table.
    MissingOptionalColumn,
    /// The column exists but is not numeric, so there is nothing to compare.
    NonNumericColumn { dtype: String },
    /// The column has no non-null values to compute statistics from.
    NoValues,
}

impl SkipReason {
    pub fn describe(&self, column: &str) -> String {
        match self {
            Self::MissingOptionalColumn => format!("Column '{}' not found", column),
            Self::NonNumericColumn { dtype } => {
                format!("Column '{}' is not numeric ({})", column, dtype)
            }
            Self::NoValues => format!("Column '{}' has no values", column),
        }
    }
}

/// Result of applying one stage to one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Applied,
    Skipped(SkipReason),
}

impl StepOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Audit entry for one column of one stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    /// Stage that produced the entry.
    pub stage: PreprocessingStage,
    /// Column the stage worked on.
    pub column: String,
    /// Whether the step ran or why it was skipped.
    pub outcome: StepOutcome,
    /// Rows in the table before the step.
    pub rows_before: usize,
    /// Rows in the table after the step.
    pub rows_after: usize,
    /// Human-readable note (codes assigned, bounds used, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl StepReport {
    /// Report for a step that ran.
    pub fn applied(
        stage: PreprocessingStage,
        column: impl Into<String>,
        rows_before: usize,
        rows_after: usize,
    ) -> Self {
        Self {
            stage,
            column: column.into(),
            outcome: StepOutcome::Applied,
            rows_before,
            rows_after,
            details: None,
        }
    }

    /// Report for a step that was skipped; the table is unchanged.
    pub fn skipped(
        stage: PreprocessingStage,
        column: impl Into<String>,
        reason: SkipReason,
        rows: usize,
    ) -> Self {
        Self {
            stage,
            column: column.into(),
            outcome: StepOutcome::Skipped(reason),
            rows_before: rows,
            rows_after: rows,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }
}

// ============================================================================
// Run Summary
// ============================================================================

/// What one pipeline run did, stage by stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreprocessingSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    pub rows_before: usize,
    pub rows_after: usize,

    pub columns_before: usize,
    pub columns_after: usize,

    /// Per-column audit trail in execution order.
    pub steps: Vec<StepReport>,

    /// Warnings for skipped optional columns.
    pub warnings: Vec<String>,
}

impl PreprocessingSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a step; skipped steps also produce a warning.
    pub fn add_step(&mut self, step: StepReport) {
        if let StepOutcome::Skipped(reason) = &step.outcome {
            self.warnings.push(format!(
                "{}: {}",
                step.stage.display_name(),
                reason.describe(&step.column)
            ));
        }
        self.steps.push(step);
    }

    pub fn extend_steps(&mut self, steps: impl IntoIterator<Item = StepReport>) {
        for step in steps {
            self.add_step(step);
        }
    }

    /// Steps that ran.
    pub fn applied(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|s| s.outcome.is_applied())
    }

    /// Steps that were skipped.
    pub fn skipped(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|s| !s.outcome.is_applied())
    }

    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }

    /// Rows removed by one stage.
    pub fn rows_removed_by(&self, stage: PreprocessingStage) -> usize {
        self.steps
            .iter()
            .filter(|s| s.stage == stage)
            .map(StepReport::rows_removed)
            .sum()
    }

    pub fn rows_removed_percentage(&self) -> f32 {
        if self.rows_before == 0 {
            0.0
        } else {
            (self.rows_removed() as f32 / self.rows_before as f32) * 100.0
        }
    }
}

/// Cleaned table plus the metadata of the run that produced it.
#[derive(Debug, Clone)]
pub struct PreprocessingOutput {
    pub data: DataFrame,
    pub encoders: LabelEncoders,
    pub summary: PreprocessingSummary,
}

impl PreprocessingOutput {
    /// Split into `(cleaned, encoders)`.
    pub fn into_parts(self) -> (DataFrame, LabelEncoders) {
        (self.data, self.encoders)
    }
}

// ============================================================================
// Tests
// ============================================================================
