//! Implausible-value filter.
//!
//! A resting blood pressure or serum cholesterol of zero is a recording
//! artefact, not a measurement. Rows carrying one are dropped before any
//! statistics are computed.

use crate::error::{PreprocessingError, Result};
use crate::pipeline::progress::PreprocessingStage;
use crate::types::{SkipReason, StepReport};
use crate::utils::{has_column, is_numeric_dtype, keep_mask, numeric_values};
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Drops rows where any required column equals zero.
pub struct ImplausibleValueFilter;

impl ImplausibleValueFilter {
    /// Filter `df` on every column in `columns`.
    ///
    /// Presence of every column is checked before any row is removed, so a
    /// missing column fails the call without touching `df`. Null values are
    /// not zero and their rows are kept. A column that does not hold numbers
    /// has no zero to match: no rows are dropped for it and the step is
    /// recorded as skipped.
    pub fn apply(df: &mut DataFrame, columns: &[String]) -> Result<Vec<StepReport>> {
        if let Some(missing) = columns.iter().find(|c| !has_column(df, c)) {
            return Err(PreprocessingError::MissingRequiredColumn(missing.clone()));
        }

        info!("Shape before 0-value filter ({}): {:?}", columns.join("/"), df.shape());

        let mut steps = Vec::with_capacity(columns.len());
        for column in columns {
            let rows_before = df.height();
            let dtype = df.column(column)?.dtype().clone();
            if !is_numeric_dtype(&dtype) {
                warn!(
                    "Column '{}' is not numeric ({}), no rows match the 0-value filter",
                    column, dtype
                );
                steps.push(StepReport::skipped(
                    PreprocessingStage::ZeroFilter,
                    column,
                    SkipReason::NonNumericColumn {
                        dtype: dtype.to_string(),
                    },
                    rows_before,
                ));
                continue;
            }

            let values = numeric_values(df.column(column)?.as_materialized_series())?;
            let keep: Vec<bool> = values.iter().map(|v| *v != Some(0.0)).collect();

            *df = df.filter(&keep_mask(&keep))?;

            let removed = rows_before - df.height();
            debug!("Removed {} rows with zero '{}'", removed, column);
            steps.push(
                StepReport::applied(PreprocessingStage::ZeroFilter, column, rows_before, df.height())
                    .with_details(format!("Removed {} rows with {} == 0", removed, column)),
            );
        }

        info!("Shape after 0-value filter: {:?}", df.shape());
        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StepOutcome;

    fn required() -> Vec<String> {
        vec!["Cholesterol".to_string(), "RestingBP".to_string()]
    }

    #[test]
    fn test_removes_zero_rows() {
        let mut df = df![
            "Cholesterol" => [289, 0, 283, 214, 0, 195, 339, 237, 208, 207],
            "RestingBP" => [140, 160, 130, 138, 150, 120, 130, 110, 140, 120],
        ]
        .unwrap();

        let steps = ImplausibleValueFilter::apply(&mut df, &required()).unwrap();

        assert_eq!(df.height(), 8);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].rows_removed(), 2);
        assert_eq!(steps[1].rows_removed(), 0);
    }

    #[test]
    fn test_zero_in_either_column_removes_row() {
        let mut df = df![
            "Cholesterol" => [200.0, 0.0, 180.0, 220.0],
            "RestingBP" => [120.0, 130.0, 0.0, 140.0],
            "Age" => [40, 50, 60, 70],
        ]
        .unwrap();

        ImplausibleValueFilter::apply(&mut df, &required()).unwrap();

        let ages: Vec<Option<i32>> = df.column("Age").unwrap().i32().unwrap().into_iter().collect();
        assert_eq!(ages, vec![Some(40), Some(70)]);

        let chol = df.column("Cholesterol").unwrap().f64().unwrap();
        let bp = df.column("RestingBP").unwrap().f64().unwrap();
        assert!(chol.min().unwrap() > 0.0);
        assert!(bp.min().unwrap() > 0.0);
    }

    #[test]
    fn test_keeps_null_rows() {
        let mut df = df![
            "Cholesterol" => [Some(200), None, Some(0)],
            "RestingBP" => [Some(120), Some(130), Some(140)],
        ]
        .unwrap();

        ImplausibleValueFilter::apply(&mut df, &required()).unwrap();
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_missing_required_column_fails() {
        let mut df = df![
            "Cholesterol" => [0, 200],
        ]
        .unwrap();

        let result = ImplausibleValueFilter::apply(&mut df, &required());
        assert!(matches!(
            result.unwrap_err(),
            PreprocessingError::MissingRequiredColumn(ref c) if c == "RestingBP"
        ));
        // Nothing was removed before the schema check failed.
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_non_numeric_column_matches_nothing() {
        let mut df = df![
            "Cholesterol" => ["high", "0", "200"],
            "RestingBP" => [120, 0, 130],
        ]
        .unwrap();

        let steps = ImplausibleValueFilter::apply(&mut df, &required()).unwrap();

        // The text "0" is not the number zero; only RestingBP removes a row.
        assert!(matches!(
            steps[0].outcome,
            StepOutcome::Skipped(SkipReason::NonNumericColumn { .. })
        ));
        assert_eq!(steps[0].rows_removed(), 0);
        assert_eq!(steps[1].rows_removed(), 1);
        let chol: Vec<Option<&str>> =
            df.column("Cholesterol").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(chol, vec![Some("high"), Some("200")]);
    }

    #[test]
    fn test_empty_table() {
        let mut df = df![
            "Cholesterol" => Vec::<i64>::new(),
            "RestingBP" => Vec::<i64>::new(),
        ]
        .unwrap();

        let steps = ImplausibleValueFilter::apply(&mut df, &required()).unwrap();
        assert_eq!(df.height(), 0);
        assert!(steps.iter().all(|s| s.rows_removed() == 0));
    }
}
