//! IQR outlier removal.
//!
//! Columns are screened one at a time in the configured order. Each column's
//! quartiles are computed on the rows that survived the previous columns, and
//! its outliers are dropped before the next column is looked at. This
//! cascade is the reference behavior and changes results compared to
//! computing every column's bounds on the same table.

use crate::error::Result;
use crate::pipeline::progress::PreprocessingStage;
use crate::types::{SkipReason, StepReport};
use crate::utils::{has_column, is_numeric_dtype, keep_mask, numeric_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Fence width in interquartile ranges.
pub const IQR_MULTIPLIER: f64 = 1.5;
/// Lower quartile level.
pub const LOWER_QUANTILE: f64 = 0.25;
/// Upper quartile level.
pub const UPPER_QUANTILE: f64 = 0.75;

/// Quantile of ascending-sorted `sorted` by linear interpolation between
/// closest ranks: position `q * (n - 1)`.
pub fn quantile_linear(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Tukey fences for one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IqrBounds {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrBounds {
    /// Fences for `values`, ignoring nulls. `None` when there is nothing to measure.
    pub fn from_values(values: &[Option<f64>]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().flatten().copied().collect();
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile_linear(&sorted, LOWER_QUANTILE)?;
        let q3 = quantile_linear(&sorted, UPPER_QUANTILE)?;
        let iqr = q3 - q1;
        Some(Self {
            q1,
            q3,
            iqr,
            lower: q1 - IQR_MULTIPLIER * iqr,
            upper: q3 + IQR_MULTIPLIER * iqr,
        })
    }

    /// Strictly outside the fences. Values on a fence are kept.
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}

/// Removes rows whose value falls outside the IQR fences, column by column.
pub struct OutlierRemover;

impl OutlierRemover {
    /// Fences for `column` on the current frame and the per-row keep decision.
    ///
    /// Null rows are never outliers.
    pub fn detect(df: &DataFrame, column: &str) -> Result<Option<(IqrBounds, Vec<bool>)>> {
        let values = numeric_values(df.column(column)?.as_materialized_series())?;
        let Some(bounds) = IqrBounds::from_values(&values) else {
            return Ok(None);
        };
        let keep = values
            .iter()
            .map(|v| v.is_none_or(|x| !bounds.is_outlier(x)))
            .collect();
        Ok(Some((bounds, keep)))
    }

    /// Screen and prune a single column.
    pub fn remove_column(df: &mut DataFrame, column: &str) -> Result<StepReport> {
        let rows_before = df.height();

        if !has_column(df, column) {
            warn!("Column '{}' for outlier removal not found", column);
            return Ok(StepReport::skipped(
                PreprocessingStage::OutlierRemoval,
                column,
                SkipReason::MissingOptionalColumn,
                rows_before,
            ));
        }

        let dtype = df.column(column)?.dtype().clone();
        if !is_numeric_dtype(&dtype) {
            warn!("Column '{}' is not numeric ({}), skipping outlier removal", column, dtype);
            return Ok(StepReport::skipped(
                PreprocessingStage::OutlierRemoval,
                column,
                SkipReason::NonNumericColumn {
                    dtype: dtype.to_string(),
                },
                rows_before,
            ));
        }

        let Some((bounds, keep)) = Self::detect(df, column)? else {
            debug!("Column '{}' has no values, skipping outlier removal", column);
            return Ok(StepReport::skipped(
                PreprocessingStage::OutlierRemoval,
                column,
                SkipReason::NoValues,
                rows_before,
            ));
        };

        let outliers = keep.iter().filter(|k| !**k).count();
        if outliers > 0 {
            *df = df.filter(&keep_mask(&keep))?;
            info!(
                "Outliers removed from '{}' ({}). New shape: {:?}",
                column,
                outliers,
                df.shape()
            );
        } else {
            info!("No outliers found in '{}'", column);
        }

        Ok(StepReport::applied(
            PreprocessingStage::OutlierRemoval,
            column,
            rows_before,
            df.height(),
        )
        .with_details(format!(
            "Q1={}, Q3={}, IQR={}, bounds=[{}, {}]",
            bounds.q1, bounds.q3, bounds.iqr, bounds.lower, bounds.upper
        )))
    }

    /// Screen every column in `columns`, in order, cascading removals.
    pub fn apply(df: &mut DataFrame, columns: &[String]) -> Result<Vec<StepReport>> {
        info!("Applying outlier removal (IQR method)...");
        columns
            .iter()
            .map(|column| Self::remove_column(df, column))
            .collect()
    }
}
