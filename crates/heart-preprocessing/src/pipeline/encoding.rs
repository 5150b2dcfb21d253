//! Categorical encoders.
//!
//! Both encoders derive their category order from an explicit
//! sort-and-enumerate step over the observed values: numeric columns sort
//! numerically, everything else sorts by string. Code assignment therefore
//! never depends on hash or insertion order.

use crate::error::Result;
use crate::pipeline::progress::PreprocessingStage;
use crate::types::{ColumnEncoding, LabelEncoders, SkipReason, StepReport};
use crate::utils::{has_column, is_numeric_dtype};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Column values rendered as category keys. Nulls stay `None`.
fn category_keys(series: &Series) -> Result<Vec<Option<String>>> {
    let as_string = series.cast(&DataType::String)?;
    Ok(as_string
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Distinct non-null categories of `series` in ascending order.
pub fn sorted_categories(series: &Series) -> Result<Vec<String>> {
    let keys = category_keys(series)?;

    if is_numeric_dtype(series.dtype()) {
        let as_float = series.cast(&DataType::Float64)?;
        let mut pairs: Vec<(f64, String)> = as_float
            .f64()?
            .into_iter()
            .zip(keys)
            .filter_map(|(value, key)| Some((value?, key?)))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        pairs.dedup_by(|a, b| a.1 == b.1);
        return Ok(pairs.into_iter().map(|(_, key)| key).collect());
    }

    let mut categories: Vec<String> = keys.into_iter().flatten().collect();
    categories.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    categories.dedup();
    Ok(categories)
}

/// Replaces categorical values with integer codes `0..k-1`.
pub struct LabelEncoder;

impl LabelEncoder {
    /// Fit the sorted categories of `column` and replace it with `UInt32` codes.
    pub fn fit_transform(df: &mut DataFrame, column: &str) -> Result<ColumnEncoding> {
        let series = df.column(column)?.as_materialized_series().clone();
        let categories = sorted_categories(&series)?;
        let encoding = ColumnEncoding::new(column, categories);

        let lookup: HashMap<&str, u32> = encoding
            .categories
            .iter()
            .enumerate()
            .map(|(code, value)| (value.as_str(), code as u32))
            .collect();

        let codes: Vec<Option<u32>> = category_keys(&series)?
            .iter()
            .map(|key| key.as_deref().and_then(|k| lookup.get(k).copied()))
            .collect();

        df.replace(column, Series::new(column.into(), codes))?;
        Ok(encoding)
    }

    /// Encode every present column in `columns`; absent ones are skipped.
    pub fn apply(
        df: &mut DataFrame,
        columns: &[String],
    ) -> Result<(LabelEncoders, Vec<StepReport>)> {
        info!("Applying label encoding...");
        let mut encoders = LabelEncoders::new();
        let mut steps = Vec::with_capacity(columns.len());

        for column in columns {
            let rows = df.height();
            if !has_column(df, column) {
                warn!("Column '{}' for label encoding not found", column);
                steps.push(StepReport::skipped(
                    PreprocessingStage::LabelEncoding,
                    column,
                    SkipReason::MissingOptionalColumn,
                    rows,
                ));
                continue;
            }

            let encoding = Self::fit_transform(df, column)?;
            let assigned = encoding
                .categories
                .iter()
                .enumerate()
                .map(|(code, value)| format!("{}={}", value, code))
                .collect::<Vec<_>>()
                .join(", ");
            debug!("Label encoded '{}': {}", column, assigned);

            steps.push(
                StepReport::applied(PreprocessingStage::LabelEncoding, column, rows, rows)
                    .with_details(assigned),
            );
            encoders.insert(column.clone(), encoding);
        }

        Ok((encoders, steps))
    }
}

/// Expands categorical columns into boolean indicators, dropping the first
/// sorted category as the baseline.
pub struct OneHotEncoder;

impl OneHotEncoder {
    /// Name of the indicator column for `category` of `column`.
    pub fn indicator_name(column: &str, category: &str) -> String {
        format!("{}_{}", column, category)
    }

    /// Replace `column` with `k-1` indicator columns appended at the end of
    /// the frame. Returns the indicator names.
    ///
    /// A frame column already carrying an indicator's name is overwritten in
    /// place by the indicator.
    pub fn encode_column(df: &mut DataFrame, column: &str) -> Result<Vec<String>> {
        let series = df.drop_in_place(column)?.take_materialized_series();
        let categories = sorted_categories(&series)?;
        let keys = category_keys(&series)?;

        let mut added = Vec::with_capacity(categories.len().saturating_sub(1));
        for category in categories.iter().skip(1) {
            let name = Self::indicator_name(column, category);
            if has_column(df, &name) {
                warn!(
                    "One-hot indicator '{}' replaces an existing column of the same name",
                    name
                );
            }
            let flags: Vec<bool> = keys
                .iter()
                .map(|key| key.as_deref() == Some(category.as_str()))
                .collect();
            df.with_column(Series::new(name.as_str().into(), flags))?;
            added.push(name);
        }

        Ok(added)
    }

    /// Encode every present column in `columns`; absent ones are skipped and
    /// the frame passes through unchanged when none are present.
    pub fn apply(df: &mut DataFrame, columns: &[String]) -> Result<Vec<StepReport>> {
        info!("Applying one-hot encoding...");
        let mut steps = Vec::with_capacity(columns.len());
        let mut encoded = Vec::new();

        for column in columns {
            let rows = df.height();
            if !has_column(df, column) {
                debug!("Column '{}' for one-hot encoding not found", column);
                steps.push(StepReport::skipped(
                    PreprocessingStage::OneHotEncoding,
                    column,
                    SkipReason::MissingOptionalColumn,
                    rows,
                ));
                continue;
            }

            let added = Self::encode_column(df, column)?;
            steps.push(
                StepReport::applied(PreprocessingStage::OneHotEncoding, column, rows, rows)
                    .with_details(format!("Added {}", added.join(", "))),
            );
            encoded.push(column.as_str());
        }

        if encoded.is_empty() {
            info!("No specified columns found for one-hot encoding");
        } else {
            info!("One-hot encoded: {:?}", encoded);
            info!("Shape after one-hot encoding: {:?}", df.shape());
        }

        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StepOutcome;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn names(df: &DataFrame) -> Vec<String> {
        df.get_column_names().iter().map(|c| c.to_string()).collect()
    }

    fn u32_values(df: &DataFrame, column: &str) -> Vec<Option<u32>> {
        df.column(column).unwrap().u32().unwrap().into_iter().collect()
    }

    #[test]
    fn test_sorted_categories_strings() {
        let series = Series::new("ChestPainType".into(), &["ATA", "NAP", "ASY", "TA", "ATA"]);
        assert_eq!(
            sorted_categories(&series).unwrap(),
            vec!["ASY", "ATA", "NAP", "TA"]
        );
    }

    #[test]
    fn test_sorted_categories_numeric_order() {
        // Lexicographic order would put 10 before 9.
        let series = Series::new("grade".into(), &[10i64, 9, 2, 9]);
        assert_eq!(sorted_categories(&series).unwrap(), vec!["2", "9", "10"]);
    }

    #[test]
    fn test_label_encode_sex() {
        let mut df = df!["Sex" => ["M", "F", "M", "M", "F"]].unwrap();

        let (encoders, steps) = LabelEncoder::apply(&mut df, &columns(&["Sex"])).unwrap();

        assert_eq!(
            u32_values(&df, "Sex"),
            vec![Some(1), Some(0), Some(1), Some(1), Some(0)]
        );
        let encoding = &encoders["Sex"];
        assert_eq!(encoding.code_of("F"), Some(0));
        assert_eq!(encoding.code_of("M"), Some(1));
        assert_eq!(steps[0].outcome, StepOutcome::Applied);
    }

    #[test]
    fn test_label_codes_are_dense() {
        let mut df = df!["ExerciseAngina" => ["Y", "N", "N", "Y", "N", "N"]].unwrap();

        let (encoders, _) = LabelEncoder::apply(&mut df, &columns(&["ExerciseAngina"])).unwrap();

        let k = encoders["ExerciseAngina"].len() as u32;
        let mut codes: Vec<u32> = u32_values(&df, "ExerciseAngina").into_iter().flatten().collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes, (0..k).collect::<Vec<_>>());
    }

    #[test]
    fn test_label_encode_leaves_other_columns() {
        let mut df = df![
            "Sex" => ["M", "F"],
            "Age" => [40i64, 49],
        ]
        .unwrap();

        LabelEncoder::apply(&mut df, &columns(&["Sex"])).unwrap();

        let ages: Vec<Option<i64>> = df.column("Age").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(ages, vec![Some(40), Some(49)]);
        assert_eq!(names(&df), vec!["Sex", "Age"]);
    }

    #[test]
    fn test_label_encode_missing_column_skipped() {
        let mut df = df!["Sex" => ["M", "F"]].unwrap();

        let (encoders, steps) =
            LabelEncoder::apply(&mut df, &columns(&["Sex", "ExerciseAngina"])).unwrap();

        assert_eq!(encoders.len(), 1);
        assert_eq!(
            steps[1].outcome,
            StepOutcome::Skipped(SkipReason::MissingOptionalColumn)
        );
    }

    #[test]
    fn test_label_encode_keeps_nulls() {
        let mut df = df!["Sex" => [Some("M"), None, Some("F")]].unwrap();

        let (encoders, _) = LabelEncoder::apply(&mut df, &columns(&["Sex"])).unwrap();

        assert_eq!(encoders["Sex"].len(), 2);
        assert_eq!(u32_values(&df, "Sex"), vec![Some(1), None, Some(0)]);
    }

    #[test]
    fn test_one_hot_chest_pain() {
        let mut df = df![
            "Age" => [40i64, 49, 37, 48, 54],
            "ChestPainType" => ["ATA", "NAP", "ATA", "ASY", "TA"],
        ]
        .unwrap();

        let steps = OneHotEncoder::apply(&mut df, &columns(&["ChestPainType"])).unwrap();

        assert_eq!(
            names(&df),
            vec![
                "Age",
                "ChestPainType_ATA",
                "ChestPainType_NAP",
                "ChestPainType_TA"
            ]
        );
        let ata: Vec<Option<bool>> = df
            .column("ChestPainType_ATA")
            .unwrap()
            .bool()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(
            ata,
            vec![Some(true), Some(false), Some(true), Some(false), Some(false)]
        );
        assert_eq!(df.height(), 5);
        assert!(steps[0].outcome.is_applied());
    }

    #[test]
    fn test_one_hot_cardinality() {
        let mut df = df![
            "RestingECG" => ["Normal", "ST", "LVH", "Normal"],
            "ST_Slope" => ["Up", "Flat", "Up", "Down"],
        ]
        .unwrap();
        let width_before = df.width();

        OneHotEncoder::apply(&mut df, &columns(&["RestingECG", "ST_Slope"])).unwrap();

        // 3 categories each: -2 source columns, +2 +2 indicators.
        assert_eq!(df.width(), width_before - 2 + 2 + 2);
        assert!(!has_column(&df, "RestingECG"));
        assert!(has_column(&df, "ST_Slope_Flat"));
        assert!(has_column(&df, "ST_Slope_Up"));
        assert!(!has_column(&df, "ST_Slope_Down"));
    }

    #[test]
    fn test_one_hot_missing_column_skipped() {
        let mut df = df!["ChestPainType" => ["ATA", "NAP"]].unwrap();

        let steps =
            OneHotEncoder::apply(&mut df, &columns(&["ChestPainType", "ST_Slope"])).unwrap();

        assert!(!names(&df).iter().any(|c| c.starts_with("ST_Slope_")));
        assert_eq!(
            steps[1].outcome,
            StepOutcome::Skipped(SkipReason::MissingOptionalColumn)
        );
    }

    #[test]
    fn test_one_hot_no_target_columns_passes_through() {
        let mut df = df!["Age" => [40i64, 49]].unwrap();
        let before = df.clone();

        let steps =
            OneHotEncoder::apply(&mut df, &columns(&["ChestPainType", "RestingECG"])).unwrap();

        assert!(df.equals(&before));
        assert!(steps.iter().all(|s| !s.outcome.is_applied()));
    }

    #[test]
    fn test_one_hot_indicator_overwrites_same_named_column() {
        let mut df = df![
            "ST_Slope_Up" => [7i64, 8, 9],
            "ST_Slope" => ["Up", "Flat", "Up"],
        ]
        .unwrap();

        let added = OneHotEncoder::encode_column(&mut df, "ST_Slope").unwrap();

        assert_eq!(added, vec!["ST_Slope_Up"]);
        assert_eq!(names(&df), vec!["ST_Slope_Up"]);
        let up: Vec<Option<bool>> = df
            .column("ST_Slope_Up")
            .unwrap()
            .bool()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(up, vec![Some(true), Some(false), Some(true)]);
    }

    #[test]
    fn test_one_hot_single_category_drops_column() {
        let mut df = df![
            "Age" => [40i64, 49],
            "ST_Slope" => ["Up", "Up"],
        ]
        .unwrap();

        OneHotEncoder::apply(&mut df, &columns(&["ST_Slope"])).unwrap();
        assert_eq!(names(&df), vec!["Age"]);
    }
}
