//! Configuration types for the preprocessing pipeline.
//!
//! The configuration names the columns each stage works on. Defaults are the
//! fixed heart-disease schema; the lists are explicit and ordered so the
//! outlier cascade never depends on a container's iteration order.
//! Numeric thresholds (the 1.5 IQR fence, the quartile levels) are constants
//! in [`crate::pipeline::outliers`] and are deliberately not configurable.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Columns whose zero values mark a physiologically implausible record.
pub const ZERO_FILTER_COLUMNS: [&str; 2] = ["Cholesterol", "RestingBP"];

/// Columns replaced by integer codes.
pub const LABEL_ENCODE_COLUMNS: [&str; 2] = ["Sex", "ExerciseAngina"];

/// Columns expanded into indicator columns.
pub const ONE_HOT_COLUMNS: [&str; 3] = ["ChestPainType", "RestingECG", "ST_Slope"];

/// Columns screened for outliers, in processing order.
pub const OUTLIER_COLUMNS: [&str; 4] = ["RestingBP", "Cholesterol", "MaxHR", "Oldpeak"];

fn to_owned_list(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

/// Configuration for the preprocessing pipeline.
///
/// Use [`PipelineConfig::builder()`] to override individual column lists.
///
/// # Example
///
/// ```rust,ignore
/// use heart_preprocessing::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .outlier_columns(["MaxHR", "Oldpeak"])
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Required numeric columns; rows where any of them equals zero are dropped.
    /// A missing column here is a hard error.
    /// Default: `Cholesterol`, `RestingBP`
    pub zero_filter_columns: Vec<String>,

    /// Optional columns to label-encode (sorted value -> 0..k-1).
    /// Default: `Sex`, `ExerciseAngina`
    pub label_encode_columns: Vec<String>,

    /// Optional columns to one-hot encode with the first sorted category dropped.
    /// Default: `ChestPainType`, `RestingECG`, `ST_Slope`
    pub one_hot_columns: Vec<String>,

    /// Optional numeric columns for IQR outlier removal, processed in this order.
    /// Default: `RestingBP`, `Cholesterol`, `MaxHR`, `Oldpeak`
    pub outlier_columns: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            zero_filter_columns: to_owned_list(&ZERO_FILTER_COLUMNS),
            label_encode_columns: to_owned_list(&LABEL_ENCODE_COLUMNS),
            one_hot_columns: to_owned_list(&ONE_HOT_COLUMNS),
            outlier_columns: to_owned_list(&OUTLIER_COLUMNS),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.zero_filter_columns.is_empty() {
            return Err(ConfigValidationError::NoRequiredColumns);
        }

        let lists = [
            ("zero_filter_columns", &self.zero_filter_columns),
            ("label_encode_columns", &self.label_encode_columns),
            ("one_hot_columns", &self.one_hot_columns),
            ("outlier_columns", &self.outlier_columns),
        ];

        for (field, columns) in lists {
            let mut seen = HashSet::new();
            for column in columns {
                if column.trim().is_empty() {
                    return Err(ConfigValidationError::EmptyColumnName {
                        field: field.to_string(),
                    });
                }
                if !seen.insert(column.as_str()) {
                    return Err(ConfigValidationError::DuplicateColumn {
                        field: field.to_string(),
                        column: column.clone(),
                    });
                }
            }
        }

        // A column cannot be both label-encoded and expanded into indicators.
        if let Some(column) = self
            .label_encode_columns
            .iter()
            .find(|c| self.one_hot_columns.contains(c))
        {
            return Err(ConfigValidationError::ConflictingEncoding(column.clone()));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("At least one zero-filter column is required")]
    NoRequiredColumns,

    #[error("Empty column name in '{field}'")]
    EmptyColumnName { field: String },

    #[error("Column '{column}' listed twice in '{field}'")]
    DuplicateColumn { field: String, column: String },

    #[error("Column '{0}' cannot be both label-encoded and one-hot encoded")]
    ConflictingEncoding(String),
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    zero_filter_columns: Option<Vec<String>>,
    label_encode_columns: Option<Vec<String>>,
    one_hot_columns: Option<Vec<String>>,
    outlier_columns: Option<Vec<String>>,
}

impl PipelineConfigBuilder {
    /// Set the required columns checked for implausible zeros.
    pub fn zero_filter_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.zero_filter_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the columns to label-encode.
    pub fn label_encode_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.label_encode_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the columns to one-hot encode.
    pub fn one_hot_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.one_hot_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the outlier columns.
    ///
    /// Order matters: each column's bounds are computed on the rows left
    /// after the previous columns were screened.
    pub fn outlier_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outlier_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            zero_filter_columns: self
                .zero_filter_columns
                .unwrap_or(defaults.zero_filter_columns),
            label_encode_columns: self
                .label_encode_columns
                .unwrap_or(defaults.label_encode_columns),
            one_hot_columns: self.one_hot_columns.unwrap_or(defaults.one_hot_columns),
            outlier_columns: self.outlier_columns.unwrap_or(defaults.outlier_columns),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.zero_filter_columns, vec!["Cholesterol", "RestingBP"]);
        assert_eq!(config.label_encode_columns, vec!["Sex", "ExerciseAngina"]);
        assert_eq!(
            config.one_hot_columns,
            vec!["ChestPainType", "RestingECG", "ST_Slope"]
        );
        assert_eq!(
            config.outlier_columns,
            vec!["RestingBP", "Cholesterol", "MaxHR", "Oldpeak"]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_defaults() {
        let config = PipelineConfig::builder().build().unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PipelineConfig::builder()
            .outlier_columns(["Oldpeak", "MaxHR"])
            .one_hot_columns(Vec::<String>::new())
            .build()
            .unwrap();

        assert_eq!(config.outlier_columns, vec!["Oldpeak", "MaxHR"]);
        assert!(config.one_hot_columns.is_empty());
        assert_eq!(config.label_encode_columns, vec!["Sex", "ExerciseAngina"]);
    }

    #[test]
    fn test_validation_no_required_columns() {
        let result = PipelineConfig::builder()
            .zero_filter_columns(Vec::<String>::new())
            .build();

        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::NoRequiredColumns
        ));
    }

    #[test]
    fn test_validation_duplicate_column() {
        let result = PipelineConfig::builder()
            .outlier_columns(["MaxHR", "Oldpeak", "MaxHR"])
            .build();

        match result.unwrap_err() {
            ConfigValidationError::DuplicateColumn { field, column } => {
                assert_eq!(field, "outlier_columns");
                assert_eq!(column, "MaxHR");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validation_empty_name() {
        let result = PipelineConfig::builder().label_encode_columns(["Sex", " "]).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::EmptyColumnName { .. }
        ));
    }

    #[test]
    fn test_validation_conflicting_encoding() {
        let result = PipelineConfig::builder()
            .label_encode_columns(["Sex", "ST_Slope"])
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::ConflictingEncoding(ref c) if c == "ST_Slope"
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "zero_filter_columns": ["Cholesterol"],
            "label_encode_columns": ["Sex"],
            "one_hot_columns": ["ChestPainType"],
            "outlier_columns": ["Oldpeak", "RestingBP"]
        }"#;

        let config: PipelineConfig = serde_json::from_str(json).expect("Should deserialize");
        assert!(config.validate().is_ok());
        assert_eq!(config.zero_filter_columns, vec!["Cholesterol"]);
        assert_eq!(config.outlier_columns, vec!["Oldpeak", "RestingBP"]);
    }
}
