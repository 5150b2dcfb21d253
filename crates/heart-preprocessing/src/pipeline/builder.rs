//! Main preprocessing pipeline module.
//!
//! This module provides the `Pipeline` struct and builder that thread one
//! table through the four cleaning stages in fixed order.

use crate::config::{ConfigValidationError, PipelineConfig};
use crate::error::{Result, ResultExt};
use crate::pipeline::encoding::{LabelEncoder, OneHotEncoder};
use crate::pipeline::filter::ImplausibleValueFilter;
use crate::pipeline::outliers::OutlierRemover;
use crate::pipeline::progress::{
    ClosureProgressReporter, PreprocessingStage, ProgressReporter, ProgressUpdate,
};
use crate::types::{PreprocessingOutput, PreprocessingSummary, StepReport};
use polars::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// The preprocessing pipeline.
///
/// Use [`Pipeline::builder()`] to create a pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use heart_preprocessing::{Pipeline, PipelineConfig};
///
/// let output = Pipeline::builder()
///     .config(PipelineConfig::default())
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .process(&dataframe)?;
///
/// let (cleaned, encoders) = output.into_parts();
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

// Each call to `process` works on its own copy of the table, so one pipeline
// can be shared across threads.
static_assertions::assert_impl_all!(Pipeline: Send, Sync);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// The configuration this pipeline runs with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the four stages on a copy of `df`.
    ///
    /// The caller's frame is never modified. On error no partial output is
    /// returned.
    ///
    /// # Errors
    ///
    /// [`PreprocessingError::MissingRequiredColumn`](crate::PreprocessingError::MissingRequiredColumn)
    /// if a zero-filter column is absent. Absent optional columns are not
    /// errors; they show up as skipped steps in the summary.
    pub fn process(&self, df: &DataFrame) -> Result<PreprocessingOutput> {
        match self.process_internal(df.clone()) {
            Ok(output) => {
                self.report_progress(ProgressUpdate::complete("Preprocessing steps completed"));
                Ok(output)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn report_steps(&self, stage: PreprocessingStage, steps: &[StepReport]) {
        let total = steps.len();
        for (idx, step) in steps.iter().enumerate() {
            let message = match &step.outcome {
                crate::types::StepOutcome::Applied => {
                    format!("{}: {}", stage.display_name(), step.column)
                }
                crate::types::StepOutcome::Skipped(reason) => reason.describe(&step.column),
            };
            self.report_progress(ProgressUpdate::for_column(
                stage,
                step.column.clone(),
                idx + 1,
                total,
                message,
            ));
        }
    }

    fn process_internal(&self, mut df: DataFrame) -> Result<PreprocessingOutput> {
        let start_time = Instant::now();

        info!("Starting preprocessing pipeline...");
        self.report_progress(ProgressUpdate::new(
            PreprocessingStage::Initializing,
            0.0,
            "Starting preprocessing pipeline...",
        ));

        let mut summary = PreprocessingSummary::new();
        summary.rows_before = df.height();
        summary.columns_before = df.width();

        // Step 1: implausible values (hard-required columns)
        self.report_progress(ProgressUpdate::new(
            PreprocessingStage::ZeroFilter,
            0.0,
            "Filtering implausible zero values...",
        ));
        let steps = ImplausibleValueFilter::apply(&mut df, &self.config.zero_filter_columns)
            .context("Implausible-value filter")?;
        self.report_steps(PreprocessingStage::ZeroFilter, &steps);
        summary.extend_steps(steps);

        // Step 2: label encoding
        let (encoders, steps) =
            LabelEncoder::apply(&mut df, &self.config.label_encode_columns)
                .context("Label encoding")?;
        self.report_steps(PreprocessingStage::LabelEncoding, &steps);
        summary.extend_steps(steps);

        // Step 3: one-hot encoding
        let steps = OneHotEncoder::apply(&mut df, &self.config.one_hot_columns)
            .context("One-hot encoding")?;
        self.report_steps(PreprocessingStage::OneHotEncoding, &steps);
        summary.extend_steps(steps);

        // Step 4: outlier removal, cascading in configured order
        let steps = OutlierRemover::apply(&mut df, &self.config.outlier_columns)
            .context("Outlier removal")?;
        self.report_steps(PreprocessingStage::OutlierRemoval, &steps);
        summary.extend_steps(steps);

        summary.rows_after = df.height();
        summary.columns_after = df.width();
        summary.duration_ms = start_time.elapsed().as_millis() as u64;

        info!("Preprocessing steps completed.");
        info!("Final shape of processed data: {:?}", df.shape());

        Ok(PreprocessingOutput {
            data: df,
            encoders,
            summary,
        })
    }
}

/// Builder for creating a [`Pipeline`] instance.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PreprocessingError;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn heart_rows() -> DataFrame {
        df![
            "Age" => [40i64, 49, 37, 48, 54, 39],
            "Sex" => ["M", "F", "M", "F", "M", "M"],
            "ChestPainType" => ["ATA", "NAP", "ATA", "ASY", "NAP", "NAP"],
            "RestingBP" => [140i64, 160, 130, 138, 150, 120],
            "Cholesterol" => [289i64, 180, 283, 214, 0, 339],
            "MaxHR" => [172i64, 156, 98, 108, 122, 170],
            "ExerciseAngina" => ["N", "N", "N", "Y", "N", "N"],
            "Oldpeak" => [0.0, 1.0, 0.0, 1.5, 0.0, 0.0],
        ]
        .unwrap()
    }

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = Pipeline::builder().build().unwrap();
        assert_eq!(pipeline.config(), &PipelineConfig::default());
        assert!(pipeline.progress_reporter.is_none());
    }

    #[test]
    fn test_pipeline_builder_rejects_invalid_config() {
        let config = PipelineConfig {
            zero_filter_columns: Vec::new(),
            ..PipelineConfig::default()
        };
        assert!(Pipeline::builder().config(config).build().is_err());
    }

    #[test]
    fn test_process_does_not_mutate_input() {
        let df = heart_rows();
        let before = df.clone();

        let output = Pipeline::builder().build().unwrap().process(&df).unwrap();

        assert!(df.equals(&before));
        assert_eq!(output.summary.rows_before, 6);
        assert!(output.data.height() <= 5);
    }

    #[test]
    fn test_process_missing_required_column() {
        let df = heart_rows().drop("RestingBP").unwrap();

        let err = Pipeline::builder().build().unwrap().process(&df).unwrap_err();

        assert_eq!(err.error_code(), "SCHEMA_ERROR");
        assert!(matches!(err, PreprocessingError::WithContext { .. }));
    }

    #[test]
    fn test_stage_order_in_summary() {
        let output = Pipeline::builder()
            .build()
            .unwrap()
            .process(&heart_rows())
            .unwrap();

        let stages: Vec<PreprocessingStage> =
            output.summary.steps.iter().map(|s| s.stage).collect();
        let mut sorted = stages.clone();
        sorted.sort_by_key(|s| s.base_progress().to_bits());
        assert_eq!(stages, sorted);

        // RestingECG and ST_Slope are absent from the fixture.
        let skipped: Vec<&str> = output
            .summary
            .skipped()
            .map(|s| s.column.as_str())
            .collect();
        assert_eq!(skipped, vec!["RestingECG", "ST_Slope"]);
    }

    #[test]
    fn test_progress_callback_receives_updates() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();
        let last_stage = Arc::new(Mutex::new(None));
        let last_stage_clone = last_stage.clone();

        let pipeline = Pipeline::builder()
            .on_progress(move |update| {
                call_count_clone.fetch_add(1, Ordering::SeqCst);
                *last_stage_clone.lock().unwrap() = Some(update.stage);
            })
            .build()
            .unwrap();

        pipeline.process(&heart_rows()).unwrap();

        assert!(call_count.load(Ordering::SeqCst) > 4);
        assert_eq!(
            *last_stage.lock().unwrap(),
            Some(PreprocessingStage::Complete)
        );
    }

    #[test]
    fn test_failure_reported_to_progress() {
        let last_stage = Arc::new(Mutex::new(None));
        let last_stage_clone = last_stage.clone();

        let pipeline = Pipeline::builder()
            .on_progress(move |update| {
                *last_stage_clone.lock().unwrap() = Some(update.stage);
            })
            .build()
            .unwrap();

        let df = heart_rows().drop("Cholesterol").unwrap();
        assert!(pipeline.process(&df).is_err());
        assert_eq!(*last_stage.lock().unwrap(), Some(PreprocessingStage::Failed));
    }
}
