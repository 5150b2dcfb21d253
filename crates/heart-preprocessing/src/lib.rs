//! Heart-Disease Record Preprocessing Library
//!
//! Cleans a table of heart-disease clinical records into model-ready form,
//! built on Polars.
//!
//! # Overview
//!
//! One call runs four stages in a fixed order:
//!
//! 1. **Implausible-value filter**: drops rows with a zero `Cholesterol` or
//!    `RestingBP` (both columns are required)
//! 2. **Label encoding**: `Sex` and `ExerciseAngina` become integer codes
//!    assigned in sorted order; the fitted records are returned
//! 3. **One-hot encoding**: `ChestPainType`, `RestingECG` and `ST_Slope`
//!    become boolean indicator columns with the first category dropped
//! 4. **Outlier removal**: IQR fences on `RestingBP`, `Cholesterol`, `MaxHR`
//!    and `Oldpeak`, applied column by column so each column sees the rows
//!    the previous ones left
//!
//! Optional columns that are absent are skipped and reported in the run
//! summary; only a missing filter column aborts the run.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use heart_preprocessing::{preprocess, io};
//!
//! let df = io::load_csv("heart.csv")?;
//! let (cleaned, encoders) = preprocess(&df)?;
//!
//! println!("Sex codes: {:?}", encoders["Sex"].to_mapping());
//! io::write_csv(&cleaned, "processed_heart_data.csv")?;
//! ```
//!
//! # Configuration and Progress
//!
//! ```rust,ignore
//! use heart_preprocessing::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .outlier_columns(["Cholesterol", "RestingBP"])
//!     .build()?;
//!
//! let output = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process(&df)?;
//!
//! for step in output.summary.skipped() {
//!     println!("skipped {:?} on {}", step.stage, step.column);
//! }
//! ```

pub mod config;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod reporting;
pub mod types;
pub mod utils;

use polars::prelude::DataFrame;

// Re-exports for convenient access
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder};
pub use error::{PreprocessingError, Result as PreprocessingResult, ResultExt};
pub use pipeline::{
    ClosureProgressReporter, ImplausibleValueFilter, IqrBounds, LabelEncoder, OneHotEncoder,
    OutlierRemover, Pipeline, PipelineBuilder, PreprocessingStage, ProgressReporter,
    ProgressUpdate,
};
pub use reporting::RunReport;
pub use types::{
    ColumnEncoding, LabelEncoders, PreprocessingOutput, PreprocessingSummary, SkipReason,
    StepOutcome, StepReport, encoder_mappings,
};

/// Run the default pipeline on a copy of `df`.
///
/// Returns the cleaned table and the label-encoding records. The caller's
/// frame is left untouched.
///
/// # Errors
///
/// [`PreprocessingError::MissingRequiredColumn`] when `Cholesterol` or
/// `RestingBP` is absent.
pub fn preprocess(df: &DataFrame) -> PreprocessingResult<(DataFrame, LabelEncoders)> {
    let pipeline = Pipeline::builder().build()?;
    Ok(pipeline.process(df)?.into_parts())
}
