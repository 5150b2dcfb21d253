//! Pipeline module.
//!
//! This module provides the preprocessing pipeline and the stages it runs:
//! implausible-value filter, label encoding, one-hot encoding and IQR
//! outlier removal.

mod builder;
pub mod encoding;
pub mod filter;
pub mod outliers;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder};
pub use encoding::{LabelEncoder, OneHotEncoder};
pub use filter::ImplausibleValueFilter;
pub use outliers::{IqrBounds, OutlierRemover};
pub use progress::{
    ClosureProgressReporter, PreprocessingStage, ProgressReporter, ProgressUpdate,
};
