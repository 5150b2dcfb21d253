//! CSV loading and saving at the edges of the pipeline.
//!
//! The pipeline itself never touches the filesystem; these helpers are what
//! the command-line tool uses to get a table in and out.

use crate::error::{PreprocessingError, Result};
use polars::io::csv::read::{CsvParseOptions, CsvReadOptions, NullValues};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Rows scanned to infer column types.
const INFER_SCHEMA_ROWS: usize = 1000;

/// Cell values read as missing, in every column. These are the markers
/// common CSV exports of this dataset use, so a numeric column with a few
/// `NA` cells still loads as numeric.
pub const NULL_TOKENS: [&str; 12] = [
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "null", "NULL", "None", "#N/A", "<NA>",
];

/// How boolean indicator columns are spelled in written files.
const TRUE_LITERAL: &str = "True";
const FALSE_LITERAL: &str = "False";

/// Load a headered CSV file into a DataFrame.
///
/// # Errors
///
/// [`PreprocessingError::InputNotFound`] if `path` does not exist,
/// [`PreprocessingError::LoadFailed`] if it cannot be parsed.
pub fn load_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PreprocessingError::InputNotFound(path.to_path_buf()));
    }

    let load_failed = |e: PolarsError| PreprocessingError::LoadFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let null_values = NullValues::AllColumns(NULL_TOKENS.iter().map(|t| (*t).into()).collect());

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_parse_options(CsvParseOptions::default().with_null_values(Some(null_values)))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(load_failed)?
        .finish()
        .map_err(load_failed)?;

    info!("Loaded '{}': {:?}", path.display(), df.shape());
    Ok(df)
}

/// Sibling path the output is staged under before it is renamed into place.
fn staging_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!(".{}.tmp", file_name))
}

/// Copy of `df` with every Boolean column rendered as `True`/`False` text.
/// Nulls stay null.
fn render_booleans(df: &DataFrame) -> PolarsResult<DataFrame> {
    let columns = df
        .get_columns()
        .iter()
        .map(|column| {
            if column.dtype() != &DataType::Boolean {
                return Ok(column.clone());
            }
            let rendered: StringChunked = column
                .bool()?
                .into_iter()
                .map(|v| v.map(|b| if b { TRUE_LITERAL } else { FALSE_LITERAL }))
                .collect();
            Ok(Column::from(
                rendered.with_name(column.name().clone()).into_series(),
            ))
        })
        .collect::<PolarsResult<Vec<Column>>>()?;
    DataFrame::new(columns)
}

/// Write `df` as a headered CSV file without an index column.
///
/// Indicator (Boolean) columns are written as `True`/`False`.
///
/// The table is written to a temporary sibling file first and renamed over
/// `path` only once it is complete, so a failed write never leaves a
/// truncated file behind. Missing parent directories are created.
///
/// # Errors
///
/// [`PreprocessingError::WriteFailed`] on any filesystem or encoding failure.
pub fn write_csv(df: &DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let write_failed = |reason: String| PreprocessingError::WriteFailed {
        path: path.to_path_buf(),
        reason,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| write_failed(e.to_string()))?;
    }

    let mut rendered = render_booleans(df).map_err(|e| write_failed(e.to_string()))?;

    let staging = staging_path(path);
    let written = File::create(&staging)
        .map_err(|e| e.to_string())
        .and_then(|mut file| {
            CsvWriter::new(&mut file)
                .include_header(true)
                .with_separator(b',')
                .with_quote_char(b'"')
                .finish(&mut rendered)
                .map_err(|e| e.to_string())
        });

    if let Err(reason) = written {
        let _ = fs::remove_file(&staging);
        return Err(write_failed(reason));
    }

    fs::rename(&staging, path).map_err(|e| {
        let _ = fs::remove_file(&staging);
        write_failed(e.to_string())
    })?;

    debug!("Staged output moved into place: {}", path.display());
    info!("Dataset saved: {}", path.display());
    Ok(())
}
