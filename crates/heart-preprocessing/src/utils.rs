//! Shared helpers for the pipeline stages.

use polars::prelude::*;

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Whether `df` has a column called `name`.
#[inline]
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

/// Column values as `f64`, keeping nulls as `None`.
///
/// NaN is mapped to `None` so it behaves like a missing value in statistics
/// and comparisons.
pub fn numeric_values(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let as_float = series.cast(&DataType::Float64)?;
    Ok(as_float
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Keep-mask from per-row decisions, ready for [`DataFrame::filter`].
pub fn keep_mask(keep: &[bool]) -> BooleanChunked {
    BooleanChunked::from_slice("mask".into(), keep)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_has_column() {
        let df = df!["Age" => [40, 49]].unwrap();
        assert!(has_column(&df, "Age"));
        assert!(!has_column(&df, "age"));
    }

    #[test]
    fn test_numeric_values_maps_nan_to_none() {
        let series = Series::new("x".into(), &[Some(1.0), None, Some(f64::NAN)]);
        assert_eq!(numeric_values(&series).unwrap(), vec![Some(1.0), None, None]);
    }

    #[test]
    fn test_numeric_values_from_integers() {
        let series = Series::new("x".into(), &[120i64, 0, 140]);
        assert_eq!(
            numeric_values(&series).unwrap(),
            vec![Some(120.0), Some(0.0), Some(140.0)]
        );
    }
}
