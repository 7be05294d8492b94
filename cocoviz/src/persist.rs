//! Parquet storage of benchmark results.
//!
//! Each file holds the trace of exactly one [`BenchmarkResult`]. Every column is
//! stored as `Float64`; the algorithm name and the JSON encoded
//! [`ProblemDescription`] travel in the Arrow schema metadata and, for readers
//! that ignore the embedded Arrow schema, in the Parquet key-value metadata.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::metadata::KeyValue;
use parquet::file::properties::WriterProperties;
use tracing::{debug, instrument};

use crate::error::{Error, ErrorDetails};
use crate::problem::ProblemDescription;
use crate::result::{BenchmarkResult, FEVALS_COLUMN};
use crate::result_set::ResultSet;
use crate::table::Table;

pub const ALGORITHM_METADATA_KEY: &str = "algorithm";
pub const PROBLEM_METADATA_KEY: &str = "problem";

const ZSTD_LEVEL: i32 = 3;

/// Writes `result` to a Parquet file at `path`, replacing any existing file.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn write_parquet(result: &BenchmarkResult, path: impl AsRef<Path>) -> Result<(), Error> {
    let path = path.as_ref();
    let metadata = HashMap::from([
        (ALGORITHM_METADATA_KEY.to_string(), result.algorithm().to_string()),
        (PROBLEM_METADATA_KEY.to_string(), result.problem().to_json()?),
    ]);

    let data = result.data();
    let fields: Vec<Field> = data
        .column_names()
        .map(|name| Field::new(name, DataType::Float64, false))
        .collect();
    let schema = Arc::new(Schema::new_with_metadata(fields, metadata.clone()));
    let arrays: Vec<ArrayRef> = data
        .columns()
        .map(|(_, values)| Arc::new(Float64Array::from(values.to_vec())) as ArrayRef)
        .collect();
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;

    let key_value_metadata = metadata
        .into_iter()
        .map(|(key, value)| KeyValue::new(key, value))
        .collect();
    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(ZstdLevel::try_new(ZSTD_LEVEL)?))
        .set_key_value_metadata(Some(key_value_metadata))
        .build();

    let file = File::create(path).map_err(|e| {
        Error::new(ErrorDetails::FileWrite {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    })?;
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    debug!(rows = batch.num_rows(), "Wrote result");
    Ok(())
}

/// Reads a result written by [`write_parquet`].
///
/// Numeric columns of any type are converted to `Float64`; nulls become `NaN`.
pub fn read_parquet(path: impl AsRef<Path>) -> Result<BenchmarkResult, Error> {
    read_parquet_with_fevals_column(path, FEVALS_COLUMN)
}

/// Like [`read_parquet`], for files written by other tools.
///
/// Files holding a `__fevals` column use it. Otherwise the evaluation counts
/// are taken from `fevals_column`, falling back to the first column as in
/// [`BenchmarkResult::new`].
#[instrument(skip_all, fields(path = %path.as_ref().display(), fevals_column = fevals_column))]
pub fn read_parquet_with_fevals_column(
    path: impl AsRef<Path>,
    fevals_column: &str,
) -> Result<BenchmarkResult, Error> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        Error::new(ErrorDetails::FileRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let key_value_metadata: HashMap<&str, &str> = builder
        .metadata()
        .file_metadata()
        .key_value_metadata()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|kv| Some((kv.key.as_str(), kv.value.as_deref()?)))
                .collect()
        })
        .unwrap_or_default();
    let schema = builder.schema().clone();
    let lookup = |key: &str| -> Result<String, Error> {
        schema
            .metadata()
            .get(key)
            .map(String::as_str)
            .or_else(|| key_value_metadata.get(key).copied())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::new(ErrorDetails::MissingMetadata {
                    key: key.to_string(),
                })
            })
    };
    let algorithm = lookup(ALGORITHM_METADATA_KEY)?;
    let problem = ProblemDescription::from_json(&lookup(PROBLEM_METADATA_KEY)?)?;

    let mut columns: Vec<(String, Vec<f64>)> = schema
        .fields()
        .iter()
        .map(|field| (field.name().clone(), Vec::new()))
        .collect();
    for batch in builder.build()? {
        let batch = batch?;
        for ((_, values), array) in columns.iter_mut().zip(batch.columns()) {
            append_as_f64(values, array)?;
        }
    }
    debug!(
        algorithm = %algorithm,
        columns = columns.len(),
        "Read result"
    );

    let table = Table::from_columns(columns)?;
    let fevals_column = if table.contains(FEVALS_COLUMN) {
        FEVALS_COLUMN
    } else {
        fevals_column
    };
    BenchmarkResult::new(algorithm, problem, table, fevals_column)
}

fn append_as_f64(values: &mut Vec<f64>, array: &ArrayRef) -> Result<(), Error> {
    let array = cast(array, &DataType::Float64)?;
    let array = array
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| {
            Error::new(ErrorDetails::Arrow {
                message: format!("Expected a Float64 column, got {}", array.data_type()),
            })
        })?;
    values.extend(array.iter().map(|value| value.unwrap_or(f64::NAN)));
    Ok(())
}

/// Reads every file in `paths` into a single [`ResultSet`], in order.
///
/// `fevals_column` is used for files without a `__fevals` column, see
/// [`read_parquet_with_fevals_column`].
pub fn read_result_set<P: AsRef<Path>>(
    paths: impl IntoIterator<Item = P>,
    fevals_column: &str,
) -> Result<ResultSet, Error> {
    let mut results = ResultSet::new();
    for path in paths {
        results.append(read_parquet_with_fevals_column(path, fevals_column)?)?;
    }
    Ok(results)
}
