//! Parquet directory source
//!
//! Each `<experiment>.parquet` file in a directory holds one experiment's
//! exported run table. Experiments are listed in file-name order and get
//! their position as id.
//!
//! Conversion rules:
//! - a `run_id` column is required; it also stays a regular display column
//! - Arrow nulls (and float `NaN`) become the missing sentinel
//! - integer, float, and decimal-free numeric columns become numbers
//! - everything else is rendered to text via Arrow's display formatter

use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::array::{
    Array, ArrayRef, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    LargeStringArray, StringArray, UInt32Array, UInt64Array,
};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::RunTableSource;
use crate::experiment::{CellValue, Experiment, RunRecord, RunTable};
use crate::{Error, Result};

/// File extension the source looks for.
pub const PARQUET_EXTENSION: &str = "parquet";

/// Column that identifies runs.
pub const RUN_ID_COLUMN: &str = "run_id";

/// Source backed by a directory of Parquet files.
#[derive(Debug, Clone)]
pub struct ParquetRunSource {
    dir: PathBuf,
}

impl ParquetRunSource {
    /// Create a source over `dir`. The directory is read lazily.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory this source reads.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn table_path(&self, experiment_name: &str) -> PathBuf {
        self.dir
            .join(format!("{experiment_name}.{PARQUET_EXTENSION}"))
    }

    fn unreadable(&self, e: &std::io::Error) -> Error {
        Error::SourceUnavailable(format!("cannot read {}: {e}", self.dir.display()))
    }
}

impl RunTableSource for ParquetRunSource {
    fn list_experiments(&self) -> Result<Vec<Experiment>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| self.unreadable(&e))?;

        let mut names = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| self.unreadable(&e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(PARQUET_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();

        Ok(names
            .into_iter()
            .enumerate()
            .map(|(id, name)| Experiment::new(name, id.to_string()))
            .collect())
    }

    fn fetch_run_table(&self, experiment_name: &str) -> Result<RunTable> {
        let path = self.table_path(experiment_name);
        tracing::debug!(path = %path.display(), "loading parquet run table");
        load_run_table(&path)
    }

    fn describe(&self) -> String {
        format!("parquet ({})", self.dir.display())
    }
}

/// Load a Parquet file into a run table.
///
/// # Errors
///
/// Returns [`Error::SourceUnavailable`] if the file cannot be opened or
/// decoded, and [`Error::InvalidTable`] if it has no `run_id` column or
/// violates the run table invariants.
pub fn load_run_table(path: &Path) -> Result<RunTable> {
    let file = File::open(path).map_err(|e| {
        Error::SourceUnavailable(format!("failed to open {}: {e}", path.display()))
    })?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| {
        Error::SourceUnavailable(format!("failed to parse {}: {e}", path.display()))
    })?;

    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();

    let reader = builder.build().map_err(|e| {
        Error::SourceUnavailable(format!("failed to create reader for {}: {e}", path.display()))
    })?;

    let mut records = Vec::new();
    for batch in reader {
        let batch = batch.map_err(|e| {
            Error::SourceUnavailable(format!("failed to read record batch: {e}"))
        })?;
        records.extend(batch_to_records(&batch)?);
    }

    RunTable::new(columns, records)
}

/// Convert one record batch into run records.
///
/// # Errors
///
/// Returns [`Error::InvalidTable`] if the batch has no usable `run_id`.
pub fn batch_to_records(batch: &RecordBatch) -> Result<Vec<RunRecord>> {
    let run_id_index = batch
        .schema()
        .index_of(RUN_ID_COLUMN)
        .map_err(|_| Error::InvalidTable(format!("missing '{RUN_ID_COLUMN}' column")))?;

    let mut records = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let values = batch
            .columns()
            .iter()
            .map(|array| cell_at(array, row))
            .collect::<Result<Vec<_>>>()?;

        let run_id = match &values[run_id_index] {
            CellValue::Missing => {
                return Err(Error::InvalidTable(format!("null run_id in row {row}")));
            }
            other => other.to_string(),
        };
        records.push(RunRecord::new(run_id, values));
    }
    Ok(records)
}

/// Read one cell of an Arrow array as a [`CellValue`].
///
/// # Errors
///
/// Returns [`Error::Arrow`] if a value cannot be formatted.
#[allow(clippy::cast_precision_loss)]
pub fn cell_at(array: &ArrayRef, row: usize) -> Result<CellValue> {
    if array.is_null(row) {
        return Ok(CellValue::Missing);
    }

    let any = array.as_any();
    let value = match array.data_type() {
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| CellValue::number(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| CellValue::number(f64::from(a.value(row)))),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| CellValue::number(a.value(row) as f64)),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| CellValue::number(f64::from(a.value(row)))),
        DataType::UInt64 => any
            .downcast_ref::<UInt64Array>()
            .map(|a| CellValue::number(a.value(row) as f64)),
        DataType::UInt32 => any
            .downcast_ref::<UInt32Array>()
            .map(|a| CellValue::number(f64::from(a.value(row)))),
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|a| CellValue::text(a.value(row))),
        DataType::LargeUtf8 => any
            .downcast_ref::<LargeStringArray>()
            .map(|a| CellValue::text(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| CellValue::text(a.value(row).to_string())),
        _ => None,
    };

    match value {
        Some(v) => Ok(v),
        None => Ok(CellValue::Text(array_value_to_string(array, row)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{Field, Schema};
    use parquet::arrow::ArrowWriter;
    use std::sync::Arc;

    fn write_runs(dir: &Path, name: &str, with_run_id: bool) {
        let mut fields = vec![
            Field::new("metrics.MAE", DataType::Float64, true),
            Field::new("params.fit_intercept", DataType::Utf8, true),
        ];
        let mut arrays: Vec<ArrayRef> = vec![
            Arc::new(Float64Array::from(vec![Some(0.2), None, Some(f64::NAN)])),
            Arc::new(StringArray::from(vec![Some("1"), Some("0"), None])),
        ];
        if with_run_id {
            fields.insert(0, Field::new(RUN_ID_COLUMN, DataType::Utf8, false));
            arrays.insert(0, Arc::new(StringArray::from(vec!["r1", "r2", "r3"])));
        }

        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new(schema.clone(), arrays).unwrap();
        let file = File::create(dir.join(format!("{name}.parquet"))).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn test_list_experiments_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        write_runs(dir.path(), "zeta", true);
        write_runs(dir.path(), "alpha", true);
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let source = ParquetRunSource::new(dir.path());
        let experiments = source.list_experiments().unwrap();

        assert_eq!(experiments.len(), 2);
        assert_eq!(experiments[0].name(), "alpha");
        assert_eq!(experiments[0].id(), "0");
        assert_eq!(experiments[1].name(), "zeta");
    }

    #[test]
    fn test_fetch_normalizes_nulls_and_nan() {
        let dir = tempfile::tempdir().unwrap();
        write_runs(dir.path(), "exp", true);

        let table = ParquetRunSource::new(dir.path()).fetch_run_table("exp").unwrap();

        assert_eq!(table.columns(), ["run_id", "metrics.MAE", "params.fit_intercept"]);
        assert_eq!(table.value("r1", "metrics.MAE"), Some(&CellValue::Number(0.2)));
        assert_eq!(table.value("r2", "metrics.MAE"), Some(&CellValue::Missing));
        assert_eq!(table.value("r3", "metrics.MAE"), Some(&CellValue::Missing));
        assert_eq!(table.value("r3", "params.fit_intercept"), Some(&CellValue::Missing));
    }

    #[test]
    fn test_missing_run_id_column_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        write_runs(dir.path(), "exp", false);

        let err = ParquetRunSource::new(dir.path()).fetch_run_table("exp").unwrap_err();
        assert!(matches!(err, Error::InvalidTable(_)));
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = ParquetRunSource::new(dir.path()).fetch_run_table("nope").unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(_)));
    }

    #[test]
    fn test_file_in_place_of_dir_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("runs.parquet");
        std::fs::write(&file, "not a directory").unwrap();

        let err = ParquetRunSource::new(file.clone()).list_experiments().unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(ref msg) if msg.contains("runs.parquet")));
    }

    #[test]
    fn test_listing_io_errors_are_unavailable() {
        let source = ParquetRunSource::new("/runs");
        let err = source.unreadable(&std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"));
        assert!(matches!(err, Error::SourceUnavailable(ref msg) if msg.contains("/runs") && msg.contains("denied")));
    }

    #[test]
    fn test_missing_dir_is_unavailable() {
        let source = ParquetRunSource::new("/definitely/not/here");
        assert!(matches!(
            source.list_experiments().unwrap_err(),
            Error::SourceUnavailable(_)
        ));
    }
}
