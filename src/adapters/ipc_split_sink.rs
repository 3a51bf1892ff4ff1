//! Arrow IPC split sink.
//!
//! Writes `train.arrow`, `validation.arrow` and `test.arrow` to the output
//! directory through polars' IPC writer. The first column is `timestamp`
//! (Datetime, milliseconds since the Unix epoch in UTC); feature and
//! regression target columns are Float64; code columns (`momentum_leader`,
//! direction targets) are Int32. Missing values would be nulls, but the
//! cleaner guarantees none reach this point.
//!
//! Each file is encoded into a temporary file inside the output directory.
//! Only once all three encoded are they renamed into place. Artifacts from an
//! earlier run are moved aside first; if any rename fails, the new files are
//! removed and the earlier ones restored.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use polars::prelude::{Column, DataFrame, DataType, IpcReader, IpcWriter, NamedFrom, SerReader, SerWriter, Series, TimeUnit};
use tempfile::{NamedTempFile, TempDir};

use crate::domain::error::PrepError;
use crate::domain::split::{SplitKind, SplitSet};
use crate::domain::table::{ColumnValues, FeatureTable};
use crate::ports::split_sink::SplitSink;

pub const TIMESTAMP_COLUMN: &str = "timestamp";

pub struct IpcSplitSink {
    output_dir: PathBuf,
}

impl IpcSplitSink {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn artifact_path(&self, kind: SplitKind) -> PathBuf {
        self.output_dir.join(format!("{}.arrow", kind.name()))
    }
}

fn storage_err(context: &str, e: impl std::fmt::Display) -> PrepError {
    PrepError::Storage {
        reason: format!("{context}: {e}"),
    }
}

/// Converts a feature table into a polars frame with a leading timestamp
/// column.
pub fn to_dataframe(table: &FeatureTable) -> Result<DataFrame, PrepError> {
    let millis: Vec<i64> = table.index().iter().map(|ts| ts.timestamp_millis()).collect();
    let timestamp = Series::new(TIMESTAMP_COLUMN.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .map_err(|e| storage_err("timestamp column", e))?;

    let mut columns: Vec<Column> = Vec::with_capacity(table.columns().len() + 1);
    columns.push(Column::from(timestamp));
    for column in table.columns() {
        let name = column.id.to_string();
        let series = match &column.values {
            ColumnValues::Float(values) => Series::new(name.as_str().into(), values.as_slice()),
            ColumnValues::Code(values) => Series::new(name.as_str().into(), values.as_slice()),
        };
        columns.push(Column::from(series));
    }

    DataFrame::new(columns).map_err(|e| storage_err("building frame", e))
}

fn encode(table: &FeatureTable, dir: &Path) -> Result<NamedTempFile, PrepError> {
    let mut df = to_dataframe(table)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    IpcWriter::new(tmp.as_file_mut())
        .finish(&mut df)
        .map_err(|e| storage_err("encoding Arrow IPC", e))?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

/// Reads an artifact back; used by `describe` and by tests.
pub fn read_artifact(path: &Path) -> Result<DataFrame, PrepError> {
    let file = File::open(path)?;
    IpcReader::new(file)
        .finish()
        .map_err(|e| storage_err(&format!("reading {}", path.display()), e))
}

impl SplitSink for IpcSplitSink {
    fn persist(&self, splits: &SplitSet) -> Result<Vec<PathBuf>, PrepError> {
        fs::create_dir_all(&self.output_dir)?;

        let mut staged = Vec::with_capacity(3);
        for (kind, table) in splits.iter() {
            let tmp = encode(table, &self.output_dir)?;
            log::debug!("{}: encoded {} rows", kind.name(), table.len());
            staged.push((kind, self.artifact_path(kind), tmp));
        }

        let backup = TempDir::new_in(&self.output_dir)?;
        let mut swap = Swap::default();
        if let Err(e) = swap.apply(staged, backup.path()) {
            swap.rollback();
            return Err(e);
        }
        Ok(swap.written)
    }
}

/// Renames performed so far, so a failed swap can be undone.
#[derive(Default)]
struct Swap {
    stashed: Vec<(PathBuf, PathBuf)>,
    written: Vec<PathBuf>,
}

impl Swap {
    fn apply(
        &mut self,
        staged: Vec<(SplitKind, PathBuf, NamedTempFile)>,
        backup: &Path,
    ) -> Result<(), PrepError> {
        for (kind, path, _) in &staged {
            if path.is_file() {
                let aside = backup.join(kind.name());
                fs::rename(path, &aside)?;
                self.stashed.push((path.clone(), aside));
            }
        }
        for (_, path, tmp) in staged {
            tmp.persist(&path)
                .map_err(|e| storage_err(&format!("renaming into {}", path.display()), e.error))?;
            self.written.push(path);
        }
        Ok(())
    }

    fn rollback(&self) {
        for path in &self.written {
            if let Err(e) = fs::remove_file(path) {
                log::warn!("could not remove {}: {}", path.display(), e);
            }
        }
        for (path, aside) in &self.stashed {
            if let Err(e) = fs::rename(aside, path) {
                log::warn!("could not restore {}: {}", path.display(), e);
            }
        }
    }
}
