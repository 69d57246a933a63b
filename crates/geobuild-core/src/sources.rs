//! File-backed [`TableSource`].

use std::path::{Path, PathBuf};

use geobuild_core_common::TableSource;
use log::debug;
use tabular_csv::{CsvReadOptions, Table, TableResult, read_csv_table};

/// Loads CSV files, resolving relative handles against an optional data
/// directory.
#[derive(Debug, Clone, Default)]
pub struct CsvTableSource {
    data_dir: Option<PathBuf>,
    options: CsvReadOptions,
}

impl CsvTableSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative handles against `dir`.
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: CsvReadOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// The file a handle refers to.
    #[must_use]
    pub fn resolve(&self, handle: &str) -> PathBuf {
        let path = Path::new(handle);
        match &self.data_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl TableSource for CsvTableSource {
    fn load(&self, handle: &str) -> TableResult<Table> {
        let path = self.resolve(handle);
        debug!("Loading table '{handle}' from {}", path.display());
        read_csv_table(&path, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_relative_handle_uses_data_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("points.csv"), "x,y,z\n1,2,3\n").unwrap();

        let source = CsvTableSource::new().with_data_dir(dir.path());
        let table = source.load("points.csv").unwrap();
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_absolute_handle_ignores_data_dir() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("points.csv");
        fs::write(&file, "x,y,z\n1,2,3\n").unwrap();

        let source = CsvTableSource::new().with_data_dir("/nonexistent");
        assert!(source.load(file.to_str().unwrap()).is_ok());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let source = CsvTableSource::new().with_data_dir(dir.path());
        let err = source.load("nope.csv").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_custom_delimiter() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("collar.tsv"), "id\tz\nDH1\t12.5\n").unwrap();

        let source = CsvTableSource::new()
            .with_data_dir(dir.path())
            .with_options(CsvReadOptions::new().with_delimiter(b'\t'));
        let table = source.load("collar.tsv").unwrap();
        assert_eq!(table.column_names(), vec!["id", "z"]);
    }
}
