//! Data collaborators that supply series to the analyses.

use crate::error::{AnalysisError, Result};
use crate::mmap_utils::mmap_file;
use crate::parser::parse_series_from_bytes;
use crate::types::{Credential, Series, SeriesId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File extension used by [`FileSource`]
pub const SERIES_FILE_EXTENSION: &str = "csv";

/// Supplies time-ordered series for a [`SeriesId`]
#[async_trait]
pub trait SeriesSource: Send + Sync {
    /// Fetch the samples of one variable, sorted ascending by time.
    ///
    /// # Errors
    /// `AccessForbidden` when the credential is rejected, `OperationFailed`
    /// when the data cannot be retrieved.
    async fn fetch_series(&self, id: SeriesId, credential: &Credential) -> Result<Series>;
}

/// Fixed set of series held in memory; ignores credentials
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    series: HashMap<SeriesId, Series>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: SeriesId, series: Series) -> Option<Series> {
        self.series.insert(id, series)
    }

    pub fn with_series(mut self, id: SeriesId, series: Series) -> Self {
        self.insert(id, series);
        self
    }
}

#[async_trait]
impl SeriesSource for InMemorySource {
    async fn fetch_series(&self, id: SeriesId, _credential: &Credential) -> Result<Series> {
        self.series
            .get(&id)
            .cloned()
            .ok_or_else(|| AnalysisError::OperationFailed(format!("no series stored for {}", id)))
    }
}

/// Series files in one directory, named `{experiment}-{variable}.csv`
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(AnalysisError::OperationFailed(format!(
                "series directory not found: {}",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn path_for(&self, id: SeriesId) -> PathBuf {
        self.root.join(series_file_name(id))
    }
}

#[async_trait]
impl SeriesSource for FileSource {
    async fn fetch_series(&self, id: SeriesId, _credential: &Credential) -> Result<Series> {
        let path = self.path_for(id);
        if !path.is_file() {
            return Err(AnalysisError::OperationFailed(format!(
                "no series file for {} at {}",
                id,
                path.display()
            )));
        }

        log::debug!("Reading series {} from {}", id, path.display());
        tokio::task::spawn_blocking(move || load_series_file(&path))
            .await
            .map_err(|e| AnalysisError::OperationFailed(format!("series reader failed: {}", e)))?
    }
}

/// File name under which [`FileSource`] stores a series
pub fn series_file_name(id: SeriesId) -> String {
    format!("{}-{}.{}", id.experiment, id.variable, SERIES_FILE_EXTENSION)
}

/// Recover the [`SeriesId`] from a `{experiment}-{variable}.csv` path
pub fn series_id_from_path(path: &Path) -> Option<SeriesId> {
    if path.extension()?.to_str()? != SERIES_FILE_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (experiment, variable) = stem.split_once('-')?;
    Some(SeriesId::new(
        experiment.trim().parse().ok()?,
        variable.trim().parse().ok()?,
    ))
}

/// Load and parse one series file
pub fn load_series_file(path: &Path) -> Result<Series> {
    let mmap = mmap_file(path)?;
    parse_series_from_bytes(&mmap).map_err(|e| match e {
        AnalysisError::ParseError(msg) => {
            AnalysisError::ParseError(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_series_id_from_path() {
        assert_eq!(
            series_id_from_path(Path::new("/data/12-3.csv")),
            Some(SeriesId::new(12, 3))
        );
        assert_eq!(series_id_from_path(Path::new("12-3.txt")), None);
        assert_eq!(series_id_from_path(Path::new("twelve-3.csv")), None);
        assert_eq!(series_id_from_path(Path::new("12.csv")), None);
    }

    #[test]
    fn test_file_name_round_trip() {
        let id = SeriesId::new(7, 41);
        assert_eq!(series_file_name(id), "7-41.csv");
        assert_eq!(series_id_from_path(Path::new(&series_file_name(id))), Some(id));
    }

    #[tokio::test]
    async fn test_file_source_reads_series() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("1-2.csv"), "time,value\n0,1\n1,2\n2,3\n").unwrap();

        let source = FileSource::new(tmp.path()).unwrap();
        let series = source
            .fetch_series(SeriesId::new(1, 2), &Credential::anonymous())
            .await
            .unwrap();
        assert_eq!(series.values(), vec![1.0, 2.0, 3.0]);
    }

    #[tokio::test]
    async fn test_file_source_missing_series() {
        let tmp = tempfile::tempdir().unwrap();
        let source = FileSource::new(tmp.path()).unwrap();
        let result = source
            .fetch_series(SeriesId::new(9, 9), &Credential::anonymous())
            .await;
        assert!(matches!(result, Err(AnalysisError::OperationFailed(_))));
    }

    #[test]
    fn test_file_source_requires_directory() {
        assert!(FileSource::new("/nonexistent_dir_12345").is_err());
    }

    #[tokio::test]
    async fn test_in_memory_source() {
        let id = SeriesId::new(1, 1);
        let series = Series::from_pairs([(0.0, 1.0)]).unwrap();
        let source = InMemorySource::new().with_series(id, series.clone());

        assert_eq!(
            source.fetch_series(id, &Credential::anonymous()).await.unwrap(),
            series
        );
        assert!(source
            .fetch_series(SeriesId::new(2, 2), &Credential::anonymous())
            .await
            .is_err());
    }
}
