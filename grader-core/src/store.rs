//! On-disk layout of candidate reports and rankings.

use std::path::{Path, PathBuf};

use log::info;

use crate::codec;
use crate::domain::CandidateRecord;
use crate::error::{GraderError, Result};
use crate::fs::FileSystem;
use crate::ranking::RankingTables;

/// File holding a persisted candidate record.
pub const RECORD_FILE: &str = "report_raw_data.json";

/// File holding a ranking's tables.
pub const RANKING_FILE: &str = "ranking_data.json";

/// Rendered Markdown summary, written next to the data file.
pub const SUMMARY_FILE: &str = "report_summary.md";

/// Directory of named reports, one subdirectory per report.
#[derive(Debug, Clone)]
pub struct ReportStore<F> {
    fs: F,
    base: PathBuf,
}

impl<F: FileSystem> ReportStore<F> {
    /// Store rooted at `base`.
    pub fn new(fs: F, base: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            base: base.into(),
        }
    }

    /// Root directory of the store.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Directory of a named report.
    pub fn report_path(&self, name: &str) -> PathBuf {
        self.base.join(name)
    }

    /// Fail with [`GraderError::ReportExists`] if the report directory is
    /// already there and `overwrite` is not set.
    pub fn check_available(&self, name: &str, overwrite: bool) -> Result<PathBuf> {
        let path = self.report_path(name);
        if self.fs.exists(&path) && !overwrite {
            return Err(GraderError::ReportExists(name.to_string()));
        }
        Ok(path)
    }

    /// Persist a candidate record and its rendered summary.
    pub fn save_record(
        &self,
        name: &str,
        record: &CandidateRecord,
        summary: &str,
    ) -> Result<PathBuf> {
        let dir = self.report_path(name);
        self.fs.create_dir_all(&dir)?;
        let path = dir.join(RECORD_FILE);
        self.fs.write(&path, &codec::encode(record)?)?;
        self.fs.write(&dir.join(SUMMARY_FILE), summary.as_bytes())?;
        info!("saved record for {} to {}", record.name(), path.display());
        Ok(path)
    }

    /// Load a persisted candidate record.
    pub fn load_record(&self, name: &str) -> Result<CandidateRecord> {
        let bytes = self.fs.read(&self.report_path(name).join(RECORD_FILE))?;
        codec::decode(&bytes)
    }

    /// Persist ranking tables and their rendered summary.
    pub fn save_ranking(
        &self,
        name: &str,
        tables: &RankingTables,
        summary: &str,
    ) -> Result<PathBuf> {
        let dir = self.report_path(name);
        self.fs.create_dir_all(&dir)?;
        let path = dir.join(RANKING_FILE);
        self.fs.write(&path, &serde_json::to_vec_pretty(tables)?)?;
        self.fs.write(&dir.join(SUMMARY_FILE), summary.as_bytes())?;
        info!(
            "saved ranking of {} candidates to {}",
            tables.scores.len(),
            path.display()
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{MockFileSystem, StdFileSystem};

    #[test]
    fn existing_report_is_refused_without_overwrite() {
        let mut fs = MockFileSystem::new();
        fs.expect_exists().returning(|_| true);
        let store = ReportStore::new(fs, "/reports");

        let error = store.check_available("round1", false).expect_err("exists");
        assert!(matches!(error, GraderError::ReportExists(name) if name == "round1"));
        let path = store.check_available("round1", true).expect("overwrite");
        assert_eq!(path, PathBuf::from("/reports/round1"));
    }

    #[test]
    fn save_ranking_creates_directory_and_writes_both_files() {
        let mut fs = MockFileSystem::new();
        fs.expect_create_dir_all()
            .withf(|path| path == Path::new("/rankings/round1"))
            .times(1)
            .returning(|_| Ok(()));
        fs.expect_write()
            .withf(|path, _| path == Path::new("/rankings/round1/ranking_data.json"))
            .times(1)
            .returning(|_, _| Ok(()));
        fs.expect_write()
            .withf(|path, contents| {
                path == Path::new("/rankings/round1/report_summary.md") && contents == b"# ranking"
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let store = ReportStore::new(fs, "/rankings");

        let path = store
            .save_ranking("round1", &RankingTables::default(), "# ranking")
            .expect("save");
        assert_eq!(path, PathBuf::from("/rankings/round1/ranking_data.json"));
    }

    #[test]
    fn saved_record_loads_back() {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time")
            .as_nanos();
        let base = std::env::temp_dir().join(format!("grader_store_test_{nanos}"));
        let store = ReportStore::new(StdFileSystem::new(), &base);

        store.check_available("alice", false).expect("available");
        let record = CandidateRecord::new("alice");
        let path = store
            .save_record("alice", &record, "# alice\n")
            .expect("save");
        assert_eq!(path, base.join("alice").join(RECORD_FILE));
        assert_eq!(store.load_record("alice").expect("load"), record);
        let summary = std::fs::read_to_string(base.join("alice").join(SUMMARY_FILE))
            .expect("summary");
        assert_eq!(summary, "# alice\n");

        std::fs::remove_dir_all(&base).expect("cleanup temp dir");
    }
}
