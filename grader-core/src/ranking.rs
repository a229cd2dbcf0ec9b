//! Cross-candidate ranking over persisted records.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::domain::{CandidateRecord, ToolKind};
use crate::error::Result;
use crate::fs::FileSystem;
use crate::store::RECORD_FILE;

/// Why a report directory did not contribute to a ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The directory holds no record file.
    MissingRecord,
    /// The record file could not be read or decoded.
    Corrupt(String),
    /// The record has an empty candidate name.
    MissingName,
    /// Another record with the same candidate name was loaded first.
    Duplicate(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingRecord => write!(f, "no {RECORD_FILE}"),
            SkipReason::Corrupt(reason) => write!(f, "corrupt record: {reason}"),
            SkipReason::MissingName => f.write_str("record has no candidate name"),
            SkipReason::Duplicate(name) => write!(f, "duplicate candidate {name}"),
        }
    }
}

/// A report directory left out of a ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    /// Report directory.
    pub path: PathBuf,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Records loaded for ranking, keyed by candidate name.
///
/// Records iterate in candidate name order whatever order they were loaded in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankingSet {
    /// Loaded records; the first one seen wins for each name.
    pub records: BTreeMap<String, CandidateRecord>,
    /// Directories that were skipped, in load order.
    pub skipped: Vec<SkippedRecord>,
}

impl RankingSet {
    /// Number of distinct candidates.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no candidate was loaded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add a record unless its name is empty or already present.
    pub fn insert(&mut self, path: &Path, record: CandidateRecord) {
        let name = record.name().trim().to_string();
        if name.is_empty() {
            self.skip(path, SkipReason::MissingName);
        } else if self.records.contains_key(&name) {
            self.skip(path, SkipReason::Duplicate(name));
        } else {
            self.records.insert(name, record);
        }
    }

    fn skip(&mut self, path: &Path, reason: SkipReason) {
        warn!("skipping {}: {reason}", path.display());
        self.skipped.push(SkippedRecord {
            path: path.to_path_buf(),
            reason,
        });
    }
}

/// Load every record found in the subdirectories of `dir`.
///
/// Directories are visited in name order. Individual records never fail the
/// load; only an unlistable `dir` does.
pub fn load_all(fs: &impl FileSystem, dir: &Path) -> Result<RankingSet> {
    let mut set = RankingSet::default();
    for report_dir in fs.list_dirs(dir)? {
        let record_path = report_dir.join(RECORD_FILE);
        if !fs.exists(&record_path) {
            debug!("{} has no record file", report_dir.display());
            set.skip(&report_dir, SkipReason::MissingRecord);
            continue;
        }
        match fs.read(&record_path).and_then(|bytes| codec::decode(&bytes)) {
            Ok(record) => set.insert(&report_dir, record),
            Err(err) => set.skip(&report_dir, SkipReason::Corrupt(err.to_string())),
        }
    }
    Ok(set)
}

/// A candidate's lint score; `None` when the score tool produced none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    /// Candidate name.
    pub name: String,
    /// Score out of 10.
    pub score: Option<f64>,
}

/// One slice of a candidate's test outcome breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSlice {
    /// Outcome label: `error`, `failed` or `passed`.
    pub outcome: String,
    /// Share of all tests, in percent.
    pub percentage: f64,
}

/// Tables comparing every loaded candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingTables {
    /// Per lint tool, each candidate's total issue count.
    pub errors_by_tool: BTreeMap<ToolKind, BTreeMap<String, u64>>,
    /// Scores, best first.
    pub scores: Vec<CandidateScore>,
    /// Per candidate, the non-empty test outcome slices.
    pub test_outcomes: BTreeMap<String, Vec<OutcomeSlice>>,
    /// Report directories that were left out.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedRecord>,
}

/// Compare loaded candidates.
pub fn rank(set: &RankingSet) -> RankingTables {
    let mut errors_by_tool: BTreeMap<ToolKind, BTreeMap<String, u64>> = BTreeMap::new();
    for tool in ToolKind::LINTERS {
        let totals: BTreeMap<String, u64> = set
            .records
            .iter()
            .filter_map(|(name, record)| {
                record
                    .tool(tool)
                    .map(|metrics| (name.clone(), metrics.total()))
            })
            .collect();
        if !totals.is_empty() {
            errors_by_tool.insert(tool, totals);
        }
    }

    let mut scores: Vec<CandidateScore> = set
        .records
        .iter()
        .map(|(name, record)| CandidateScore {
            name: name.clone(),
            score: record
                .tool(ToolKind::Pylint)
                .and_then(|metrics| metrics.score()),
        })
        .collect();
    scores.sort_by(compare_scores);

    let test_outcomes: BTreeMap<String, Vec<OutcomeSlice>> = set
        .records
        .iter()
        .filter_map(|(name, record)| {
            let tests = &record.pytest.as_ref()?.tests;
            let slices: Vec<OutcomeSlice> = [
                ("error", tests.percentage_error()),
                ("failed", tests.percentage_failed()),
                ("passed", tests.percentage_passed()),
            ]
            .into_iter()
            .filter(|(_, percentage)| *percentage > 0.0)
            .map(|(outcome, percentage)| OutcomeSlice {
                outcome: outcome.to_string(),
                percentage,
            })
            .collect();
            Some((name.clone(), slices))
        })
        .collect();

    RankingTables {
        errors_by_tool,
        scores,
        test_outcomes,
        skipped: set.skipped.clone(),
    }
}

fn compare_scores(a: &CandidateScore, b: &CandidateScore) -> Ordering {
    match (a.score, b.score) {
        (Some(left), Some(right)) => right
            .partial_cmp(&left)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    }
}
