#![deny(missing_docs)]
//! Grader core library.
//!
//! Runs Python analysis and test tools against a candidate's code, classifies
//! their output line by line, and folds it into a persisted record that can be
//! ranked against other candidates.

pub mod accumulator;
pub mod aggregator;
pub mod classifier;
pub mod codec;
pub mod command;
pub mod config;
pub mod domain;
pub mod error;
pub mod fs;
/// Subprocess execution with timeouts.
pub mod process;
pub mod ranking;
pub mod report;
pub mod schema;
pub mod store;
pub mod tool;

pub use aggregator::aggregate;
pub use classifier::{Classification, RuleTable, classify, rule_table};
pub use config::{DEFAULT_PYTHON, DEFAULT_TIMEOUT, GradeSettings, ToolConfig};
pub use domain::{
    CandidateInfo, CandidateRecord, Category, CoverageMetrics, NOT_AVAILABLE, TestMetrics,
    TestReport, ToolKind, ToolMetrics,
};
pub use error::{GraderError, Result};
pub use fs::{FileSystem, StdFileSystem};
pub use process::{ProcessOutput, ProcessRunner, TokioProcessRunner};
pub use ranking::{RankingSet, RankingTables, load_all, rank};
pub use report::{
    render_candidate_markdown, render_candidate_text, render_json, render_ranking_markdown,
    render_ranking_text,
};
pub use schema::{RecordSchema, record_schema_json};
pub use store::{RANKING_FILE, RECORD_FILE, ReportStore, SUMMARY_FILE};
pub use tool::{LintTool, TestRunnerTool, Tool, ToolOutcome, build_tools};
