//! Domain entities for the grader.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Placeholder used wherever a category collected no output lines.
pub const NOT_AVAILABLE: &str = "N/A";

/// Key under which the sum of all category counts is stored.
pub const TOTAL_KEY: &str = "total";

/// The analysis tools run against a candidate.
///
/// Declaration order is the fixed execution order.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// Style and complexity linter.
    Flake8,
    /// Static type checker.
    Mypy,
    /// Design linter that also produces a 0-10 quality score.
    Pylint,
    /// Test runner with coverage.
    Pytest,
    /// Style-only checker.
    Pycodestyle,
}

impl ToolKind {
    /// Every tool in execution order.
    pub const ALL: [ToolKind; 5] = [
        ToolKind::Flake8,
        ToolKind::Mypy,
        ToolKind::Pylint,
        ToolKind::Pytest,
        ToolKind::Pycodestyle,
    ];

    /// Tools that report counted issues (everything except the test runner).
    pub const LINTERS: [ToolKind; 4] = [
        ToolKind::Pylint,
        ToolKind::Flake8,
        ToolKind::Pycodestyle,
        ToolKind::Mypy,
    ];

    /// Stable identifier, also used as the persisted key.
    pub fn id(self) -> &'static str {
        match self {
            ToolKind::Flake8 => "flake8",
            ToolKind::Mypy => "mypy",
            ToolKind::Pylint => "pylint",
            ToolKind::Pytest => "pytest",
            ToolKind::Pycodestyle => "pycodestyle",
        }
    }

    /// Python module invoked with `python -m`.
    pub fn module(self) -> &'static str {
        self.id()
    }

    /// Parse a tool from an identifier or one of its aliases.
    pub fn parse(id: &str) -> Option<Self> {
        match id.trim().to_lowercase().as_str() {
            "flake8" | "complexity" => Some(ToolKind::Flake8),
            "mypy" | "typecheck" | "type-check" => Some(ToolKind::Mypy),
            "pylint" | "lint" | "design" => Some(ToolKind::Pylint),
            "pytest" | "tests" | "test-runner" => Some(ToolKind::Pytest),
            "pycodestyle" | "pep8" | "style" => Some(ToolKind::Pycodestyle),
            _ => None,
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Result class an output line can be bucketed into.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    /// Error-level diagnostics.
    Errors,
    /// Warning-level diagnostics.
    Warnings,
    /// Type checker notes.
    Notes,
    /// Informational messages the linter ignored.
    Ignored,
    /// Convention (style) messages.
    StyleIssues,
    /// Refactor (design) messages.
    DesignIssues,
    /// Naming convention violations.
    Namings,
    /// Pyflakes findings.
    Flakes,
    /// Cyclomatic complexity findings.
    Complexities,
    /// Tests that errored.
    ErrorTests,
    /// Tests that failed.
    FailedTests,
    /// Tests that passed.
    PassedTests,
    /// The tool's own summary line.
    Summary,
    /// Per-file coverage line.
    CoverageDetail,
    /// Coverage totals line.
    CoverageTotal,
}

impl Category {
    /// Persisted name of the category.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Errors => "errors",
            Category::Warnings => "warnings",
            Category::Notes => "notes",
            Category::Ignored => "ignored",
            Category::StyleIssues => "style_issues",
            Category::DesignIssues => "design_issues",
            Category::Namings => "namings",
            Category::Flakes => "flakes",
            Category::Complexities => "complexities",
            Category::ErrorTests => "error_tests",
            Category::FailedTests => "failed_tests",
            Category::PassedTests => "passed_tests",
            Category::Summary => "summary",
            Category::CoverageDetail => "coverage_detail",
            Category::CoverageTotal => "coverage_total",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One output line tagged with its category. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine {
    /// Category assigned by the classifier.
    pub category: Category,
    /// The raw output line.
    pub text: String,
}

/// Identity of the graded candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CandidateInfo {
    /// Human-assigned candidate name.
    pub name: String,
}

/// Normalized result of running one lint-style tool.
///
/// `metrics["total"]` always equals the sum of the other counts; it is
/// computed on construction and cannot be set independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ToolMetrics {
    metrics: BTreeMap<String, u64>,
    details: BTreeMap<String, String>,
    score: Option<f64>,
    summary: Option<String>,
}

impl ToolMetrics {
    /// Build metrics from per-category counts and joined detail text.
    ///
    /// Any `total` entry in `counts` is ignored and recomputed. Empty detail
    /// text is replaced by [`NOT_AVAILABLE`].
    pub fn from_counts(
        counts: BTreeMap<String, u64>,
        details: BTreeMap<String, String>,
        score: Option<f64>,
        summary: Option<String>,
    ) -> Self {
        let mut metrics: BTreeMap<String, u64> = counts
            .into_iter()
            .filter(|(category, _)| category != TOTAL_KEY)
            .collect();
        let total = metrics.values().sum();
        metrics.insert(TOTAL_KEY.to_string(), total);

        let details = details
            .into_iter()
            .map(|(category, text)| (category, sentinel_if_empty(text)))
            .collect();

        Self {
            metrics,
            details,
            score,
            summary,
        }
    }

    /// Count for a category, zero when the tool has no such category.
    pub fn count(&self, category: &str) -> u64 {
        self.metrics.get(category).copied().unwrap_or(0)
    }

    /// Sum of all category counts.
    pub fn total(&self) -> u64 {
        self.count(TOTAL_KEY)
    }

    /// All counts, including `total`.
    pub fn metrics(&self) -> &BTreeMap<String, u64> {
        &self.metrics
    }

    /// Newline-joined lines for a category, or `N/A`.
    pub fn details(&self, category: &str) -> &str {
        self.details
            .get(category)
            .map(String::as_str)
            .unwrap_or(NOT_AVAILABLE)
    }

    /// Scalar quality score when the tool produces one.
    pub fn score(&self) -> Option<f64> {
        self.score
    }

    /// The tool's own summary output, verbatim.
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }
}

/// Outcome counts and derived percentages for a test run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TestMetrics {
    error_tests: u64,
    failed_tests: u64,
    passed_tests: u64,
    total_tests: u64,
    percentage_error: f64,
    percentage_failed: f64,
    percentage_passed: f64,
    details: BTreeMap<String, String>,
    summary: Option<String>,
}

impl TestMetrics {
    /// Build test metrics from outcome counts, deriving total and percentages.
    ///
    /// All percentages are zero when no tests ran.
    pub fn from_counts(
        error_tests: u64,
        failed_tests: u64,
        passed_tests: u64,
        details: BTreeMap<String, String>,
        summary: Option<String>,
    ) -> Self {
        let total_tests = error_tests + failed_tests + passed_tests;
        let percentage = |count: u64| {
            if total_tests == 0 {
                0.0
            } else {
                100.0 * count as f64 / total_tests as f64
            }
        };
        let details = details
            .into_iter()
            .map(|(category, text)| (category, sentinel_if_empty(text)))
            .collect();

        Self {
            error_tests,
            failed_tests,
            passed_tests,
            total_tests,
            percentage_error: percentage(error_tests),
            percentage_failed: percentage(failed_tests),
            percentage_passed: percentage(passed_tests),
            details,
            summary,
        }
    }

    /// Number of tests that errored.
    pub fn error_tests(&self) -> u64 {
        self.error_tests
    }

    /// Number of tests that failed.
    pub fn failed_tests(&self) -> u64 {
        self.failed_tests
    }

    /// Number of tests that passed.
    pub fn passed_tests(&self) -> u64 {
        self.passed_tests
    }

    /// Sum of all outcomes.
    pub fn total_tests(&self) -> u64 {
        self.total_tests
    }

    /// Percentage of errored tests.
    pub fn percentage_error(&self) -> f64 {
        self.percentage_error
    }

    /// Percentage of failed tests.
    pub fn percentage_failed(&self) -> f64 {
        self.percentage_failed
    }

    /// Percentage of passed tests.
    pub fn percentage_passed(&self) -> f64 {
        self.percentage_passed
    }

    /// Newline-joined lines for an outcome category, or `N/A`.
    pub fn details(&self, category: &str) -> &str {
        self.details
            .get(category)
            .map(String::as_str)
            .unwrap_or(NOT_AVAILABLE)
    }

    /// The runner's closing summary line.
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }
}

/// Statement coverage parsed from the coverage totals line.
///
/// All numeric fields are zero when coverage data was unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CoverageMetrics {
    /// Total statements.
    pub statements_total: u64,
    /// Statements never executed.
    pub statements_missing: u64,
    /// Branching statements.
    pub statements_branching: u64,
    /// Partially covered branches.
    pub statements_partial_branching: u64,
    /// Percentage of statements covered.
    pub statements_percentage: f64,
    /// Per-file coverage lines joined with newlines, or `N/A`.
    pub details: String,
    /// The raw totals line.
    pub summary: Option<String>,
}

impl Default for CoverageMetrics {
    fn default() -> Self {
        Self {
            statements_total: 0,
            statements_missing: 0,
            statements_branching: 0,
            statements_partial_branching: 0,
            statements_percentage: 0.0,
            details: NOT_AVAILABLE.to_string(),
            summary: None,
        }
    }
}

/// Test runner output: outcomes plus coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TestReport {
    /// Test outcome metrics.
    pub tests: TestMetrics,
    /// Coverage metrics.
    pub coverage: CoverageMetrics,
}

/// Persisted result of grading one candidate with every configured tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CandidateRecord {
    /// Candidate identity.
    pub candidate: CandidateInfo,
    /// Lint-style tool results keyed by tool.
    pub tools: BTreeMap<ToolKind, ToolMetrics>,
    /// Test runner results, when the test runner was configured.
    pub pytest: Option<TestReport>,
}

impl CandidateRecord {
    /// Start an empty record for a candidate.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            candidate: CandidateInfo { name: name.into() },
            tools: BTreeMap::new(),
            pytest: None,
        }
    }

    /// Candidate name.
    pub fn name(&self) -> &str {
        &self.candidate.name
    }

    /// Metrics for a lint-style tool, if it ran.
    pub fn tool(&self, kind: ToolKind) -> Option<&ToolMetrics> {
        self.tools.get(&kind)
    }
}

fn sentinel_if_empty(text: String) -> String {
    if text.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(&str, u64)]) -> BTreeMap<String, u64> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), *value))
            .collect()
    }

    #[test]
    fn tool_metrics_total_is_sum_of_counts() {
        let metrics = ToolMetrics::from_counts(
            counts(&[("errors", 2), ("warnings", 3), ("notes", 0)]),
            BTreeMap::new(),
            None,
            None,
        );
        assert_eq!(metrics.total(), 5);
        let sum: u64 = metrics
            .metrics()
            .iter()
            .filter(|(key, _)| key.as_str() != TOTAL_KEY)
            .map(|(_, value)| *value)
            .sum();
        assert_eq!(metrics.total(), sum);
    }

    #[test]
    fn tool_metrics_ignores_supplied_total() {
        let metrics = ToolMetrics::from_counts(
            counts(&[("errors", 1), ("total", 99)]),
            BTreeMap::new(),
            None,
            None,
        );
        assert_eq!(metrics.total(), 1);
    }

    #[test]
    fn empty_details_render_sentinel() {
        let mut details = BTreeMap::new();
        details.insert("errors".to_string(), String::new());
        let metrics = ToolMetrics::from_counts(counts(&[("errors", 0)]), details, None, None);
        assert_eq!(metrics.details("errors"), NOT_AVAILABLE);
        assert_eq!(metrics.details("unknown"), NOT_AVAILABLE);
    }

    #[test]
    fn test_metrics_zero_total_has_zero_percentages() {
        let tests = TestMetrics::from_counts(0, 0, 0, BTreeMap::new(), None);
        assert_eq!(tests.total_tests(), 0);
        assert_eq!(tests.percentage_error(), 0.0);
        assert_eq!(tests.percentage_failed(), 0.0);
        assert_eq!(tests.percentage_passed(), 0.0);
    }

    #[test]
    fn test_metrics_percentages_sum_to_hundred() {
        let tests = TestMetrics::from_counts(1, 2, 4, BTreeMap::new(), None);
        assert_eq!(tests.total_tests(), 7);
        let sum = tests.percentage_error() + tests.percentage_failed() + tests.percentage_passed();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn tool_kind_parses_aliases() {
        assert_eq!(ToolKind::parse("lint"), Some(ToolKind::Pylint));
        assert_eq!(ToolKind::parse(" PEP8 "), Some(ToolKind::Pycodestyle));
        assert_eq!(ToolKind::parse("tests"), Some(ToolKind::Pytest));
        assert_eq!(ToolKind::parse("rustfmt"), None);
    }

    #[test]
    fn tool_kind_order_matches_execution_order() {
        let mut sorted = ToolKind::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, ToolKind::ALL.to_vec());
        assert_eq!(ToolKind::Pylint.to_string(), "pylint");
    }
}
