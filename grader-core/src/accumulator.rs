//! Turns classified lines into normalized metrics.

use std::collections::BTreeMap;

use log::warn;

use crate::classifier::{Classification, RuleTable};
use crate::domain::{
    Category, ClassifiedLine, CoverageMetrics, NOT_AVAILABLE, TestMetrics, TestReport,
    ToolKind, ToolMetrics,
};
use crate::error::{GraderError, Result};

/// Classify raw output lines with a rule table.
///
/// Unmatched lines are dropped. A fatal match aborts with
/// [`GraderError::FatalTool`].
pub fn classify_lines<S: AsRef<str>>(
    table: &RuleTable,
    lines: &[S],
) -> Result<Vec<ClassifiedLine>> {
    let mut classified = Vec::new();
    for line in lines {
        let line = line.as_ref();
        match table.classify(line) {
            Classification::Category(category) => classified.push(ClassifiedLine {
                category,
                text: line.to_string(),
            }),
            Classification::Unmatched => continue,
            Classification::Fatal => {
                return Err(GraderError::FatalTool {
                    tool: table.tool().to_string(),
                    line: line.to_string(),
                });
            }
        }
    }
    Ok(classified)
}

/// Accumulate lint-style lines into counts, joined text, score and summary.
pub fn accumulate(table: &RuleTable, lines: &[ClassifiedLine]) -> ToolMetrics {
    let buckets = Buckets::collect(table.categories(), lines);

    let summaries: Vec<&str> = lines
        .iter()
        .filter(|line| line.category == Category::Summary)
        .map(|line| line.text.as_str())
        .collect();

    let (summary, score) = if table.has_score() {
        // Score tools print one rating line; the last one wins.
        let summary = summaries.last().map(|line| line.to_string());
        let score = summary.as_deref().and_then(|line| {
            let score = table.extract_score(line);
            if score.is_none() {
                warn!("{}: no score found in summary line: {line}", table.tool());
            }
            score
        });
        (summary, score)
    } else if summaries_are_statistics(table.tool()) {
        (join_non_empty(&summaries), None)
    } else {
        (summaries.last().map(|line| line.to_string()), None)
    };

    ToolMetrics::from_counts(buckets.counts, buckets.details, score, summary)
}

/// Accumulate test runner lines into outcome and coverage metrics.
pub fn accumulate_tests(table: &RuleTable, lines: &[ClassifiedLine]) -> TestReport {
    let buckets = Buckets::collect(table.categories(), lines);
    let count = |category: Category| buckets.counts.get(category.as_str()).copied().unwrap_or(0);

    let summary = lines
        .iter()
        .rev()
        .find(|line| line.category == Category::Summary)
        .map(|line| line.text.clone());

    let tests = TestMetrics::from_counts(
        count(Category::ErrorTests),
        count(Category::FailedTests),
        count(Category::PassedTests),
        buckets.details,
        summary,
    );

    let coverage_details: Vec<&str> = lines
        .iter()
        .filter(|line| line.category == Category::CoverageDetail)
        .map(|line| line.text.as_str())
        .collect();
    let totals = lines
        .iter()
        .rev()
        .find(|line| line.category == Category::CoverageTotal);

    let mut coverage = match totals {
        Some(line) => parse_coverage_line(&line.text),
        None => CoverageMetrics::default(),
    };
    coverage.details =
        join_non_empty(&coverage_details).unwrap_or_else(|| NOT_AVAILABLE.to_string());

    TestReport { tests, coverage }
}

/// Parse a coverage totals line by counting its numeric tokens.
///
/// Five tokens carry branch data, three do not; any other count means the
/// coverage data is unavailable and every field is zero.
pub fn parse_coverage_line(line: &str) -> CoverageMetrics {
    let tokens: Vec<u64> = line
        .split(|c: char| !c.is_ascii_digit())
        .filter(|token| !token.is_empty())
        .filter_map(|token| token.parse().ok())
        .collect();

    let (total, missing, branching, partial, percentage) = match tokens.as_slice() {
        [total, missing, branching, partial, percentage] => {
            (*total, *missing, *branching, *partial, *percentage)
        }
        [total, missing, percentage] => (*total, *missing, 0, 0, *percentage),
        _ => {
            return CoverageMetrics {
                summary: Some(line.to_string()),
                ..CoverageMetrics::default()
            };
        }
    };

    CoverageMetrics {
        statements_total: total,
        statements_missing: missing,
        statements_branching: branching,
        statements_partial_branching: partial,
        statements_percentage: percentage as f64,
        details: NOT_AVAILABLE.to_string(),
        summary: Some(line.to_string()),
    }
}

struct Buckets {
    counts: BTreeMap<String, u64>,
    details: BTreeMap<String, String>,
}

impl Buckets {
    fn collect(categories: &[Category], lines: &[ClassifiedLine]) -> Self {
        let mut counts: BTreeMap<String, u64> = categories
            .iter()
            .map(|category| (category.as_str().to_string(), 0))
            .collect();
        let mut texts: BTreeMap<String, Vec<&str>> = categories
            .iter()
            .map(|category| (category.as_str().to_string(), Vec::new()))
            .collect();

        for line in lines {
            let key = line.category.as_str();
            if let Some(count) = counts.get_mut(key) {
                *count += 1;
            }
            if let Some(text) = texts.get_mut(key) {
                text.push(line.text.as_str());
            }
        }

        let details = texts
            .into_iter()
            .map(|(category, lines)| (category, lines.join("\n")))
            .collect();

        Self { counts, details }
    }
}

fn summaries_are_statistics(tool: ToolKind) -> bool {
    matches!(tool, ToolKind::Flake8 | ToolKind::Pycodestyle)
}

fn join_non_empty(lines: &[&str]) -> Option<String> {
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::rule_table;
    use crate::domain::TOTAL_KEY;

    fn run(tool: ToolKind, output: &[&str]) -> ToolMetrics {
        let table = rule_table(tool);
        let lines = classify_lines(table, output).expect("classify");
        accumulate(table, &lines)
    }

    fn assert_total_is_sum(metrics: &ToolMetrics) {
        let sum: u64 = metrics
            .metrics()
            .iter()
            .filter(|(key, _)| key.as_str() != TOTAL_KEY)
            .map(|(_, value)| *value)
            .sum();
        assert_eq!(metrics.total(), sum);
    }

    #[test]
    fn pylint_output_accumulates_counts_score_and_summary() {
        let metrics = run(
            ToolKind::Pylint,
            &[
                "************* Module pkg.app",
                "pkg/app.py:1: [C0114(missing-module-docstring), ] Missing module docstring",
                "pkg/app.py:3: [W0611(unused-import), ] Unused import os",
                "pkg/app.py:8: [E0602(undefined-variable), run] Undefined variable 'x'",
                "pkg/app.py:9: [E1101(no-member), run] Instance has no member",
                "",
                "-----------------------------------",
                "Your code has been rated at 5.00/10",
            ],
        );

        assert_eq!(metrics.count("errors"), 2);
        assert_eq!(metrics.count("warnings"), 1);
        assert_eq!(metrics.count("style_issues"), 1);
        assert_eq!(metrics.count("design_issues"), 0);
        assert_eq!(metrics.count("ignored"), 0);
        assert_eq!(metrics.total(), 4);
        assert_total_is_sum(&metrics);
        assert_eq!(metrics.score(), Some(5.0));
        assert_eq!(metrics.summary(), Some("Your code has been rated at 5.00/10"));
        assert_eq!(
            metrics.details("errors"),
            "pkg/app.py:8: [E0602(undefined-variable), run] Undefined variable 'x'\n\
             pkg/app.py:9: [E1101(no-member), run] Instance has no member"
        );
        assert_eq!(metrics.details("design_issues"), NOT_AVAILABLE);
    }

    #[test]
    fn pylint_summary_without_two_decimal_score_leaves_score_unset() {
        let metrics = run(ToolKind::Pylint, &["Your code has been rated at 7.5/10"]);
        assert_eq!(metrics.score(), None);
        assert_eq!(metrics.summary(), Some("Your code has been rated at 7.5/10"));
    }

    #[test]
    fn empty_output_yields_zero_counts_and_sentinels() {
        let metrics = run(ToolKind::Mypy, &[]);
        assert_eq!(metrics.total(), 0);
        assert_eq!(metrics.count("errors"), 0);
        assert_eq!(metrics.count("notes"), 0);
        assert_eq!(metrics.details("errors"), NOT_AVAILABLE);
        assert_eq!(metrics.details("warnings"), NOT_AVAILABLE);
        assert_eq!(metrics.details("notes"), NOT_AVAILABLE);
        assert_eq!(metrics.summary(), None);
    }

    #[test]
    fn flake8_statistics_are_joined_into_summary() {
        let metrics = run(
            ToolKind::Flake8,
            &[
                "./pkg/app.py:1:1: F401 'os' imported but unused",
                "./pkg/app.py:1:80: E501 line too long (90 > 88 characters)",
                "./pkg/app.py:2:80: E501 line too long (95 > 88 characters)",
                "./pkg/app.py:10:1: C901 'run' is too complex (12)",
                "1     C901 'run' is too complex (12)",
                "2     E501 line too long (90 > 88 characters)",
                "1     F401 'os' imported but unused",
            ],
        );
        assert_eq!(metrics.count("errors"), 2);
        assert_eq!(metrics.count("flakes"), 1);
        assert_eq!(metrics.count("complexities"), 1);
        assert_eq!(metrics.count("namings"), 0);
        assert_eq!(metrics.total(), 4);
        assert_total_is_sum(&metrics);
        assert_eq!(
            metrics.summary(),
            Some(
                "1     C901 'run' is too complex (12)\n\
                 2     E501 line too long (90 > 88 characters)\n\
                 1     F401 'os' imported but unused"
            )
        );
        assert_eq!(metrics.score(), None);
    }

    #[test]
    fn fatal_line_aborts_classification() {
        let table = rule_table(ToolKind::Pytest);
        let error = classify_lines(
            table,
            &[
                "collected 0 items / 1 error",
                "E   ModuleNotFoundError: No module named 'numpy'",
            ],
        )
        .expect_err("fatal");
        match error {
            GraderError::FatalTool { tool, line } => {
                assert_eq!(tool, "pytest");
                assert!(line.contains("numpy"));
            }
            other => panic!("expected fatal tool error, got {other:?}"),
        }
    }

    #[test]
    fn pytest_output_accumulates_outcomes_and_coverage() {
        let table = rule_table(ToolKind::Pytest);
        let lines = classify_lines(
            table,
            &[
                "============================= test session starts ==============================",
                "tests/test_app.py::test_one PASSED                                       [ 25%]",
                "tests/test_app.py::test_two PASSED                                       [ 50%]",
                "tests/test_app.py::test_three FAILED                                     [ 75%]",
                "tests/test_app.py::test_four ERROR                                       [100%]",
                "---------- coverage: platform linux, python 3.11.4-final-0 -----------",
                "Name                 Stmts   Miss Branch BrPart  Cover",
                "pkg/app.py             120     15     30      5    87%",
                "TOTAL                  120     15     30      5    87%",
                "=========== 1 failed, 2 passed, 1 error in 0.31s ===========",
            ],
        )
        .expect("classify");

        let report = accumulate_tests(table, &lines);
        assert_eq!(report.tests.passed_tests(), 2);
        assert_eq!(report.tests.failed_tests(), 1);
        assert_eq!(report.tests.error_tests(), 1);
        assert_eq!(report.tests.total_tests(), 4);
        assert_eq!(report.tests.percentage_passed(), 50.0);
        assert_eq!(report.tests.percentage_failed(), 25.0);
        assert_eq!(report.tests.percentage_error(), 25.0);
        assert_eq!(
            report.tests.summary(),
            Some("=========== 1 failed, 2 passed, 1 error in 0.31s ===========")
        );

        assert_eq!(report.coverage.statements_total, 120);
        assert_eq!(report.coverage.statements_missing, 15);
        assert_eq!(report.coverage.statements_branching, 30);
        assert_eq!(report.coverage.statements_partial_branching, 5);
        assert_eq!(report.coverage.statements_percentage, 87.0);
        assert_eq!(
            report.coverage.details,
            "pkg/app.py             120     15     30      5    87%"
        );
    }

    #[test]
    fn no_tests_yields_zero_percentages_and_unavailable_coverage() {
        let table = rule_table(ToolKind::Pytest);
        let lines = classify_lines(table, &["no tests ran in 0.01s"]).expect("classify");
        let report = accumulate_tests(table, &lines);
        assert_eq!(report.tests.total_tests(), 0);
        assert_eq!(report.tests.percentage_error(), 0.0);
        assert_eq!(report.tests.percentage_failed(), 0.0);
        assert_eq!(report.tests.percentage_passed(), 0.0);
        assert_eq!(report.tests.details("passed_tests"), NOT_AVAILABLE);
        assert_eq!(report.coverage, CoverageMetrics::default());
    }

    #[test]
    fn coverage_line_with_five_tokens_has_branch_detail() {
        let coverage = parse_coverage_line("TOTAL    120     15     30      5    87%");
        assert_eq!(coverage.statements_total, 120);
        assert_eq!(coverage.statements_missing, 15);
        assert_eq!(coverage.statements_branching, 30);
        assert_eq!(coverage.statements_partial_branching, 5);
        assert_eq!(coverage.statements_percentage, 87.0);
    }

    #[test]
    fn coverage_line_with_three_tokens_defaults_branching() {
        let coverage = parse_coverage_line("TOTAL    120     15    87%");
        assert_eq!(coverage.statements_total, 120);
        assert_eq!(coverage.statements_missing, 15);
        assert_eq!(coverage.statements_branching, 0);
        assert_eq!(coverage.statements_partial_branching, 0);
        assert_eq!(coverage.statements_percentage, 87.0);
    }

    #[test]
    fn coverage_line_with_other_token_counts_is_zeroed() {
        for line in ["TOTAL", "TOTAL 1 2 3 4 5 6 7%"] {
            let coverage = parse_coverage_line(line);
            assert_eq!(coverage.statements_total, 0);
            assert_eq!(coverage.statements_missing, 0);
            assert_eq!(coverage.statements_branching, 0);
            assert_eq!(coverage.statements_partial_branching, 0);
            assert_eq!(coverage.statements_percentage, 0.0);
        }
    }
}
