//! Report formatting for candidate records and rankings.

use std::fmt::Write;

use serde::Serialize;

use crate::domain::{CandidateRecord, NOT_AVAILABLE, TestReport, ToolKind, ToolMetrics};
use crate::ranking::RankingTables;

/// Render a candidate record as Markdown.
pub fn render_candidate_markdown(record: &CandidateRecord) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Grading Report: {}\n", record.name());

    for (tool, metrics) in &record.tools {
        append_tool_section(&mut output, *tool, metrics);
    }
    match &record.pytest {
        Some(report) => append_test_section(&mut output, report),
        None => {
            let _ = writeln!(output, "## pytest\nTests were not run.\n");
        }
    }
    output
}

/// Render a candidate record as plain text.
pub fn render_candidate_text(record: &CandidateRecord) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Candidate: {}", record.name());
    for (tool, metrics) in &record.tools {
        let counts = metrics
            .metrics()
            .iter()
            .map(|(category, count)| format!("{category}={count}"))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(output, "  {tool}: {counts}");
        if let Some(score) = metrics.score() {
            let _ = writeln!(output, "    score: {score:.2}/10");
        }
    }
    if let Some(report) = &record.pytest {
        let tests = &report.tests;
        let _ = writeln!(
            output,
            "  pytest: passed={} failed={} error={} total={}",
            tests.passed_tests(),
            tests.failed_tests(),
            tests.error_tests(),
            tests.total_tests()
        );
        let _ = writeln!(
            output,
            "    coverage: {}% of {} statements",
            report.coverage.statements_percentage, report.coverage.statements_total
        );
    }
    output
}

/// Render ranking tables as Markdown.
pub fn render_ranking_markdown(tables: &RankingTables) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Candidate Ranking\n");

    let _ = writeln!(output, "## Scores\n");
    if tables.scores.is_empty() {
        let _ = writeln!(output, "No candidates found.\n");
    } else {
        let _ = writeln!(output, "| Rank | Candidate | Score |");
        let _ = writeln!(output, "| --- | --- | --- |");
        for (index, entry) in tables.scores.iter().enumerate() {
            let _ = writeln!(
                output,
                "| {} | {} | {} |",
                index + 1,
                entry.name,
                format_score(entry.score)
            );
        }
        let _ = writeln!(output);
    }

    for (tool, totals) in &tables.errors_by_tool {
        let _ = writeln!(output, "## {tool} issues\n");
        let _ = writeln!(output, "| Candidate | Total |");
        let _ = writeln!(output, "| --- | --- |");
        for (name, total) in totals {
            let _ = writeln!(output, "| {name} | {total} |");
        }
        let _ = writeln!(output);
    }

    if !tables.test_outcomes.is_empty() {
        let _ = writeln!(output, "## Test outcomes\n");
        for (name, slices) in &tables.test_outcomes {
            if slices.is_empty() {
                let _ = writeln!(output, "- {name}: no tests");
                continue;
            }
            let parts = slices
                .iter()
                .map(|slice| format!("{} {:.1}%", slice.outcome, slice.percentage))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(output, "- {name}: {parts}");
        }
        let _ = writeln!(output);
    }

    if !tables.skipped.is_empty() {
        let _ = writeln!(output, "## Skipped reports\n");
        for skipped in &tables.skipped {
            let _ = writeln!(output, "- `{}`: {}", skipped.path.display(), skipped.reason);
        }
        let _ = writeln!(output);
    }
    output
}

/// Render ranking tables as plain text.
pub fn render_ranking_text(tables: &RankingTables) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Ranking ({} candidates)", tables.scores.len());
    for (index, entry) in tables.scores.iter().enumerate() {
        let _ = writeln!(
            output,
            "  {}. {} {}",
            index + 1,
            entry.name,
            format_score(entry.score)
        );
    }
    for skipped in &tables.skipped {
        let _ = writeln!(output, "  skipped {}: {}", skipped.path.display(), skipped.reason);
    }
    output
}

/// Render any serializable payload as JSON.
pub fn render_json<T: Serialize + ?Sized>(payload: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(payload)
}

fn format_score(score: Option<f64>) -> String {
    score
        .map(|score| format!("{score:.2}/10"))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn append_tool_section(output: &mut String, tool: ToolKind, metrics: &ToolMetrics) {
    let _ = writeln!(output, "## {tool}\n");
    if let Some(score) = metrics.score() {
        let _ = writeln!(output, "- Score: {score:.2}/10");
    }
    let _ = writeln!(
        output,
        "- Summary: {}\n",
        metrics.summary().unwrap_or(NOT_AVAILABLE)
    );
    let _ = writeln!(output, "| Category | Count |");
    let _ = writeln!(output, "| --- | --- |");
    for (category, count) in metrics.metrics() {
        let _ = writeln!(output, "| {category} | {count} |");
    }
    let _ = writeln!(output);

    for category in metrics.metrics().keys().filter(|key| *key != "total") {
        let details = metrics.details(category);
        if details == NOT_AVAILABLE {
            continue;
        }
        append_code_block(output, category, details);
    }
}

fn append_test_section(output: &mut String, report: &TestReport) {
    let tests = &report.tests;
    let coverage = &report.coverage;
    let _ = writeln!(output, "## pytest\n");
    let _ = writeln!(
        output,
        "- Summary: {}",
        tests.summary().unwrap_or(NOT_AVAILABLE)
    );
    let _ = writeln!(
        output,
        "- Passed: {} ({:.1}%)",
        tests.passed_tests(),
        tests.percentage_passed()
    );
    let _ = writeln!(
        output,
        "- Failed: {} ({:.1}%)",
        tests.failed_tests(),
        tests.percentage_failed()
    );
    let _ = writeln!(
        output,
        "- Errors: {} ({:.1}%)",
        tests.error_tests(),
        tests.percentage_error()
    );
    let _ = writeln!(output, "- Total: {}\n", tests.total_tests());

    let _ = writeln!(output, "### Coverage\n");
    let _ = writeln!(output, "- Statements: {}", coverage.statements_total);
    let _ = writeln!(output, "- Missing: {}", coverage.statements_missing);
    let _ = writeln!(output, "- Branches: {}", coverage.statements_branching);
    let _ = writeln!(
        output,
        "- Partial branches: {}",
        coverage.statements_partial_branching
    );
    let _ = writeln!(output, "- Covered: {}%\n", coverage.statements_percentage);
    if coverage.details != NOT_AVAILABLE {
        append_code_block(output, "coverage by file", &coverage.details);
    }
}

fn append_code_block(output: &mut String, title: &str, contents: &str) {
    let _ = writeln!(output, "### {title}");
    let _ = writeln!(output, "```text\n{contents}\n```\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CoverageMetrics, TestMetrics};
    use crate::ranking::{CandidateScore, OutcomeSlice, SkipReason, SkippedRecord};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn sample_record() -> CandidateRecord {
        let mut record = CandidateRecord::new("alice");
        record.tools.insert(
            ToolKind::Pylint,
            ToolMetrics::from_counts(
                BTreeMap::from([("errors".to_string(), 1), ("warnings".to_string(), 0)]),
                BTreeMap::from([
                    ("errors".to_string(), "a.py:1: [E0602] undefined".to_string()),
                    ("warnings".to_string(), String::new()),
                ]),
                Some(6.5),
                Some("Your code has been rated at 6.50/10".to_string()),
            ),
        );
        record.pytest = Some(TestReport {
            tests: TestMetrics::from_counts(0, 1, 1, BTreeMap::new(), None),
            coverage: CoverageMetrics {
                statements_total: 12,
                statements_percentage: 75.0,
                ..CoverageMetrics::default()
            },
        });
        record
    }

    #[test]
    fn renders_candidate_markdown() {
        let output = render_candidate_markdown(&sample_record());
        assert!(output.contains("# Grading Report: alice"));
        assert!(output.contains("- Score: 6.50/10"));
        assert!(output.contains("| total | 1 |"));
        assert!(output.contains("a.py:1: [E0602] undefined"));
        assert!(!output.contains("### warnings"));
        assert!(output.contains("- Passed: 1 (50.0%)"));
        assert!(output.contains("- Summary: N/A"));
        assert!(output.contains("- Covered: 75%"));
    }

    #[test]
    fn renders_candidate_text() {
        let output = render_candidate_text(&sample_record());
        assert!(output.contains("pylint: errors=1, total=1, warnings=0"));
        assert!(output.contains("score: 6.50/10"));
        assert!(output.contains("pytest: passed=1 failed=1 error=0 total=2"));
    }

    #[test]
    fn renders_ranking_markdown() {
        let tables = RankingTables {
            errors_by_tool: BTreeMap::from([(
                ToolKind::Flake8,
                BTreeMap::from([("alice".to_string(), 3)]),
            )]),
            scores: vec![
                CandidateScore {
                    name: "alice".to_string(),
                    score: Some(9.25),
                },
                CandidateScore {
                    name: "bob".to_string(),
                    score: None,
                },
            ],
            test_outcomes: BTreeMap::from([(
                "alice".to_string(),
                vec![OutcomeSlice {
                    outcome: "passed".to_string(),
                    percentage: 100.0,
                }],
            )]),
            skipped: vec![SkippedRecord {
                path: PathBuf::from("/reports/broken"),
                reason: SkipReason::MissingName,
            }],
        };
        let output = render_ranking_markdown(&tables);
        assert!(output.contains("| 1 | alice | 9.25/10 |"));
        assert!(output.contains("| 2 | bob | N/A |"));
        assert!(output.contains("## flake8 issues"));
        assert!(output.contains("- alice: passed 100.0%"));
        assert!(output.contains("`/reports/broken`: record has no candidate name"));

        let text = render_ranking_text(&tables);
        assert!(text.contains("1. alice 9.25/10"));
        assert!(text.contains("skipped /reports/broken"));
    }

    #[test]
    fn renders_empty_ranking() {
        let output = render_ranking_markdown(&RankingTables::default());
        assert!(output.contains("No candidates found."));
    }

    #[test]
    fn renders_json_payload() {
        let json = render_json(&sample_record()).expect("json");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed["candidate"]["name"], "alice");
        assert_eq!(parsed["tools"]["pylint"]["metrics"]["total"], 1);
    }
}
