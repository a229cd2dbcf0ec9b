//! Tool trait and the concrete lint and test runner tools.

use crate::accumulator::{accumulate, accumulate_tests, classify_lines};
use crate::classifier::{RuleTable, rule_table};
use crate::command::{self, Invocation};
use crate::config::{GradeSettings, ToolConfig};
use crate::domain::{ClassifiedLine, TestReport, ToolKind, ToolMetrics};
use crate::error::Result;

/// Normalized result of one tool run.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// Counts from a static analysis tool.
    Lint(ToolMetrics),
    /// Outcome and coverage metrics from the test runner.
    Tests(TestReport),
}

/// A tool that can be invoked and whose output can be normalized.
pub trait Tool {
    /// Which tool this is.
    fn kind(&self) -> ToolKind;
    /// Configuration the tool is invoked with.
    fn config(&self) -> &ToolConfig;
    /// Classify raw stdout lines, failing on a fatal line.
    fn classify(&self, lines: &[String]) -> Result<Vec<ClassifiedLine>>;
    /// Fold classified lines into metrics.
    fn accumulate(&self, lines: &[ClassifiedLine]) -> ToolOutcome;

    /// Shell command line for this tool.
    fn command(&self) -> String {
        command::build(self.config())
    }

    /// Process invocation for this tool under the given settings.
    fn invocation(&self, settings: &GradeSettings) -> Invocation {
        Invocation::for_tool(self.config(), settings)
    }

    /// Classify then accumulate.
    fn interpret(&self, lines: &[String]) -> Result<ToolOutcome> {
        let classified = self.classify(lines)?;
        Ok(self.accumulate(&classified))
    }
}

/// Static analysis tool producing [`ToolMetrics`].
#[derive(Debug, Clone)]
pub struct LintTool {
    config: ToolConfig,
    table: &'static RuleTable,
}

impl LintTool {
    /// Wrap a lint tool configuration.
    pub fn new(config: ToolConfig) -> Self {
        let table = rule_table(config.tool);
        Self { config, table }
    }
}

impl Tool for LintTool {
    fn kind(&self) -> ToolKind {
        self.config.tool
    }

    fn config(&self) -> &ToolConfig {
        &self.config
    }

    fn classify(&self, lines: &[String]) -> Result<Vec<ClassifiedLine>> {
        classify_lines(self.table, lines)
    }

    fn accumulate(&self, lines: &[ClassifiedLine]) -> ToolOutcome {
        ToolOutcome::Lint(accumulate(self.table, lines))
    }
}

/// Test runner producing a [`TestReport`].
#[derive(Debug, Clone)]
pub struct TestRunnerTool {
    config: ToolConfig,
    table: &'static RuleTable,
}

impl TestRunnerTool {
    /// Wrap the test runner configuration.
    pub fn new(config: ToolConfig) -> Self {
        let table = rule_table(config.tool);
        Self { config, table }
    }
}

impl Tool for TestRunnerTool {
    fn kind(&self) -> ToolKind {
        self.config.tool
    }

    fn config(&self) -> &ToolConfig {
        &self.config
    }

    fn classify(&self, lines: &[String]) -> Result<Vec<ClassifiedLine>> {
        classify_lines(self.table, lines)
    }

    fn accumulate(&self, lines: &[ClassifiedLine]) -> ToolOutcome {
        ToolOutcome::Tests(accumulate_tests(self.table, lines))
    }
}

/// Build tool instances from configurations, preserving order.
pub fn build_tools(configs: &[ToolConfig]) -> Vec<Box<dyn Tool + Send + Sync>> {
    configs
        .iter()
        .cloned()
        .map(|config| -> Box<dyn Tool + Send + Sync> {
            match config.tool {
                ToolKind::Pytest => Box::new(TestRunnerTool::new(config)),
                _ => Box::new(LintTool::new(config)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraderError;

    fn settings() -> GradeSettings {
        let mut settings = GradeSettings::new("/code", "/reports/alice");
        settings.package = Some("assessment".to_string());
        settings
    }

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn build_tools_picks_implementation_by_kind() {
        let tools = build_tools(&ToolConfig::all_defaults(&settings()));
        let kinds: Vec<ToolKind> = tools.iter().map(|tool| tool.kind()).collect();
        assert_eq!(kinds, ToolKind::ALL.to_vec());
        let pytest = tools
            .iter()
            .find(|tool| tool.kind() == ToolKind::Pytest)
            .expect("pytest tool");
        assert!(matches!(
            pytest.interpret(&[]).expect("interpret"),
            ToolOutcome::Tests(_)
        ));
    }

    #[test]
    fn lint_tool_counts_classified_lines() {
        let tool = LintTool::new(ToolConfig::defaults(ToolKind::Mypy, &settings()));
        let outcome = tool
            .interpret(&lines(&[
                "assessment/a.py:3: error: Missing return statement",
                "assessment/a.py:9: note: See docs",
                "Found 1 error in 1 file (checked 2 source files)",
                "unrelated chatter",
            ]))
            .expect("interpret");
        let ToolOutcome::Lint(metrics) = outcome else {
            panic!("expected lint metrics");
        };
        assert_eq!(metrics.count("errors"), 1);
        assert_eq!(metrics.count("notes"), 1);
        assert_eq!(metrics.total(), 2);
        assert_eq!(
            metrics.summary(),
            Some("Found 1 error in 1 file (checked 2 source files)")
        );
    }

    #[test]
    fn test_runner_aborts_on_fatal_line() {
        let tool = TestRunnerTool::new(ToolConfig::defaults(ToolKind::Pytest, &settings()));
        let error = tool
            .interpret(&lines(&["E   ModuleNotFoundError: No module named 'assessment'"]))
            .expect_err("fatal");
        assert!(matches!(error, GraderError::FatalTool { .. }));
    }

    #[test]
    fn command_and_invocation_follow_config() {
        let settings = settings();
        let tool = LintTool::new(ToolConfig::defaults(ToolKind::Flake8, &settings));
        assert_eq!(
            tool.command(),
            "python3 -m flake8 --statistics --max-complexity=10 --max-line-length=88 assessment"
        );
        let invocation = tool.invocation(&settings);
        assert_eq!(invocation.tool, ToolKind::Flake8);
        assert_eq!(invocation.command, tool.command());
    }
}
