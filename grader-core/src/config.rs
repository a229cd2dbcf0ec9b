//! Grading settings and per-tool default configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::ToolKind;

/// Default per-invocation timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default Python interpreter used to launch tools.
pub const DEFAULT_PYTHON: &str = "python3";

/// Settings shared by every tool run for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeSettings {
    /// Root of the candidate's source tree; tools run from here.
    pub source: PathBuf,
    /// Package directory inside `source` to grade, if any.
    pub package: Option<String>,
    /// Interpreter used as `<python> -m <tool>`.
    pub python: String,
    /// Directory the report for this candidate is written to.
    pub report_path: PathBuf,
    /// Timeout applied to each tool invocation.
    pub timeout: Duration,
}

impl GradeSettings {
    /// Settings with default interpreter and timeout.
    pub fn new(source: impl Into<PathBuf>, report_path: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            package: None,
            python: DEFAULT_PYTHON.to_string(),
            report_path: report_path.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Directory that must exist before any tool is run.
    pub fn code_dir(&self) -> PathBuf {
        match &self.package {
            Some(package) => self.source.join(package),
            None => self.source.clone(),
        }
    }

    /// Scope handed to tools: the package, or every entry of the source root.
    pub fn scope(&self) -> String {
        self.package.clone().unwrap_or_else(|| "*".to_string())
    }
}

/// Invocation configuration for one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    /// Tool being configured.
    pub tool: ToolKind,
    /// Program prefix, e.g. `python3 -m pylint`.
    pub program: String,
    /// Boolean flags, rendered before arguments.
    pub flags: Vec<String>,
    /// Argument pairs rendered as `name=value`; order is preserved.
    pub args: Vec<(String, String)>,
    /// Path or wildcard the tool inspects, rendered last.
    pub scope: Option<String>,
    /// Extra environment variables for the process.
    pub env: Vec<(String, String)>,
}

impl ToolConfig {
    /// Default configuration for a tool.
    pub fn defaults(tool: ToolKind, settings: &GradeSettings) -> Self {
        match tool {
            ToolKind::Pylint => pylint_config(settings),
            ToolKind::Flake8 => flake8_config(settings),
            ToolKind::Mypy => mypy_config(settings),
            ToolKind::Pycodestyle => pycodestyle_config(settings),
            ToolKind::Pytest => pytest_config(settings),
        }
    }

    /// Default configuration for every tool, in execution order.
    pub fn all_defaults(settings: &GradeSettings) -> Vec<Self> {
        ToolKind::ALL
            .iter()
            .map(|tool| Self::defaults(*tool, settings))
            .collect()
    }

    /// Replace the argument pairs.
    pub fn with_args<I, K, V>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.args = args
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
        self
    }

    /// Replace the flags.
    pub fn with_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags = flags.into_iter().map(Into::into).collect();
        self
    }

    fn base(tool: ToolKind, settings: &GradeSettings) -> Self {
        Self {
            tool,
            program: format!("{} -m {}", settings.python, tool.module()),
            flags: Vec::new(),
            args: Vec::new(),
            scope: Some(settings.scope()),
            env: Vec::new(),
        }
    }
}

fn pylint_config(settings: &GradeSettings) -> ToolConfig {
    let mut config = ToolConfig::base(ToolKind::Pylint, settings).with_args([
        ("--output-format", "parseable"),
        ("--ignore", "'./docs .eggs/ .git/ ./venv ./tests'"),
    ]);
    config.env = python_path(&settings.source);
    config
}

fn flake8_config(settings: &GradeSettings) -> ToolConfig {
    ToolConfig::base(ToolKind::Flake8, settings)
        .with_flags(["--statistics"])
        .with_args([("--max-complexity", "10"), ("--max-line-length", "88")])
}

fn mypy_config(settings: &GradeSettings) -> ToolConfig {
    ToolConfig::base(ToolKind::Mypy, settings).with_flags([
        "--allow-untyped-defs",
        "--disallow-untyped-calls",
        "--disallow-incomplete-defs",
        "--ignore-missing-imports",
        "--namespace-packages",
        "--no-color-output",
    ])
}

fn pycodestyle_config(settings: &GradeSettings) -> ToolConfig {
    let mut config = ToolConfig::base(ToolKind::Pycodestyle, settings)
        .with_flags(["--statistics"])
        .with_args([
            ("--max-line-length", "88"),
            ("--exclude", "'.eggs tests .venv'"),
        ]);
    config.env = python_path(&settings.source);
    config
}

fn pytest_config(settings: &GradeSettings) -> ToolConfig {
    let report = settings.report_path.display();
    let mut config = ToolConfig::base(ToolKind::Pytest, settings)
        .with_flags(["--doctest-modules", "--self-contained-html", "--verbose"])
        .with_args([
            ("--maxfail".to_string(), "999".to_string()),
            ("--color".to_string(), "no".to_string()),
            ("--code-highlight".to_string(), "no".to_string()),
            ("--cov".to_string(), "./".to_string()),
            ("--html".to_string(), format!("{report}/pytest/index.html")),
            ("--cov-report".to_string(), format!("html:{report}/pytest-cov/")),
            ("--cov-report".to_string(), "term".to_string()),
        ]);
    // Test discovery starts from the working directory.
    config.scope = None;
    config
}

fn python_path(source: &Path) -> Vec<(String, String)> {
    vec![("PYTHONPATH".to_string(), source.display().to_string())]
}
