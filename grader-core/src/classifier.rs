//! Line classification rules for tool output.
//!
//! Each tool owns an ordered table of anchored patterns. The first pattern
//! that matches a line decides its category; lines matching nothing are
//! dropped. Tables are data so that supporting a new tool means adding a
//! table, not new control flow.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::{Category, ToolKind};

/// Outcome of classifying a single output line.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The line belongs to a category.
    Category(Category),
    /// The line is noise (banners, progress dots, blank lines).
    Unmatched,
    /// The line shows the tool could not run at all.
    Fatal,
}

/// Raw (pattern, category) rule.
#[derive(Debug, Clone, Copy)]
pub struct RuleSpec {
    /// Regular expression, matched at the start of the line.
    pub pattern: &'static str,
    /// Category assigned on match.
    pub category: Category,
}

/// Compiled rule table for one tool.
#[derive(Debug)]
pub struct RuleTable {
    tool: ToolKind,
    categories: &'static [Category],
    rules: Vec<(Regex, Category)>,
    fatal: Option<Regex>,
    score: Option<Regex>,
}

impl RuleTable {
    fn compile(
        tool: ToolKind,
        categories: &'static [Category],
        rules: &[RuleSpec],
        fatal: Option<&str>,
        score: Option<&str>,
    ) -> Self {
        Self {
            tool,
            categories,
            rules: rules
                .iter()
                .filter_map(|rule| anchored(rule.pattern).map(|regex| (regex, rule.category)))
                .collect(),
            fatal: fatal.and_then(anchored),
            score: score.and_then(|pattern| Regex::new(pattern).ok()),
        }
    }

    /// Tool this table classifies.
    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    /// Counted categories for the tool, in report order.
    pub fn categories(&self) -> &'static [Category] {
        self.categories
    }

    /// Classify one line: fatal pattern first, then rules top to bottom.
    pub fn classify(&self, line: &str) -> Classification {
        if let Some(fatal) = &self.fatal {
            if fatal.is_match(line) {
                return Classification::Fatal;
            }
        }
        self.rules
            .iter()
            .find(|(regex, _)| regex.is_match(line))
            .map(|(_, category)| Classification::Category(*category))
            .unwrap_or(Classification::Unmatched)
    }

    /// Extract the scalar score from a summary line, if the tool has one.
    ///
    /// Only scores rendered with exactly two decimals are recognized.
    pub fn extract_score(&self, line: &str) -> Option<f64> {
        let captures = self.score.as_ref()?.captures(line)?;
        captures.get(1)?.as_str().parse().ok()
    }

    /// Whether this tool produces a scalar score.
    pub fn has_score(&self) -> bool {
        self.score.is_some()
    }
}

fn anchored(pattern: &str) -> Option<Regex> {
    let anchored = if pattern.starts_with('^') {
        pattern.to_string()
    } else {
        format!("^{pattern}")
    };
    Regex::new(&anchored).ok()
}

const PYLINT_CATEGORIES: &[Category] = &[
    Category::Errors,
    Category::Warnings,
    Category::Ignored,
    Category::StyleIssues,
    Category::DesignIssues,
];

const PYLINT_RULES: &[RuleSpec] = &[
    RuleSpec {
        pattern: r"^.*\.py:\d+: \[E",
        category: Category::Errors,
    },
    RuleSpec {
        pattern: r"^.*\.py:\d+: \[W",
        category: Category::Warnings,
    },
    RuleSpec {
        pattern: r"^.*\.py:\d+: \[I",
        category: Category::Ignored,
    },
    RuleSpec {
        pattern: r"^.*\.py:\d+: \[C",
        category: Category::StyleIssues,
    },
    RuleSpec {
        pattern: r"^.*\.py:\d+: \[R",
        category: Category::DesignIssues,
    },
    RuleSpec {
        pattern: r"^Your code has been rated at",
        category: Category::Summary,
    },
];

/// Score rendered as `-dd.dd/10`, not preceded by more digits.
const PYLINT_SCORE: &str = r"(?:^|[^\d.\-])(-?\d{1,2}\.\d{2})/10";

const FLAKE8_CATEGORIES: &[Category] = &[
    Category::Errors,
    Category::Warnings,
    Category::Namings,
    Category::Flakes,
    Category::Complexities,
];

const FLAKE8_RULES: &[RuleSpec] = &[
    RuleSpec {
        pattern: r"^.*\.py:\d+:\d+: E",
        category: Category::Errors,
    },
    RuleSpec {
        pattern: r"^.*\.py:\d+:\d+: W",
        category: Category::Warnings,
    },
    RuleSpec {
        pattern: r"^.*\.py:\d+:\d+: N",
        category: Category::Namings,
    },
    RuleSpec {
        pattern: r"^.*\.py:\d+:\d+: F",
        category: Category::Flakes,
    },
    RuleSpec {
        pattern: r"^.*\.py:\d+:\d+: C",
        category: Category::Complexities,
    },
    RuleSpec {
        pattern: r"^[0-9]",
        category: Category::Summary,
    },
];

const MYPY_CATEGORIES: &[Category] = &[Category::Errors, Category::Warnings, Category::Notes];

const MYPY_RULES: &[RuleSpec] = &[
    RuleSpec {
        pattern: r"^.*\.py:\d+: error:",
        category: Category::Errors,
    },
    RuleSpec {
        pattern: r"^.*\.py:\d+: warning:",
        category: Category::Warnings,
    },
    RuleSpec {
        pattern: r"^.*\.py:\d+: note:",
        category: Category::Notes,
    },
    RuleSpec {
        pattern: r"^Found \d+ errors?",
        category: Category::Summary,
    },
    RuleSpec {
        pattern: r"^Success: no issues",
        category: Category::Summary,
    },
];

const PYCODESTYLE_CATEGORIES: &[Category] = &[Category::Errors, Category::Warnings];

const PYCODESTYLE_RULES: &[RuleSpec] = &[
    RuleSpec {
        pattern: r"^.*\.py:\d+:\d+: E",
        category: Category::Errors,
    },
    RuleSpec {
        pattern: r"^.*\.py:\d+:\d+: W",
        category: Category::Warnings,
    },
    RuleSpec {
        pattern: r"^[0-9]",
        category: Category::Summary,
    },
];

const PYTEST_CATEGORIES: &[Category] = &[
    Category::ErrorTests,
    Category::FailedTests,
    Category::PassedTests,
];

// Verbose status lines carry the progress marker; collection errors only show
// up in the short summary, as a bare file path.
const PYTEST_RULES: &[RuleSpec] = &[
    RuleSpec {
        pattern: r"^.*ERROR +\[[ 0-9]{3}%\]",
        category: Category::ErrorTests,
    },
    RuleSpec {
        pattern: r"^ERROR [^:\s]+\.py(\s|$)",
        category: Category::ErrorTests,
    },
    RuleSpec {
        pattern: r"^.*PASSED +\[[ 0-9]{3}%\]",
        category: Category::PassedTests,
    },
    RuleSpec {
        pattern: r"^.*FAILED +\[[ 0-9]{3}%\]",
        category: Category::FailedTests,
    },
    RuleSpec {
        pattern: r"^.*\.py.*\d{1,3}%$",
        category: Category::CoverageDetail,
    },
    RuleSpec {
        pattern: r"^TOTAL.*\d{1,3}%$",
        category: Category::CoverageTotal,
    },
    RuleSpec {
        pattern: r"^=+ .*\bin [0-9.]+s",
        category: Category::Summary,
    },
];

const PYTEST_FATAL: &str = r"^.*ModuleNotFoundError";

/// Compiled rule table for a tool (initialized once).
pub fn rule_table(tool: ToolKind) -> &'static RuleTable {
    static PYLINT: OnceLock<RuleTable> = OnceLock::new();
    static FLAKE8: OnceLock<RuleTable> = OnceLock::new();
    static MYPY: OnceLock<RuleTable> = OnceLock::new();
    static PYCODESTYLE: OnceLock<RuleTable> = OnceLock::new();
    static PYTEST: OnceLock<RuleTable> = OnceLock::new();

    match tool {
        ToolKind::Pylint => PYLINT.get_or_init(|| {
            RuleTable::compile(tool, PYLINT_CATEGORIES, PYLINT_RULES, None, Some(PYLINT_SCORE))
        }),
        ToolKind::Flake8 => FLAKE8
            .get_or_init(|| RuleTable::compile(tool, FLAKE8_CATEGORIES, FLAKE8_RULES, None, None)),
        ToolKind::Mypy => {
            MYPY.get_or_init(|| RuleTable::compile(tool, MYPY_CATEGORIES, MYPY_RULES, None, None))
        }
        ToolKind::Pycodestyle => PYCODESTYLE.get_or_init(|| {
            RuleTable::compile(tool, PYCODESTYLE_CATEGORIES, PYCODESTYLE_RULES, None, None)
        }),
        ToolKind::Pytest => PYTEST.get_or_init(|| {
            RuleTable::compile(
                tool,
                PYTEST_CATEGORIES,
                PYTEST_RULES,
                Some(PYTEST_FATAL),
                None,
            )
        }),
    }
}

/// Classify one line of a tool's output.
pub fn classify(tool: ToolKind, line: &str) -> Classification {
    rule_table(tool).classify(line)
}
