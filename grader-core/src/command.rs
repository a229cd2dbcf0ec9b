//! Command construction for tool invocations.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::{GradeSettings, ToolConfig};
use crate::domain::ToolKind;

/// Render the shell command for a tool configuration.
///
/// Order is program, flags, `name=value` arguments, then scope. Empty parts
/// are skipped so the command never carries doubled separators.
pub fn build(config: &ToolConfig) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(config.flags.len() + config.args.len() + 2);
    parts.push(config.program.clone());
    parts.extend(config.flags.iter().cloned());
    parts.extend(
        config
            .args
            .iter()
            .map(|(name, value)| format!("{name}={value}")),
    );
    if let Some(scope) = &config.scope {
        parts.push(scope.clone());
    }
    parts
        .into_iter()
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A fully described process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Tool being run.
    pub tool: ToolKind,
    /// Shell command line.
    pub command: String,
    /// Directory the command runs in.
    pub working_dir: PathBuf,
    /// Extra environment variables.
    pub env: Vec<(String, String)>,
    /// Maximum run time before the process is killed.
    pub timeout: Duration,
}

impl Invocation {
    /// Describe how to run a tool for the given settings.
    pub fn for_tool(config: &ToolConfig, settings: &GradeSettings) -> Self {
        Self {
            tool: config.tool,
            command: build(config),
            working_dir: settings.source.clone(),
            env: config.env.clone(),
            timeout: settings.timeout,
        }
    }
}
