//! Runs every configured tool for one candidate and builds its record.

use std::time::Instant;

use log::{debug, info};

use crate::config::{GradeSettings, ToolConfig};
use crate::domain::CandidateRecord;
use crate::error::{GraderError, Result};
use crate::process::ProcessRunner;
use crate::tool::{Tool, ToolOutcome, build_tools};

/// Grade one candidate.
///
/// The code directory is checked before anything runs. Tools then run
/// sequentially in the order given; any failure aborts the whole run so no
/// partial record is ever returned.
pub fn aggregate(
    name: &str,
    settings: &GradeSettings,
    configs: &[ToolConfig],
    runner: &dyn ProcessRunner,
) -> Result<CandidateRecord> {
    let code_dir = settings.code_dir();
    if !code_dir.is_dir() {
        return Err(GraderError::InvalidScope(code_dir));
    }

    let mut record = CandidateRecord::new(name);
    for tool in build_tools(configs) {
        match run_tool(tool.as_ref(), settings, runner)? {
            ToolOutcome::Lint(metrics) => {
                record.tools.insert(tool.kind(), metrics);
            }
            ToolOutcome::Tests(report) => record.pytest = Some(report),
        }
    }
    info!("graded {name} with {} tools", configs.len());
    Ok(record)
}

/// Run a single tool and normalize its stdout.
pub fn run_tool(
    tool: &(dyn Tool + Send + Sync),
    settings: &GradeSettings,
    runner: &dyn ProcessRunner,
) -> Result<ToolOutcome> {
    let invocation = tool.invocation(settings);
    info!("running {}", tool.kind());
    debug!("command: {}", invocation.command);

    let started = Instant::now();
    let output = runner.run(&invocation)?;
    debug!(
        "{} exited with {:?} after {:.2}s ({} stdout lines)",
        tool.kind(),
        output.status,
        started.elapsed().as_secs_f64(),
        output.stdout.len()
    );

    if !output.succeeded() && output.is_blank() {
        let status = output
            .status
            .map(|code| code.to_string())
            .unwrap_or_else(|| "signal".to_string());
        return Err(GraderError::ToolExecution {
            tool: tool.kind().to_string(),
            reason: format!("exited with status {status} and no output"),
        });
    }

    tool.interpret(&output.stdout)
}
