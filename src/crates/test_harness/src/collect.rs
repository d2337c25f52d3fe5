use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{HarnessError, HarnessResult};

/// Vehicles that left the intersection during one step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepStatus {
    pub left_vehicles: Vec<String>,
}

/// Final output document, one status per `STEP` command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationOutput {
    pub step_statuses: Vec<StepStatus>,
}

impl SimulationOutput {
    /// Pretty-printed JSON with a trailing newline.
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }
}

/// Parse captured simulator stdout into one [`StepStatus`] per non-blank line.
///
/// Fails on the first line that is not a step status document, and when the
/// number of lines differs from `expected_steps`.
pub fn collect_step_statuses(raw: &str, expected_steps: usize) -> HarnessResult<SimulationOutput> {
    let step_statuses = raw
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(index, line)| {
            serde_json::from_str::<StepStatus>(line.trim())
                .map_err(|err| HarnessError::malformed(index, line, err))
        })
        .collect::<HarnessResult<Vec<_>>>()?;

    if step_statuses.len() != expected_steps {
        return Err(HarnessError::CountMismatch {
            expected: expected_steps,
            actual: step_statuses.len(),
        });
    }
    debug!(steps = step_statuses.len(), "collected step statuses");

    Ok(SimulationOutput { step_statuses })
}

/// Decode captured stdout as UTF-8.
///
/// Invalid bytes are an output error for the first non-blank line holding
/// them, never silently replaced.
pub(crate) fn decode_stdout(bytes: Vec<u8>) -> HarnessResult<String> {
    String::from_utf8(bytes).map_err(|err| {
        let bytes = err.into_bytes();
        let (index, line) = bytes
            .split(|byte| *byte == b'\n')
            .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
            .enumerate()
            .find(|(_, line)| std::str::from_utf8(line).is_err())
            .map(|(index, line)| (index, String::from_utf8_lossy(line).into_owned()))
            .unwrap_or_default();
        HarnessError::malformed(index, &line, "invalid UTF-8")
    })
}

/// Write the output document, replacing `path` atomically.
///
/// The document goes to a temporary file next to `path` first, so a failure
/// never leaves a truncated or half-written document behind.
pub fn write_output(path: impl AsRef<Path>, output: &SimulationOutput) -> HarnessResult<()> {
    let path = path.as_ref();
    let write_error = |source: io::Error| HarnessError::OutputWrite {
        path: path.to_path_buf(),
        source,
    };

    let text = output
        .to_json_string()
        .map_err(|err| write_error(err.into()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if fs::metadata(path).map(|meta| meta.is_dir()).unwrap_or(false) {
        return Err(write_error(io::Error::other("destination is a directory")));
    }

    let mut file = NamedTempFile::new_in(dir).map_err(write_error)?;
    file.write_all(text.as_bytes()).map_err(write_error)?;
    file.as_file().sync_all().map_err(write_error)?;
    file.persist(path).map_err(|err| write_error(err.error))?;
    Ok(())
}
