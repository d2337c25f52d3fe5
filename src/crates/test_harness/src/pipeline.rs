use std::path::Path;

use tracing::{debug, info};

use crate::collect::{collect_step_statuses, write_output, SimulationOutput};
use crate::command::{translate, SimulationInput};
use crate::config::SimulatorConfig;
use crate::error::HarnessResult;
use crate::harness::run_simulator;

/// Translate `input`, run the simulator once, and rebuild the step results.
pub fn run(config: &SimulatorConfig, input: &SimulationInput) -> HarnessResult<SimulationOutput> {
    let lines = translate(input.commands());
    let expected_steps = input.step_count();
    info!(
        commands = lines.len(),
        steps = expected_steps,
        "translated commands"
    );

    let captured = run_simulator(config, &lines)?;
    debug!(stdout = %captured.stdout, "captured simulator output");
    if !captured.stderr.is_empty() {
        debug!(stderr = %captured.stderr, "simulator wrote to stderr");
    }

    let output = collect_step_statuses(&captured.stdout, expected_steps)?;
    info!(steps = output.step_statuses.len(), "collected results");
    Ok(output)
}

/// File-to-file variant of [`run`]. The output document is only written when
/// every stage succeeded.
pub fn run_files(
    config: &SimulatorConfig,
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> HarnessResult<SimulationOutput> {
    let input_path = input_path.as_ref();
    let output_path = output_path.as_ref();

    let input = SimulationInput::load(input_path)?;
    info!(input = %input_path.display(), "loaded input document");

    let output = run(config, &input)?;
    write_output(output_path, &output)?;
    info!(output = %output_path.display(), "wrote output document");
    Ok(output)
}
