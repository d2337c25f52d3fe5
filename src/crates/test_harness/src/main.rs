use std::process::ExitCode;

use intersection_harness::{logging, run_files, ErrorClass, HarnessError, SimulatorConfig};

const USAGE: &str = "usage: intersection_harness <path_to_simulator_executable> <input_file> <output_file>";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [simulator, input, output] = args.as_slice() else {
        eprintln!("{USAGE}");
        return ExitCode::from(ErrorClass::Config.exit_code());
    };

    logging::init();

    let result = SimulatorConfig::from_env(simulator)
        .and_then(|config| run_files(&config, input, output));
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::from(err.class().exit_code())
        }
    }
}

fn report(err: &HarnessError) {
    eprintln!("error: {err}");
    if let Some((stdout, stderr)) = err.diagnostics() {
        if !stdout.trim().is_empty() {
            eprintln!("--- simulator stdout ---\n{}", stdout.trim_end());
        }
        if !stderr.trim().is_empty() {
            eprintln!("--- simulator stderr ---\n{}", stderr.trim_end());
        }
    }
}
