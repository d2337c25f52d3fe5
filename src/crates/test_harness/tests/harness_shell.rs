#![cfg(unix)]

#[path = "harness_support.rs"]
mod support;

use std::time::{Duration, Instant};

use intersection_harness::{
    run, run_simulator, translate, Command, ErrorClass, HarnessError, SimulationInput, StepStatus,
};
use support::{shell_simulator, two_step_commands};

#[test]
fn batch_is_newline_joined_without_trailing_separator() {
    let lines = translate(&two_step_commands());
    let captured = run_simulator(&shell_simulator("cat"), &lines).expect("cat should run");

    assert_eq!(
        captured.stdout,
        "ADD_VEHICLE v1 north south\nSTEP\nADD_VEHICLE v2 east west\nSTEP"
    );
    assert!(captured.stderr.is_empty());
}

#[test]
fn stdin_is_closed_after_the_batch() {
    // `wc -l` only prints once it sees end-of-input.
    let lines = vec!["STEP".to_string(), "STEP".to_string(), "STEP".to_string()];
    let captured =
        run_simulator(&shell_simulator("wc -l | tr -d ' '"), &lines).expect("wc should run");
    assert_eq!(captured.stdout.trim(), "2");
}

#[test]
fn reconstructs_step_statuses_from_simulator_output() {
    let input = SimulationInput::new(two_step_commands()).expect("valid commands");
    let simulator = shell_simulator(
        r#"cat > /dev/null; echo '{"leftVehicles":["v1"]}'; echo '{"leftVehicles":[]}'"#,
    );

    let output = run(&simulator, &input).expect("run should succeed");
    assert_eq!(
        output.step_statuses,
        vec![
            StepStatus {
                left_vehicles: vec!["v1".to_string()]
            },
            StepStatus::default(),
        ]
    );
    assert_eq!(
        serde_json::to_string(&output).unwrap(),
        r#"{"stepStatuses":[{"leftVehicles":["v1"]},{"leftVehicles":[]}]}"#
    );
}

#[test]
fn non_zero_exit_attaches_captured_output() {
    let simulator = shell_simulator("cat > /dev/null; echo partial; echo boom >&2; exit 7");
    let err = run_simulator(&simulator, &["STEP".to_string()]).unwrap_err();

    assert_eq!(err.class(), ErrorClass::Process);
    match err {
        HarnessError::SimulatorFailure {
            status,
            stdout,
            stderr,
        } => {
            assert_eq!(status.code(), Some(7));
            assert_eq!(stdout, "partial\n");
            assert_eq!(stderr, "boom\n");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn missing_executable_fails_to_start() {
    let config = intersection_harness::SimulatorConfig::new("/definitely/not/a/simulator");
    let err = run_simulator(&config, &["STEP".to_string()]).unwrap_err();
    match err {
        HarnessError::FailedToStart { path, .. } => {
            assert_eq!(path.to_str(), Some("/definitely/not/a/simulator"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn large_output_written_before_reading_does_not_stall() {
    let simulator =
        shell_simulator(r#"yes '{"leftVehicles":[]}' | head -n 20000; cat > /dev/null"#);
    let lines = vec!["STEP".to_string(); 20_000];
    let input_steps = lines.len();

    let captured = run_simulator(&simulator, &lines).expect("run should succeed");
    assert_eq!(captured.stdout.lines().count(), input_steps);
}

#[test]
fn simulator_that_ignores_stdin_is_not_an_error_by_itself() {
    let lines = vec!["ADD_VEHICLE car north south".to_string(); 50_000];
    let captured = run_simulator(&shell_simulator("exit 0"), &lines).expect("exit 0 is success");
    assert!(captured.stdout.is_empty());
}

#[test]
fn timeout_kills_a_stuck_simulator() {
    let simulator = shell_simulator("exec sleep 30").with_timeout(Duration::from_millis(200));
    let err = run_simulator(&simulator, &["STEP".to_string()]).unwrap_err();
    assert!(matches!(err, HarnessError::Timeout(limit) if limit == Duration::from_millis(200)));
}

#[test]
fn timeout_covers_a_simulator_that_never_reads_its_batch() {
    let limit = Duration::from_millis(200);
    let simulator = shell_simulator("exec sleep 30").with_timeout(limit);
    let lines = vec!["ADD_VEHICLE car north south".to_string(); 50_000];

    let started = Instant::now();
    let err = run_simulator(&simulator, &lines).unwrap_err();
    assert!(matches!(err, HarnessError::Timeout(_)), "got {err:?}");
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "run took {:?}",
        started.elapsed()
    );
}

#[test]
fn timeout_covers_output_held_open_after_exit() {
    // The backgrounded sleep inherits stdout and keeps it open after sh exits.
    let limit = Duration::from_millis(200);
    let simulator = shell_simulator("cat > /dev/null; sleep 30 & exit 0").with_timeout(limit);

    let started = Instant::now();
    let err = run_simulator(&simulator, &["STEP".to_string()]).unwrap_err();
    assert!(matches!(err, HarnessError::Timeout(_)), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn invalid_utf8_in_output_is_an_output_error() {
    let input = SimulationInput::new(vec![Command::Step]).expect("valid commands");
    let simulator =
        shell_simulator(r#"cat > /dev/null; printf '{"leftVehicles":["v\377"]}\n'"#);

    let err = run(&simulator, &input).unwrap_err();
    assert_eq!(err.class(), ErrorClass::OutputParse);
    match err {
        HarnessError::MalformedOutput { index, reason, .. } => {
            assert_eq!(index, 0);
            assert_eq!(reason, "invalid UTF-8");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn env_and_working_directory_reach_the_child() {
    let dir = tempfile::tempdir().expect("temp dir");
    let simulator = shell_simulator(r#"cat > /dev/null; printf '%s %s' "$SIM_FLAVOUR" "$(pwd -P)""#)
        .with_env("SIM_FLAVOUR", "rush-hour")
        .with_working_directory(dir.path());

    let captured = run_simulator(&simulator, &[]).expect("run should succeed");
    let expected_dir = dir.path().canonicalize().expect("canonical temp dir");
    assert_eq!(
        captured.stdout,
        format!("rush-hour {}", expected_dir.display())
    );
}
