use std::collections::{BTreeMap, VecDeque};
use std::io::{self, Read, Write};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use intersection_harness::{Road, StepStatus, ADD_VEHICLE, STEP};

/// Number of consecutive steps a pair of opposing roads keeps the green light.
const GREEN_STEPS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Garbage,
    Fail,
    Short,
    Hang,
}

impl Mode {
    fn from_env() -> Self {
        match std::env::var("FAKE_SIMULATOR_MODE").as_deref() {
            Ok("garbage") => Mode::Garbage,
            Ok("fail") => Mode::Fail,
            Ok("short") => Mode::Short,
            Ok("hang") => Mode::Hang,
            _ => Mode::Normal,
        }
    }
}

#[derive(Default)]
struct Intersection {
    queues: BTreeMap<Road, VecDeque<String>>,
    steps: usize,
}

impl Intersection {
    fn add_vehicle(&mut self, id: &str, start: Road) {
        self.queues
            .entry(start)
            .or_default()
            .push_back(id.to_string());
    }

    fn step(&mut self) -> StepStatus {
        let green = if (self.steps / GREEN_STEPS) % 2 == 0 {
            [Road::North, Road::South]
        } else {
            [Road::East, Road::West]
        };
        self.steps += 1;

        let left_vehicles = green
            .iter()
            .filter_map(|road| self.queues.get_mut(road).and_then(VecDeque::pop_front))
            .collect();
        StepStatus { left_vehicles }
    }
}

fn main() -> ExitCode {
    let mode = Mode::from_env();

    let mut batch = String::new();
    if let Err(err) = io::stdin().read_to_string(&mut batch) {
        eprintln!("failed to read commands: {err}");
        return ExitCode::from(2);
    }

    if mode == Mode::Hang {
        thread::sleep(Duration::from_secs(60));
    }

    let mut results = Vec::new();
    let mut intersection = Intersection::default();
    for line in batch.lines().filter(|line| !line.trim().is_empty()) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            [keyword, id, start, end] if *keyword == ADD_VEHICLE => {
                match (Road::parse(start), Road::parse(end)) {
                    (Some(start), Some(_)) => intersection.add_vehicle(id, start),
                    _ => {
                        eprintln!("invalid road in {line:?}");
                        return ExitCode::from(2);
                    }
                }
            }
            [keyword] if *keyword == STEP => results.push(intersection.step()),
            _ => {
                eprintln!("unknown command {line:?}");
                return ExitCode::from(2);
            }
        }
    }

    if mode == Mode::Short {
        results.pop();
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (index, status) in results.iter().enumerate() {
        let line = if mode == Mode::Garbage && index == 1 {
            "garbage".to_string()
        } else {
            match serde_json::to_string(status) {
                Ok(line) => line,
                Err(err) => {
                    eprintln!("failed to encode step status: {err}");
                    return ExitCode::from(2);
                }
            }
        };
        if writeln!(out, "{line}").is_err() {
            return ExitCode::from(2);
        }
    }
    let _ = out.flush();

    if mode == Mode::Fail {
        eprintln!("simulated crash after {} steps", results.len());
        return ExitCode::from(3);
    }

    ExitCode::SUCCESS
}
