use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{HarnessError, HarnessResult};

/// Environment variable holding an optional run timeout in milliseconds.
pub const TIMEOUT_ENV: &str = "INTERSECTION_HARNESS_TIMEOUT_MS";

/// Process-level configuration for launching the simulator executable.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Path to the simulator executable to spawn.
    pub binary_path: PathBuf,
    /// Arguments given to the simulator, in order.
    pub extra_args: Vec<String>,
    /// Variables set on top of the harness's environment.
    pub env: BTreeMap<String, String>,
    /// Directory the simulator runs in. Defaults to the harness's own.
    pub working_directory: Option<PathBuf>,
    /// Upper bound on the whole run, from spawn until all output is read.
    /// `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl SimulatorConfig {
    /// Config for the simulator at `binary_path`, no timeout.
    pub fn new(binary_path: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
            extra_args: Vec::new(),
            env: BTreeMap::new(),
            working_directory: None,
            timeout: None,
        }
    }

    /// Create a config and apply overrides from the process environment.
    pub fn from_env(binary_path: impl Into<PathBuf>) -> HarnessResult<Self> {
        let config = Self::new(binary_path);
        match std::env::var(TIMEOUT_ENV) {
            Ok(value) => Ok(config.with_timeout(parse_timeout_ms(&value)?)),
            Err(_) => Ok(config),
        }
    }

    /// Append an argument to the simulator's command line.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Set a variable in the simulator's environment on top of the inherited one.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Run the simulator from `dir` instead of the harness's own directory.
    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    /// Kill the simulator if it has not exited after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

fn parse_timeout_ms(value: &str) -> HarnessResult<Duration> {
    match value.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(HarnessError::Config(format!(
            "{TIMEOUT_ENV} must be a positive number of milliseconds, got {value:?}"
        ))),
    }
}
