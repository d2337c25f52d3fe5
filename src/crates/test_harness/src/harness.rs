use std::io::{self, Read, Write};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::collect::decode_stdout;
use crate::config::SimulatorConfig;
use crate::error::{HarnessError, HarnessResult};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Everything a successful simulator run wrote.
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Point in time by which the whole run must be over.
#[derive(Debug, Clone, Copy)]
struct Deadline {
    limit: Duration,
    at: Instant,
}

impl Deadline {
    fn starting_now(limit: Duration) -> Self {
        Self {
            limit,
            at: Instant::now() + limit,
        }
    }

    fn remaining(self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    fn expired(self) -> bool {
        Instant::now() >= self.at
    }
}

/// Owns the child process and kills it unless it has already been reaped.
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    fn wait(&mut self, deadline: Option<Deadline>) -> HarnessResult<ExitStatus> {
        let status = match deadline {
            None => self.child.wait()?,
            Some(deadline) => loop {
                if let Some(status) = self.child.try_wait()? {
                    break status;
                }
                if deadline.expired() {
                    self.terminate();
                    return Err(HarnessError::Timeout(deadline.limit));
                }
                thread::sleep(POLL_INTERVAL);
            },
        };
        self.reaped = true;
        Ok(status)
    }

    fn terminate(&mut self) {
        if self.reaped {
            return;
        }
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.reaped = true;
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Spawn the simulator, send the whole batch, and wait for it to exit.
///
/// Lines are joined with `\n` and written in one go before stdin is closed.
/// The write and the draining of stdout/stderr run on worker threads, so a
/// chatty simulator cannot fill its pipe and stall, and a configured timeout
/// bounds every phase from spawn to the last byte of output. A non-zero exit
/// is reported as [`HarnessError::SimulatorFailure`] with both streams
/// attached.
pub fn run_simulator(config: &SimulatorConfig, lines: &[String]) -> HarnessResult<CapturedOutput> {
    let deadline = config.timeout.map(Deadline::starting_now);

    let mut cmd = Command::new(&config.binary_path);
    cmd.args(&config.extra_args);
    if let Some(dir) = &config.working_directory {
        cmd.current_dir(dir);
    }
    cmd.envs(&config.env);
    cmd.stdin(Stdio::piped());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let child = cmd.spawn().map_err(|source| HarnessError::FailedToStart {
        path: config.binary_path.clone(),
        source,
    })?;
    let mut guard = ChildGuard {
        child,
        reaped: false,
    };
    info!(
        pid = guard.child.id(),
        simulator = %config.binary_path.display(),
        "simulator started"
    );

    let stdout = guard
        .child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("failed to capture simulator stdout"))?;
    let stderr = guard
        .child
        .stderr
        .take()
        .ok_or_else(|| io::Error::other("failed to capture simulator stderr"))?;
    let stdin = guard
        .child
        .stdin
        .take()
        .ok_or_else(|| io::Error::other("failed to capture simulator stdin"))?;
    let stdout_rx = spawn_stream_reader(stdout);
    let stderr_rx = spawn_stream_reader(stderr);

    let batch = lines.join("\n");
    debug!(lines = lines.len(), bytes = batch.len(), "writing command batch");
    let writer_rx = spawn_batch_writer(stdin, batch);

    let written = match await_worker(&writer_rx, deadline, "batch writer") {
        Ok(result) => result,
        Err(err) => {
            guard.terminate();
            return Err(err);
        }
    };
    match written {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
            warn!("simulator closed stdin before the whole batch was written");
        }
        Err(err) => return Err(err.into()),
    }

    let status = guard.wait(deadline)?;
    let stdout = await_worker(&stdout_rx, deadline, "stdout reader")??;
    let stderr = await_worker(&stderr_rx, deadline, "stderr reader")??;
    debug!(%status, stdout_bytes = stdout.len(), stderr_bytes = stderr.len(), "simulator exited");

    let stderr = String::from_utf8_lossy(&stderr).into_owned();
    if !status.success() {
        return Err(HarnessError::SimulatorFailure {
            status,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr,
        });
    }

    Ok(CapturedOutput {
        stdout: decode_stdout(stdout)?,
        stderr,
    })
}

fn spawn_batch_writer(mut stdin: ChildStdin, batch: String) -> mpsc::Receiver<io::Result<()>> {
    spawn_worker(move || {
        stdin.write_all(batch.as_bytes())?;
        stdin.flush()
        // stdin drops here, signalling end-of-input
    })
}

fn spawn_stream_reader<R: Read + Send + 'static>(
    mut reader: R,
) -> mpsc::Receiver<io::Result<Vec<u8>>> {
    spawn_worker(move || {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(bytes)
    })
}

fn spawn_worker<T, F>(work: F) -> mpsc::Receiver<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(work());
    });
    rx
}

/// Receive a worker's result, giving up once `deadline` passes.
fn await_worker<T>(
    rx: &mpsc::Receiver<T>,
    deadline: Option<Deadline>,
    name: &str,
) -> HarnessResult<T> {
    let received = match deadline {
        None => rx.recv().map_err(|_| mpsc::RecvTimeoutError::Disconnected),
        Some(deadline) => rx.recv_timeout(deadline.remaining()),
    };
    match received {
        Ok(value) => Ok(value),
        Err(mpsc::RecvTimeoutError::Timeout) => match deadline {
            Some(deadline) => Err(HarnessError::Timeout(deadline.limit)),
            None => Err(io::Error::other(format!("{name} stopped unexpectedly")).into()),
        },
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(io::Error::other(format!("{name} panicked")).into())
        }
    }
}
