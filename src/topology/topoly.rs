//! Topoly integration.
//!
//! Topoly (Dabrowski-Tumanski et al., 2021) is a Python package computing knot
//! polynomials over random closures of an open chain. It is run as a
//! subprocess: a short script loads the persisted PDB, calls the selected
//! polynomial function and prints the resulting distribution as JSON on its
//! last line of output.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::TopologyConfig;
use crate::parsing::pdb::StructureModel;
use crate::topology::{ClassificationError, Distribution, KnotInvariant};

/// Arguments: structure path, polynomial name, closure scheme, number of tries
const TOPOLY_SCRIPT: &str = r"
import json, sys
import topoly
path, method, closure, tries = sys.argv[1], sys.argv[2], int(sys.argv[3]), int(sys.argv[4])
result = getattr(topoly, method)(path, closure=closure, tries=tries)
if not isinstance(result, dict):
    result = {str(result): 1.0}
print(json.dumps({str(k): float(v) for k, v in result.items()}))
";

const POLL_INTERVAL: Duration = Duration::from_millis(50);
/// How long output readers may lag behind the exit of the child
const READER_GRACE: Duration = Duration::from_secs(2);

/// Runs Topoly through a Python interpreter
#[derive(Debug, Clone)]
pub struct TopolyCommand {
    config: TopologyConfig,
}

impl TopolyCommand {
    pub fn new(config: TopologyConfig) -> Self {
        Self { config }
    }

    /// Check that the interpreter can import the library
    pub fn is_available(&self) -> bool {
        Command::new(&self.config.python)
            .args(["-c", "import topoly"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    }
}

impl KnotInvariant for TopolyCommand {
    fn distribution(
        &self,
        structure: &StructureModel,
        closure_scheme: u8,
        sample_count: u32,
    ) -> Result<Distribution, ClassificationError> {
        let path = structure.path().ok_or(ClassificationError::NotPersisted)?;

        tracing::debug!(
            "Running {} with closure {closure_scheme} and {sample_count} tries on {}",
            self.config.invariant,
            path.display()
        );

        let child = Command::new(&self.config.python)
            .arg("-c")
            .arg(TOPOLY_SCRIPT)
            .arg(path)
            .arg(self.config.invariant.function_name())
            .arg(closure_scheme.to_string())
            .arg(sample_count.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ClassificationError::Invariant(format!(
                    "failed to start {}: {e}",
                    self.config.python.display()
                ))
            })?;

        let output = wait_with_timeout(child, self.config.timeout())?;
        if !output.success {
            let reason = output.stderr.lines().last().unwrap_or("no error output");
            return Err(ClassificationError::Invariant(format!(
                "topoly exited unsuccessfully: {reason}"
            )));
        }

        parse_distribution(&output.stdout)
    }
}

struct Finished {
    success: bool,
    stdout: String,
    stderr: String,
}

/// Drains one output pipe of the child on a background thread.
///
/// The buffer is shared so output can be collected even if the pipe is never
/// closed, e.g. when a grandchild inherited it and outlives the child.
struct PipeReader {
    buffer: Arc<Mutex<Vec<u8>>>,
    handle: thread::JoinHandle<()>,
}

impl PipeReader {
    fn spawn<R: Read + Send + 'static>(pipe: Option<R>) -> Self {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);

        let handle = thread::spawn(move || {
            let Some(mut pipe) = pipe else {
                return;
            };
            let mut chunk = [0_u8; 4096];
            while let Ok(n) = pipe.read(&mut chunk) {
                if n == 0 {
                    break;
                }
                match sink.lock() {
                    Ok(mut buffer) => buffer.extend_from_slice(&chunk[..n]),
                    Err(_) => break,
                }
            }
        });

        Self { buffer, handle }
    }

    /// Output read so far, waiting at most until `deadline` for end of stream
    fn collect(self, deadline: Instant) -> String {
        while !self.handle.is_finished() && Instant::now() < deadline {
            thread::sleep(POLL_INTERVAL);
        }
        if self.handle.is_finished() {
            let _ = self.handle.join();
        } else {
            tracing::debug!("Topoly output pipe still open after exit; reader detached");
        }

        self.buffer
            .lock()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    }
}

/// Wait for `child`, killing it once `timeout` has elapsed.
///
/// Output pipes are drained on separate threads so a chatty child cannot block
/// on a full pipe. After the child exits its readers get `READER_GRACE` to
/// reach end of stream.
fn wait_with_timeout(mut child: Child, timeout: Duration) -> Result<Finished, ClassificationError> {
    let stdout = PipeReader::spawn(child.stdout.take());
    let stderr = PipeReader::spawn(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                drop(stdout);
                let stderr = stderr.collect(Instant::now() + READER_GRACE);
                tracing::debug!("Killed topoly; last output: {}", stderr.trim());
                return Err(ClassificationError::Invariant(format!(
                    "timed out after {}s",
                    timeout.as_secs()
                )));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                return Err(ClassificationError::Invariant(format!(
                    "failed waiting for topoly: {e}"
                )))
            }
        }
    };

    let grace = Instant::now() + READER_GRACE;
    Ok(Finished {
        success: status.success(),
        stdout: stdout.collect(grace),
        stderr: stderr.collect(grace),
    })
}

/// Parse the distribution from the last non-empty line of script output
fn parse_distribution(stdout: &str) -> Result<Distribution, ClassificationError> {
    let line = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| ClassificationError::Invariant("topoly produced no output".to_string()))?;

    serde_json::from_str(line)
        .map_err(|e| ClassificationError::Invariant(format!("unexpected topoly output: {e}")))
}
