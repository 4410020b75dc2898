//! Child process plumbing for one model invocation.

use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::decode::OutputDecoding;
use crate::error::{RunError, RunResult};

const SPAWN_ATTEMPTS: u32 = 5;
const STDERR_TAIL: usize = 20;

/// Run `executable` with `cwd` as its working directory, handing each
/// non-empty stdout line to `on_line` as it arrives. Returns the line count.
pub(crate) fn run_executable(
    executable: &Path,
    cwd: &Path,
    decoding: OutputDecoding,
    on_line: &mut dyn FnMut(&str),
) -> RunResult<()> {
    let executable = std::path::absolute(executable).map_err(|source| RunError::Spawn {
        executable: executable.to_path_buf(),
        source,
    })?;
    let mut child = spawn(&executable, cwd)?;

    let stderr = child
        .stderr
        .take()
        .map(|pipe| thread::spawn(move || collect_tail(pipe, decoding)));

    let io_error = |source: io::Error| RunError::Io {
        executable: executable.clone(),
        source,
    };

    let mut lines = 0;
    if let Some(stdout) = child.stdout.take() {
        let mut reader = BufReader::new(stdout);
        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            if reader.read_until(b'\n', &mut buffer).map_err(io_error)? == 0 {
                break;
            }
            let line = decoding.decode(&buffer);
            let line = line.trim();
            if !line.is_empty() {
                lines += 1;
                on_line(line);
            }
        }
    }

    let status = child.wait().map_err(io_error)?;
    let stderr_tail = match stderr {
        Some(handle) => handle.join().unwrap_or_else(|_| {
            warn!(executable = %executable.display(), "stderr reader panicked");
            Vec::new()
        }),
        None => Vec::new(),
    };

    debug!(executable = %executable.display(), %status, lines, "executable finished");
    if status.success() {
        Ok(())
    } else {
        Err(RunError::ExecutableFailed {
            executable,
            status: status.to_string(),
            code: status.code(),
            stderr_tail,
        })
    }
}

/// A freshly copied executable can briefly report "text file busy" while
/// another thread's fork still holds the write descriptor.
fn spawn(executable: &Path, cwd: &Path) -> RunResult<Child> {
    let mut attempt = 1;
    loop {
        let spawned = Command::new(executable)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();
        match spawned {
            Ok(child) => return Ok(child),
            Err(err)
                if err.kind() == io::ErrorKind::ExecutableFileBusy && attempt < SPAWN_ATTEMPTS =>
            {
                debug!(executable = %executable.display(), attempt, "executable busy, retrying");
                thread::sleep(Duration::from_millis(25 * u64::from(attempt)));
                attempt += 1;
            }
            Err(source) => {
                return Err(RunError::Spawn {
                    executable: executable.to_path_buf(),
                    source,
                });
            }
        }
    }
}

/// Drain stderr completely so the child never blocks on a full pipe, keeping
/// only the last few lines for error reports.
fn collect_tail(pipe: impl Read, decoding: OutputDecoding) -> Vec<String> {
    let mut reader = BufReader::new(pipe);
    let mut tail = VecDeque::with_capacity(STDERR_TAIL);
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        match reader.read_until(b'\n', &mut buffer) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let line = decoding.decode(&buffer);
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if tail.len() == STDERR_TAIL {
                    tail.pop_front();
                }
                tail.push_back(line.to_string());
            }
        }
    }
    tail.into()
}
