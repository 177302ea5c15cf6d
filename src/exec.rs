use anyhow::{Context, Result};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::CaseError;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

// --------------------- Executable resolution ------------------------------
pub fn is_windows() -> bool {
    cfg!(windows)
}

pub fn exe_suffix(windows: bool) -> &'static str {
    if windows {
        ".exe"
    } else {
        ""
    }
}

/// Locate the binary under test by convention: a data directory ending in
/// `test/data` sits two levels below the build directory holding the binary.
/// Any other data directory is assumed to hold the binary itself.
pub fn conventional_executable(data_dir: &Path, exe_name: &str, windows: bool) -> PathBuf {
    let base = if data_dir.ends_with(Path::new("test").join("data")) {
        data_dir
            .parent()
            .and_then(Path::parent)
            .unwrap_or(data_dir)
    } else {
        data_dir
    };
    base.join(format!("{exe_name}{}", exe_suffix(windows)))
}

/// Resolve an explicit `--exe` value. Bare names are searched on `PATH`,
/// then in the working directory.
pub fn resolve_override(exe: &Path) -> Result<PathBuf> {
    if exe.components().count() != 1 || exe.is_absolute() {
        return Ok(exe.to_path_buf());
    }
    match which::which(exe) {
        Ok(found) => Ok(found),
        Err(_) if exe.is_file() => Ok(Path::new(".").join(exe)),
        Err(err) => Err(err).with_context(|| format!("executable {exe:?} not found on PATH")),
    }
}

// --------------------- Child process --------------------------------------
/// Run `exe` with `args`, optionally feeding `stdin_data`, and return its
/// stdout. Stderr is discarded. A non-zero exit is an error.
pub fn run_child(
    exe: &Path,
    args: &[String],
    stdin_data: Option<&[u8]>,
    timeout: Option<Duration>,
) -> Result<Vec<u8>, CaseError> {
    let mut command = Command::new(exe);
    command.args(args);
    command.stdin(if stdin_data.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });
    command.stdout(Stdio::piped()).stderr(Stdio::null());
    let mut child = command.spawn().map_err(|source| CaseError::Spawn {
        path: exe.to_path_buf(),
        source,
    })?;

    let deadline = timeout.map(Deadline::after);

    let stdin_done = match (stdin_data, child.stdin.take()) {
        (Some(data), Some(mut stdin)) => {
            let owned = data.to_vec();
            let (tx, rx) = mpsc::channel();
            thread::spawn(move || {
                let written = match stdin.write_all(&owned) {
                    // The child may exit without draining its input.
                    Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                    other => other,
                };
                let _ = tx.send(written);
            });
            Some(rx)
        }
        _ => None,
    };
    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("child stdout was not captured"))?;
    let (stdout_tx, stdout_rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let read = stdout.read_to_end(&mut buf).map(|_| buf);
        let _ = stdout_tx.send(read);
    });

    let status = match &deadline {
        None => child.wait()?,
        Some(deadline) => match wait_until(&mut child, deadline.at)? {
            Some(status) => status,
            None => {
                child.kill()?;
                child.wait()?;
                return Err(deadline.expired());
            }
        },
    };

    // Descendants can keep the pipes open after the child exits, so the
    // deadline also bounds draining them.
    if let Some(rx) = stdin_done {
        receive(&rx, deadline.as_ref())?;
    }
    let output = receive(&stdout_rx, deadline.as_ref())?;

    tracing::debug!(
        "[CMD ] {:?} {:?} -> status {:?}, stdout {}B",
        exe,
        args,
        status.code(),
        output.len()
    );

    if !status.success() {
        return Err(CaseError::ExitStatus {
            code: status.code(),
        });
    }
    Ok(output)
}

struct Deadline {
    at: Instant,
    limit: Duration,
}

impl Deadline {
    fn after(limit: Duration) -> Self {
        Self {
            at: Instant::now() + limit,
            limit,
        }
    }

    fn expired(&self) -> CaseError {
        CaseError::Timeout {
            secs: self.limit.as_secs(),
        }
    }
}

fn wait_until(child: &mut Child, at: Instant) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= at {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Take a pipe worker's result, giving up once `deadline` passes.
fn receive<T>(rx: &Receiver<io::Result<T>>, deadline: Option<&Deadline>) -> Result<T, CaseError> {
    let received = match deadline {
        None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        Some(deadline) => rx.recv_timeout(deadline.at.saturating_duration_since(Instant::now())),
    };
    match received {
        Ok(result) => Ok(result?),
        Err(RecvTimeoutError::Timeout) => Err(deadline.map_or_else(
            || io::Error::other("pipe worker timed out").into(),
            Deadline::expired,
        )),
        Err(RecvTimeoutError::Disconnected) => {
            Err(io::Error::other("pipe worker exited without a result").into())
        }
    }
}
