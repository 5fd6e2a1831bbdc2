//! Subprocess spawning, stream draining and hard timeouts.

use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, timeout};
use tracing::{debug, warn};

use crate::{PhantomError, Result};

/// How long to keep reading the pipes once the engine has gone; grandchildren
/// may still hold them open.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Raw result of a finished engine process.
#[derive(Debug, Clone)]
pub(crate) struct ProcessOutput {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub elapsed: Duration,
}

impl ProcessOutput {
    /// Captured stdout, decoded as UTF-8 with replacement characters.
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Captured stderr, decoded as UTF-8 with replacement characters.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// One engine invocation: program, arguments, working directory and limit.
#[derive(Debug, Clone)]
pub(crate) struct EngineInvocation<'a> {
    pub program: &'a Path,
    pub args: Vec<OsString>,
    pub current_dir: Option<&'a Path>,
    pub limit: Option<Duration>,
}

/// Background reader collecting one pipe until EOF or until told to stop.
struct Drain {
    stop: oneshot::Sender<()>,
    task: JoinHandle<Vec<u8>>,
}

impl Drain {
    fn spawn<R>(pipe: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (stop, mut stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let Some(mut pipe) = pipe else { return buf };
            let mut chunk = [0u8; 8192];
            loop {
                tokio::select! {
                    read = pipe.read(&mut chunk) => match read {
                        Ok(0) | Err(_) => break,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    },
                    _ = &mut stopped => break,
                }
            }
            buf
        });
        Self { stop, task }
    }

    /// Waits for EOF until `deadline`, then keeps whatever was read so far.
    async fn finish(mut self, deadline: time::Instant) -> (Vec<u8>, bool) {
        match time::timeout_at(deadline, &mut self.task).await {
            Ok(joined) => (joined.unwrap_or_default(), true),
            Err(_) => {
                let _ = self.stop.send(());
                (self.task.await.unwrap_or_default(), false)
            }
        }
    }
}

/// Runs the engine to completion.
///
/// stdout and stderr are drained on their own tasks while the process runs.
/// When `limit` elapses, or waiting fails, the process is killed and reaped
/// before the error is returned. Dropping the returned future also kills it.
/// After a normal exit the pipes are read for at most the rest of `limit`
/// (never less than [`DRAIN_GRACE`]), so a background child holding them open
/// cannot stall the caller.
pub(crate) async fn run_engine(invocation: EngineInvocation<'_>) -> Result<ProcessOutput> {
    let mut cmd = Command::new(invocation.program);
    cmd.args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = invocation.current_dir {
        cmd.current_dir(dir);
    }

    let start = Instant::now();
    let mut child = cmd
        .spawn()
        .map_err(|err| map_spawn_error(err, invocation.program))?;
    debug!(
        target = "engine::process",
        op = "process::spawn",
        program = %invocation.program.display(),
        args = ?invocation.args,
        pid = child.id(),
        "Engine process spawned"
    );

    let stdout = Drain::spawn(child.stdout.take());
    let stderr = Drain::spawn(child.stderr.take());

    let waited = match invocation.limit {
        Some(limit) => match timeout(limit, child.wait()).await {
            Ok(result) => result,
            Err(_) => {
                let _ = child.kill().await;
                let _ = child.wait().await;
                drop(stdout);
                let (stderr, _) = stderr.finish(time::Instant::now() + DRAIN_GRACE).await;
                warn!(
                    target = "engine::process",
                    op = "process::wait",
                    result = "timeout",
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    limit_ms = limit.as_millis() as u64,
                    "Engine exceeded its time limit; process killed"
                );
                return Err(PhantomError::timeout(
                    limit,
                    "engine process exceeded its wall-clock limit and was killed",
                    String::from_utf8_lossy(&stderr),
                ));
            }
        },
        None => child.wait().await,
    };

    let status = match waited {
        Ok(status) => status,
        Err(err) => {
            let _ = child.kill().await;
            let _ = child.wait().await;
            return Err(PhantomError::Io(err));
        }
    };

    // Whatever is left of the limit, but never less than the grace.
    let budget = invocation
        .limit
        .map_or(DRAIN_GRACE, |limit| limit.saturating_sub(start.elapsed()).max(DRAIN_GRACE));
    let deadline = time::Instant::now() + budget;
    let (stdout, stdout_closed) = stdout.finish(deadline).await;
    let (stderr, stderr_closed) = stderr.finish(deadline).await;
    if !(stdout_closed && stderr_closed) {
        warn!(
            target = "engine::process",
            op = "process::drain",
            result = "truncated",
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Engine exited but a descendant kept its output open; stopped reading"
        );
    }
    let exit_code = exit_code(status);

    debug!(
        target = "engine::process",
        op = "process::wait",
        result = "exited",
        exit_code,
        elapsed_ms = start.elapsed().as_millis() as u64,
        stdout_bytes = stdout.len(),
        stderr_bytes = stderr.len(),
        "Engine process exited"
    );

    Ok(ProcessOutput {
        exit_code,
        stdout,
        stderr,
        elapsed: start.elapsed(),
    })
}

/// Exit code of a finished process; signal deaths map to `128 + signal`.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

pub(crate) fn map_spawn_error(err: io::Error, program: &Path) -> PhantomError {
    if err.kind() == io::ErrorKind::NotFound {
        PhantomError::EngineNotFound {
            command: program.display().to_string(),
        }
    } else {
        PhantomError::Io(err)
    }
}
