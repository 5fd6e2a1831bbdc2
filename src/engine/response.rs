//! Mapping finished engine processes to caller-facing results.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::process::ProcessOutput;
use super::script::{EXIT_LOAD_FAILED, EXIT_OK, EXIT_READY_TIMEOUT, EXIT_SCRIPT_ERROR};
use super::workspace::Workspace;
use crate::options::RenderFormat;
use crate::{PhantomError, Result};

/// Exit code and captured output of a script run.
///
/// Streams are decoded as UTF-8; invalid sequences become U+FFFD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResponse {
    exit_code: i32,
    std_out: String,
    std_err: String,
}

impl ExecutionResponse {
    pub fn new(exit_code: i32, std_out: impl Into<String>, std_err: impl Into<String>) -> Self {
        Self {
            exit_code,
            std_out: std_out.into(),
            std_err: std_err.into(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn std_out(&self) -> &str {
        &self.std_out
    }

    pub fn std_err(&self) -> &str {
        &self.std_err
    }

    pub fn success(&self) -> bool {
        self.exit_code == EXIT_OK
    }
}

impl From<ProcessOutput> for ExecutionResponse {
    fn from(output: ProcessOutput) -> Self {
        ExecutionResponse::new(output.exit_code, output.stdout_text(), output.stderr_text())
    }
}

/// An open stream over a rendered artifact.
///
/// The stream owns the workspace the artifact lives in. Dropping it, or
/// calling [`RenderedPdf::close`], removes the workspace.
#[derive(Debug)]
pub struct RenderedPdf {
    // Declared before `workspace` so the handle is closed before removal.
    file: File,
    len: u64,
    path: PathBuf,
    format: RenderFormat,
    elapsed: Duration,
    workspace: Workspace,
}

impl RenderedPdf {
    /// Size of the artifact in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn format(&self) -> RenderFormat {
        self.format
    }

    /// Wall-clock time the engine spent rendering.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Location of the artifact; valid until the stream is closed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Workspace directory backing this stream.
    pub fn workspace_path(&self) -> &Path {
        self.workspace.path()
    }

    /// Reads the remaining bytes and releases the workspace.
    pub fn into_bytes(mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.len as usize);
        self.file.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Closes the stream and removes the workspace.
    pub fn close(self) {
        let RenderedPdf {
            file, workspace, ..
        } = self;
        drop(file);
        workspace.release();
    }
}

impl Read for RenderedPdf {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Seek for RenderedPdf {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

/// Classifies a finished render process.
///
/// Only a zero exit with a non-empty artifact is a success. Readiness
/// timeouts reported by the script become [`PhantomError::Timeout`]; every
/// other outcome is a [`PhantomError::Render`] carrying stderr.
pub(crate) fn map_render_output(
    output: ProcessOutput,
    workspace: Workspace,
    format: RenderFormat,
    js_wait_timeout: Duration,
) -> Result<RenderedPdf> {
    let stderr = output.stderr_text();
    match output.exit_code {
        EXIT_OK => {}
        EXIT_READY_TIMEOUT => {
            return Err(PhantomError::timeout(
                js_wait_timeout,
                "page did not become ready before the JavaScript wait timeout",
                stderr,
            ))
        }
        EXIT_LOAD_FAILED => {
            return Err(PhantomError::render(
                Some(output.exit_code),
                "engine could not load the document",
                stderr,
            ))
        }
        EXIT_SCRIPT_ERROR => {
            return Err(PhantomError::render(
                Some(output.exit_code),
                "render script raised an error (check header/footer functions)",
                stderr,
            ))
        }
        code => {
            return Err(PhantomError::render(
                Some(code),
                format!("engine exited with status {code}"),
                stderr,
            ))
        }
    }

    let path = workspace.output_path(format);
    let file = match File::open(&path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(PhantomError::render(
                Some(output.exit_code),
                "engine exited cleanly but produced no output file",
                stderr,
            ))
        }
        Err(err) => return Err(PhantomError::Io(err)),
    };
    let len = file.metadata()?.len();
    if len == 0 {
        return Err(PhantomError::render(
            Some(output.exit_code),
            "engine exited cleanly but the output file is empty",
            stderr,
        ));
    }

    Ok(RenderedPdf {
        file,
        len,
        path,
        format,
        elapsed: output.elapsed,
        workspace,
    })
}
