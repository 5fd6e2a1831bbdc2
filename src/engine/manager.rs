//! Engine manager for running scripts and renders.
//!
//! This module provides the `PhantomEngine` struct, which owns the engine
//! settings and bounds the number of simultaneous engine processes with a
//! semaphore.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncRead;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, info};

use super::process::{run_engine, EngineInvocation};
use super::response::{map_render_output, ExecutionResponse, RenderedPdf};
use super::script::generate_render_script;
use super::workspace::Workspace;
use crate::options::{EngineOptions, RenderOptions};
use crate::{PhantomError, Result};

/// Environment variable that overrides the default engine executable.
pub const PHANTOMJS_BIN_ENV: &str = "PHANTOMJS_BIN";

/// Default cap on simultaneous engine processes.
pub const DEFAULT_MAX_CONCURRENT_PROCESSES: usize = 16;

/// Extra wall-clock time a render may take beyond its JavaScript wait timeout.
pub const DEFAULT_RENDER_GRACE: Duration = Duration::from_secs(30);

/// Limit for the `--version` availability probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Executable used when no path is configured, resolved once per process.
pub static DEFAULT_EXECUTABLE: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var_os(PHANTOMJS_BIN_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("phantomjs"))
});

/// Settings shared by every invocation of one engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EngineSettings {
    /// Engine executable, a bare name looked up on PATH or a path.
    pub executable: PathBuf,
    /// Directory under which workspaces are created (system temp dir if unset).
    pub workspace_root: Option<PathBuf>,
    /// Maximum number of engine processes alive at once.
    pub max_concurrent_processes: usize,
    /// Hard limit for script runs; unbounded when unset.
    #[serde(with = "humantime_serde")]
    pub exec_timeout: Option<Duration>,
    /// Added to the JavaScript wait timeout to form the hard render limit.
    #[serde(with = "humantime_serde")]
    pub render_grace: Duration,
    /// Limit for [`PhantomEngine::engine_version`].
    #[serde(with = "humantime_serde")]
    pub probe_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            executable: DEFAULT_EXECUTABLE.clone(),
            workspace_root: None,
            max_concurrent_processes: DEFAULT_MAX_CONCURRENT_PROCESSES,
            exec_timeout: None,
            render_grace: DEFAULT_RENDER_GRACE,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl EngineSettings {
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    pub fn with_max_concurrent_processes(mut self, max: usize) -> Self {
        self.max_concurrent_processes = max;
        self
    }

    pub fn with_exec_timeout(mut self, limit: Duration) -> Self {
        self.exec_timeout = Some(limit);
        self
    }

    pub fn with_render_grace(mut self, grace: Duration) -> Self {
        self.render_grace = grace;
        self
    }
}

/// Drives the engine executable.
///
/// Cloning is cheap; clones share the same process limit.
#[derive(Debug, Clone)]
pub struct PhantomEngine {
    settings: EngineSettings,
    switches: EngineOptions,
    semaphore: Arc<Semaphore>,
}

impl Default for PhantomEngine {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}

impl PhantomEngine {
    pub fn new(settings: EngineSettings) -> Self {
        let permits = settings.max_concurrent_processes.max(1);
        Self {
            settings,
            switches: EngineOptions::DEFAULT,
            semaphore: Arc::new(Semaphore::new(permits)),
        }
    }

    /// Sets the switches used by [`exec`](Self::exec) and every render.
    pub fn with_switches(mut self, switches: EngineOptions) -> Self {
        self.switches = switches;
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn switches(&self) -> &EngineOptions {
        &self.switches
    }

    pub fn executable(&self) -> &Path {
        &self.settings.executable
    }

    /// Runs `script` with the engine's configured switches.
    pub async fn exec<R>(&self, script: &mut R) -> Result<ExecutionResponse>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let options = self.switches.clone();
        self.exec_with(script, &options).await
    }

    /// Runs `script` with explicit switches.
    ///
    /// The exit code is returned as-is; a non-zero exit is not an error. With
    /// `help` or `version` set, the engine is asked for that information
    /// instead and the script is never read.
    pub async fn exec_with<R>(
        &self,
        script: &mut R,
        options: &EngineOptions,
    ) -> Result<ExecutionResponse>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let start = Instant::now();

        if let Some(switch) = options.short_circuit_switch() {
            let _permit = self.acquire().await?;
            let output = run_engine(EngineInvocation {
                program: self.executable(),
                args: vec![OsString::from(switch)],
                current_dir: None,
                limit: self.settings.exec_timeout,
            })
            .await?;
            debug!(
                target = "engine::manager",
                op = "engine::exec",
                result = "short_circuit",
                switch,
                exit_code = output.exit_code,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Informational engine run finished"
            );
            return Ok(output.into());
        }

        let _permit = self.acquire().await?;
        let workspace = Workspace::acquire(self.settings.workspace_root.as_deref())?;
        let script_path = workspace.stage_script(script).await?;

        let mut args: Vec<OsString> = options.switches().into_iter().map(OsString::from).collect();
        args.push(script_path.into_os_string());

        let output = run_engine(EngineInvocation {
            program: self.executable(),
            args,
            current_dir: None,
            limit: self.settings.exec_timeout,
        })
        .await?;
        workspace.release();

        info!(
            target = "engine::manager",
            op = "engine::exec",
            result = "ok",
            exit_code = output.exit_code,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Script run finished"
        );
        Ok(output.into())
    }

    /// Renders an HTML document.
    ///
    /// `options` are validated before anything is staged or spawned. The
    /// engine gets `js_wait_timeout + render_grace` of wall-clock time before
    /// it is killed.
    pub async fn render<R>(&self, html: &mut R, options: &RenderOptions) -> Result<RenderedPdf>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        options.validate()?;
        let start = Instant::now();

        let _permit = self.acquire().await?;
        let workspace = Workspace::acquire(self.settings.workspace_root.as_deref())?;
        let input_path = workspace.stage_input(html).await?;
        let output_path = workspace.output_path(options.format);
        let script = generate_render_script(options, &input_path, &output_path)?;
        let script_path = workspace.write_script(&script).await?;

        let mut args: Vec<OsString> = self
            .switches
            .switches()
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(script_path.into_os_string());

        let limit = options
            .js_wait_timeout
            .checked_add(self.settings.render_grace)
            .ok_or_else(|| {
                PhantomError::invalid_configuration(
                    "JavaScript wait timeout plus render grace overflows the hard limit",
                )
            })?;
        debug!(
            target = "engine::manager",
            op = "engine::render",
            workspace = %workspace.path().display(),
            format = options.format.as_str(),
            limit_ms = limit.as_millis() as u64,
            "Starting render"
        );

        let output = run_engine(EngineInvocation {
            program: self.executable(),
            args,
            current_dir: Some(workspace.path()),
            limit: Some(limit),
        })
        .await?;

        let rendered = map_render_output(output, workspace, options.format, options.js_wait_timeout)?;
        info!(
            target = "engine::manager",
            op = "engine::render",
            result = "ok",
            bytes = rendered.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Render finished"
        );
        Ok(rendered)
    }

    /// Asks the engine for its version string.
    pub async fn engine_version(&self) -> Result<String> {
        let _permit = self.acquire().await?;
        let output = run_engine(EngineInvocation {
            program: self.executable(),
            args: vec![OsString::from("--version")],
            current_dir: None,
            limit: Some(self.settings.probe_timeout),
        })
        .await?;

        if output.exit_code != 0 {
            return Err(PhantomError::render(
                Some(output.exit_code),
                "engine --version probe failed",
                output.stderr_text(),
            ));
        }
        Ok(output.stdout_text().trim().to_string())
    }

    async fn acquire(&self) -> Result<SemaphorePermit<'_>> {
        self.semaphore
            .acquire()
            .await
            .map_err(|_| PhantomError::Config("Engine manager unavailable".to_string()))
    }
}
