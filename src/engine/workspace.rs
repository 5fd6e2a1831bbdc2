//! Per-invocation temporary workspace.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, warn};

use crate::options::RenderFormat;
use crate::Result;

const WORKSPACE_PREFIX: &str = "phantom-render-";
const INPUT_FILE: &str = "input.html";
const SCRIPT_FILE: &str = "script.js";
const OUTPUT_STEM: &str = "output";

/// A uniquely named temporary directory owned by exactly one engine call.
///
/// Everything staged here is removed when the workspace is released or
/// dropped, on every exit path. Cleanup failures are logged, never returned.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    /// Creates a fresh directory under `root`, or the system temp dir.
    pub fn acquire(root: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let dir = match root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        let path = dir.path().to_path_buf();
        debug!(
            target = "engine::workspace",
            op = "workspace::acquire",
            path = %path.display(),
            "Workspace acquired"
        );
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn input_path(&self) -> PathBuf {
        self.path.join(INPUT_FILE)
    }

    pub fn script_path(&self) -> PathBuf {
        self.path.join(SCRIPT_FILE)
    }

    pub fn output_path(&self, format: RenderFormat) -> PathBuf {
        self.path
            .join(format!("{OUTPUT_STEM}.{}", format.extension()))
    }

    /// Copies the caller's document into the workspace.
    pub async fn stage_input<R>(&self, source: &mut R) -> Result<PathBuf>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let path = self.input_path();
        stage(&path, source).await?;
        Ok(path)
    }

    /// Copies a caller-supplied script into the workspace.
    pub async fn stage_script<R>(&self, source: &mut R) -> Result<PathBuf>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let path = self.script_path();
        stage(&path, source).await?;
        Ok(path)
    }

    /// Writes generated script text into the workspace.
    pub async fn write_script(&self, script: &str) -> Result<PathBuf> {
        let path = self.script_path();
        tokio::fs::write(&path, script.as_bytes()).await?;
        Ok(path)
    }

    /// Removes the directory now instead of waiting for drop.
    pub fn release(mut self) {
        self.cleanup();
    }

    fn cleanup(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        match dir.close() {
            Ok(()) => debug!(
                target = "engine::workspace",
                op = "workspace::release",
                result = "ok",
                path = %self.path.display(),
                "Workspace released"
            ),
            Err(err) => warn!(
                target = "engine::workspace",
                op = "workspace::release",
                result = "error",
                path = %self.path.display(),
                error = %err,
                "Failed to remove workspace; continuing"
            ),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.cleanup();
    }
}

async fn stage<R>(path: &Path, source: &mut R) -> Result<()>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut file = tokio::fs::File::create(path).await?;
    tokio::io::copy(source, &mut file).await?;
    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn acquire_creates_distinct_directories() {
        let root = TempDir::new().expect("root");
        let workspaces: Vec<Workspace> = (0..10)
            .map(|_| Workspace::acquire(Some(root.path())).expect("workspace"))
            .collect();

        let paths: HashSet<PathBuf> = workspaces.iter().map(|w| w.path().to_path_buf()).collect();
        assert_eq!(paths.len(), 10);
        for workspace in &workspaces {
            assert!(workspace.path().starts_with(root.path()));
            assert!(workspace.path().is_dir());
        }
    }

    #[tokio::test]
    async fn staged_files_are_removed_on_drop() {
        let root = TempDir::new().expect("root");
        let workspace = Workspace::acquire(Some(root.path())).expect("workspace");
        let mut html: &[u8] = b"<html><body>hi</body></html>";
        let input = workspace.stage_input(&mut html).await.expect("stage");
        let script = workspace.write_script("phantom.exit(0);").await.expect("script");

        assert_eq!(std::fs::read_to_string(&input).unwrap(), "<html><body>hi</body></html>");
        assert!(script.exists());

        let dir = workspace.path().to_path_buf();
        drop(workspace);
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn release_removes_directory_immediately() {
        let workspace = Workspace::acquire(None).expect("workspace");
        let mut script: &[u8] = b"console.log('x');";
        workspace.stage_script(&mut script).await.expect("stage");
        let dir = workspace.path().to_path_buf();

        workspace.release();
        assert!(!dir.exists());
    }

    #[test]
    fn release_tolerates_directory_removed_underneath() {
        let workspace = Workspace::acquire(None).expect("workspace");
        std::fs::remove_dir_all(workspace.path()).expect("remove");
        workspace.release();
    }

    #[test]
    fn output_path_uses_format_extension() {
        let workspace = Workspace::acquire(None).expect("workspace");
        assert!(workspace
            .output_path(RenderFormat::Pdf)
            .ends_with("output.pdf"));
        assert!(workspace
            .output_path(RenderFormat::Jpeg)
            .ends_with("output.jpg"));
    }
}
