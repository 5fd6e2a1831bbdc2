//! Fake engine executables for integration tests.
//!
//! Each fake is a POSIX shell script that answers `--help`/`--version`,
//! logs its arguments, and then runs a caller-supplied body with `$script`
//! (the last argument) and `$out` (the output path embedded in a generated
//! render script) already set.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const FAKE_VERSION: &str = "2.1.1";

/// Writes a minimal PDF to `$out` and exits 0.
pub const RENDER_OK: &str = r#"
[ -f input.html ] || { echo "input.html was not staged" >&2; exit 70; }
printf '%%PDF-1.4\n%% fake\n%%%%EOF\n' > "$out"
exit 0
"#;

/// Runs the staged script as shell code, so tests can script the engine.
pub const EXEC_AS_SHELL: &str = r#"
. "$script"
"#;

pub struct FakeEngine {
    dir: TempDir,
    path: PathBuf,
}

impl FakeEngine {
    pub fn new(body: &str) -> Self {
        let dir = TempDir::new().expect("fake engine dir");
        let path = dir.path().join("fake-phantomjs");
        let log = dir.path().join("args.log");
        let script = format!(
            r#"#!/bin/sh
echo "$@" >> "{log}"
for arg in "$@"; do
  case "$arg" in
    --help)
      echo "Usage: phantomjs [switchs] [options] [script] [argument [argument [...]]]"
      exit 0
      ;;
    --version)
      echo "{version}"
      exit 0
      ;;
  esac
done
script=""
for arg in "$@"; do script="$arg"; done
out=$(sed -n '1s/.*"outputPath":"\([^"]*\)".*/\1/p' "$script")
{body}
"#,
            log = log.display(),
            version = FAKE_VERSION,
        );
        fs::write(&path, script).expect("write fake engine");
        let mut perms = fs::metadata(&path).expect("metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("set perms");
        Self { dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Argument lines of every invocation so far.
    pub fn invocations(&self) -> Vec<String> {
        fs::read_to_string(self.dir.path().join("args.log"))
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// Number of entries left under a workspace root.
pub fn entries(root: &Path) -> usize {
    fs::read_dir(root).map(|dir| dir.count()).unwrap_or(0)
}
