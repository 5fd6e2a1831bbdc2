#![cfg(unix)]

mod support;

use std::collections::HashSet;
use std::io::Read;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use phantom_render::{
    BannerInfo, BlockingEngine, EngineOptions, EngineSettings, PhantomEngine, PhantomError,
    RenderOptions, SizeUnit,
};
use support::{entries, FakeEngine, EXEC_AS_SHELL, FAKE_VERSION, RENDER_OK};
use tempfile::TempDir;

fn engine(fake: &FakeEngine, root: &TempDir) -> PhantomEngine {
    PhantomEngine::new(
        EngineSettings::default()
            .with_executable(fake.path())
            .with_workspace_root(root.path()),
    )
}

const SMALL_HTML: &[u8] = b"<html><body><p>Hello</p></body></html>";

#[tokio::test]
async fn exec_returns_exit_code_and_streams() {
    let fake = FakeEngine::new(EXEC_AS_SHELL);
    let root = TempDir::new().unwrap();
    let engine = engine(&fake, &root);

    let mut script: &[u8] = b"echo 'hello from script'\nexit 3\n";
    let response = engine.exec(&mut script).await.expect("exec");

    assert_eq!(response.exit_code(), 3);
    assert_eq!(response.std_out(), "hello from script\n");
    assert!(response.std_err().is_empty(), "stderr: {}", response.std_err());
    assert_eq!(entries(root.path()), 0);
}

#[tokio::test]
async fn exec_passes_switches_before_script() {
    let fake = FakeEngine::new(EXEC_AS_SHELL);
    let root = TempDir::new().unwrap();
    let engine = engine(&fake, &root);

    let options = EngineOptions::DEFAULT
        .with_ignore_ssl_errors(true)
        .with_load_images(false);
    let mut script: &[u8] = b"exit 0\n";
    let response = engine.exec_with(&mut script, &options).await.expect("exec");
    assert!(response.success());

    let invocations = fake.invocations();
    assert_eq!(invocations.len(), 1);
    let args: Vec<&str> = invocations[0].split_whitespace().collect();
    assert_eq!(args[0], "--ignore-ssl-errors=true");
    assert_eq!(args[1], "--load-images=false");
    assert!(args[2].ends_with("script.js"), "args: {args:?}");
}

#[tokio::test]
async fn help_and_version_short_circuit_the_script() {
    let fake = FakeEngine::new(EXEC_AS_SHELL);
    let root = TempDir::new().unwrap();
    let engine = engine(&fake, &root);

    // Would exit 9 if it were ever run.
    let broken = b"exit 9\n";

    let help = engine
        .exec_with(&mut &broken[..], &EngineOptions::DEFAULT.with_help(true))
        .await
        .expect("help");
    assert_eq!(help.exit_code(), 0);
    assert!(help.std_out().contains("Usage"));

    let version = engine
        .exec_with(&mut &broken[..], &EngineOptions::DEFAULT.with_version(true))
        .await
        .expect("version");
    assert_eq!(version.exit_code(), 0);
    assert_eq!(version.std_out().trim(), FAKE_VERSION);

    let both = engine
        .exec_with(
            &mut &broken[..],
            &EngineOptions::DEFAULT.with_version(true).with_help(true),
        )
        .await
        .expect("both");
    assert!(both.std_out().contains("Usage"));

    assert_eq!(fake.invocations(), vec!["--help", "--version", "--help"]);
}

#[tokio::test]
async fn exec_timeout_kills_the_engine() {
    let fake = FakeEngine::new("exec sleep 30\n");
    let root = TempDir::new().unwrap();
    let engine = PhantomEngine::new(
        EngineSettings::default()
            .with_executable(fake.path())
            .with_workspace_root(root.path())
            .with_exec_timeout(Duration::from_millis(300)),
    );

    let started = Instant::now();
    let err = engine
        .exec(&mut &b"ignored"[..])
        .await
        .expect_err("must time out");
    assert!(err.is_timeout());
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(entries(root.path()), 0);
}

#[tokio::test]
async fn render_with_empty_options_does_not_spawn() {
    let fake = FakeEngine::new(RENDER_OK);
    let root = TempDir::new().unwrap();
    let engine = engine(&fake, &root);

    let err = engine
        .render(&mut &SMALL_HTML[..], &RenderOptions::EMPTY)
        .await
        .expect_err("must fail");
    assert!(matches!(err, PhantomError::InvalidConfiguration(_)));
    assert!(fake.invocations().is_empty());
    assert_eq!(entries(root.path()), 0);
}

#[tokio::test]
async fn render_returns_stream_and_cleans_up_after_close() {
    let fake = FakeEngine::new(RENDER_OK);
    let root = TempDir::new().unwrap();
    let engine = engine(&fake, &root);

    let options = RenderOptions::DEFAULT
        .with_header_info(BannerInfo::new(1.0, SizeUnit::Centimeters, "function (p, n) { return '' + p; }"));
    let mut pdf = engine
        .render(&mut &SMALL_HTML[..], &options)
        .await
        .expect("render");

    assert!(pdf.workspace_path().starts_with(root.path()));
    assert!(pdf.workspace_path().join("input.html").is_file());
    let mut bytes = Vec::new();
    pdf.read_to_end(&mut bytes).unwrap();
    assert!(bytes.starts_with(b"%PDF-1.4"));
    assert_eq!(bytes.len() as u64, pdf.len());

    pdf.close();
    assert_eq!(entries(root.path()), 0);
}

#[tokio::test]
async fn readiness_timeout_is_a_timeout_without_output() {
    let fake = FakeEngine::new(
        r#"
echo "timed out after 100ms waiting for the page to become ready" >&2
exit 65
"#,
    );
    let root = TempDir::new().unwrap();
    let engine = engine(&fake, &root);

    let options = RenderOptions::DEFAULT.with_javascript_execution_details(100, 10);
    let err = engine
        .render(&mut &SMALL_HTML[..], &options)
        .await
        .expect_err("must time out");
    assert!(err.is_timeout());
    assert!(err.stderr().unwrap_or_default().contains("timed out"));
    assert_eq!(entries(root.path()), 0);
}

#[tokio::test]
async fn hung_render_is_killed_at_the_hard_limit() {
    let fake = FakeEngine::new("exec sleep 30\n");
    let root = TempDir::new().unwrap();
    let engine = PhantomEngine::new(
        EngineSettings::default()
            .with_executable(fake.path())
            .with_workspace_root(root.path())
            .with_render_grace(Duration::from_millis(200)),
    );

    let options = RenderOptions::DEFAULT.with_javascript_execution_details(100, 50);
    let started = Instant::now();
    let err = engine
        .render(&mut &SMALL_HTML[..], &options)
        .await
        .expect_err("must time out");
    assert!(err.is_timeout());
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(entries(root.path()), 0);
}

#[tokio::test]
async fn background_child_holding_pipes_does_not_outlive_the_hard_limit() {
    let fake = FakeEngine::new(&format!("sleep 6 &\n{}", RENDER_OK));
    let root = TempDir::new().unwrap();
    let engine = PhantomEngine::new(
        EngineSettings::default()
            .with_executable(fake.path())
            .with_workspace_root(root.path())
            .with_render_grace(Duration::from_millis(500)),
    );

    let options = RenderOptions::DEFAULT.with_javascript_execution_details(500, 50);
    let started = Instant::now();
    let pdf = engine
        .render(&mut &SMALL_HTML[..], &options)
        .await
        .expect("engine exited cleanly with output");
    assert!(
        started.elapsed() < Duration::from_secs(4),
        "render took {:?}",
        started.elapsed()
    );
    assert!(pdf.len() > 0);
    pdf.close();
    assert_eq!(entries(root.path()), 0);
}

#[tokio::test]
async fn failing_engine_reports_render_error_with_stderr() {
    let fake = FakeEngine::new(
        r#"
echo "ReferenceError: Can't find variable: pageNum" >&2
exit 1
"#,
    );
    let root = TempDir::new().unwrap();
    let engine = engine(&fake, &root);

    let err = engine
        .render(&mut &SMALL_HTML[..], &RenderOptions::DEFAULT)
        .await
        .expect_err("must fail");
    match err {
        PhantomError::Render {
            exit_code, stderr, ..
        } => {
            assert_eq!(exit_code, Some(1));
            assert!(stderr.contains("ReferenceError"));
        }
        other => panic!("expected render error, got {other:?}"),
    }
    assert_eq!(entries(root.path()), 0);
}

#[tokio::test]
async fn clean_exit_without_output_is_a_render_error() {
    let fake = FakeEngine::new(": > \"$out\"\nexit 0\n");
    let root = TempDir::new().unwrap();
    let engine = engine(&fake, &root);

    let err = engine
        .render(&mut &SMALL_HTML[..], &RenderOptions::DEFAULT)
        .await
        .expect_err("must fail");
    assert!(matches!(err, PhantomError::Render { exit_code: Some(0), .. }));
    assert_eq!(entries(root.path()), 0);
}

#[tokio::test]
async fn concurrent_renders_use_distinct_workspaces() {
    let fake = FakeEngine::new(RENDER_OK);
    let root = TempDir::new().unwrap();
    let engine = engine(&fake, &root);

    let renders = (0..10).map(|i| {
        let engine = engine.clone();
        async move {
            let html = format!("<html><body><p>document {i}</p></body></html>");
            let mut reader = html.as_bytes();
            let rendered = engine.render(&mut reader, &RenderOptions::DEFAULT).await;
            rendered
        }
    });
    let results = futures::future::join_all(renders).await;

    let pdfs: Vec<_> = results
        .into_iter()
        .map(|r| r.expect("render"))
        .collect();
    let paths: HashSet<PathBuf> = pdfs
        .iter()
        .map(|pdf| pdf.workspace_path().to_path_buf())
        .collect();
    assert_eq!(paths.len(), 10);
    assert_eq!(fake.invocations().len(), 10);

    drop(pdfs);
    assert_eq!(entries(root.path()), 0);
}

#[tokio::test]
async fn engine_version_is_trimmed_stdout() {
    let fake = FakeEngine::new(RENDER_OK);
    let root = TempDir::new().unwrap();
    let version = engine(&fake, &root).engine_version().await.expect("version");
    assert_eq!(version, FAKE_VERSION);
}

#[test]
fn blocking_engine_runs_scripts_and_renders() {
    let exec_fake = FakeEngine::new(EXEC_AS_SHELL);
    let render_fake = FakeEngine::new(RENDER_OK);
    let root = TempDir::new().unwrap();

    let exec_engine = BlockingEngine::new(
        EngineSettings::default()
            .with_executable(exec_fake.path())
            .with_workspace_root(root.path()),
    )
    .expect("runtime");
    let response = exec_engine
        .exec("echo out; echo err >&2; exit 5\n".as_bytes())
        .expect("exec");
    assert_eq!(response.exit_code(), 5);
    assert_eq!(response.std_out(), "out\n");
    assert_eq!(response.std_err(), "err\n");

    let render_engine = BlockingEngine::new(
        EngineSettings::default()
            .with_executable(render_fake.path())
            .with_workspace_root(root.path()),
    )
    .expect("runtime");
    let pdf = render_engine
        .render(SMALL_HTML, &RenderOptions::DEFAULT)
        .expect("render");
    let bytes = pdf.into_bytes().expect("bytes");
    assert!(bytes.starts_with(b"%PDF"));
    assert_eq!(entries(root.path()), 0);
}

#[test]
fn blocking_engine_is_shared_across_threads() {
    let fake = FakeEngine::new(RENDER_OK);
    let root = TempDir::new().unwrap();
    let engine = BlockingEngine::new(
        EngineSettings::default()
            .with_executable(fake.path())
            .with_workspace_root(root.path()),
    )
    .expect("runtime");

    let workspaces: HashSet<PathBuf> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..10)
            .map(|i| {
                let engine = &engine;
                scope.spawn(move || {
                    let html = format!("<html><body><p>thread {i}</p></body></html>");
                    let mut pdf = engine
                        .render(html.as_bytes(), &RenderOptions::DEFAULT)
                        .expect("render");
                    let mut bytes = Vec::new();
                    pdf.read_to_end(&mut bytes).expect("read");
                    assert!(bytes.starts_with(b"%PDF"));
                    pdf.workspace_path().to_path_buf()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread"))
            .collect()
    });

    assert_eq!(workspaces.len(), 10);
    assert_eq!(fake.invocations().len(), 10);
    assert_eq!(entries(root.path()), 0);
}
