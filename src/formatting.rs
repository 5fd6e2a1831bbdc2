use std::fmt::Write as FmtWrite;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use phantom_render::{ErrorOutput, PhantomError, PhantomOutput, OUTPUT_VERSION};

use crate::cli::OutputFormat;

/// Write output in the requested format.
pub fn write_output(
    body: &PhantomOutput,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => write_json_output(body, output.as_deref())?,
        OutputFormat::Pretty => write_pretty_output(body, output.as_deref())?,
    };
    Ok(())
}

/// Render an error and return the appropriate exit code.
pub fn render_error(err: PhantomError, format: OutputFormat, output: Option<PathBuf>) -> ExitCode {
    let error_payload = err.to_payload();
    let payload = PhantomOutput::Error(ErrorOutput {
        version: OUTPUT_VERSION.to_string(),
        message: Some(error_payload.message.clone()),
        error: error_payload,
    });

    match format {
        OutputFormat::Json => {
            let content =
                serde_json::to_string(&payload).unwrap_or_else(|_| "{\"mode\":\"error\"}".into());
            if let Some(path) = output {
                if let Err(write_err) = std::fs::write(&path, &content) {
                    eprintln!("Failed to write error output: {}", write_err);
                    println!("{content}");
                }
            } else {
                println!("{content}");
            }
        }
        OutputFormat::Pretty => {
            if let Err(write_err) = write_pretty_output(&payload, output.as_deref()) {
                eprintln!("Failed to write error output: {}", write_err);
            }
        }
    };

    // Exit code 2 is fatal; a script that exited non-zero uses 1.
    ExitCode::from(2)
}

fn write_json_output(body: &PhantomOutput, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let content = serde_json::to_string(body)?;
    if let Some(path) = output {
        std::fs::write(path, content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}

fn write_pretty_output(body: &PhantomOutput, output: Option<&Path>) -> io::Result<()> {
    let stdout_is_tty = std::io::stdout().is_terminal();
    let use_human = output.is_none() && stdout_is_tty;

    if use_human {
        let content = format_pretty(body, true);
        println!("{content}");
        return Ok(());
    }

    // Non-tty or file output: keep JSON shape for pipelines/files.
    let content =
        serde_json::to_string_pretty(body).unwrap_or_else(|_| "{\"mode\":\"error\"}".to_string());
    if let Some(path) = output {
        std::fs::write(path, &content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}

/// Format output for human consumption in a terminal.
pub fn format_pretty(body: &PhantomOutput, colorize: bool) -> String {
    match body {
        PhantomOutput::Exec(out) => {
            let mut buf = String::new();
            let ok = out.response.success();
            let status = color(
                &format!("exit {}", out.response.exit_code()),
                if ok { "32" } else { "31" },
                colorize,
            );
            writeln!(buf, "{} {}", color("[EXEC]", "36", colorize), status).ok();
            writeln!(buf, "Engine: {}", out.engine.display()).ok();
            push_stream(&mut buf, "stdout", out.response.std_out());
            push_stream(&mut buf, "stderr", out.response.std_err());
            buf
        }
        PhantomOutput::Render(out) => {
            let mut buf = String::new();
            let header = color("[RENDER]", "32", colorize);
            writeln!(
                buf,
                "{} {} ({} bytes, {} ms)",
                header,
                out.output_path.display(),
                out.bytes,
                out.elapsed_ms
            )
            .ok();
            writeln!(buf, "Format: {}", out.format.as_str()).ok();
            writeln!(buf, "Engine: {}", out.engine.display()).ok();
            buf
        }
        PhantomOutput::Check(out) => {
            let mut buf = String::new();
            let header = color("[CHECK]", "34", colorize);
            writeln!(buf, "{} {} {}", header, out.engine.display(), out.engine_version).ok();
            buf
        }
        PhantomOutput::Error(out) => {
            let mut buf = String::new();
            let header = color("[ERROR]", "31", colorize);
            let message = out
                .message
                .as_deref()
                .unwrap_or_else(|| out.error.message.as_str());
            writeln!(buf, "{} {}", header, message).ok();
            if let Some(remediation) = &out.error.remediation {
                writeln!(buf, "Hint: {}", remediation).ok();
            }
            buf
        }
    }
}

fn push_stream(buf: &mut String, label: &str, text: &str) {
    if text.is_empty() {
        return;
    }
    writeln!(buf, "{label}:").ok();
    for line in text.lines() {
        writeln!(buf, "  {line}").ok();
    }
}

/// Apply ANSI color codes when enabled.
fn color(text: &str, code: &str, colorize: bool) -> String {
    if colorize {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}

/// Exit code for `exec`: success only when the engine exited 0.
pub fn exit_code_for_exec(engine_exit_code: i32) -> ExitCode {
    if engine_exit_code == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
