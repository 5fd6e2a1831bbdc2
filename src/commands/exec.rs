use std::path::PathBuf;
use std::process::ExitCode;

use phantom_render::{ExecOutput, PhantomError, PhantomOutput, OUTPUT_VERSION};
use tokio::io::AsyncRead;
use tracing::debug;

use crate::cli::{OutputFormat, SwitchArgs};
use crate::formatting::{exit_code_for_exec, render_error, write_output};
use crate::settings::{build_engine, load_config, resolve_engine_settings};

/// Run the exec command.
#[allow(clippy::too_many_arguments)]
pub async fn run_exec(
    config_path: Option<PathBuf>,
    cli_engine: Option<PathBuf>,
    script: PathBuf,
    engine_help: bool,
    engine_version: bool,
    switches: SwitchArgs,
    timeout: Option<u64>,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> ExitCode {
    let config = match load_config(config_path.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => return render_error(err, format, output.clone()),
    };
    let settings = resolve_engine_settings(&config, cli_engine, timeout);
    let options = switches
        .apply(config.switches.clone())
        .with_help(engine_help)
        .with_version(engine_version);
    let engine = build_engine(settings, config.switches.clone());

    // Informational runs never read the script, so it need not exist.
    let mut reader: Box<dyn AsyncRead + Unpin + Send> = if options.short_circuit_switch().is_some() {
        Box::new(tokio::io::empty())
    } else {
        match tokio::fs::File::open(&script).await {
            Ok(file) => Box::new(file),
            Err(err) => {
                return render_error(
                    PhantomError::invalid_configuration(format!(
                        "cannot open script {}: {err}",
                        script.display()
                    )),
                    format,
                    output,
                )
            }
        }
    };

    debug!(
        target = "commands::exec",
        engine = %engine.executable().display(),
        script = %script.display(),
        switches = ?options.switches(),
        "Running script"
    );
    let response = match engine.exec_with(&mut reader, &options).await {
        Ok(response) => response,
        Err(err) => return render_error(err, format, output),
    };

    let exit_code = response.exit_code();
    let body = PhantomOutput::Exec(ExecOutput {
        version: OUTPUT_VERSION.to_string(),
        engine: engine.executable().to_path_buf(),
        response,
    });
    if let Err(err) = write_output(&body, format, output.clone()) {
        return render_error(PhantomError::Config(err.to_string()), format, output);
    }
    exit_code_for_exec(exit_code)
}
