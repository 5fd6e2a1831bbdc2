use std::path::PathBuf;
use std::process::ExitCode;

use phantom_render::{CheckOutput, PhantomError, PhantomOutput, OUTPUT_VERSION};

use crate::cli::OutputFormat;
use crate::formatting::{render_error, write_output};
use crate::settings::{build_engine, load_config, resolve_engine_settings};

/// Run the check command.
pub async fn run_check(
    config_path: Option<PathBuf>,
    cli_engine: Option<PathBuf>,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> ExitCode {
    let config = match load_config(config_path.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => return render_error(err, format, output.clone()),
    };
    let engine = build_engine(
        resolve_engine_settings(&config, cli_engine, None),
        config.switches.clone(),
    );

    let engine_version = match engine.engine_version().await {
        Ok(version) => version,
        Err(err) => return render_error(err, format, output),
    };

    let body = PhantomOutput::Check(CheckOutput {
        version: OUTPUT_VERSION.to_string(),
        engine: engine.executable().to_path_buf(),
        engine_version,
    });
    if let Err(err) = write_output(&body, format, output.clone()) {
        return render_error(PhantomError::Config(err.to_string()), format, output);
    }
    ExitCode::SUCCESS
}
