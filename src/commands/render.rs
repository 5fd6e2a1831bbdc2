use std::path::PathBuf;
use std::process::ExitCode;

use phantom_render::{PhantomError, PhantomOutput, RenderOutput, OUTPUT_VERSION};
use tokio::io::AsyncRead;
use tracing::debug;

use crate::cli::{OutputFormat, SwitchArgs};
use crate::formatting::{render_error, write_output};
use crate::settings::{
    build_engine, default_base_url, format_effective_config, load_config,
    resolve_engine_settings, resolve_render_options, RenderOverrides,
};

/// Parsed `render` arguments.
pub struct RenderArgs {
    pub input: String,
    pub out: PathBuf,
    pub overrides: RenderOverrides,
    pub switches: SwitchArgs,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

/// Run the render command.
pub async fn run_render(
    config_path: Option<PathBuf>,
    cli_engine: Option<PathBuf>,
    args: RenderArgs,
) -> ExitCode {
    let RenderArgs {
        input,
        out,
        overrides,
        switches,
        format,
        output,
    } = args;

    let config = match load_config(config_path.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => return render_error(err, format, output.clone()),
    };
    let settings = resolve_engine_settings(&config, cli_engine, None);
    let options = match resolve_render_options(&config.render, overrides) {
        Ok(options) => default_base_url(options, &input),
        Err(err) => return render_error(err, format, output),
    };
    debug!(
        target = "commands::render",
        "{}",
        format_effective_config(&settings, &options, config_path.as_deref())
    );
    let engine = build_engine(settings, switches.apply(config.switches.clone()));

    let mut reader: Box<dyn AsyncRead + Unpin + Send> = if input == "-" {
        Box::new(tokio::io::stdin())
    } else {
        match tokio::fs::File::open(&input).await {
            Ok(file) => Box::new(file),
            Err(err) => {
                return render_error(
                    PhantomError::invalid_configuration(format!("cannot open input {input}: {err}")),
                    format,
                    output,
                )
            }
        }
    };

    let rendered = match engine.render(&mut reader, &options).await {
        Ok(rendered) => rendered,
        Err(err) => return render_error(err, format, output),
    };

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(err) = tokio::fs::create_dir_all(parent).await {
            return render_error(PhantomError::Io(err), format, output);
        }
    }
    if let Err(err) = tokio::fs::copy(rendered.path(), &out).await {
        return render_error(PhantomError::Io(err), format, output);
    }

    let body = PhantomOutput::Render(RenderOutput {
        version: OUTPUT_VERSION.to_string(),
        engine: engine.executable().to_path_buf(),
        output_path: out,
        format: rendered.format(),
        bytes: rendered.len(),
        elapsed_ms: u64::try_from(rendered.elapsed().as_millis()).unwrap_or(u64::MAX),
    });
    rendered.close();

    if let Err(err) = write_output(&body, format, output.clone()) {
        return render_error(PhantomError::Config(err.to_string()), format, output);
    }
    ExitCode::SUCCESS
}
