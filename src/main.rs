mod cli;
mod commands;
mod formatting;
mod settings;
mod telemetry;

use std::process::ExitCode;

use cli::Commands;
use commands::{run_check, run_exec, run_render, RenderArgs};
use settings::RenderOverrides;

#[tokio::main]
async fn main() -> ExitCode {
    run().await
}

async fn run() -> ExitCode {
    let args = cli::parse();
    telemetry::init(args.verbose);

    match args.command {
        Commands::Exec {
            script,
            engine_help,
            engine_version,
            switches,
            timeout,
            format,
            output,
        } => {
            run_exec(
                args.config,
                args.engine,
                script,
                engine_help,
                engine_version,
                switches,
                timeout,
                format,
                output,
            )
            .await
        }
        Commands::Render {
            input,
            out,
            paper,
            landscape,
            margins,
            viewport,
            zoom,
            header_height,
            header_js,
            footer_height,
            footer_js,
            js_timeout,
            js_interval,
            base_url,
            image_format,
            switches,
            format,
            output,
        } => {
            let overrides = RenderOverrides {
                paper,
                landscape,
                margins,
                viewport,
                zoom,
                header: header_height.zip(header_js),
                footer: footer_height.zip(footer_js),
                js_timeout_ms: js_timeout,
                js_interval_ms: js_interval,
                base_url,
                format: image_format.map(Into::into),
            };
            run_render(
                args.config,
                args.engine,
                RenderArgs {
                    input,
                    out,
                    overrides,
                    switches,
                    format,
                    output,
                },
            )
            .await
        }
        Commands::Check { format, output } => {
            run_check(args.config, args.engine, format, output).await
        }
    }
}
