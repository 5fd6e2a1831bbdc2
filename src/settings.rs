use std::path::{Path, PathBuf};
use std::time::Duration;

use phantom_render::units::Length;
use phantom_render::{
    BannerInfo, Config, EngineOptions, EngineSettings, Margins, Orientation, PaperSize,
    PhantomEngine, PhantomError, RenderFormat, RenderOptions, Viewport,
};
use url::Url;

/// Render flags as given on the command line; `None` keeps the config value.
#[derive(Debug, Default, Clone)]
pub struct RenderOverrides {
    pub paper: Option<PaperSize>,
    pub landscape: bool,
    pub margins: Option<Margins>,
    pub viewport: Option<Viewport>,
    pub zoom: Option<f64>,
    pub header: Option<(Length, String)>,
    pub footer: Option<(Length, String)>,
    pub js_timeout_ms: Option<u64>,
    pub js_interval_ms: Option<u64>,
    pub base_url: Option<Url>,
    pub format: Option<RenderFormat>,
}

/// Load config from a TOML file, central config, or return defaults.
/// Priority: explicit path > ~/.config/phantom-render/config.toml > defaults
pub fn load_config(path: Option<&Path>) -> Result<Config, PhantomError> {
    let cfg = Config::load(path).map_err(|e| PhantomError::Config(e.to_string()))?;

    cfg.validate().map_err(|e| {
        let prefix = path
            .map(|p| format!("Invalid config ({}): {}", p.display(), e))
            .unwrap_or_else(|| format!("Invalid config: {}", e));
        PhantomError::Config(prefix)
    })?;
    Ok(cfg)
}

/// Engine settings after applying `--engine` and an exec timeout.
pub fn resolve_engine_settings(
    config: &Config,
    cli_engine: Option<PathBuf>,
    exec_timeout_secs: Option<u64>,
) -> EngineSettings {
    let mut settings = config.engine.clone();
    if let Some(engine) = cli_engine {
        settings.executable = engine;
    }
    if let Some(secs) = exec_timeout_secs {
        settings.exec_timeout = Some(Duration::from_secs(secs));
    }
    settings
}

pub fn build_engine(settings: EngineSettings, switches: EngineOptions) -> PhantomEngine {
    PhantomEngine::new(settings).with_switches(switches)
}

/// Merge CLI render flags over the config's render defaults.
pub fn resolve_render_options(
    base: &RenderOptions,
    overrides: RenderOverrides,
) -> Result<RenderOptions, PhantomError> {
    let mut options = base.clone();
    if let Some(paper) = overrides.paper {
        options = options.with_paper_size(paper);
    }
    if overrides.landscape {
        options = options.with_orientation(Orientation::Landscape);
    }
    if let Some(margins) = overrides.margins {
        options = options.with_margins(margins);
    }
    if let Some(viewport) = overrides.viewport {
        options = options.with_viewport(viewport);
    }
    if let Some(zoom) = overrides.zoom {
        options = options.with_zoom_factor(zoom);
    }
    if let Some((height, source)) = overrides.header {
        options = options.with_header_info(banner(height, &source)?);
    }
    if let Some((height, source)) = overrides.footer {
        options = options.with_footer_info(banner(height, &source)?);
    }
    if overrides.js_timeout_ms.is_some() || overrides.js_interval_ms.is_some() {
        let timeout = overrides
            .js_timeout_ms
            .unwrap_or_else(|| millis(options.js_wait_timeout));
        let interval = overrides
            .js_interval_ms
            .unwrap_or_else(|| millis(options.js_wait_interval));
        options = options.with_javascript_execution_details(timeout, interval);
    }
    if let Some(url) = overrides.base_url {
        options = options.with_base_url(url);
    }
    if let Some(format) = overrides.format {
        options = options.with_format(format);
    }
    Ok(options)
}

/// Without an explicit base URL, relative resources resolve next to the
/// input file rather than inside the staging workspace. Stdin input (`-`)
/// and unreadable paths leave the options untouched.
pub fn default_base_url(options: RenderOptions, input: &str) -> RenderOptions {
    if input == "-" || options.base_url.is_some() {
        return options;
    }
    match std::fs::canonicalize(input)
        .ok()
        .and_then(|path| Url::from_file_path(path).ok())
    {
        Some(url) => options.with_base_url(url),
        None => options,
    }
}

/// Banner source is inline JavaScript, or `@path` to read it from a file.
fn banner(height: Length, source: &str) -> Result<BannerInfo, PhantomError> {
    let source = match source.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).map_err(|e| {
            PhantomError::invalid_configuration(format!(
                "cannot read banner function from {path}: {e}"
            ))
        })?,
        None => source.to_string(),
    };
    Ok(BannerInfo::new(height.value, height.unit, source))
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Format effective render settings as a single-line string.
pub fn format_effective_config(
    settings: &EngineSettings,
    options: &RenderOptions,
    config_source: Option<&Path>,
) -> String {
    let source = config_source
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());
    let paper = options
        .paper_size
        .map(|p| {
            let (w, h) = p.oriented(options.orientation);
            format!("{w}x{h}")
        })
        .unwrap_or_else(|| "none".to_string());
    format!(
        "Effective config [{source}]: engine={}, paper={paper}, margins={},{},{},{}, viewport={}, zoom={}, js-timeout={}ms, js-interval={}ms, format={}, grace={}s",
        settings.executable.display(),
        options.margins.top,
        options.margins.right,
        options.margins.bottom,
        options.margins.left,
        options.viewport,
        options.zoom_factor,
        millis(options.js_wait_timeout),
        millis(options.js_wait_interval),
        options.format.as_str(),
        settings.render_grace.as_secs(),
    )
}
