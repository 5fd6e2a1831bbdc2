use clap::{Args, Parser, Subcommand, ValueEnum};
use phantom_render::units::Length;
use phantom_render::{EngineOptions, Margins, PaperSize, ProxyType, RenderFormat, Viewport};
use std::path::PathBuf;
use url::Url;

#[derive(Parser)]
#[command(name = "phantom-render")]
#[command(
    version,
    about = "Run PhantomJS scripts and render HTML to PDF",
    long_about = "phantom-render\n\nModes:\n- exec: run an engine script and report its exit code, stdout and stderr.\n- render: render an HTML document to PDF (or PNG/JPEG) with paper size, margins, headers/footers and JavaScript readiness waiting.\n- check: verify the engine executable is reachable and print its version.\n\nUse --help on any subcommand for details."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Enable verbose output (debug logging on stderr)")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Optional config file (TOML) with [engine], [switches] and [render] defaults; CLI flags override config"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Engine executable (overrides config and PHANTOMJS_BIN)"
    )]
    pub engine: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a script with the engine
    Exec {
        #[arg(long, value_name = "PATH", help = "Script file to run")]
        script: PathBuf,

        #[arg(long, help = "Ask the engine for its usage text instead of running the script")]
        engine_help: bool,

        #[arg(long, help = "Ask the engine for its version instead of running the script")]
        engine_version: bool,

        #[command(flatten)]
        switches: SwitchArgs,

        #[arg(long, value_name = "SECS", help = "Kill the engine after this many seconds")]
        timeout: Option<u64>,

        #[arg(long, value_enum, default_value = "json", help = "Output format")]
        format: OutputFormat,

        #[arg(long, short, help = "Output file path (stdout if omitted)")]
        output: Option<PathBuf>,
    },

    /// Render an HTML document
    Render {
        #[arg(long, value_name = "PATH", help = "HTML document to render ('-' reads stdin)")]
        input: String,

        #[arg(long, value_name = "PATH", help = "Where to write the rendered artifact")]
        out: PathBuf,

        #[arg(
            long,
            help = "Paper size: letter, legal, tabloid, a3, a4, a5 or WIDTH,HEIGHT (e.g., 210mm,297mm)"
        )]
        paper: Option<PaperSize>,

        #[arg(long, help = "Landscape orientation")]
        landscape: bool,

        #[arg(long, help = "Margins: one length or TOP,RIGHT,BOTTOM,LEFT (e.g., 0.5in or 1cm,2cm,1cm,2cm)")]
        margins: Option<Margins>,

        #[arg(long, help = "Viewport dimensions (WIDTHxHEIGHT)")]
        viewport: Option<Viewport>,

        #[arg(long, help = "Zoom factor applied to the page")]
        zoom: Option<f64>,

        #[arg(long, requires = "header_js", help = "Header height (e.g., 1cm)")]
        header_height: Option<Length>,

        #[arg(
            long,
            requires = "header_height",
            value_name = "SRC",
            help = "Header function source, function (pageNum, numPages) { ... }; prefix with @ to read a file"
        )]
        header_js: Option<String>,

        #[arg(long, requires = "footer_js", help = "Footer height (e.g., 1cm)")]
        footer_height: Option<Length>,

        #[arg(
            long,
            requires = "footer_height",
            value_name = "SRC",
            help = "Footer function source, function (pageNum, numPages) { ... }; prefix with @ to read a file"
        )]
        footer_js: Option<String>,

        #[arg(long, value_name = "MS", help = "How long to wait for the page to become ready (milliseconds)")]
        js_timeout: Option<u64>,

        #[arg(long, value_name = "MS", help = "How often to poll for readiness (milliseconds)")]
        js_interval: Option<u64>,

        #[arg(long, help = "Base URL for relative resources (defaults to the staged document)")]
        base_url: Option<Url>,

        #[arg(long, value_enum, help = "Artifact format")]
        image_format: Option<ImageFormat>,

        #[command(flatten)]
        switches: SwitchArgs,

        #[arg(long, value_enum, default_value = "json", help = "Output format")]
        format: OutputFormat,

        #[arg(long, short, help = "Summary output file path (stdout if omitted)")]
        output: Option<PathBuf>,
    },

    /// Check that the engine is reachable and print its version
    Check {
        #[arg(long, value_enum, default_value = "json", help = "Output format")]
        format: OutputFormat,

        #[arg(long, short, help = "Output file path (stdout if omitted)")]
        output: Option<PathBuf>,
    },
}

/// Engine switches shared by `exec` and `render`.
#[derive(Args, Debug, Default, Clone)]
pub struct SwitchArgs {
    #[arg(long, help = "Engine debug output")]
    pub debug: bool,

    #[arg(long, value_name = "PATH", help = "Persistent cookie file")]
    pub cookies_file: Option<PathBuf>,

    #[arg(long, value_name = "BOOL", help = "Enable the disk cache")]
    pub disk_cache: Option<bool>,

    #[arg(long, value_name = "BOOL", help = "Ignore SSL errors")]
    pub ignore_ssl_errors: Option<bool>,

    #[arg(long, value_name = "BOOL", help = "Load inlined images")]
    pub load_images: Option<bool>,

    #[arg(long, value_name = "PATH", help = "Local storage location")]
    pub local_storage_path: Option<PathBuf>,

    #[arg(long, value_name = "KB", help = "Local storage quota")]
    pub local_storage_quota: Option<u64>,

    #[arg(long, value_name = "BOOL", help = "Allow local content to access remote URLs")]
    pub local_to_remote_url_access: Option<bool>,

    #[arg(long, value_name = "KB", help = "Disk cache size limit")]
    pub max_disk_cache_size: Option<u64>,

    #[arg(long, value_name = "ENC", help = "Encoding for terminal output")]
    pub output_encoding: Option<String>,

    #[arg(long, value_name = "HOST:PORT", help = "Proxy server")]
    pub proxy: Option<String>,

    #[arg(long, value_enum, help = "Proxy type")]
    pub proxy_type: Option<ProxyKind>,

    #[arg(long, value_name = "USER:PASS", help = "Proxy credentials")]
    pub proxy_auth: Option<String>,

    #[arg(long, value_name = "ENC", help = "Encoding of the script")]
    pub script_encoding: Option<String>,

    #[arg(long, value_name = "NAME", help = "SSL protocol (e.g., tlsv1.2, any)")]
    pub ssl_protocol: Option<String>,

    #[arg(long, value_name = "BOOL", help = "Enable web security")]
    pub web_security: Option<bool>,
}

impl SwitchArgs {
    /// Overlays the flags that were given onto `base`.
    pub fn apply(self, base: EngineOptions) -> EngineOptions {
        let mut options = base;
        if self.debug {
            options = options.with_debug(true);
        }
        if let Some(path) = self.cookies_file {
            options = options.with_cookies_file(path);
        }
        if let Some(enabled) = self.disk_cache {
            options = options.with_disk_cache(enabled);
        }
        if let Some(ignore) = self.ignore_ssl_errors {
            options = options.with_ignore_ssl_errors(ignore);
        }
        if let Some(load) = self.load_images {
            options = options.with_load_images(load);
        }
        if let Some(path) = self.local_storage_path {
            options = options.with_local_storage_path(path);
        }
        if let Some(quota) = self.local_storage_quota {
            options = options.with_local_storage_quota(quota);
        }
        if let Some(allowed) = self.local_to_remote_url_access {
            options = options.with_local_to_remote_url_access(allowed);
        }
        if let Some(size) = self.max_disk_cache_size {
            options = options.with_max_disk_cache_size(size);
        }
        if let Some(encoding) = self.output_encoding {
            options = options.with_output_encoding(encoding);
        }
        if let Some(proxy) = self.proxy {
            options = options.with_proxy(proxy);
        }
        if let Some(kind) = self.proxy_type {
            options = options.with_proxy_type(kind.into());
        }
        if let Some(auth) = self.proxy_auth {
            options = options.with_proxy_auth(auth);
        }
        if let Some(encoding) = self.script_encoding {
            options = options.with_script_encoding(encoding);
        }
        if let Some(protocol) = self.ssl_protocol {
            options = options.with_ssl_protocol(protocol);
        }
        if let Some(enabled) = self.web_security {
            options = options.with_web_security(enabled);
        }
        options
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ProxyKind {
    Http,
    Socks5,
    None,
}

impl From<ProxyKind> for ProxyType {
    fn from(kind: ProxyKind) -> Self {
        match kind {
            ProxyKind::Http => ProxyType::Http,
            ProxyKind::Socks5 => ProxyType::Socks5,
            ProxyKind::None => ProxyType::None,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ImageFormat {
    Pdf,
    Png,
    Jpeg,
}

impl From<ImageFormat> for RenderFormat {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Pdf => RenderFormat::Pdf,
            ImageFormat::Png => RenderFormat::Png,
            ImageFormat::Jpeg => RenderFormat::Jpeg,
        }
    }
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Pretty,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands, ImageFormat, OutputFormat};
    use clap::Parser;
    use phantom_render::{EngineOptions, PaperSize, ProxyType};

    #[test]
    fn exec_command_uses_defaults() {
        let cli = Cli::parse_from(["phantom-render", "exec", "--script", "hello.js"]);

        assert!(!cli.verbose);
        assert!(cli.config.is_none());
        assert!(cli.engine.is_none());

        match cli.command {
            Commands::Exec {
                script,
                engine_help,
                engine_version,
                switches,
                timeout,
                format,
                output,
            } => {
                assert_eq!(script, std::path::PathBuf::from("hello.js"));
                assert!(!engine_help);
                assert!(!engine_version);
                assert!(timeout.is_none());
                assert!(matches!(format, OutputFormat::Json));
                assert!(output.is_none());
                assert_eq!(switches.apply(EngineOptions::DEFAULT), EngineOptions::DEFAULT);
            }
            _ => panic!("expected exec command"),
        }
    }

    #[test]
    fn exec_switch_flags_map_to_engine_options() {
        let cli = Cli::parse_from([
            "phantom-render",
            "--engine",
            "/opt/phantomjs",
            "exec",
            "--script",
            "s.js",
            "--ignore-ssl-errors",
            "true",
            "--proxy",
            "10.0.0.1:8080",
            "--proxy-type",
            "socks5",
            "--web-security",
            "false",
        ]);

        assert_eq!(cli.engine.as_deref(), Some(std::path::Path::new("/opt/phantomjs")));
        match cli.command {
            Commands::Exec { switches, .. } => {
                let options = switches.apply(EngineOptions::DEFAULT);
                assert_eq!(options.ignore_ssl_errors, Some(true));
                assert_eq!(options.proxy.as_deref(), Some("10.0.0.1:8080"));
                assert_eq!(options.proxy_type, Some(ProxyType::Socks5));
                assert_eq!(options.web_security, Some(false));
            }
            _ => panic!("expected exec command"),
        }
    }

    #[test]
    fn render_command_respects_overrides() {
        let cli = Cli::parse_from([
            "phantom-render",
            "--verbose",
            "render",
            "--input",
            "-",
            "--out",
            "out.png",
            "--paper",
            "a4",
            "--landscape",
            "--margins",
            "1cm,2cm,1cm,2cm",
            "--viewport",
            "800x600",
            "--js-timeout",
            "2500",
            "--js-interval",
            "100",
            "--image-format",
            "png",
            "--format",
            "pretty",
        ]);

        assert!(cli.verbose);
        match cli.command {
            Commands::Render {
                input,
                out,
                paper,
                landscape,
                margins,
                viewport,
                js_timeout,
                js_interval,
                image_format,
                format,
                header_height,
                ..
            } => {
                assert_eq!(input, "-");
                assert_eq!(out, std::path::PathBuf::from("out.png"));
                assert_eq!(paper, Some(PaperSize::A4));
                assert!(landscape);
                assert_eq!(margins.map(|m| m.left.to_string()), Some("2cm".to_string()));
                assert_eq!(viewport.map(|v| v.width), Some(800));
                assert_eq!(js_timeout, Some(2500));
                assert_eq!(js_interval, Some(100));
                assert!(matches!(image_format, Some(ImageFormat::Png)));
                assert!(matches!(format, OutputFormat::Pretty));
                assert!(header_height.is_none());
            }
            _ => panic!("expected render command"),
        }
    }

    #[test]
    fn header_height_requires_source() {
        let result = Cli::try_parse_from([
            "phantom-render",
            "render",
            "--input",
            "in.html",
            "--out",
            "out.pdf",
            "--header-height",
            "1cm",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn check_command_parses() {
        let cli = Cli::parse_from(["phantom-render", "check", "--format", "pretty"]);
        assert!(matches!(
            cli.command,
            Commands::Check {
                format: OutputFormat::Pretty,
                output: None
            }
        ));
    }
}
