use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Proxy protocols accepted by `--proxy-type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyType {
    Http,
    Socks5,
    None,
}

impl ProxyType {
    pub const fn as_str(self) -> &'static str {
        match self {
            ProxyType::Http => "http",
            ProxyType::Socks5 => "socks5",
            ProxyType::None => "none",
        }
    }
}

/// Command-line switches passed to the engine executable.
///
/// Every field maps to exactly one switch. Values are plain data: `help` and
/// `version` may both be set, the orchestrator decides which one wins (see
/// [`EngineOptions::short_circuit_switch`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EngineOptions {
    pub help: bool,
    pub version: bool,
    pub debug: bool,
    pub cookies_file: Option<PathBuf>,
    pub disk_cache: Option<bool>,
    pub ignore_ssl_errors: Option<bool>,
    pub load_images: Option<bool>,
    pub local_storage_path: Option<PathBuf>,
    pub local_storage_quota: Option<u64>,
    pub local_to_remote_url_access: Option<bool>,
    pub max_disk_cache_size: Option<u64>,
    pub output_encoding: Option<String>,
    pub proxy: Option<String>,
    pub proxy_type: Option<ProxyType>,
    pub proxy_auth: Option<String>,
    pub script_encoding: Option<String>,
    pub ssl_protocol: Option<String>,
    pub web_security: Option<bool>,
}

impl EngineOptions {
    /// No switches at all: the engine runs the script with its own defaults.
    pub const DEFAULT: EngineOptions = EngineOptions {
        help: false,
        version: false,
        debug: false,
        cookies_file: None,
        disk_cache: None,
        ignore_ssl_errors: None,
        load_images: None,
        local_storage_path: None,
        local_storage_quota: None,
        local_to_remote_url_access: None,
        max_disk_cache_size: None,
        output_encoding: None,
        proxy: None,
        proxy_type: None,
        proxy_auth: None,
        script_encoding: None,
        ssl_protocol: None,
        web_security: None,
    };

    #[must_use]
    pub fn with_help(mut self, help: bool) -> Self {
        self.help = help;
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: bool) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn with_cookies_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cookies_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_disk_cache(mut self, enabled: bool) -> Self {
        self.disk_cache = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_ignore_ssl_errors(mut self, ignore: bool) -> Self {
        self.ignore_ssl_errors = Some(ignore);
        self
    }

    #[must_use]
    pub fn with_load_images(mut self, load: bool) -> Self {
        self.load_images = Some(load);
        self
    }

    #[must_use]
    pub fn with_local_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_storage_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_local_storage_quota(mut self, kilobytes: u64) -> Self {
        self.local_storage_quota = Some(kilobytes);
        self
    }

    #[must_use]
    pub fn with_local_to_remote_url_access(mut self, allowed: bool) -> Self {
        self.local_to_remote_url_access = Some(allowed);
        self
    }

    #[must_use]
    pub fn with_max_disk_cache_size(mut self, kilobytes: u64) -> Self {
        self.max_disk_cache_size = Some(kilobytes);
        self
    }

    #[must_use]
    pub fn with_output_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.output_encoding = Some(encoding.into());
        self
    }

    #[must_use]
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    #[must_use]
    pub fn with_proxy_type(mut self, proxy_type: ProxyType) -> Self {
        self.proxy_type = Some(proxy_type);
        self
    }

    #[must_use]
    pub fn with_proxy_auth(mut self, credentials: impl Into<String>) -> Self {
        self.proxy_auth = Some(credentials.into());
        self
    }

    #[must_use]
    pub fn with_script_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.script_encoding = Some(encoding.into());
        self
    }

    #[must_use]
    pub fn with_ssl_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.ssl_protocol = Some(protocol.into());
        self
    }

    #[must_use]
    pub fn with_web_security(mut self, enabled: bool) -> Self {
        self.web_security = Some(enabled);
        self
    }

    /// The informational switch that replaces a normal run, if any.
    ///
    /// `--help` takes precedence over `--version`.
    pub fn short_circuit_switch(&self) -> Option<&'static str> {
        if self.help {
            Some("--help")
        } else if self.version {
            Some("--version")
        } else {
            None
        }
    }

    /// Switches for a normal script run, in the documented order.
    ///
    /// `help` and `version` are never included here.
    pub fn switches(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.debug {
            args.push("--debug=true".to_string());
        }
        if let Some(path) = &self.cookies_file {
            args.push(format!("--cookies-file={}", path.display()));
        }
        push_bool(&mut args, "--disk-cache", self.disk_cache);
        push_bool(&mut args, "--ignore-ssl-errors", self.ignore_ssl_errors);
        push_bool(&mut args, "--load-images", self.load_images);
        if let Some(path) = &self.local_storage_path {
            args.push(format!("--local-storage-path={}", path.display()));
        }
        if let Some(quota) = self.local_storage_quota {
            args.push(format!("--local-storage-quota={quota}"));
        }
        push_bool(
            &mut args,
            "--local-to-remote-url-access",
            self.local_to_remote_url_access,
        );
        if let Some(size) = self.max_disk_cache_size {
            args.push(format!("--max-disk-cache-size={size}"));
        }
        if let Some(encoding) = &self.output_encoding {
            args.push(format!("--output-encoding={encoding}"));
        }
        if let Some(proxy) = &self.proxy {
            args.push(format!("--proxy={proxy}"));
        }
        if let Some(proxy_type) = self.proxy_type {
            args.push(format!("--proxy-type={}", proxy_type.as_str()));
        }
        if let Some(auth) = &self.proxy_auth {
            args.push(format!("--proxy-auth={auth}"));
        }
        if let Some(encoding) = &self.script_encoding {
            args.push(format!("--script-encoding={encoding}"));
        }
        if let Some(protocol) = &self.ssl_protocol {
            args.push(format!("--ssl-protocol={protocol}"));
        }
        push_bool(&mut args, "--web-security", self.web_security);

        args
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn push_bool(args: &mut Vec<String>, switch: &str, value: Option<bool>) {
    if let Some(value) = value {
        args.push(format!("{switch}={value}"));
    }
}
