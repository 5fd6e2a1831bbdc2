use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use super::page::{Margins, Orientation, PaperSize};
use crate::units::{Length, SizeUnit};
use crate::{PhantomError, Result, Viewport};

/// Default upper bound on waiting for the page to declare itself ready.
pub const DEFAULT_JS_WAIT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Default cadence for re-checking page readiness.
pub const DEFAULT_JS_WAIT_INTERVAL: Duration = Duration::from_millis(50);

/// Longest readiness wait a render accepts.
pub const MAX_JS_WAIT_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Header or footer band printed on every page.
///
/// `function_source` is JavaScript of the shape
/// `function (pageNum, numPages) { return "<html>"; }`. It is embedded into the
/// generated script verbatim; syntax errors surface on the engine's stderr.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BannerInfo {
    pub height: f64,
    pub unit: SizeUnit,
    pub function_source: String,
}

impl BannerInfo {
    pub fn new(height: f64, unit: SizeUnit, function_source: impl Into<String>) -> Self {
        Self {
            height,
            unit,
            function_source: function_source.into(),
        }
    }

    pub fn height(&self) -> Length {
        Length::new(self.height, self.unit)
    }
}

/// Output artifact produced by a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderFormat {
    #[default]
    Pdf,
    Png,
    Jpeg,
}

impl RenderFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            RenderFormat::Pdf => "pdf",
            RenderFormat::Png => "png",
            RenderFormat::Jpeg => "jpeg",
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            RenderFormat::Pdf => "pdf",
            RenderFormat::Png => "png",
            RenderFormat::Jpeg => "jpg",
        }
    }
}

/// Page and timing parameters for a single render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RenderOptions {
    pub paper_size: Option<PaperSize>,
    pub orientation: Orientation,
    pub margins: Margins,
    pub viewport: Viewport,
    pub zoom_factor: f64,
    pub header: Option<BannerInfo>,
    pub footer: Option<BannerInfo>,
    #[serde(with = "humantime_serde")]
    pub js_wait_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub js_wait_interval: Duration,
    pub format: RenderFormat,
    pub base_url: Option<Url>,
}

impl RenderOptions {
    /// US Letter, portrait, half-inch margins, no banners.
    pub const DEFAULT: RenderOptions = RenderOptions {
        paper_size: Some(PaperSize::LETTER),
        orientation: Orientation::Portrait,
        margins: Margins::uniform(Length::inches(0.5)),
        viewport: Viewport::DEFAULT,
        zoom_factor: 1.0,
        header: None,
        footer: None,
        js_wait_timeout: DEFAULT_JS_WAIT_TIMEOUT,
        js_wait_interval: DEFAULT_JS_WAIT_INTERVAL,
        format: RenderFormat::Pdf,
        base_url: None,
    };

    /// No paper size; rejected by [`RenderOptions::validate`].
    pub const EMPTY: RenderOptions = RenderOptions {
        paper_size: None,
        orientation: Orientation::Portrait,
        margins: Margins::NONE,
        viewport: Viewport::DEFAULT,
        zoom_factor: 1.0,
        header: None,
        footer: None,
        js_wait_timeout: DEFAULT_JS_WAIT_TIMEOUT,
        js_wait_interval: DEFAULT_JS_WAIT_INTERVAL,
        format: RenderFormat::Pdf,
        base_url: None,
    };

    #[must_use]
    pub fn with_paper_size(mut self, paper_size: PaperSize) -> Self {
        self.paper_size = Some(paper_size);
        self
    }

    #[must_use]
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    #[must_use]
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    #[must_use]
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    #[must_use]
    pub fn with_zoom_factor(mut self, zoom_factor: f64) -> Self {
        self.zoom_factor = zoom_factor;
        self
    }

    #[must_use]
    pub fn with_header_info(mut self, header: BannerInfo) -> Self {
        self.header = Some(header);
        self
    }

    #[must_use]
    pub fn with_footer_info(mut self, footer: BannerInfo) -> Self {
        self.footer = Some(footer);
        self
    }

    /// Readiness timeout and poll interval, both in milliseconds.
    #[must_use]
    pub fn with_javascript_execution_details(mut self, timeout_ms: u64, interval_ms: u64) -> Self {
        self.js_wait_timeout = Duration::from_millis(timeout_ms);
        self.js_wait_interval = Duration::from_millis(interval_ms);
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: RenderFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Checks that the options can drive a render. Called before any process
    /// is spawned.
    pub fn validate(&self) -> Result<()> {
        let paper = self.paper_size.ok_or_else(|| {
            PhantomError::invalid_configuration("render options carry no paper size")
        })?;

        let (page_width, page_height) = paper.oriented(self.orientation);
        if !page_width.is_valid() || !page_height.is_valid() || page_width.value == 0.0
            || page_height.value == 0.0
        {
            return Err(PhantomError::invalid_configuration(format!(
                "paper size {page_width} x {page_height} must be positive"
            )));
        }
        if let Some(bad) = self.margins.iter().find(|m| !m.is_valid()) {
            return Err(PhantomError::invalid_configuration(format!(
                "margin {bad} must be a finite, non-negative length"
            )));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(PhantomError::invalid_configuration(format!(
                "viewport {} must be non-zero",
                self.viewport
            )));
        }
        if !self.zoom_factor.is_finite() || self.zoom_factor <= 0.0 {
            return Err(PhantomError::invalid_configuration(format!(
                "zoom factor {} must be positive",
                self.zoom_factor
            )));
        }
        if self.js_wait_timeout.is_zero() || self.js_wait_timeout > MAX_JS_WAIT_TIMEOUT {
            return Err(PhantomError::invalid_configuration(format!(
                "JavaScript wait timeout {:?} must be positive and at most {:?}",
                self.js_wait_timeout, MAX_JS_WAIT_TIMEOUT
            )));
        }
        if self.js_wait_interval.is_zero() || self.js_wait_interval > self.js_wait_timeout {
            return Err(PhantomError::invalid_configuration(format!(
                "JavaScript poll interval {:?} must be positive and no longer than the timeout {:?}",
                self.js_wait_interval, self.js_wait_timeout
            )));
        }

        let mut banner_points = 0.0;
        for (name, banner) in [("header", &self.header), ("footer", &self.footer)] {
            let Some(banner) = banner else { continue };
            if self.format != RenderFormat::Pdf {
                return Err(PhantomError::invalid_configuration(format!(
                    "{name} banners require pdf output, not {}",
                    self.format.as_str()
                )));
            }
            if !banner.height().is_valid() {
                return Err(PhantomError::invalid_configuration(format!(
                    "{name} height {} must be a finite, non-negative length",
                    banner.height()
                )));
            }
            banner_points += banner.height().to_points();
        }

        if self.margins.horizontal_points() >= page_width.to_points() {
            return Err(PhantomError::invalid_configuration(format!(
                "left and right margins leave no printable width on {page_width} paper"
            )));
        }
        if self.margins.vertical_points() + banner_points >= page_height.to_points() {
            return Err(PhantomError::invalid_configuration(format!(
                "margins and banners leave no printable height on {page_height} paper"
            )));
        }

        if let Some(base) = &self.base_url {
            if !matches!(base.scheme(), "file" | "http" | "https") {
                return Err(PhantomError::invalid_configuration(format!(
                    "base URL scheme '{}' is not supported; use file, http or https",
                    base.scheme()
                )));
            }
        }

        Ok(())
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn footer() -> BannerInfo {
        BannerInfo::new(
            1.0,
            SizeUnit::Inches,
            "function (pageNum, numPages) { return pageNum + ' / ' + numPages; }",
        )
    }

    #[test]
    fn default_is_valid_and_empty_is_not() {
        assert!(RenderOptions::DEFAULT.validate().is_ok());
        let err = RenderOptions::EMPTY.validate().unwrap_err();
        assert!(matches!(err, PhantomError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("paper size"));
    }

    #[test]
    fn transformers_return_new_values() {
        let base = RenderOptions::DEFAULT;
        let with_footer = base.clone().with_footer_info(footer());

        assert!(base.footer.is_none());
        assert!(RenderOptions::DEFAULT.footer.is_none());
        assert_eq!(with_footer.footer, Some(footer()));
        assert_eq!(with_footer.paper_size, Some(PaperSize::LETTER));
    }

    #[test]
    fn javascript_details_are_milliseconds() {
        let opts = RenderOptions::DEFAULT.with_javascript_execution_details(100, 50);
        assert_eq!(opts.js_wait_timeout, Duration::from_millis(100));
        assert_eq!(opts.js_wait_interval, Duration::from_millis(50));
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn unbounded_wait_timeout_is_rejected() {
        let mut opts = RenderOptions::DEFAULT;
        opts.js_wait_timeout = Duration::MAX;
        assert!(matches!(
            opts.validate(),
            Err(PhantomError::InvalidConfiguration(_))
        ));

        let parsed: RenderOptions =
            toml::from_str("js-wait-timeout = \"18446744073709551615s\"").unwrap();
        assert!(parsed.validate().is_err());

        opts.js_wait_timeout = MAX_JS_WAIT_TIMEOUT;
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn interval_longer_than_timeout_is_rejected() {
        let opts = RenderOptions::DEFAULT.with_javascript_execution_details(50, 100);
        assert!(opts.validate().is_err());
        let zero = RenderOptions::DEFAULT.with_javascript_execution_details(0, 0);
        assert!(zero.validate().is_err());
    }

    #[test]
    fn banners_and_margins_must_fit_the_page() {
        let tall = BannerInfo::new(6.0, SizeUnit::Inches, "function () { return ''; }");
        let opts = RenderOptions::DEFAULT
            .with_header_info(tall.clone())
            .with_footer_info(tall);
        let err = opts.validate().unwrap_err();
        assert!(err.to_string().contains("printable height"));

        let wide = RenderOptions::DEFAULT.with_margins(Margins::uniform(Length::inches(5.0)));
        assert!(wide.validate().is_err());
    }

    #[test]
    fn banners_require_pdf_output() {
        let opts = RenderOptions::DEFAULT
            .with_footer_info(footer())
            .with_format(RenderFormat::Png);
        assert!(opts.validate().is_err());
    }

    #[test]
    fn zoom_must_be_positive() {
        assert!(RenderOptions::DEFAULT.with_zoom_factor(0.0).validate().is_err());
        assert!(RenderOptions::DEFAULT
            .with_zoom_factor(f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn base_url_scheme_is_checked() {
        let ok = RenderOptions::DEFAULT.with_base_url(Url::parse("https://example.com/").unwrap());
        assert!(ok.validate().is_ok());
        let bad = RenderOptions::DEFAULT.with_base_url(Url::parse("ftp://example.com/").unwrap());
        assert!(bad.validate().is_err());
    }

    #[test]
    fn deserializes_partial_toml_over_defaults() {
        let opts: RenderOptions = toml::from_str(
            "paper-size = { width = \"210mm\", height = \"297mm\" }\norientation = \"landscape\"\njs-wait-timeout = \"2s\"\n",
        )
        .unwrap();
        assert_eq!(opts.paper_size, Some(PaperSize::A4));
        assert_eq!(opts.orientation, Orientation::Landscape);
        assert_eq!(opts.js_wait_timeout, Duration::from_secs(2));
        assert_eq!(opts.js_wait_interval, DEFAULT_JS_WAIT_INTERVAL);
        assert!(opts.validate().is_ok());
    }
}
