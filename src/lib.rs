//! phantom-render library
//!
//! Drives a PhantomJS-compatible headless engine as a subprocess: run an
//! arbitrary script and capture its output, or render an HTML document to PDF
//! (or PNG/JPEG) with page size, margins, headers/footers and JavaScript
//! readiness waiting.
//!
//! # Module Overview
//!
//! - [`engine`] - Workspaces, script generation, process orchestration
//! - [`options`] - Engine switches and render options
//! - [`units`] - Lengths and size units
//! - [`blocking`] - Synchronous wrapper around the async engine
//! - [`config`] - Configuration file support
//! - [`output`] - JSON output schemas
//!
//! # Example
//!
//! ```no_run
//! use phantom_render::{EngineSettings, PhantomEngine, RenderOptions};
//! use std::io::Read;
//!
//! # async fn example() -> phantom_render::Result<()> {
//! let engine = PhantomEngine::new(EngineSettings::default());
//!
//! let mut script: &[u8] = b"console.log('hi'); phantom.exit(0);";
//! let response = engine.exec(&mut script).await?;
//! assert_eq!(response.exit_code(), 0);
//!
//! let mut html: &[u8] = b"<html><body><h1>Invoice</h1></body></html>";
//! let mut pdf = engine.render(&mut html, &RenderOptions::DEFAULT).await?;
//! let mut bytes = Vec::new();
//! pdf.read_to_end(&mut bytes)?;
//! # Ok(())
//! # }
//! ```

pub mod blocking;
pub mod config;
pub mod engine;
pub mod error;
pub mod options;
pub mod output;
pub mod units;
pub mod viewport;

pub use blocking::BlockingEngine;
pub use config::{Config, ConfigError};
pub use engine::{
    generate_render_script, EngineSettings, ExecutionResponse, PhantomEngine, RenderedPdf,
    Workspace, DEFAULT_EXECUTABLE,
};
pub use error::{ErrorCategory, ErrorPayload, PhantomError, Result};
pub use options::{
    BannerInfo, EngineOptions, Margins, Orientation, PaperSize, ProxyType, RenderFormat,
    RenderOptions,
};
pub use output::{
    CheckOutput, ErrorOutput, ExecOutput, PhantomOutput, RenderOutput, OUTPUT_VERSION,
};
pub use units::{Length, SizeUnit};
pub use viewport::Viewport;
