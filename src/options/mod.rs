//! Immutable option values feeding the engine.
//!
//! - `engine` - command-line switches for the engine executable
//! - `render` - page, banner and readiness settings for a render
//! - `page` - paper sizes, orientation and margins

mod engine;
mod page;
mod render;

pub use engine::{EngineOptions, ProxyType};
pub use page::{Margins, Orientation, PaperSize, PaperSizeParseError};
pub use render::{
    BannerInfo, RenderFormat, RenderOptions, DEFAULT_JS_WAIT_INTERVAL, DEFAULT_JS_WAIT_TIMEOUT,
    MAX_JS_WAIT_TIMEOUT,
};
