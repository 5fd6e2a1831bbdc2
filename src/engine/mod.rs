//! Headless engine orchestration.
//!
//! Every call gets its own [`Workspace`], a generated or caller-supplied
//! script staged as a file, and one engine process bounded by a hard
//! timeout. [`PhantomEngine`] is the async entry point.

mod manager;
mod process;
mod response;
mod script;
mod workspace;

pub use manager::{
    EngineSettings, PhantomEngine, DEFAULT_EXECUTABLE, DEFAULT_MAX_CONCURRENT_PROCESSES,
    DEFAULT_PROBE_TIMEOUT, DEFAULT_RENDER_GRACE, PHANTOMJS_BIN_ENV,
};
pub use response::{ExecutionResponse, RenderedPdf};
pub use script::{
    generate_render_script, EXIT_LOAD_FAILED, EXIT_OK, EXIT_READY_TIMEOUT, EXIT_SCRIPT_ERROR,
};
pub use workspace::Workspace;
