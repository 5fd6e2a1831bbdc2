//! Synchronous facade over [`PhantomEngine`].

use std::io::Read;
use tokio::runtime::Runtime;

use crate::engine::{EngineSettings, ExecutionResponse, PhantomEngine, RenderedPdf};
use crate::options::{EngineOptions, RenderOptions};
use crate::Result;

/// Blocking engine backed by its own multi-thread runtime.
///
/// Safe to share between threads; concurrent calls are bounded by the
/// same process limit as the async engine.
#[derive(Debug)]
pub struct BlockingEngine {
    engine: PhantomEngine,
    runtime: Runtime,
}

impl BlockingEngine {
    pub fn new(settings: EngineSettings) -> Result<Self> {
        Self::from_engine(PhantomEngine::new(settings))
    }

    pub fn from_engine(engine: PhantomEngine) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("phantom-render")
            .build()?;
        Ok(Self { engine, runtime })
    }

    pub fn engine(&self) -> &PhantomEngine {
        &self.engine
    }

    pub fn exec(&self, script: impl Read) -> Result<ExecutionResponse> {
        let script = read_all(script)?;
        self.runtime
            .block_on(self.engine.exec(&mut script.as_slice()))
    }

    pub fn exec_with(&self, script: impl Read, options: &EngineOptions) -> Result<ExecutionResponse> {
        let script = read_all(script)?;
        self.runtime
            .block_on(self.engine.exec_with(&mut script.as_slice(), options))
    }

    pub fn render(&self, html: impl Read, options: &RenderOptions) -> Result<RenderedPdf> {
        let html = read_all(html)?;
        self.runtime
            .block_on(self.engine.render(&mut html.as_slice(), options))
    }

    pub fn engine_version(&self) -> Result<String> {
        self.runtime.block_on(self.engine.engine_version())
    }
}

fn read_all(mut source: impl Read) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    source.read_to_end(&mut buf)?;
    Ok(buf)
}
