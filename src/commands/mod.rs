mod check;
mod exec;
mod render;

pub use check::run_check;
pub use exec::run_exec;
pub use render::{run_render, RenderArgs};
