pub mod render;
pub mod shell;

pub use render::render;
pub use shell::{run_shell, Command};
