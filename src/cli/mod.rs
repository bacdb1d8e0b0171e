mod commands;
mod help;
pub mod output;
mod registry;
mod shell;

pub use shell::{run_cli, ShellContext};
