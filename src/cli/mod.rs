//! Command line interface for bakelite
// (c) Bakelite Contributors

mod args;
mod cli_main;
pub(crate) mod styles;

pub use args::CliArgs;
pub use cli_main::cli;
