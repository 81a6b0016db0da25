//! General utility code that didn't fit anywhere else
// (c) Bakelite Contributors

mod tracing;
mod version;

pub(crate) use tracing::{is_initialized as tracing_is_initialised, setup as setup_tracing};
pub(crate) use version::short as version_string;
