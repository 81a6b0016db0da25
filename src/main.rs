//! bakelite command-line entrypoint
// (c) Bakelite Contributors

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use std::process::ExitCode;

#[cfg_attr(coverage_nightly, coverage(off))]
fn main() -> ExitCode {
    bakelite::main()
}
