//! Build-time version information
// (c) Bakelite Contributors

/// The version string shown by `--version`: the crate version plus a short git hash,
/// when `build.rs` was able to determine one.
#[must_use]
pub(crate) fn short() -> String {
    if let Some(v) = option_env!("BAKELITE_VERSION_STRING") {
        return v.to_string();
    }
    let hash = option_env!("BAKELITE_BUILD_GIT_HASH").unwrap_or("???");
    format!("{}+g{hash}", env!("CARGO_PKG_VERSION"))
}
