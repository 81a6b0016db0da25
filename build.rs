#![allow(missing_docs)]

fn main() {
    process_version_string();
}

fn process_version_string() {
    // trap: docs.rs builds don't get a git short hash
    let hash = git_short_hash().unwrap_or("unknown".into());
    println!("cargo:rustc-env=BAKELITE_BUILD_GIT_HASH={hash}");
    let cargo_version = env!("CARGO_PKG_VERSION");
    let version_string = format!("{cargo_version}+g{hash}");
    println!("cargo:rustc-env=BAKELITE_VERSION_STRING={version_string}");
}

fn git_short_hash() -> Option<String> {
    use std::process::Command;
    let args = &["rev-parse", "--short=8", "HEAD"];
    if let Ok(output) = Command::new("git").args(args).output() {
        let rev = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if rev.is_empty() { None } else { Some(rev) }
    } else {
        None
    }
}
