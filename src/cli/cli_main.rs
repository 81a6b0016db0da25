//! Main CLI for bakelite
// (c) Bakelite Contributors

use std::fs;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};

use super::args::{CliArgs, Command};
use super::styles::{configure_colours, error, reset};
use crate::codegen;
use crate::model;
use crate::parser;

/// Main CLI entrypoint. Call this from `main`; it reads argv.
#[must_use]
pub fn cli() -> ExitCode {
    cli_inner()
        .inspect_err(|e| {
            if crate::util::tracing_is_initialised() {
                tracing::error!("{e}");
            } else {
                eprintln!("{ERROR}Error:{RESET} {e}", ERROR = error(), RESET = reset());
            }
        })
        .map_or(ExitCode::FAILURE, |success| {
            if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        })
}

/// Inner CLI logic. `true` indicates success; `false` indicates a failure where the
/// callee has already reported the problem to stderr.
fn cli_inner() -> Result<bool> {
    use clap::Parser as _;
    use clap::error::ErrorKind::{DisplayHelp, DisplayVersion};

    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), DisplayHelp | DisplayVersion) => {
            print!("{e}");
            return Ok(true);
        }
        Err(e) => return Err(e.into()),
    };

    configure_colours(args.color);
    let trace_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    crate::util::setup_tracing(trace_level)?;

    match args.command {
        Command::Gen { lang, input, output } => run_gen(lang, &input, &output),
        Command::Runtime { lang, output } => run_runtime(lang, &output),
    }
}

fn run_gen(lang: codegen::Target, input: &std::path::Path, output: &std::path::Path) -> Result<bool> {
    let source = fs::read_to_string(input)
        .with_context(|| format!("reading schema file '{}'", input.display()))?;

    let file = match parser::parse(&source) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("{ERROR}Error:{RESET} {e}", ERROR = error(), RESET = reset());
            return Ok(false);
        }
    };

    let schema = match model::resolve(&file) {
        Ok(schema) => schema,
        Err(e) => {
            eprintln!("{ERROR}Error:{RESET} {e}", ERROR = error(), RESET = reset());
            return Ok(false);
        }
    };

    let generated = codegen::generate(lang, &schema);
    fs::write(output, generated)
        .with_context(|| format!("writing generated output to '{}'", output.display()))?;
    tracing::info!("generated {} ({})", output.display(), lang.display_name());
    Ok(true)
}

/// Writes the `runtime` artifact. The tiny backends emit more than one file (a header plus
/// a companion implementation file); the first goes to the user's `-o` path and any
/// further files land alongside it, in the same directory, under their own names.
fn run_runtime(lang: codegen::Target, output: &std::path::Path) -> Result<bool> {
    let Some(files) = codegen::runtime(lang) else {
        return Err(anyhow!(
            "{} has no separate runtime artifact; its generated module is self-contained",
            lang.display_name()
        ));
    };

    let dir = output.parent().unwrap_or_else(|| std::path::Path::new("."));
    for (i, (name, contents)) in files.iter().enumerate() {
        let path = if i == 0 { output.to_path_buf() } else { dir.join(name) };
        fs::write(&path, contents)
            .with_context(|| format!("writing runtime artifact to '{}'", path.display()))?;
        tracing::info!("wrote runtime file {} ({})", path.display(), lang.display_name());
    }
    Ok(true)
}
