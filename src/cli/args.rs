//! Command-line argument definitions
// (c) Bakelite Contributors

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::codegen::Target;

use super::styles::{CLAP_STYLES, ColourMode};

/// Schema compiler for embedded communication protocols
#[derive(Debug, Parser)]
#[command(name = "bakelite", version = crate::util::version_string(), styles = CLAP_STYLES)]
pub struct CliArgs {
    /// What to do
    #[command(subcommand)]
    pub command: Command,

    /// Controls use of terminal colours
    #[arg(long, global = true, value_enum, default_value_t = ColourMode::Auto)]
    pub color: ColourMode,

    /// Increase output verbosity (may be repeated)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// The two top-level operations bakelite supports
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compiles a `.bakelite` schema into generated source for one target
    Gen {
        /// Target language
        #[arg(short = 'l', long = "lang", value_enum)]
        lang: Target,
        /// Input `.bakelite` file
        #[arg(short, long)]
        input: PathBuf,
        /// Output file to write the generated source to
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Writes the language-specific runtime-support artifact (COBS/CRC/stream/framer)
    Runtime {
        /// Target language
        #[arg(short = 'l', long = "lang", value_enum)]
        lang: Target,
        /// Output file to write the runtime artifact to
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gen_invocation() {
        let args = CliArgs::try_parse_from([
            "bakelite", "gen", "-l", "ctiny", "-i", "schema.bakelite", "-o", "out.h",
        ])
        .unwrap();
        match args.command {
            Command::Gen { lang, input, output } => {
                assert_eq!(lang, Target::Ctiny);
                assert_eq!(input, PathBuf::from("schema.bakelite"));
                assert_eq!(output, PathBuf::from("out.h"));
            }
            Command::Runtime { .. } => panic!("expected Gen"),
        }
    }

    #[test]
    fn parses_runtime_invocation() {
        let args = CliArgs::try_parse_from(["bakelite", "runtime", "-l", "cpptiny", "-o", "rt.hpp"]).unwrap();
        match args.command {
            Command::Runtime { lang, output } => {
                assert_eq!(lang, Target::Cpptiny);
                assert_eq!(output, PathBuf::from("rt.hpp"));
            }
            Command::Gen { .. } => panic!("expected Runtime"),
        }
    }

    #[test]
    fn rejects_unknown_target() {
        assert!(CliArgs::try_parse_from(["bakelite", "gen", "-l", "java", "-i", "a", "-o", "b"]).is_err());
    }
}
