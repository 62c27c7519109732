//! Command-line parsing for `tsq`.
//!
//! ```text
//! tsq c <input> <output> [--no-ext] [--level N] [-v]
//! tsq d <input> <output> [-v]
//! tsq b
//! ```
//!
//! Parsing is split from dispatch so it can be unit-tested without touching
//! `std::env` or the filesystem.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};

use crate::config::{LEVEL_DEFAULT, LEVEL_MAX};

/// Fully parsed invocation.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Compress {
        input: PathBuf,
        output: PathBuf,
        extensions: bool,
        level: u8,
        verbose: bool,
    },
    Decompress {
        input: PathBuf,
        output: PathBuf,
        verbose: bool,
    },
    Bench,
    Help,
}

pub const USAGE: &str = "\
tsq - TurboSqueeze block compressor

usage:
  tsq c <input> <output> [--no-ext] [--level N] [-v]   compress a file
  tsq d <input> <output> [-v]                          decompress a file
  tsq b                                                run the benchmark
  tsq -h | --help                                      show this help

options:
  --no-ext     disable the wide-copy extensions (default: enabled)
  --level N    compression level 0..=10 (default: 0)
  -v           verbose job progress
";

/// Parse `argv[1..]`.
pub fn parse_args(argv: &[String]) -> Result<Command> {
    let mut it = argv.iter();
    let mode = match it.next() {
        None => return Ok(Command::Help),
        Some(m) => m.as_str(),
    };
    match mode {
        "-h" | "--help" | "help" => Ok(Command::Help),
        "b" => {
            if it.next().is_some() {
                bail!("bad usage: 'tsq b' takes no arguments");
            }
            Ok(Command::Bench)
        }
        "c" | "d" => {
            let mut paths: Vec<PathBuf> = Vec::new();
            let mut extensions = true;
            let mut level = LEVEL_DEFAULT;
            let mut verbose = false;
            while let Some(arg) = it.next() {
                match arg.as_str() {
                    "--no-ext" => extensions = false,
                    "--level" => {
                        let v = it
                            .next()
                            .ok_or_else(|| anyhow!("bad usage: --level needs a value"))?;
                        level = v
                            .parse::<u8>()
                            .ok()
                            .filter(|l| *l <= LEVEL_MAX)
                            .ok_or_else(|| anyhow!("bad usage: level must be 0..={}", LEVEL_MAX))?;
                    }
                    "-v" | "--verbose" => verbose = true,
                    other if other.starts_with('-') => {
                        bail!("bad usage: unknown option '{}'", other)
                    }
                    path => paths.push(PathBuf::from(path)),
                }
            }
            let [input, output] = <[PathBuf; 2]>::try_from(paths)
                .map_err(|_| anyhow!("bad usage: expected <input> <output>"))?;
            if mode == "c" {
                Ok(Command::Compress {
                    input,
                    output,
                    extensions,
                    level,
                    verbose,
                })
            } else {
                if !extensions || level != LEVEL_DEFAULT {
                    bail!("bad usage: --no-ext/--level only apply to compression");
                }
                Ok(Command::Decompress {
                    input,
                    output,
                    verbose,
                })
            }
        }
        other => bail!("bad usage: unknown mode '{}'", other),
    }
}
