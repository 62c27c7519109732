//! Command-line surface of the `tsq` binary: parsing and dispatch.

pub mod args;

use std::time::Instant;

use anyhow::{Context, Result};

use crate::display::set_display_level;
use crate::pipeline::{Compressor, Decompressor};

pub use args::{parse_args, Command, USAGE};

/// Execute a parsed command; returns the process exit code.
pub fn run(cmd: Command) -> i32 {
    match dispatch(cmd) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("tsq: {:#}", e);
            1
        }
    }
}

fn dispatch(cmd: Command) -> Result<()> {
    match cmd {
        Command::Help => {
            eprint!("{}", USAGE);
            Ok(())
        }
        Command::Bench => crate::bench::run().context("benchmark failed"),
        Command::Compress {
            input,
            output,
            extensions,
            level,
            verbose,
        } => {
            if verbose {
                set_display_level(3);
            }
            let ctx = Compressor::new(verbose).context("cannot start compression context")?;
            let start = Instant::now();
            ctx.compress_file(&input, &output, extensions, level)
                .with_context(|| format!("compressing {}", input.display()))?;
            let in_size = std::fs::metadata(&input).map(|m| m.len()).unwrap_or(0);
            let out_size = std::fs::metadata(&output).map(|m| m.len()).unwrap_or(0);
            eprintln!(
                "{} ({}) -> {} ({}) in {:.3}s",
                input.display(),
                in_size,
                output.display(),
                out_size,
                start.elapsed().as_secs_f64(),
            );
            Ok(())
        }
        Command::Decompress {
            input,
            output,
            verbose,
        } => {
            if verbose {
                set_display_level(3);
            }
            let ctx = Decompressor::new(verbose).context("cannot start decompression context")?;
            let start = Instant::now();
            ctx.decompress_file(&input, &output)
                .with_context(|| format!("decompressing {}", input.display()))?;
            let in_size = std::fs::metadata(&input).map(|m| m.len()).unwrap_or(0);
            let out_size = std::fs::metadata(&output).map(|m| m.len()).unwrap_or(0);
            eprintln!(
                "{} ({}) -> {} ({}) in {:.3}s",
                input.display(),
                in_size,
                output.display(),
                out_size,
                start.elapsed().as_secs_f64(),
            );
            Ok(())
        }
    }
}
