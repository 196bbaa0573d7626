//! Command-line arguments for the `recompress` binary.
//!
//! [`Cli`] is the raw clap definition; [`resolve`] validates it and derives
//! the values the entry point needs ([`ParsedArgs`]).  Validation errors are
//! `anyhow` errors whose message begins with `"bad usage: "`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::bail;
use clap::{ArgAction, Parser};

use crate::config::{COOLDOWN, DEFAULT_INPUT, THROTTLE_EVERY, ZSTD_EXTENSION};
use crate::driver::Throttle;

/// Repeatedly compress one file to zstd, pausing periodically to bound memory.
#[derive(Debug, Parser)]
#[command(name = "recompress", version)]
pub struct Cli {
    /// File to compress.
    #[arg(default_value = DEFAULT_INPUT)]
    pub input: PathBuf,

    /// Compressed output [default: INPUT.zst].
    pub output: Option<PathBuf>,

    /// Pause after this many successful iterations (0 = never).
    #[arg(long, value_name = "N", default_value_t = THROTTLE_EVERY)]
    pub every: u64,

    /// Length of each pause, in seconds.
    #[arg(long, value_name = "SECS", default_value_t = COOLDOWN.as_secs())]
    pub cooldown: u64,

    /// Stop after N iterations instead of waiting for Enter.
    #[arg(long, value_name = "N")]
    pub count: Option<u64>,

    /// More output (repeatable).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Less output (repeatable).
    #[arg(short, long, action = ArgAction::Count)]
    pub quiet: u8,
}

/// Validated runtime options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub throttle: Throttle,
    /// Iteration limit; `None` runs until the operator presses Enter.
    pub limit: Option<u64>,
    pub display_level: u32,
}

/// Parse `std::env::args()`.  Help and version requests exit the process.
pub fn parse_args() -> anyhow::Result<ParsedArgs> {
    resolve(Cli::parse())
}

/// Validate `cli` and fill in defaults.
pub fn resolve(cli: Cli) -> anyhow::Result<ParsedArgs> {
    let output = match cli.output {
        Some(path) => path,
        None => {
            let mut name = cli.input.clone().into_os_string();
            name.push(ZSTD_EXTENSION);
            PathBuf::from(name)
        }
    };
    if output == cli.input {
        bail!(
            "bad usage: output {} is the same file as the input",
            output.display()
        );
    }
    if cli.count == Some(0) {
        bail!("bad usage: --count must be at least 1");
    }

    let display_level = (2 + i32::from(cli.verbose) - i32::from(cli.quiet)).clamp(0, 4) as u32;

    Ok(ParsedArgs {
        input: cli.input,
        output,
        throttle: Throttle {
            every: cli.every,
            cooldown: Duration::from_secs(cli.cooldown),
        },
        limit: cli.count,
        display_level,
    })
}
