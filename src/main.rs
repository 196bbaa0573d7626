//! Binary entry point for the `recompress` command-line tool.
//!
//! # Control flow
//!
//! 1. [`parse_args`] reads the command line into a [`ParsedArgs`] value.
//! 2. With `--count N`, [`run`] compresses N times in the foreground and
//!    returns an exit code.
//! 3. Otherwise the repeat loop runs on a background thread while the main
//!    thread waits for Enter.  A failure on the loop thread is fatal to the
//!    whole process.

use std::process;
use std::thread;

use anyhow::Context;

use recompress::cli::args::{parse_args, ParsedArgs};
use recompress::cli::prompt::wait_enter;
use recompress::display::set_display_level;
use recompress::driver;
use recompress::io::EnginePool;
use recompress::{displaylevel, displayout};

/// Run the loop selected by `args`.  Returns the process exit code.
fn run(args: ParsedArgs) -> anyhow::Result<i32> {
    displaylevel!(
        3,
        "*** recompress v{} : {} -> {}, zstd level {} ***\n",
        env!("CARGO_PKG_VERSION"),
        args.input.display(),
        args.output.display(),
        recompress::config::COMPRESSION_LEVEL
    );

    if let Some(limit) = args.limit {
        let pool = EnginePool::new();
        return Ok(
            match driver::run(&pool, &args.input, &args.output, &args.throttle, Some(limit)) {
                Ok(stats) => {
                    displaylevel!(
                        2,
                        "compressed {} times ({} pauses)\n",
                        stats.iterations,
                        stats.pauses
                    );
                    0
                }
                Err(failure) => {
                    displaylevel!(1, "recompress: {}\n", failure);
                    1
                }
            },
        );
    }

    thread::Builder::new()
        .name("compress-loop".to_owned())
        .spawn(move || {
            let pool = EnginePool::new();
            match driver::run(&pool, &args.input, &args.output, &args.throttle, None) {
                Ok(_) => process::exit(0),
                Err(failure) => {
                    displaylevel!(1, "recompress: {}\n", failure);
                    process::exit(1);
                }
            }
        })
        .context("cannot start the compression thread")?;

    wait_enter("press enter key to stop...\n");
    displayout!("done\n");
    Ok(0)
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("recompress: {:#}", e);
            process::exit(1);
        }
    };
    set_display_level(args.display_level);

    let exit_code = match run(args) {
        Ok(code) => code,
        Err(e) => {
            displaylevel!(1, "recompress: {:#}\n", e);
            1
        }
    };
    process::exit(exit_code);
}
