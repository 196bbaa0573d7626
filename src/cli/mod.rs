//! Command-line interface for the `recompress` binary.
//!
//! | Submodule  | Responsibility |
//! |------------|----------------|
//! | [`args`]   | clap definition, validation, `ParsedArgs`. |
//! | [`prompt`] | "press enter to stop" wait. |

pub mod args;
pub mod prompt;
