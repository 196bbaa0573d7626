//! Operator interaction on the terminal.

use crate::displayout;

/// Print `prompt` on stdout and block until one character (normally the
/// newline of Enter) arrives on stdin, or stdin is closed.
pub fn wait_enter(prompt: &str) {
    displayout!("{}", prompt);
    // Read exactly one character so nothing beyond the keypress is consumed.
    // SAFETY: getchar has no preconditions.
    unsafe { libc::getchar() };
}
