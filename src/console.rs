//! Operator-facing progress lines. Tool output itself is streamed by the
//! child processes and never passes through here.

use colored::Colorize;

/// Print a green status line.
pub fn status(msg: &str) {
    println!("{}", msg.green());
}
