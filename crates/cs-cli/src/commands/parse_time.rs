//! Parse-time command printing the canonical form of a typed time.

use std::io::Write;

use anyhow::{Result, bail};
use cs_core::parse_typed_time_input;

/// Runs the parse-time command.
pub fn run<W: Write>(writer: &mut W, text: &str) -> Result<()> {
    let Some(typed) = parse_typed_time_input(text) else {
        bail!("invalid time {text:?}, expected HH:MM or H:MM am/pm");
    };
    writeln!(writer, "{}", typed.canonical)?;
    Ok(())
}
