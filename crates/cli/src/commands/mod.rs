//! CLI subcommands.

pub mod hash;
pub mod push;
pub mod sign;
pub mod stores;
pub mod verify;

use serde_json::Value;

/// Write one JSON document per line to stdout.
#[allow(clippy::print_stdout)]
pub fn emit(value: &Value) {
    println!("{value}");
}

/// Write a plain line to stdout.
#[allow(clippy::print_stdout)]
pub fn emit_line(line: &str) {
    println!("{line}");
}
