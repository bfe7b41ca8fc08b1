use serde_json::Value;
use std::io::{self, Write};

/// Pretty-print the result envelope to stdout, newline-terminated.
pub fn print_json(value: &Value) {
    let mut out = io::stdout().lock();
    if let Err(e) = write_json(&mut out, value) {
        eprintln!("JSON output error: {}", e);
    }
}

pub fn write_json<W: Write>(out: &mut W, value: &Value) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}
