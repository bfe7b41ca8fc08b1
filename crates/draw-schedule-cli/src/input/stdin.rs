use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Read a configuration piped on stdin.
/// Returns None when stdin is a terminal or the pipe is empty.
pub fn read_stdin<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_piped(&buffer)
}

/// JSON objects are read as JSON; anything else is treated as YAML, so a
/// config file can be piped in either form.
pub fn parse_piped<T: DeserializeOwned>(text: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let config = if trimmed.starts_with('{') {
        serde_json::from_str(trimmed).map_err(|e| format!("Failed to parse JSON from stdin: {e}"))?
    } else {
        serde_yaml::from_str(trimmed).map_err(|e| format!("Failed to parse YAML from stdin: {e}"))?
    };
    tracing::debug!(bytes = trimmed.len(), "read schedule configuration from stdin");
    Ok(Some(config))
}
