use serde_json::Value;
use std::io::{self, Read};

/// Read a JSON request from stdin when one is piped in.
///
/// Returns `None` for an interactive terminal or an empty pipe, so the
/// caller can fall back to command-line flags.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_piped(&buffer)
}

fn parse_piped(buffer: &str) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| format!("Failed to parse JSON from stdin: {}", e))?;
    tracing::debug!(bytes = trimmed.len(), "read request from stdin");
    Ok(Some(value))
}
