use serde::de::DeserializeOwned;
use std::io::{self, Read};
use tracing::debug;

/// Request piped on stdin, deserialized straight into `T` so that errors
/// point at the offending line and column. `None` when stdin is a terminal or
/// nothing was piped.
pub fn read_stdin<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut raw = String::new();
    io::stdin().lock().read_to_string(&mut raw)?;
    if raw.trim().is_empty() {
        return Ok(None);
    }
    debug!(bytes = raw.len(), "read request from stdin");

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| format!("Invalid request on stdin: {e}").into())
}
