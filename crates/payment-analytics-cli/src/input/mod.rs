pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Request document from `--input <file.json>`, else from piped stdin.
pub fn read_request<T: DeserializeOwned>(path: Option<&str>) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        file::read_json(path)
    } else if let Some(request) = stdin::read_stdin()? {
        Ok(request)
    } else {
        Err("--input <file.json> or stdin required".into())
    }
}
