use crate::error::Result;
use std::fs;
use std::path::Path;

/// Reads a whole WITSML document into memory.
///
/// I/O failures (missing file, permissions, invalid UTF-8) are returned to the
/// caller unchanged.
pub fn read_xml<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "read document");
    Ok(content)
}
