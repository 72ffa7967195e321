//! Checks applied to an uploaded statement before it is parsed

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

pub const MAX_FILENAME_CHARS: usize = 255;

const SUSPICIOUS: &[&str] = &["..", "\0", "<", ">", ":", "\"", "|", "?", "*"];

/// Validate the name of an uploaded file
pub fn validate_filename(filename: &str) -> Result<()> {
    let is_csv = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return Err(Error::Upload(
            "Invalid file type. Only CSV files allowed.".into(),
        ));
    }
    if SUSPICIOUS.iter().any(|s| filename.contains(s)) {
        return Err(Error::Upload("Invalid filename format".into()));
    }
    if filename.chars().count() > MAX_FILENAME_CHARS {
        return Err(Error::Upload("Filename too long".into()));
    }
    Ok(())
}

/// Validate uploaded bytes and decode them to text
///
/// UTF-8 is tried first (a BOM is dropped), then Latin-1, which accepts any
/// byte sequence.
pub fn decode_content(content: &[u8], max_bytes: usize) -> Result<String> {
    if content.is_empty() {
        return Err(Error::Upload("File is empty".into()));
    }
    if content.len() > max_bytes {
        return Err(Error::Upload(format!(
            "File too large. Maximum size: {:.1} MB",
            max_bytes as f64 / (1024.0 * 1024.0)
        )));
    }
    if content.contains(&0) {
        return Err(Error::Upload("File contains invalid characters".into()));
    }

    let text = match std::str::from_utf8(content) {
        Ok(s) => s.strip_prefix('\u{feff}').unwrap_or(s).to_string(),
        Err(_) => {
            debug!("Upload is not UTF-8, decoding as Latin-1");
            content.iter().map(|&b| b as char).collect()
        }
    };

    if text.split('\n').take(2).count() < 2 {
        return Err(Error::Upload("CSV file is too short or empty".into()));
    }
    Ok(text)
}

/// Validate a named upload end to end
pub fn validate_upload(filename: &str, content: &[u8], max_bytes: usize) -> Result<String> {
    validate_filename(filename)?;
    decode_content(content, max_bytes)
}

/// Read a statement from disk, applying the upload checks to its file name and content
pub fn read_upload(path: &Path, max_bytes: usize) -> Result<String> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Upload(format!("Not a file name: {}", path.display())))?;
    validate_filename(filename)?;

    let size = fs::metadata(path)?.len();
    if size > max_bytes as u64 {
        return Err(Error::Upload(format!(
            "File too large. Maximum size: {:.1} MB",
            max_bytes as f64 / (1024.0 * 1024.0)
        )));
    }
    decode_content(&fs::read(path)?, max_bytes)
}
