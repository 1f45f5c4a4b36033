// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk storage for binary response bodies.
//!
//! Textual bodies are kept inline in the network entry; binary bodies are
//! written under `<state>/bodies` with restrictive permissions and the entry
//! records the file path. `clear network` wipes the directory.

use std::io::Write;
use std::path::{Path, PathBuf};

use bp_core::time::now_ms;

/// Replace anything outside `[A-Za-z0-9._-]` so ids and url segments are
/// safe as file name components.
pub fn sanitize(component: &str) -> String {
    component
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect()
}

/// Last path segment of a URL, without query or fragment. Falls back to
/// "body" for bare origins.
pub fn basename_from_url(url: &str) -> String {
    let trimmed = url.split(['?', '#']).next().unwrap_or(url);
    let base = trimmed.trim_end_matches('/').rsplit('/').next().unwrap_or("");
    if base.is_empty() || base.contains(':') {
        "body".to_string()
    } else {
        sanitize(base)
    }
}

/// Write a body file as `<unix_ms>-<request id>-<basename>`, mode 0600,
/// creating the directory (0700) on first use.
pub fn write_body(
    dir: &Path,
    request_id: &str,
    url: &str,
    bytes: &[u8],
) -> std::io::Result<PathBuf> {
    use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};

    if !dir.exists() {
        std::fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)?;
    }

    let name = format!("{}-{}-{}", now_ms(), sanitize(request_id), basename_from_url(url));
    let path = dir.join(name);
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(&path)?;
    file.write_all(bytes)?;
    Ok(path)
}

/// Remove every file in the bodies directory. Returns how many were removed.
pub fn clear(dir: &Path) -> std::io::Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Whether a MIME type should be persisted to disk rather than inlined.
pub fn is_binary_mime(mime: &str) -> bool {
    let mime = mime.to_ascii_lowercase();
    if mime.starts_with("text/") {
        return false;
    }
    !(mime.contains("json")
        || mime.contains("javascript")
        || mime.contains("xml")
        || mime.contains("svg")
        || mime.contains("x-www-form-urlencoded"))
}

#[cfg(test)]
#[path = "bodies_tests.rs"]
mod tests;
