//! On-disk format of the level cache.
//!
//! A pretty-printed JSON object nested as
//! `shape_id -> branch_factor -> level -> approximation`. Integer keys are
//! written as strings and parsed back into integers. Files are replaced
//! atomically: the table is written to a temporary file in the target
//! directory, which is then renamed over the old file.

use crate::approximation::Approximation;
use crate::error::{SpherizeError, SpherizeResult};
use config::constants::CACHE_JSON_INDENT;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Cached approximations by shape, branch factor and level.
pub type CacheTable = BTreeMap<String, BTreeMap<u32, BTreeMap<u32, Approximation>>>;

/// Serializes a table as indented JSON.
pub(crate) fn encode(table: &CacheTable) -> serde_json::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(CACHE_JSON_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    table.serialize(&mut serializer)?;
    buffer.push(b'\n');
    Ok(buffer)
}

/// Parses and validates a table. `path` is only used in error messages.
pub(crate) fn decode(bytes: &[u8], path: &Path) -> SpherizeResult<CacheTable> {
    let table: CacheTable =
        serde_json::from_slice(bytes).map_err(|err| SpherizeError::corrupt(path, err.to_string()))?;

    for (shape_id, branches) in &table {
        for (branch_factor, levels) in branches {
            for (level, approx) in levels {
                if let Some(problem) = invalid_value(approx) {
                    return Err(SpherizeError::corrupt(
                        path,
                        format!(
                            "'{}' branch {} level {}: {}",
                            shape_id, branch_factor, level, problem
                        ),
                    ));
                }
            }
        }
    }
    Ok(table)
}

/// Describes why `approx` cannot be stored, if it cannot.
pub(crate) fn invalid_value(approx: &Approximation) -> Option<&'static str> {
    let metrics = [approx.mean_error, approx.best_error, approx.worst_error];
    if metrics.iter().any(|m| !m.is_finite() || *m < 0.0) {
        return Some("error metrics must be finite and non-negative");
    }
    for sphere in &approx.primitives {
        if !sphere.center().is_finite() {
            return Some("sphere center is not finite");
        }
        if !sphere.radius.is_finite() || sphere.radius < 0.0 {
            return Some("sphere radius must be finite and non-negative");
        }
    }
    None
}

/// Reads a table from `path`. A missing file yields `None`.
pub(crate) fn read(path: &Path) -> SpherizeResult<Option<CacheTable>> {
    match fs::read(path) {
        Ok(bytes) => decode(&bytes, path).map(Some),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(SpherizeError::io(path, err)),
    }
}

/// Atomically replaces `path` with `bytes`.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> SpherizeResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|err| SpherizeError::io(dir, err))?;

    let mut file = NamedTempFile::new_in(dir).map_err(|err| SpherizeError::io(dir, err))?;
    file.write_all(bytes)
        .and_then(|()| file.as_file().sync_all())
        .map_err(|err| SpherizeError::io(file.path(), err))?;
    file.persist(path)
        .map_err(|err| SpherizeError::io(path, err.error))?;
    Ok(())
}
