//! Purpose: Single-file façade operations: read, write, create, update, delete, exists.
//! Exports: `read`, `read_as`, `write`, `create`, `create_with`, `update`, `delete`,
//!   `delete_if_exists`, `exists`.
//! Role: Compose path probing, the codec, and whole-file replacement into one call each.
//! Invariants: Documents are encoded in memory before any file is touched.
//! Invariants: Writes go to a sibling temp file that is renamed over the target, so the
//!   target holds the old bytes or the new bytes, never a mix.
//! Invariants: No locking; concurrent writers race and the last rename wins.
//! Invariants: Every handle is scoped to the call and closed on all exit paths.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::ApiResult;
use super::options::{CreateOptions, UpdateOptions, WriteOptions};
use crate::core::codec;
use crate::core::error::{Error, ErrorKind};
use crate::core::paths::{self, PathState};

const TEMP_PREFIX: &str = ".autojson-";

/// Reads and parses the JSON document at `path`.
///
/// Missing paths, directories, and unreadable files are file errors; content
/// that is not JSON is a `Parse` error carrying line and column.
pub fn read(path: impl AsRef<Path>) -> ApiResult<Value> {
    let path = path.as_ref();
    let bytes = read_bytes(path)?;
    let value = codec::decode(&bytes).map_err(|err| err.with_path(path))?;
    debug!(path = %path.display(), bytes = bytes.len(), "read document");
    Ok(value)
}

/// Like [`read`], then converts the document into `T`.
pub fn read_as<T: DeserializeOwned>(path: impl AsRef<Path>) -> ApiResult<T> {
    let path = path.as_ref();
    let value = read(path)?;
    codec::from_document(value).map_err(|err| err.with_path(path))
}

/// Serializes `document` and replaces the file at `path` with it.
pub fn write<T: Serialize + ?Sized>(
    path: impl AsRef<Path>,
    document: &T,
    options: &WriteOptions,
) -> ApiResult<()> {
    let path = path.as_ref();
    let bytes = codec::encode(document, &options.encoding()).map_err(|err| err.with_path(path))?;
    if paths::probe(path)? == PathState::Directory {
        return Err(Error::new(ErrorKind::NotAFile)
            .with_message("cannot write a document over a directory")
            .with_path(path));
    }
    let dir = paths::ensure_parent_dir(path, options.create_dirs)?;
    replace_file(path, &dir, &bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "wrote document");
    Ok(())
}

/// Creates the file at `path`, defaulting to an empty object when `data` is `None`.
///
/// Fails with `AlreadyExists` (and writes nothing) when the path is taken and
/// `overwrite` is off.
pub fn create(
    path: impl AsRef<Path>,
    data: Option<&Value>,
    options: &CreateOptions,
) -> ApiResult<()> {
    match data {
        Some(data) => create_with(path, data, options),
        None => create_with(path, &Value::Object(Map::new()), options),
    }
}

/// Typed form of [`create`] for any serializable value.
pub fn create_with<T: Serialize + ?Sized>(
    path: impl AsRef<Path>,
    data: &T,
    options: &CreateOptions,
) -> ApiResult<()> {
    let path = path.as_ref();
    if !options.overwrite && paths::probe(path)? != PathState::Missing {
        return Err(Error::new(ErrorKind::AlreadyExists)
            .with_message("file already exists")
            .with_path(path)
            .with_hint("Pass overwrite to replace it, or use update to merge into it."));
    }
    write(path, data, &options.write_options())
}

/// Shallow-merges `updates` into the object stored at `path` and returns the result.
///
/// Top-level keys in `updates` replace same-named keys; nested objects are
/// replaced wholesale, not merged. A stored document that is valid JSON but
/// not an object is discarded and treated as `{}`.
pub fn update(
    path: impl AsRef<Path>,
    updates: &Value,
    options: &UpdateOptions,
) -> ApiResult<Value> {
    let path = path.as_ref();
    let Some(updates) = updates.as_object() else {
        return Err(Error::new(ErrorKind::Type)
            .with_message(format!(
                "updates must be a JSON object, got {}",
                value_type_name(updates)
            ))
            .with_path(path));
    };

    let mut document = match paths::probe(path)? {
        PathState::Missing if options.create_if_not_exists => Map::new(),
        PathState::Missing => {
            return Err(not_found(path)
                .with_hint("Enable create-if-not-exists to start from an empty object."));
        }
        _ => match read(path)? {
            Value::Object(map) => map,
            other => {
                warn!(
                    path = %path.display(),
                    found = value_type_name(&other),
                    "stored document is not an object; replacing it"
                );
                Map::new()
            }
        },
    };

    for (key, value) in updates {
        document.insert(key.clone(), value.clone());
    }
    let merged = Value::Object(document);
    write(path, &merged, &options.write_options())?;
    Ok(merged)
}

/// Removes the file at `path`. Deleting a missing file is an error.
///
/// A symlink is removed as a link, dangling or not; its target is untouched.
pub fn delete(path: impl AsRef<Path>) -> ApiResult<()> {
    let path = path.as_ref();
    match paths::probe_entry(path)? {
        PathState::Missing => return Err(not_found(path)),
        PathState::Directory => {
            return Err(Error::new(ErrorKind::NotAFile)
                .with_message("refusing to delete a directory")
                .with_path(path));
        }
        PathState::File | PathState::Other => {}
    }
    fs::remove_file(path).map_err(|err| paths::io_error(err, path))?;
    debug!(path = %path.display(), "deleted document");
    Ok(())
}

/// Idempotent [`delete`]: returns whether a file was actually removed.
pub fn delete_if_exists(path: impl AsRef<Path>) -> ApiResult<bool> {
    match delete(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// True only for a regular file holding valid JSON. Never fails.
pub fn exists(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    if !matches!(paths::probe(path), Ok(PathState::File)) {
        return false;
    }
    match read(path) {
        Ok(_) => true,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "not a valid JSON file");
            false
        }
    }
}

fn read_bytes(path: &Path) -> ApiResult<Vec<u8>> {
    match paths::probe(path)? {
        PathState::Missing => return Err(not_found(path)),
        PathState::Directory => {
            return Err(Error::new(ErrorKind::NotAFile)
                .with_message("path is a directory")
                .with_path(path));
        }
        PathState::File | PathState::Other => {}
    }
    fs::read(path).map_err(|err| paths::io_error(err, path))
}

fn replace_file(path: &Path, dir: &Path, bytes: &[u8]) -> ApiResult<()> {
    // Dropping the temp file on any early return removes it.
    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|err| paths::io_error(err, dir))?;
    tmp.write_all(bytes)
        .map_err(|err| paths::io_error(err, tmp.path()))?;
    tmp.as_file()
        .sync_all()
        .map_err(|err| paths::io_error(err, tmp.path()))?;
    carry_permissions(path, tmp.as_file())?;
    tmp.persist(path)
        .map_err(|err| paths::io_error(err.error, path))?;
    Ok(())
}

// Temp files are created owner-only; keep the target's mode, or use a
// conventional 0644 for new files.
fn carry_permissions(path: &Path, file: &fs::File) -> ApiResult<()> {
    let permissions = match fs::metadata(path) {
        Ok(meta) => meta.permissions(),
        Err(_) => default_permissions(file)?,
    };
    file.set_permissions(permissions)
        .map_err(|err| paths::io_error(err, path))
}

#[cfg(unix)]
fn default_permissions(_file: &fs::File) -> ApiResult<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Ok(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions(file: &fs::File) -> ApiResult<fs::Permissions> {
    file.metadata()
        .map(|meta| meta.permissions())
        .map_err(|err| Error::new(ErrorKind::Io).with_source(err))
}

fn not_found(path: &Path) -> Error {
    Error::new(ErrorKind::NotFound)
        .with_message("file not found")
        .with_path(path)
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::{TEMP_PREFIX, read, value_type_name, write};
    use crate::api::options::WriteOptions;
    use crate::core::error::ErrorKind;
    use serde_json::{Value, json};

    #[test]
    fn write_leaves_no_temp_files_behind() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("doc.json");
        write(&path, &json!({"a": 1}), &WriteOptions::default()).expect("write");
        write(&path, &json!({"a": 2}), &WriteOptions::default()).expect("rewrite");

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .expect("read_dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["doc.json".to_string()]);
        assert!(!names.iter().any(|name| name.starts_with(TEMP_PREFIX)));
        assert_eq!(read(&path).expect("read"), json!({"a": 2}));
    }

    #[test]
    fn writing_over_a_directory_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = write(dir.path(), &json!({}), &WriteOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAFile);
    }

    #[cfg(unix)]
    #[test]
    fn rewrite_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("doc.json");
        std::fs::write(&path, "{}").expect("seed");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).expect("chmod");

        write(&path, &json!({"k": "v"}), &WriteOptions::default()).expect("write");
        let mode = std::fs::metadata(&path).expect("meta").permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[test]
    fn type_names_cover_every_variant() {
        assert_eq!(value_type_name(&Value::Null), "null");
        assert_eq!(value_type_name(&json!(true)), "boolean");
        assert_eq!(value_type_name(&json!(1)), "number");
        assert_eq!(value_type_name(&json!("s")), "string");
        assert_eq!(value_type_name(&json!([])), "array");
        assert_eq!(value_type_name(&json!({})), "object");
    }
}
