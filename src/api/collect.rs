//! Purpose: Bulk-load every `.json` file under a directory.
//! Exports: `auto`, `Collection`, `SkippedFile`.
//! Role: Directory-level façade built on `read`; owns enumeration and key derivation.
//! Invariants: Candidates are fully enumerated and sorted before the first parse, so a
//!   mid-walk failure never leaves a half-built collection.
//! Invariants: Walk depth is 1 or unbounded; symlinked files are loaded, symlinked
//!   directories are not descended.
//! Invariants: Per-file failures abort under `ErrorPolicy::Stop` and are recorded under
//!   `ErrorPolicy::Skip`; walk failures and duplicate keys always abort.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::ApiResult;
use super::file::read;
use super::options::{AutoOptions, ErrorPolicy, KeyStyle};
use crate::core::error::{Error, ErrorKind};
use crate::core::paths::{self, PathState};

const JSON_EXTENSION: &str = "json";

/// A file `auto` could not load under [`ErrorPolicy::Skip`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub kind: ErrorKind,
    pub message: String,
}

/// Documents loaded by [`auto`], keyed per [`KeyStyle`] and ordered by key.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Collection {
    documents: BTreeMap<String, Value>,
    skipped: Vec<SkippedFile>,
}

impl Collection {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.documents.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.documents.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    pub fn documents(&self) -> &BTreeMap<String, Value> {
        &self.documents
    }

    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }

    pub fn into_documents(self) -> BTreeMap<String, Value> {
        self.documents
    }
}

impl IntoIterator for Collection {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.into_iter()
    }
}

/// Loads every `.json` file under `directory`.
///
/// A missing directory is created (and an empty collection returned) only
/// when `create_if_not_exists` is set; otherwise it is a `NotFound` error.
pub fn auto(directory: impl AsRef<Path>, options: &AutoOptions) -> ApiResult<Collection> {
    let directory = directory.as_ref();
    match paths::probe(directory)? {
        PathState::Directory => {}
        PathState::Missing if options.create_if_not_exists => {
            paths::create_dir_all(directory)?;
            return Ok(Collection::default());
        }
        PathState::Missing => {
            return Err(Error::new(ErrorKind::NotFound)
                .with_message("directory not found")
                .with_path(directory));
        }
        PathState::File | PathState::Other => {
            return Err(Error::new(ErrorKind::NotAFile)
                .with_message("not a directory")
                .with_path(directory));
        }
    }

    let candidates = discover(directory, options.recursive)?;
    debug!(
        dir = %directory.display(),
        candidates = candidates.len(),
        recursive = options.recursive,
        "scanned directory"
    );

    let mut collection = Collection::default();
    let mut origins: BTreeMap<String, PathBuf> = BTreeMap::new();
    for candidate in candidates {
        let key = document_key(directory, &candidate, options.key);
        if let Some(previous) = origins.get(&key) {
            return Err(Error::new(ErrorKind::DuplicateKey)
                .with_message(format!(
                    "key {key:?} is produced by both {} and {}",
                    previous.display(),
                    candidate.display()
                ))
                .with_path(&candidate)
                .with_hint("Use relative-path keys, or rename one of the files."));
        }

        let document = match read(&candidate) {
            Ok(document) => document,
            Err(err) if options.on_error == ErrorPolicy::Skip => {
                warn!(path = %candidate.display(), error = %err, "skipping unreadable JSON file");
                collection.skipped.push(SkippedFile {
                    path: candidate,
                    kind: err.kind(),
                    message: err.to_string(),
                });
                continue;
            }
            Err(err) => return Err(err),
        };
        origins.insert(key.clone(), candidate);
        collection.documents.insert(key, document);
    }
    Ok(collection)
}

fn discover(directory: &Path, recursive: bool) -> ApiResult<Vec<PathBuf>> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut found = Vec::new();
    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| walk_error(err, directory))?;
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if is_file && has_json_extension(entry.path()) {
            found.push(entry.into_path());
        }
    }
    found.sort();
    Ok(found)
}

fn has_json_extension(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(JSON_EXTENSION)
}

fn document_key(directory: &Path, path: &Path, style: KeyStyle) -> String {
    match style {
        KeyStyle::RelativePath => {
            let relative = path.strip_prefix(directory).unwrap_or(path);
            relative
                .components()
                .map(|component| component.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        }
        KeyStyle::Stem => path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default(),
    }
}

fn walk_error(err: walkdir::Error, root: &Path) -> Error {
    let path = err.path().unwrap_or(root).to_path_buf();
    let kind = err
        .io_error()
        .map(paths::io_error_kind)
        .unwrap_or(ErrorKind::Io);
    Error::new(kind)
        .with_message(format!("failed to scan directory: {err}"))
        .with_path(path)
        .with_source(err)
}

#[cfg(test)]
mod tests {
    use super::{KeyStyle, document_key, has_json_extension};
    use std::path::Path;

    #[test]
    fn extension_match_is_exact() {
        assert!(has_json_extension(Path::new("a.json")));
        assert!(has_json_extension(Path::new("dir/b.c.json")));
        assert!(!has_json_extension(Path::new("a.jsonl")));
        assert!(!has_json_extension(Path::new("a.JSON")));
        assert!(!has_json_extension(Path::new("json")));
    }

    #[test]
    fn keys_follow_style() {
        let root = Path::new("/data");
        let nested = Path::new("/data/sub/deep/b.json");
        assert_eq!(
            document_key(root, nested, KeyStyle::RelativePath),
            "sub/deep/b.json"
        );
        assert_eq!(document_key(root, nested, KeyStyle::Stem), "b");
        assert_eq!(
            document_key(root, Path::new("/data/a.json"), KeyStyle::RelativePath),
            "a.json"
        );
    }
}
