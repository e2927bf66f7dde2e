// Path probing, parent-directory creation, and io error classification.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PathState {
    Missing,
    File,
    Directory,
    Other,
}

/// Classifies what currently sits at `path`, following symlinks.
///
/// Metadata failures other than "not found" (e.g. permission denied on a
/// parent) are returned as file errors rather than folded into `Missing`.
pub fn probe(path: &Path) -> Result<PathState, Error> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(PathState::File),
        Ok(meta) if meta.is_dir() => Ok(PathState::Directory),
        Ok(_) => Ok(PathState::Other),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(PathState::Missing),
        Err(err) => Err(io_error(err, path)),
    }
}

/// Classifies the directory entry at `path` itself; a symlink (dangling or
/// not) is `Other`.
pub fn probe_entry(path: &Path) -> Result<PathState, Error> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_file() => Ok(PathState::File),
        Ok(meta) if meta.is_dir() => Ok(PathState::Directory),
        Ok(_) => Ok(PathState::Other),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(PathState::Missing),
        Err(err) => Err(io_error(err, path)),
    }
}

/// Directory that will hold `path`; a bare file name lives in `.`.
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Makes sure the directory holding `path` exists.
///
/// With `create_dirs` missing intermediates are created; without it a missing
/// parent is a `NotFound` error. Never touches `path` itself.
pub fn ensure_parent_dir(path: &Path, create_dirs: bool) -> Result<PathBuf, Error> {
    let parent = parent_dir(path);
    match probe(&parent)? {
        PathState::Directory => Ok(parent),
        PathState::Missing if create_dirs => {
            create_dir_all(&parent)?;
            Ok(parent)
        }
        PathState::Missing => Err(Error::new(ErrorKind::NotFound)
            .with_message("parent directory does not exist")
            .with_path(&parent)
            .with_hint("Create the directory first or enable directory creation.")),
        PathState::File | PathState::Other => Err(Error::new(ErrorKind::NotAFile)
            .with_message("parent path is not a directory")
            .with_path(&parent)),
    }
}

pub fn create_dir_all(dir: &Path) -> Result<(), Error> {
    debug!(dir = %dir.display(), "creating directory");
    fs::create_dir_all(dir).map_err(|err| io_error(err, dir))
}

/// Wraps an io failure on `path` into a file-class [`Error`].
pub fn io_error(err: io::Error, path: &Path) -> Error {
    Error::new(io_error_kind(&err))
        .with_message(err.to_string())
        .with_path(path)
        .with_source(err)
}

pub fn io_error_kind(err: &io::Error) -> ErrorKind {
    #[cfg(unix)]
    {
        let errno = err.raw_os_error().unwrap_or_default();
        if errno == libc::EACCES || errno == libc::EPERM {
            return ErrorKind::Permission;
        }
        if errno == libc::ENOSPC || errno == libc::EDQUOT {
            return ErrorKind::StorageFull;
        }
        if errno == libc::EISDIR || errno == libc::ENOTDIR {
            return ErrorKind::NotAFile;
        }
    }
    match err.kind() {
        io::ErrorKind::NotFound => ErrorKind::NotFound,
        io::ErrorKind::PermissionDenied => ErrorKind::Permission,
        io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists,
        io::ErrorKind::IsADirectory | io::ErrorKind::NotADirectory => ErrorKind::NotAFile,
        io::ErrorKind::StorageFull => ErrorKind::StorageFull,
        _ => ErrorKind::Io,
    }
}

#[cfg(test)]
mod tests {
    use super::{PathState, ensure_parent_dir, io_error_kind, parent_dir, probe, probe_entry};
    use crate::core::error::ErrorKind;
    use std::path::{Path, PathBuf};

    #[cfg(unix)]
    #[test]
    fn probe_entry_sees_dangling_links() {
        let dir = tempfile::tempdir().expect("tempdir");
        let link = dir.path().join("link.json");
        std::os::unix::fs::symlink(dir.path().join("absent.json"), &link).expect("symlink");

        assert_eq!(probe(&link).expect("probe"), PathState::Missing);
        assert_eq!(probe_entry(&link).expect("entry"), PathState::Other);
    }

    #[test]
    fn probe_reports_each_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("a.json");
        std::fs::write(&file, "{}").expect("write");

        assert_eq!(probe(dir.path()).expect("dir"), PathState::Directory);
        assert_eq!(probe(&file).expect("file"), PathState::File);
        assert_eq!(
            probe(&dir.path().join("missing.json")).expect("missing"),
            PathState::Missing
        );
    }

    #[test]
    fn bare_file_name_lives_in_current_dir() {
        assert_eq!(parent_dir(Path::new("data.json")), PathBuf::from("."));
        assert_eq!(parent_dir(Path::new("a/b/data.json")), PathBuf::from("a/b"));
    }

    #[test]
    fn ensure_parent_dir_creates_intermediates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("x").join("y").join("doc.json");

        let parent = ensure_parent_dir(&target, true).expect("create");
        assert!(parent.is_dir());
        assert!(!target.exists());
    }

    #[test]
    fn ensure_parent_dir_without_create_fails_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("nope").join("doc.json");

        let err = ensure_parent_dir(&target, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.is_file_error());
        assert!(!dir.path().join("nope").exists());
    }

    #[test]
    fn ensure_parent_dir_rejects_file_parent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").expect("write");

        let err = ensure_parent_dir(&blocker.join("doc.json"), true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAFile);
    }

    #[cfg(unix)]
    #[test]
    fn errno_values_map_to_expected_kinds() {
        let err = std::io::Error::from_raw_os_error(libc::EACCES);
        assert_eq!(io_error_kind(&err), ErrorKind::Permission);

        let err = std::io::Error::from_raw_os_error(libc::EPERM);
        assert_eq!(io_error_kind(&err), ErrorKind::Permission);

        let err = std::io::Error::from_raw_os_error(libc::ENOSPC);
        assert_eq!(io_error_kind(&err), ErrorKind::StorageFull);

        let err = std::io::Error::from_raw_os_error(libc::EISDIR);
        assert_eq!(io_error_kind(&err), ErrorKind::NotAFile);

        let err = std::io::Error::from_raw_os_error(libc::ENOENT);
        assert_eq!(io_error_kind(&err), ErrorKind::NotFound);

        let err = std::io::Error::from_raw_os_error(libc::EEXIST);
        assert_eq!(io_error_kind(&err), ErrorKind::AlreadyExists);

        let err = std::io::Error::from_raw_os_error(libc::EBADF);
        assert_eq!(io_error_kind(&err), ErrorKind::Io);
    }
}
