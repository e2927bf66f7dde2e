//! Purpose: Single error type shared by every façade operation and the CLI.
//! Exports: `Error`, `ErrorKind`, `ErrorClass`, `to_exit_code`.
//! Role: Callers match on `kind()` or `class()` instead of on error subtypes.
//! Invariants: Every kind belongs to exactly one class; the mapping is fixed.
//! Invariants: Exit codes are stable once published; new kinds get new codes.
use std::error::Error as StdError;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    Internal,
    Usage,
    NotFound,
    AlreadyExists,
    Permission,
    NotAFile,
    StorageFull,
    Io,
    Parse,
    Serialize,
    Type,
    DuplicateKey,
}

/// Coarse grouping of [`ErrorKind`]s.
///
/// `File` covers everything about where a document lives, `Validation` covers
/// what a document contains.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorClass {
    File,
    Validation,
    Usage,
    Internal,
}

impl ErrorKind {
    pub fn class(self) -> ErrorClass {
        match self {
            ErrorKind::NotFound
            | ErrorKind::AlreadyExists
            | ErrorKind::Permission
            | ErrorKind::NotAFile
            | ErrorKind::StorageFull
            | ErrorKind::Io => ErrorClass::File,
            ErrorKind::Parse
            | ErrorKind::Serialize
            | ErrorKind::Type
            | ErrorKind::DuplicateKey => ErrorClass::Validation,
            ErrorKind::Usage => ErrorClass::Usage,
            ErrorKind::Internal => ErrorClass::Internal,
        }
    }
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    path: Option<PathBuf>,
    position: Option<(usize, usize)>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            path: None,
            position: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn class(&self) -> ErrorClass {
        self.kind.class()
    }

    pub fn is_file_error(&self) -> bool {
        self.class() == ErrorClass::File
    }

    pub fn is_validation_error(&self) -> bool {
        self.class() == ErrorClass::Validation
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 1-based line of a parse failure, when the parser reported one.
    pub fn line(&self) -> Option<usize> {
        self.position.map(|(line, _)| line)
    }

    /// 1-based column of a parse failure, when the parser reported one.
    pub fn column(&self) -> Option<usize> {
        self.position.map(|(_, column)| column)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_position(mut self, line: usize, column: usize) -> Self {
        // serde_json reports 0/0 when the failure has no location (e.g. io errors).
        if line > 0 {
            self.position = Some((line, column));
        }
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }
        if let Some((line, column)) = self.position {
            write!(f, " (line: {line}, column: {column})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::AlreadyExists => 4,
        ErrorKind::Permission => 6,
        ErrorKind::Parse => 7,
        ErrorKind::Io => 8,
        ErrorKind::NotAFile => 9,
        ErrorKind::StorageFull => 10,
        ErrorKind::Serialize => 11,
        ErrorKind::Type => 12,
        ErrorKind::DuplicateKey => 13,
    }
}
