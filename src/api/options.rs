//! Purpose: Per-call knobs for the façade operations.
//! Exports: `WriteOptions`, `CreateOptions`, `UpdateOptions`, `AutoOptions`,
//!   `ErrorPolicy`, `KeyStyle`.
//! Role: Replace keyword defaults with explicit structs; `Default` holds the documented values.
//! Invariants: Defaults are indent 4, raw UTF-8, parent creation on write, no overwrite,
//!   no implicit creation on update/auto, recursive walks that stop on the first bad file.

use crate::core::codec::{DEFAULT_INDENT, Encoding};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WriteOptions {
    pub indent: Option<usize>,
    pub ensure_ascii: bool,
    pub create_dirs: bool,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self {
            indent: Some(DEFAULT_INDENT),
            ensure_ascii: false,
            create_dirs: true,
        }
    }

    pub fn with_indent(mut self, indent: Option<usize>) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_ensure_ascii(mut self, ensure_ascii: bool) -> Self {
        self.ensure_ascii = ensure_ascii;
        self
    }

    pub fn with_create_dirs(mut self, create_dirs: bool) -> Self {
        self.create_dirs = create_dirs;
        self
    }

    pub(crate) fn encoding(&self) -> Encoding {
        Encoding {
            indent: self.indent,
            ensure_ascii: self.ensure_ascii,
        }
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CreateOptions {
    pub overwrite: bool,
    pub indent: Option<usize>,
    pub ensure_ascii: bool,
}

impl CreateOptions {
    pub fn new() -> Self {
        Self {
            overwrite: false,
            indent: Some(DEFAULT_INDENT),
            ensure_ascii: false,
        }
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_indent(mut self, indent: Option<usize>) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_ensure_ascii(mut self, ensure_ascii: bool) -> Self {
        self.ensure_ascii = ensure_ascii;
        self
    }

    // Creation always makes missing parents.
    pub(crate) fn write_options(&self) -> WriteOptions {
        WriteOptions {
            indent: self.indent,
            ensure_ascii: self.ensure_ascii,
            create_dirs: true,
        }
    }
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UpdateOptions {
    pub create_if_not_exists: bool,
    pub indent: Option<usize>,
    pub ensure_ascii: bool,
}

impl UpdateOptions {
    pub fn new() -> Self {
        Self {
            create_if_not_exists: false,
            indent: Some(DEFAULT_INDENT),
            ensure_ascii: false,
        }
    }

    pub fn with_create_if_not_exists(mut self, create: bool) -> Self {
        self.create_if_not_exists = create;
        self
    }

    pub fn with_indent(mut self, indent: Option<usize>) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_ensure_ascii(mut self, ensure_ascii: bool) -> Self {
        self.ensure_ascii = ensure_ascii;
        self
    }

    pub(crate) fn write_options(&self) -> WriteOptions {
        WriteOptions {
            indent: self.indent,
            ensure_ascii: self.ensure_ascii,
            create_dirs: true,
        }
    }
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// What `auto` does with a file that cannot be read or parsed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorPolicy {
    /// Abort the whole call with the first failure.
    Stop,
    /// Record the failure in `Collection::skipped` and keep going.
    Skip,
}

/// How `auto` names the documents it loads.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum KeyStyle {
    /// Path relative to the scanned directory, `/`-separated (`sub/b.json`).
    RelativePath,
    /// File name without extension (`b`); duplicate stems are an error.
    Stem,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AutoOptions {
    pub recursive: bool,
    pub create_if_not_exists: bool,
    pub on_error: ErrorPolicy,
    pub key: KeyStyle,
}

impl AutoOptions {
    pub fn new() -> Self {
        Self {
            recursive: true,
            create_if_not_exists: false,
            on_error: ErrorPolicy::Stop,
            key: KeyStyle::RelativePath,
        }
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_create_if_not_exists(mut self, create: bool) -> Self {
        self.create_if_not_exists = create;
        self
    }

    pub fn with_error_policy(mut self, on_error: ErrorPolicy) -> Self {
        self.on_error = on_error;
        self
    }

    pub fn with_key_style(mut self, key: KeyStyle) -> Self {
        self.key = key;
        self
    }
}

impl Default for AutoOptions {
    fn default() -> Self {
        Self::new()
    }
}
