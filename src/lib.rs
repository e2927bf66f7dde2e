//! Purpose: JSON files on local disk, one call per operation.
//! Exports: `api` (façade operations, options, errors) re-exported at the crate root,
//!   plus `notice` for CLI diagnostics.
//! Role: Library behind the `autojson` binary and the integration tests.
//! Invariants: No caching, no locking, no background work; every call re-resolves its path.
//! Invariants: Writes replace whole files atomically via temp file + rename.
//!
//! ```no_run
//! use autojson::{UpdateOptions, WriteOptions};
//! use serde_json::json;
//!
//! autojson::write("conf/app.json", &json!({"port": 8080}), &WriteOptions::default())?;
//! let merged = autojson::update(
//!     "conf/app.json",
//!     &json!({"debug": true}),
//!     &UpdateOptions::default(),
//! )?;
//! assert_eq!(merged, json!({"port": 8080, "debug": true}));
//! # Ok::<(), autojson::Error>(())
//! ```
pub mod api;
mod core;
pub mod notice;

pub use api::*;
