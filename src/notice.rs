//! Purpose: Define a stable, structured schema for non-fatal stderr notices.
//! Exports: `Notice`, `notice_json`, `skipped_file_notice`.
//! Role: Shared contract helper for CLI diagnostics (skipped files and similar events).
//! Invariants: Notices are non-fatal and never alter stdout payloads.
//! Invariants: JSON schema is stable once published; fields are additive-only.
use serde_json::{Map, Value, json};

use crate::api::SkippedFile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: String,
    pub time: String,
    pub cmd: String,
    pub path: String,
    pub message: String,
    pub details: Map<String, Value>,
}

pub fn notice_json(notice: &Notice) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(notice.kind));
    inner.insert("time".to_string(), json!(notice.time));
    inner.insert("cmd".to_string(), json!(notice.cmd));
    inner.insert("path".to_string(), json!(notice.path));
    inner.insert("message".to_string(), json!(notice.message));
    inner.insert("details".to_string(), Value::Object(notice.details.clone()));

    let mut outer = Map::new();
    outer.insert("notice".to_string(), Value::Object(inner));
    Value::Object(outer)
}

/// Notice for a file that `auto` skipped instead of aborting on.
pub fn skipped_file_notice(skipped: &SkippedFile, cmd: &str, time: String) -> Notice {
    let mut details = Map::new();
    details.insert(
        "error_kind".to_string(),
        json!(format!("{:?}", skipped.kind)),
    );
    Notice {
        kind: "skip".to_string(),
        time,
        cmd: cmd.to_string(),
        path: skipped.path.display().to_string(),
        message: skipped.message.clone(),
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::{Notice, notice_json, skipped_file_notice};
    use crate::api::{ErrorKind, SkippedFile};
    use serde_json::{Map, Value};
    use std::path::PathBuf;

    #[test]
    fn notice_json_has_required_fields() {
        let mut details = Map::new();
        details.insert("skipped_count".to_string(), Value::from(3));

        let notice = Notice {
            kind: "skip".to_string(),
            time: "2026-02-01T00:00:00Z".to_string(),
            cmd: "auto".to_string(),
            path: "data/bad.json".to_string(),
            message: "skipped 3 files".to_string(),
            details,
        };

        let value = notice_json(&notice);
        let obj = value
            .get("notice")
            .and_then(|v| v.as_object())
            .expect("notice object");

        assert_eq!(obj.get("kind").and_then(|v| v.as_str()), Some("skip"));
        assert_eq!(
            obj.get("time").and_then(|v| v.as_str()),
            Some("2026-02-01T00:00:00Z")
        );
        assert_eq!(obj.get("cmd").and_then(|v| v.as_str()), Some("auto"));
        assert_eq!(obj.get("path").and_then(|v| v.as_str()), Some("data/bad.json"));
        assert_eq!(
            obj.get("message").and_then(|v| v.as_str()),
            Some("skipped 3 files")
        );
        assert!(obj.get("details").and_then(|v| v.as_object()).is_some());
    }

    #[test]
    fn skipped_file_notice_carries_error_kind() {
        let skipped = SkippedFile {
            path: PathBuf::from("data/bad.json"),
            kind: ErrorKind::Parse,
            message: "Parse: invalid JSON".to_string(),
        };
        let notice = skipped_file_notice(&skipped, "auto", "t".to_string());
        assert_eq!(notice.kind, "skip");
        assert_eq!(notice.path, "data/bad.json");
        assert_eq!(
            notice.details.get("error_kind").and_then(|v| v.as_str()),
            Some("Parse")
        );
    }
}
