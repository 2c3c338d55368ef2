//! Append-only audit log.
//!
//! Every state-changing operation appends one JSON line to the current
//! day's file under `audit/`. Entries are never mutated. A failed audit
//! append is logged to tracing and does not fail the primary operation.

use crate::model::ModelManager;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub op: String,
    pub actor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub result: String,
}

pub struct AuditBmc;

impl AuditBmc {
    /// Append an audit entry; never fails the caller.
    pub fn record(
        mm: &ModelManager,
        op: &str,
        actor: &str,
        project_id: Option<&str>,
        target: Option<&str>,
        result: &str,
    ) {
        let entry = AuditEntry {
            timestamp: Utc::now(),
            op: op.to_string(),
            actor: actor.to_string(),
            project_id: project_id.map(str::to_string),
            target: target.map(str::to_string),
            result: result.to_string(),
        };

        let path = mm.root().audit_log(entry.timestamp.date_naive());
        let line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(e) => {
                warn!(op, error = %e, "Failed to serialize audit entry");
                return;
            }
        };
        if let Err(e) = crate::store::atomic::append_line(&path, &line) {
            warn!(op, error = %e, "Failed to append audit entry");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use brainstorm_common::config::AppConfig;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_record_appends_json_lines() {
        let dir = TempDir::new().expect("create temp dir");
        let mm = ModelManager::new_for_test(dir.path().to_path_buf(), Arc::new(AppConfig::default()))
            .expect("mm");

        AuditBmc::record(&mm, "create_project", "alice", Some("p1"), None, "ok");
        AuditBmc::record(&mm, "delete_project", "mallory", Some("p1"), None, "denied");

        let path = mm.root().audit_log(Utc::now().date_naive());
        let content = std::fs::read_to_string(path).expect("read log");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: AuditEntry = serde_json::from_str(lines[0]).expect("parse");
        assert_eq!(first.op, "create_project");
        assert_eq!(first.actor, "alice");
        assert_eq!(first.result, "ok");

        let second: AuditEntry = serde_json::from_str(lines[1]).expect("parse");
        assert_eq!(second.result, "denied");
    }
}
