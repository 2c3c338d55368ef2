//! Boundary validation tests: unknown fields, unsafe identifiers, and
//! mutually exclusive payload arguments.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use brainstorm_common::config::AppConfig;
use brainstorm_core::Ctx;
use brainstorm_core::model::ModelManager;
use brainstorm_mcp::tools::{
    CreateProjectParams, SendMessageParams, StoreResourceParams, project, resources,
};
use std::sync::Arc;
use tempfile::TempDir;

fn create_test_mm() -> (Arc<ModelManager>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = AppConfig::default();
    config.storage.data_root = temp_dir.path().join("brainstorm");

    let mm = ModelManager::new_for_test(config.storage.data_root.clone(), Arc::new(config))
        .expect("Failed to create ModelManager");
    (Arc::new(mm), temp_dir)
}

fn ctx() -> Ctx {
    Ctx::new("mcp-test-client")
}

mod unknown_fields {
    use super::*;

    #[test]
    fn create_project_rejects_unknown_fields() {
        let result = serde_json::from_value::<CreateProjectParams>(serde_json::json!({
            "project_id": "alpha",
            "agent_name": "alice",
            "surprise": true,
        }));
        assert!(result.is_err(), "unknown fields must be rejected");
    }

    #[test]
    fn send_message_rejects_legacy_field_names() {
        // The change log renamed fields; only current names are accepted
        let result = serde_json::from_value::<SendMessageParams>(serde_json::json!({
            "project_id": "alpha",
            "from_agent": "alice",
            "reply_expected": false,
            "payload": {},
            "version": "abc123",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn store_resource_rejects_caller_supplied_creator() {
        let result = serde_json::from_value::<StoreResourceParams>(serde_json::json!({
            "project_id": "alpha",
            "resource_id": "notes",
            "agent_name": "alice",
            "content": "x",
            "creator_agent": "mallory",
        }));
        assert!(result.is_err(), "creator_agent is never accepted from callers");
    }

    #[test]
    fn reply_expected_is_mandatory() {
        let result = serde_json::from_value::<SendMessageParams>(serde_json::json!({
            "project_id": "alpha",
            "from_agent": "alice",
            "payload": "hi",
        }));
        assert!(result.is_err(), "reply_expected has no default");
    }
}

mod unsafe_identifiers {
    use super::*;

    #[tokio::test]
    async fn traversal_project_id_fails_with_invalid_id() {
        let (mm, _temp) = create_test_mm();

        for bad in ["../../etc/passwd", "a/b", "a\\b", "-dash", ""] {
            let result = project::create_project_impl(
                &ctx(),
                &mm,
                CreateProjectParams {
                    project_id: bad.to_string(),
                    name: None,
                    agent_name: "alice".to_string(),
                },
            )
            .await;
            let err = format!("{:?}", result.expect_err("must reject"));
            assert!(err.contains("INVALID_ID"), "expected INVALID_ID for {bad:?}, got {err}");
        }

        // Nothing leaked onto disk
        let projects = std::fs::read_dir(mm.root().projects_dir()).expect("projects dir");
        assert_eq!(projects.count(), 0);
    }
}

mod payload_arguments {
    use super::*;

    #[tokio::test]
    async fn content_and_source_path_are_mutually_exclusive() {
        let (mm, _temp) = create_test_mm();
        project::create_project_impl(
            &ctx(),
            &mm,
            CreateProjectParams {
                project_id: "alpha".to_string(),
                name: None,
                agent_name: "alice".to_string(),
            },
        )
        .await
        .expect("create");

        let result = resources::store_resource_impl(
            &ctx(),
            &mm,
            StoreResourceParams {
                project_id: "alpha".to_string(),
                resource_id: "notes".to_string(),
                agent_name: "alice".to_string(),
                name: None,
                content: Some("inline".to_string()),
                source_path: Some("/tmp/whatever.txt".to_string()),
                etag: None,
                permissions: None,
                mime_type: None,
            },
        )
        .await;
        let err = format!("{:?}", result.expect_err("must reject"));
        assert!(err.contains("mutually exclusive"));
    }
}
