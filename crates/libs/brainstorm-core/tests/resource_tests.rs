//! Resource storage tests: ETag optimistic concurrency, deny-by-default
//! ACLs, and creator-only permission changes.

// Tests are allowed to use unwrap()/expect() for clearer failure messages
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use brainstorm_core::Error;
use brainstorm_core::model::resource::{
    PayloadForStore, Permissions, ResourceBmc, ResourceForStore, ResourceManifest,
};
use common::TestContext;

fn store_input(project_id: &str, resource_id: &str, content: &str) -> ResourceForStore {
    ResourceForStore {
        project_id: project_id.to_string(),
        resource_id: resource_id.to_string(),
        name: None,
        etag: None,
        permissions: None,
        mime_type: Some("text/plain".to_string()),
        payload: Some(PayloadForStore::Inline(content.to_string())),
    }
}

async fn setup() -> TestContext {
    let tc = TestContext::new().expect("test context");
    tc.create_project("alpha", "alice").await.expect("create");
    tc.join(&tc.other_ctx(), "alpha", "bob").await.expect("join");
    tc
}

#[tokio::test]
async fn test_create_assigns_etag_and_default_acl() {
    let tc = setup().await;

    let manifest = ResourceBmc::store(&tc.ctx, &tc.mm, "alice", store_input("alpha", "notes", "v1"))
        .await
        .expect("store");

    assert_eq!(manifest.etag.len(), 16);
    assert!(manifest.etag.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(manifest.creator_agent, "alice");
    assert_eq!(manifest.size_bytes, Some(2));

    let perms = manifest.permissions.expect("default permissions");
    assert_eq!(perms.read, vec!["*".to_string()]);
    assert_eq!(perms.write, vec!["alice".to_string()]);
}

#[tokio::test]
async fn test_any_member_reads_via_wildcard() {
    let tc = setup().await;
    ResourceBmc::store(&tc.ctx, &tc.mm, "alice", store_input("alpha", "notes", "shared"))
        .await
        .expect("store");

    let read = ResourceBmc::get(&tc.other_ctx(), &tc.mm, "alpha", "notes", "bob").expect("get");
    assert_eq!(read.content.as_deref(), Some("shared"));
}

#[tokio::test]
async fn test_non_member_is_forbidden() {
    let tc = setup().await;
    ResourceBmc::store(&tc.ctx, &tc.mm, "alice", store_input("alpha", "notes", "x"))
        .await
        .expect("store");

    let err = ResourceBmc::get(&tc.ctx, &tc.mm, "alpha", "notes", "mallory").unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    let err = ResourceBmc::store(&tc.ctx, &tc.mm, "mallory", store_input("alpha", "other", "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
}

#[tokio::test]
async fn test_update_requires_current_etag() {
    let tc = setup().await;
    let v1 = ResourceBmc::store(&tc.ctx, &tc.mm, "alice", store_input("alpha", "notes", "v1"))
        .await
        .expect("store");

    // Correct etag: succeeds, etag rotates
    let mut update = store_input("alpha", "notes", "v2");
    update.etag = Some(v1.etag.clone());
    let v2 = ResourceBmc::store(&tc.ctx, &tc.mm, "alice", update)
        .await
        .expect("update");
    assert_ne!(v2.etag, v1.etag);
    assert_eq!(v2.created_at, v1.created_at);

    // Stale etag: rejected
    let mut stale = store_input("alpha", "notes", "v3");
    stale.etag = Some(v1.etag.clone());
    let err = ResourceBmc::store(&tc.ctx, &tc.mm, "alice", stale)
        .await
        .unwrap_err();
    match err {
        Error::EtagMismatch { current, provided, .. } => {
            assert_eq!(current, v2.etag);
            assert_eq!(provided, v1.etag);
        }
        other => panic!("expected EtagMismatch, got {other:?}"),
    }

    // Missing etag on update is also a mismatch
    let err = ResourceBmc::store(&tc.ctx, &tc.mm, "alice", store_input("alpha", "notes", "v3"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::EtagMismatch { .. }));
}

#[tokio::test]
async fn test_writer_outside_acl_is_rejected() {
    let tc = setup().await;
    let v1 = ResourceBmc::store(&tc.ctx, &tc.mm, "alice", store_input("alpha", "notes", "v1"))
        .await
        .expect("store");

    let mut update = store_input("alpha", "notes", "hijack");
    update.etag = Some(v1.etag);
    let err = ResourceBmc::store(&tc.other_ctx(), &tc.mm, "bob", update)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InsufficientWrite { .. }));
}

#[tokio::test]
async fn test_only_creator_changes_permissions() {
    let tc = setup().await;
    let mut create = store_input("alpha", "notes", "v1");
    create.permissions = Some(Permissions {
        read: vec!["*".to_string()],
        write: vec!["alice".to_string(), "bob".to_string()],
    });
    let v1 = ResourceBmc::store(&tc.ctx, &tc.mm, "alice", create)
        .await
        .expect("store");

    // Bob is a writer but not the creator: his ACL input is ignored
    let mut update = store_input("alpha", "notes", "v2");
    update.etag = Some(v1.etag);
    update.permissions = Some(Permissions {
        read: vec!["bob".to_string()],
        write: vec!["bob".to_string()],
    });
    let v2 = ResourceBmc::store(&tc.other_ctx(), &tc.mm, "bob", update)
        .await
        .expect("update");
    let perms = v2.permissions.clone().expect("permissions");
    assert_eq!(perms.read, vec!["*".to_string()]);
    assert_eq!(perms.write, vec!["alice".to_string(), "bob".to_string()]);
    assert_eq!(v2.creator_agent, "alice", "creator is immutable");

    // The creator can narrow the ACL
    let mut narrow = store_input("alpha", "notes", "v3");
    narrow.etag = Some(v2.etag);
    narrow.permissions = Some(Permissions {
        read: vec!["alice".to_string()],
        write: vec!["alice".to_string()],
    });
    ResourceBmc::store(&tc.ctx, &tc.mm, "alice", narrow)
        .await
        .expect("narrow");

    let err = ResourceBmc::get(&tc.other_ctx(), &tc.mm, "alpha", "notes", "bob").unwrap_err();
    assert!(matches!(err, Error::InsufficientRead { .. }));
}

#[tokio::test]
async fn test_absent_permissions_deny_all() {
    let tc = setup().await;
    ResourceBmc::store(&tc.ctx, &tc.mm, "alice", store_input("alpha", "notes", "x"))
        .await
        .expect("store");

    // Strip the permissions field on disk
    let manifest_path = tc
        .data_root()
        .join("projects/alpha/resources/notes/manifest.json");
    let mut manifest: ResourceManifest =
        serde_json::from_slice(&std::fs::read(&manifest_path).expect("read")).expect("parse");
    manifest.permissions = None;
    std::fs::write(
        &manifest_path,
        serde_json::to_vec_pretty(&manifest).expect("ser"),
    )
    .expect("write");

    let err = ResourceBmc::get(&tc.ctx, &tc.mm, "alpha", "notes", "alice").unwrap_err();
    assert!(matches!(err, Error::NoPermissionsDefined(_)));
}

#[tokio::test]
async fn test_oversized_inline_payload_rejected() {
    let tc = setup().await;
    let big = "x".repeat(50 * 1024 + 1);
    let err = ResourceBmc::store(&tc.ctx, &tc.mm, "alice", store_input("alpha", "big", &big))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PayloadTooLarge { .. }));
}

#[tokio::test]
async fn test_update_without_payload_preserves_managed_fields() {
    let tc = setup().await;
    let v1 = ResourceBmc::store(&tc.ctx, &tc.mm, "alice", store_input("alpha", "notes", "body"))
        .await
        .expect("store");

    let rename = ResourceForStore {
        project_id: "alpha".to_string(),
        resource_id: "notes".to_string(),
        name: Some("renamed".to_string()),
        etag: Some(v1.etag),
        permissions: None,
        mime_type: None,
        payload: None,
    };
    let v2 = ResourceBmc::store(&tc.ctx, &tc.mm, "alice", rename)
        .await
        .expect("update");

    assert_eq!(v2.name, "renamed");
    assert_eq!(v2.size_bytes, Some(4));
    assert_eq!(v2.mime_type.as_deref(), Some("text/plain"));

    let read = ResourceBmc::get(&tc.ctx, &tc.mm, "alpha", "notes", "alice").expect("get");
    assert_eq!(read.content.as_deref(), Some("body"));
}

#[tokio::test]
async fn test_list_returns_only_readable_manifests() {
    let tc = setup().await;
    ResourceBmc::store(&tc.ctx, &tc.mm, "alice", store_input("alpha", "open", "x"))
        .await
        .expect("store");

    let mut private = store_input("alpha", "private", "y");
    private.permissions = Some(Permissions {
        read: vec!["alice".to_string()],
        write: vec!["alice".to_string()],
    });
    ResourceBmc::store(&tc.ctx, &tc.mm, "alice", private)
        .await
        .expect("store");

    let for_bob = ResourceBmc::list(&tc.other_ctx(), &tc.mm, "alpha", "bob", 0, None).expect("list");
    let ids: Vec<_> = for_bob.iter().map(|m| m.resource_id.as_str()).collect();
    assert_eq!(ids, vec!["open"]);

    let for_alice = ResourceBmc::list(&tc.ctx, &tc.mm, "alpha", "alice", 0, None).expect("list");
    assert_eq!(for_alice.len(), 2);
}

#[tokio::test]
async fn test_get_unknown_resource_not_found() {
    let tc = setup().await;
    let err = ResourceBmc::get(&tc.ctx, &tc.mm, "alpha", "ghost", "alice").unwrap_err();
    assert!(matches!(err, Error::ResourceNotFound(_)));
}
