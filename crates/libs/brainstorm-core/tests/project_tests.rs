//! Project lifecycle tests: creation, listing, archiving, deletion, and the
//! coordinator backfill for pre-v0.10 member records.

// Tests are allowed to use unwrap()/expect() for clearer failure messages
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use brainstorm_core::Error;
use brainstorm_core::model::member::{Member, MemberBmc, Role};
use brainstorm_core::model::project::{ProjectBmc, ProjectForCreate};
use common::TestContext;

#[tokio::test]
async fn test_create_project_writes_metadata_and_coordinator() {
    let tc = TestContext::new().expect("test context");

    let project = tc.create_project("alpha", "alice").await.expect("create");
    assert_eq!(project.project_id, "alpha");
    assert_eq!(project.schema_version, "1.0");
    assert!(!project.archived);

    assert!(tc.data_root().join("projects/alpha/metadata.json").exists());

    let alice = MemberBmc::get(&tc.ctx, &tc.mm, "alpha", "alice").expect("member");
    assert_eq!(alice.role, Some(Role::Coordinator));
    assert_eq!(alice.client_id.as_deref(), Some("test-client-0001"));
}

#[tokio::test]
async fn test_create_duplicate_fails_already_exists() {
    let tc = TestContext::new().expect("test context");
    tc.create_project("alpha", "alice").await.expect("create");

    let err = tc.create_project("alpha", "bob").await.unwrap_err();
    assert!(matches!(err, Error::AlreadyExists(id) if id == "alpha"));
}

#[tokio::test]
async fn test_create_rejects_traversal_identifier() {
    let tc = TestContext::new().expect("test context");

    let err = ProjectBmc::create(
        &tc.ctx,
        &tc.mm,
        ProjectForCreate {
            project_id: "../../etc/passwd".to_string(),
            name: "evil".to_string(),
            created_by: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::InvalidId { .. }));

    // Nothing was created outside (or inside) the projects tree
    let entries: Vec<_> = std::fs::read_dir(tc.data_root().join("projects"))
        .expect("read projects dir")
        .collect();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_list_is_lexicographic_and_filters_archived() {
    let tc = TestContext::new().expect("test context");
    tc.create_project("charlie", "alice").await.expect("create");
    tc.create_project("alpha", "alice").await.expect("create");
    tc.create_project("bravo", "alice").await.expect("create");

    ProjectBmc::archive(&tc.ctx, &tc.mm, "bravo", "alice", Some("done".into()))
        .await
        .expect("archive");

    let visible = ProjectBmc::list(&tc.ctx, &tc.mm, 0, 100, false).expect("list");
    let ids: Vec<_> = visible.iter().map(|p| p.project_id.as_str()).collect();
    assert_eq!(ids, vec!["alpha", "charlie"]);

    let all = ProjectBmc::list(&tc.ctx, &tc.mm, 0, 100, true).expect("list all");
    let ids: Vec<_> = all.iter().map(|p| p.project_id.as_str()).collect();
    assert_eq!(ids, vec!["alpha", "bravo", "charlie"]);
}

#[tokio::test]
async fn test_list_pagination_clamps_limit() {
    let tc = TestContext::new().expect("test context");
    for i in 0..5 {
        tc.create_project(&format!("proj-{i}"), "alice")
            .await
            .expect("create");
    }

    let page = ProjectBmc::list(&tc.ctx, &tc.mm, 2, 2, false).expect("list");
    let ids: Vec<_> = page.iter().map(|p| p.project_id.as_str()).collect();
    assert_eq!(ids, vec!["proj-2", "proj-3"]);

    // limit 0 clamps to 1
    let one = ProjectBmc::list(&tc.ctx, &tc.mm, 0, 0, false).expect("list");
    assert_eq!(one.len(), 1);
}

#[tokio::test]
async fn test_archive_requires_creator() {
    let tc = TestContext::new().expect("test context");
    tc.create_project("alpha", "alice").await.expect("create");
    tc.join(&tc.other_ctx(), "alpha", "bob").await.expect("join");

    let err = ProjectBmc::archive(&tc.ctx, &tc.mm, "alpha", "bob", None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    let project = ProjectBmc::archive(&tc.ctx, &tc.mm, "alpha", "alice", Some("wrap-up".into()))
        .await
        .expect("archive");
    assert!(project.archived);
    assert_eq!(project.archived_by.as_deref(), Some("alice"));
    assert_eq!(project.archive_reason.as_deref(), Some("wrap-up"));

    // Archived projects retain their children
    assert!(tc.data_root().join("projects/alpha/members/alice.json").exists());
}

#[tokio::test]
async fn test_delete_requires_creator_and_sweeps_memberships() {
    let tc = TestContext::new().expect("test context");
    tc.create_project("alpha", "alice").await.expect("create");

    let err = ProjectBmc::delete(&tc.ctx, &tc.mm, "alpha", "bob")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    ProjectBmc::delete(&tc.ctx, &tc.mm, "alpha", "alice")
        .await
        .expect("delete");
    assert!(!tc.data_root().join("projects/alpha").exists());

    let memberships = brainstorm_core::model::identity::ClientBmc::memberships(
        &tc.mm,
        "test-client-0001",
    )
    .expect("memberships");
    assert!(memberships.is_empty());

    let err = ProjectBmc::get(&tc.ctx, &tc.mm, "alpha").unwrap_err();
    assert!(matches!(err, Error::ProjectNotFound(_)));
}

#[tokio::test]
async fn test_coordinator_backfill_for_legacy_member() {
    let tc = TestContext::new().expect("test context");
    tc.create_project("legacy", "alice").await.expect("create");

    // Simulate pre-v0.10 data: strip alice's role and client binding
    let record = tc.data_root().join("projects/legacy/members/alice.json");
    let mut alice: Member =
        serde_json::from_slice(&std::fs::read(&record).expect("read")).expect("parse");
    alice.role = None;
    alice.client_id = None;
    std::fs::write(&record, serde_json::to_vec_pretty(&alice).expect("ser")).expect("write");

    ProjectBmc::ensure_coordinator(&tc.ctx, &tc.mm, "legacy")
        .await
        .expect("backfill");

    let alice = MemberBmc::get(&tc.ctx, &tc.mm, "legacy", "alice").expect("member");
    assert_eq!(alice.role, Some(Role::Coordinator));

    // Idempotent: calling again changes nothing
    ProjectBmc::ensure_coordinator(&tc.ctx, &tc.mm, "legacy")
        .await
        .expect("backfill again");
    let members = MemberBmc::list(&tc.ctx, &tc.mm, "legacy").expect("list");
    assert_eq!(members.iter().filter(|m| m.is_coordinator()).count(), 1);
}

#[tokio::test]
async fn test_audit_log_records_mutations() {
    let tc = TestContext::new().expect("test context");
    tc.create_project("alpha", "alice").await.expect("create");
    ProjectBmc::archive(&tc.ctx, &tc.mm, "alpha", "alice", None)
        .await
        .expect("archive");

    let audit_dir = tc.data_root().join("audit");
    let entries: Vec<_> = std::fs::read_dir(&audit_dir).expect("audit dir").collect();
    assert_eq!(entries.len(), 1, "one daily audit file");

    let content =
        std::fs::read_to_string(entries[0].as_ref().expect("entry").path()).expect("read");
    assert!(content.contains("\"op\":\"create_project\""));
    assert!(content.contains("\"op\":\"archive_project\""));
}
