//! Membership lifecycle tests: join/adopt/conflict, heartbeats, leave, and
//! coordinator handover.

// Tests are allowed to use unwrap()/expect() for clearer failure messages
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use brainstorm_core::Error;
use brainstorm_core::model::member::{Member, MemberBmc, MemberForJoin, Role};
use common::TestContext;

fn join_input(project_id: &str, agent: &str) -> MemberForJoin {
    MemberForJoin {
        project_id: project_id.to_string(),
        agent_name: agent.to_string(),
        capabilities: vec!["rust".to_string()],
        labels: Default::default(),
    }
}

#[tokio::test]
async fn test_join_creates_contributor() {
    let tc = TestContext::new().expect("test context");
    tc.create_project("alpha", "alice").await.expect("create");

    let bob = MemberBmc::join(&tc.other_ctx(), &tc.mm, join_input("alpha", "bob"))
        .await
        .expect("join");
    assert_eq!(bob.role, Some(Role::Contributor));
    assert_eq!(bob.client_id.as_deref(), Some("test-client-0002"));
    assert!(bob.online);
    assert_eq!(bob.capabilities, vec!["rust".to_string()]);
}

#[tokio::test]
async fn test_join_unknown_project_fails() {
    let tc = TestContext::new().expect("test context");
    let err = MemberBmc::join(&tc.ctx, &tc.mm, join_input("ghost", "bob"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ProjectNotFound(_)));
}

#[tokio::test]
async fn test_rejoin_same_client_refreshes() {
    let tc = TestContext::new().expect("test context");
    tc.create_project("alpha", "alice").await.expect("create");

    let first = MemberBmc::join(&tc.ctx, &tc.mm, join_input("alpha", "bob"))
        .await
        .expect("join");
    let second = MemberBmc::join(&tc.ctx, &tc.mm, join_input("alpha", "bob"))
        .await
        .expect("rejoin");

    assert_eq!(first.agent_id, second.agent_id);
    assert_eq!(first.joined_at, second.joined_at);
    assert!(second.last_seen >= first.last_seen);
}

#[tokio::test]
async fn test_join_occupied_slot_conflicts() {
    let tc = TestContext::new().expect("test context");
    tc.create_project("alpha", "alice").await.expect("create");
    MemberBmc::join(&tc.ctx, &tc.mm, join_input("alpha", "bob"))
        .await
        .expect("join");

    let err = MemberBmc::join(&tc.other_ctx(), &tc.mm, join_input("alpha", "bob"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[tokio::test]
async fn test_join_adopts_legacy_record() {
    let tc = TestContext::new().expect("test context");
    tc.create_project("alpha", "alice").await.expect("create");
    MemberBmc::join(&tc.ctx, &tc.mm, join_input("alpha", "bob"))
        .await
        .expect("join");

    // Strip the client binding, simulating a record written before
    // session identity existed
    let record = tc.data_root().join("projects/alpha/members/bob.json");
    let mut bob: Member =
        serde_json::from_slice(&std::fs::read(&record).expect("read")).expect("parse");
    bob.client_id = None;
    let original_agent_id = bob.agent_id;
    let original_joined_at = bob.joined_at;
    std::fs::write(&record, serde_json::to_vec_pretty(&bob).expect("ser")).expect("write");

    let adopted = MemberBmc::join(&tc.other_ctx(), &tc.mm, join_input("alpha", "bob"))
        .await
        .expect("adopt");
    assert_eq!(adopted.agent_id, original_agent_id);
    assert_eq!(adopted.joined_at, original_joined_at);
    assert_eq!(adopted.client_id.as_deref(), Some("test-client-0002"));
}

#[tokio::test]
async fn test_heartbeat_updates_liveness_only() {
    let tc = TestContext::new().expect("test context");
    tc.create_project("alpha", "alice").await.expect("create");

    let before = MemberBmc::get(&tc.ctx, &tc.mm, "alpha", "alice").expect("get");
    let after = MemberBmc::heartbeat(&tc.ctx, &tc.mm, "alpha", "alice", false)
        .await
        .expect("heartbeat");

    assert!(!after.online);
    assert!(after.last_seen >= before.last_seen);
    assert_eq!(after.agent_id, before.agent_id);
    assert_eq!(after.role, before.role);
}

#[tokio::test]
async fn test_coordinator_cannot_leave_without_handover() {
    let tc = TestContext::new().expect("test context");
    tc.create_project("alpha", "alice").await.expect("create");
    tc.join(&tc.other_ctx(), "alpha", "bob").await.expect("join");

    let err = MemberBmc::leave(&tc.ctx, &tc.mm, "alpha", "alice")
        .await
        .unwrap_err();
    match err {
        Error::CoordinatorHandoverRequired { candidates } => {
            assert_eq!(candidates, vec!["bob".to_string()]);
        }
        other => panic!("expected CoordinatorHandoverRequired, got {other:?}"),
    }
}

#[tokio::test]
async fn test_handover_then_leave() {
    let tc = TestContext::new().expect("test context");
    tc.create_project("alpha", "alice").await.expect("create");
    tc.join(&tc.other_ctx(), "alpha", "bob").await.expect("join");

    let bob = MemberBmc::handover(&tc.ctx, &tc.mm, "alpha", "alice", "bob")
        .await
        .expect("handover");
    assert_eq!(bob.role, Some(Role::Coordinator));

    let alice = MemberBmc::get(&tc.ctx, &tc.mm, "alpha", "alice").expect("get");
    assert_eq!(alice.role, None, "source role is cleared");

    let members = MemberBmc::list(&tc.ctx, &tc.mm, "alpha").expect("list");
    assert_eq!(members.iter().filter(|m| m.is_coordinator()).count(), 1);

    // Former coordinator can now leave
    MemberBmc::leave(&tc.ctx, &tc.mm, "alpha", "alice")
        .await
        .expect("leave");
    assert!(MemberBmc::get(&tc.ctx, &tc.mm, "alpha", "alice").is_err());
}

#[tokio::test]
async fn test_handover_requires_current_coordinator() {
    let tc = TestContext::new().expect("test context");
    tc.create_project("alpha", "alice").await.expect("create");
    let bob_ctx = tc.other_ctx();
    tc.join(&bob_ctx, "alpha", "bob").await.expect("join");
    tc.join(&bob_ctx, "alpha", "carol").await.expect("join");

    let err = MemberBmc::handover(&bob_ctx, &tc.mm, "alpha", "bob", "carol")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
}

#[tokio::test]
async fn test_handover_to_unknown_member_fails() {
    let tc = TestContext::new().expect("test context");
    tc.create_project("alpha", "alice").await.expect("create");

    let err = MemberBmc::handover(&tc.ctx, &tc.mm, "alpha", "alice", "ghost")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MemberNotFound(_)));
}

#[tokio::test]
async fn test_leave_other_clients_member_forbidden() {
    let tc = TestContext::new().expect("test context");
    tc.create_project("alpha", "alice").await.expect("create");
    tc.join(&tc.other_ctx(), "alpha", "bob").await.expect("join");

    // test-client-0001 trying to remove bob, who belongs to client 0002
    let err = MemberBmc::leave(&tc.ctx, &tc.mm, "alpha", "bob")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
}
