//! Project membership: join/leave lifecycle, heartbeats, and the
//! coordinator role state machine.
//!
//! At most one member per project holds the coordinator role. Every write
//! that can change a role happens under the members-directory lock, and
//! handover re-reads all member records before committing, so no observer
//! can ever see two coordinators.

use crate::ctx::Ctx;
use crate::error::{Error, Result};
use crate::model::ModelManager;
use crate::model::audit::AuditBmc;
use crate::model::identity::{ClientBmc, MembershipEntry};
use crate::store::atomic;
use crate::store::dir_lock::{DirLock, LOCK_TIMEOUT};
use crate::utils::validation::validate_identifier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// The two member roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Coordinator,
    Contributor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub agent_name: String,
    pub agent_id: Uuid,
    /// Absent on records written before session identity existed; such
    /// slots may be reclaimed by the next client that joins with the name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub online: bool,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Member {
    pub fn is_coordinator(&self) -> bool {
        self.role == Some(Role::Coordinator)
    }
}

#[derive(Debug, Clone)]
pub struct MemberForJoin {
    pub project_id: String,
    pub agent_name: String,
    pub capabilities: Vec<String>,
    pub labels: BTreeMap<String, String>,
}

pub struct MemberBmc;

impl MemberBmc {
    pub fn get(_ctx: &Ctx, mm: &ModelManager, project_id: &str, agent_name: &str) -> Result<Member> {
        validate_identifier("project_id", project_id)?;
        validate_identifier("agent_name", agent_name)?;
        atomic::read_json_opt(&mm.root().member_record(project_id, agent_name))?
            .ok_or_else(|| Error::MemberNotFound(agent_name.to_string()))
    }

    pub fn list(_ctx: &Ctx, mm: &ModelManager, project_id: &str) -> Result<Vec<Member>> {
        validate_identifier("project_id", project_id)?;
        let dir = mm.root().members_dir(project_id);
        let mut members = Vec::new();
        for name in atomic::list_entries(&dir)? {
            if let Some(member) = atomic::read_json_opt::<Member>(&dir.join(&name))? {
                members.push(member);
            }
        }
        Ok(members)
    }

    /// Join a project, claiming or reclaiming the `agent_name` slot.
    ///
    /// - An empty slot creates a fresh contributor record.
    /// - A record without `client_id` (legacy) is adopted: `agent_id` and
    ///   `joined_at` are preserved, the client id is backfilled.
    /// - A record owned by the same client is refreshed (`last_seen`,
    ///   `online`, capabilities, labels).
    /// - A record owned by a different client fails with [`Error::Conflict`].
    pub async fn join(ctx: &Ctx, mm: &ModelManager, member_j: MemberForJoin) -> Result<Member> {
        validate_identifier("project_id", &member_j.project_id)?;
        validate_identifier("agent_name", &member_j.agent_name)?;

        let project = crate::model::project::ProjectBmc::get(ctx, mm, &member_j.project_id)?;

        let members_dir = mm.root().members_dir(&member_j.project_id);
        let lock = DirLock::for_dir(&members_dir);
        let _guard = lock
            .acquire(Some(member_j.agent_name.clone()), LOCK_TIMEOUT)
            .await?;

        let record_path = mm.root().member_record(&member_j.project_id, &member_j.agent_name);
        let now = Utc::now();
        let member = match atomic::read_json_opt::<Member>(&record_path)? {
            None => Member {
                agent_name: member_j.agent_name.clone(),
                agent_id: Uuid::new_v4(),
                client_id: Some(ctx.client_id().to_string()),
                joined_at: now,
                last_seen: now,
                online: true,
                capabilities: member_j.capabilities,
                labels: member_j.labels,
                role: Some(Role::Contributor),
            },
            Some(existing) => {
                let owner = existing.client_id.clone();
                match owner {
                    // Legacy slot: adopt it, preserving identity fields.
                    None => Member {
                        client_id: Some(ctx.client_id().to_string()),
                        last_seen: now,
                        online: true,
                        capabilities: member_j.capabilities,
                        labels: member_j.labels,
                        ..existing
                    },
                    Some(owner) if owner == ctx.client_id() => Member {
                        last_seen: now,
                        online: true,
                        capabilities: member_j.capabilities,
                        labels: member_j.labels,
                        ..existing
                    },
                    Some(_) => {
                        return Err(Error::Conflict(format!(
                            "agent name '{}' is taken by another client",
                            member_j.agent_name
                        )));
                    }
                }
            }
        };
        atomic::write_json_atomic(&record_path, &member)?;
        drop(_guard);

        ClientBmc::record_membership(
            mm,
            ctx.client_id(),
            MembershipEntry {
                project_id: member_j.project_id.clone(),
                agent_name: member_j.agent_name.clone(),
                project_name: project.name,
            },
        )
        .await?;

        AuditBmc::record(
            mm,
            "join_project",
            &member_j.agent_name,
            Some(member_j.project_id.as_str()),
            None,
            "ok",
        );
        Ok(member)
    }

    /// Refresh `last_seen` / `online`.
    ///
    /// Takes the members-directory lock like every other member-record
    /// mutator, so the read-modify-write cannot interleave with a role
    /// assignment from `handover` or the coordinator backfill.
    pub async fn heartbeat(
        ctx: &Ctx,
        mm: &ModelManager,
        project_id: &str,
        agent_name: &str,
        online: bool,
    ) -> Result<Member> {
        validate_identifier("project_id", project_id)?;
        validate_identifier("agent_name", agent_name)?;

        let members_dir = mm.root().members_dir(project_id);
        let lock = DirLock::for_dir(&members_dir);
        let _guard = lock.acquire(Some(agent_name.to_string()), LOCK_TIMEOUT).await?;

        let mut member = Self::get(ctx, mm, project_id, agent_name)?;
        member.last_seen = Utc::now();
        member.online = online;
        atomic::write_json_atomic(&mm.root().member_record(project_id, agent_name), &member)?;
        Ok(member)
    }

    /// Leave a project.
    ///
    /// A coordinator cannot leave: the role must be handed over first, and
    /// the error lists the remaining members as candidates.
    pub async fn leave(ctx: &Ctx, mm: &ModelManager, project_id: &str, agent_name: &str) -> Result<()> {
        validate_identifier("project_id", project_id)?;
        validate_identifier("agent_name", agent_name)?;

        let members_dir = mm.root().members_dir(project_id);
        let lock = DirLock::for_dir(&members_dir);
        let _guard = lock.acquire(Some(agent_name.to_string()), LOCK_TIMEOUT).await?;

        let member = Self::get(ctx, mm, project_id, agent_name)?;
        if let Some(owner) = member.client_id.as_deref() {
            if owner != ctx.client_id() {
                return Err(Error::Forbidden(format!(
                    "member '{agent_name}' belongs to another client"
                )));
            }
        }
        if member.is_coordinator() {
            let candidates = Self::list(ctx, mm, project_id)?
                .into_iter()
                .map(|m| m.agent_name)
                .filter(|name| name != agent_name)
                .collect();
            return Err(Error::CoordinatorHandoverRequired { candidates });
        }

        std::fs::remove_file(mm.root().member_record(project_id, agent_name))?;
        drop(_guard);

        ClientBmc::remove_membership(mm, ctx.client_id(), project_id, agent_name).await?;
        AuditBmc::record(mm, "leave_project", agent_name, Some(project_id), None, "ok");
        Ok(())
    }

    /// Atomically transfer the coordinator role.
    ///
    /// Under the members-directory lock, every member record is re-read and
    /// any record other than `from_agent` holding the role fails the call.
    /// The source role is cleared before the target role is set, so a crash
    /// between the writes leaves zero coordinators (recoverable through the
    /// creator backfill), never two.
    pub async fn handover(
        ctx: &Ctx,
        mm: &ModelManager,
        project_id: &str,
        from_agent: &str,
        to_agent: &str,
    ) -> Result<Member> {
        validate_identifier("project_id", project_id)?;
        validate_identifier("agent_name", from_agent)?;
        validate_identifier("agent_name", to_agent)?;

        let members_dir = mm.root().members_dir(project_id);
        let lock = DirLock::for_dir(&members_dir);
        let _guard = lock.acquire(Some(from_agent.to_string()), LOCK_TIMEOUT).await?;

        let mut from = Self::get(ctx, mm, project_id, from_agent)?;
        if !from.is_coordinator() {
            return Err(Error::Forbidden(format!(
                "'{from_agent}' is not the current coordinator"
            )));
        }
        if let Some(owner) = from.client_id.as_deref() {
            if owner != ctx.client_id() {
                return Err(Error::Forbidden(format!(
                    "member '{from_agent}' belongs to another client"
                )));
            }
        }
        let mut to = Self::get(ctx, mm, project_id, to_agent)?;

        for member in Self::list(ctx, mm, project_id)? {
            if member.is_coordinator() && member.agent_name != from_agent {
                return Err(Error::Conflict(format!(
                    "coordinator role already held by '{}'",
                    member.agent_name
                )));
            }
        }

        from.role = None;
        atomic::write_json_atomic(&mm.root().member_record(project_id, from_agent), &from)?;

        to.role = Some(Role::Coordinator);
        atomic::write_json_atomic(&mm.root().member_record(project_id, to_agent), &to)?;

        AuditBmc::record(
            mm,
            "handover_coordinator",
            from_agent,
            Some(project_id),
            Some(to_agent),
            "ok",
        );
        Ok(to)
    }
}
