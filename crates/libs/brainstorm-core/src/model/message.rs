//! Direct and broadcast messaging over per-agent inbox directories.
//!
//! Delivery writes one JSON file per recipient inbox; filenames start with
//! a UTC timestamp so a lexicographic sort is arrival order. Reading an
//! inbox is read-once: each returned message is moved into `archive/`
//! under the inbox lock.

use crate::ctx::Ctx;
use crate::error::{Error, Result};
use crate::model::ModelManager;
use crate::model::audit::AuditBmc;
use crate::model::member::{Member, MemberBmc, Role};
use crate::store::atomic;
use crate::store::dir_lock::{DirLock, LOCK_TIMEOUT};
use crate::utils::validation::{validate_identifier, validate_json_depth, validate_payload_size};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message type sent by a contributor asking to take work over.
pub const TYPE_HANDOFF: &str = "handoff";
/// Coordinator-only responses to a handoff request.
pub const TYPE_HANDOFF_ACCEPTED: &str = "handoff_accepted";
pub const TYPE_HANDOFF_REJECTED: &str = "handoff_rejected";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: Uuid,
    pub project_id: String,
    pub from_agent: String,
    /// Recipient for direct messages; absent on broadcasts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_agent: Option<String>,
    pub broadcast: bool,
    pub reply_expected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MessageForSend {
    pub project_id: String,
    pub from_agent: String,
    /// `None` broadcasts to every member except the sender.
    pub to_agent: Option<String>,
    pub reply_expected: bool,
    pub message_type: Option<String>,
    pub payload: serde_json::Value,
}

/// Delivery report returned by [`MessageBmc::send`].
#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub message_id: Uuid,
    pub recipients: Vec<String>,
    pub broadcast: bool,
}

pub struct MessageBmc;

impl MessageBmc {
    /// Deliver a message to one inbox or fan out a broadcast.
    ///
    /// Broadcast fan-out is not atomic across recipients: each file is
    /// written independently and is individually atomic.
    pub async fn send(ctx: &Ctx, mm: &ModelManager, msg: MessageForSend) -> Result<SendReceipt> {
        validate_identifier("project_id", &msg.project_id)?;
        validate_identifier("agent_name", &msg.from_agent)?;
        if let Some(to) = msg.to_agent.as_deref() {
            validate_identifier("agent_name", to)?;
        }

        let sender = Self::require_member(ctx, mm, &msg.project_id, &msg.from_agent)?;
        Self::check_payload(mm, &msg.payload)?;
        Self::check_handoff_authority(&sender, msg.message_type.as_deref())?;

        let recipients: Vec<String> = match msg.to_agent.as_deref() {
            Some(to) => {
                MemberBmc::get(ctx, mm, &msg.project_id, to)?;
                vec![to.to_string()]
            }
            None => MemberBmc::list(ctx, mm, &msg.project_id)?
                .into_iter()
                .map(|m| m.agent_name)
                .filter(|name| name != &msg.from_agent)
                .collect(),
        };

        let broadcast = msg.to_agent.is_none();
        let timestamp = Utc::now();
        let message = Message {
            message_id: Uuid::new_v4(),
            project_id: msg.project_id.clone(),
            from_agent: msg.from_agent.clone(),
            to_agent: msg.to_agent.clone(),
            broadcast,
            reply_expected: msg.reply_expected,
            message_type: msg.message_type.clone(),
            payload: msg.payload,
            timestamp,
        };
        let filename = Self::inbox_filename(&timestamp, &message.message_id);

        for recipient in &recipients {
            let path = mm.root().inbox_dir(&msg.project_id, recipient).join(&filename);
            atomic::write_json_atomic(&path, &message)?;
        }

        AuditBmc::record(
            mm,
            "send_message",
            &msg.from_agent,
            Some(msg.project_id.as_str()),
            msg.to_agent.as_deref().or(Some("(broadcast)")),
            "ok",
        );
        Ok(SendReceipt {
            message_id: message.message_id,
            recipients,
            broadcast,
        })
    }

    /// Read and archive all pending messages, oldest first.
    ///
    /// The inbox lock serializes concurrent readers so a message is
    /// returned exactly once; after a successful read it lives under
    /// `archive/` with its original filename.
    pub async fn receive(
        ctx: &Ctx,
        mm: &ModelManager,
        project_id: &str,
        agent_name: &str,
    ) -> Result<Vec<Message>> {
        validate_identifier("project_id", project_id)?;
        validate_identifier("agent_name", agent_name)?;
        Self::require_member(ctx, mm, project_id, agent_name)?;

        let inbox = mm.root().inbox_dir(project_id, agent_name);
        if !inbox.exists() {
            return Ok(Vec::new());
        }

        let lock = DirLock::for_dir(&inbox);
        let _guard = lock.acquire(Some(agent_name.to_string()), LOCK_TIMEOUT).await?;

        let archive = mm.root().inbox_archive_dir(project_id, agent_name);
        std::fs::create_dir_all(&archive)?;

        let mut messages = Vec::new();
        for name in atomic::list_entries(&inbox)? {
            let path = inbox.join(&name);
            match atomic::read_json_opt::<Message>(&path)? {
                Some(message) => {
                    std::fs::rename(&path, archive.join(&name))?;
                    messages.push(message);
                }
                None => continue,
            }
        }
        drop(_guard);

        if !messages.is_empty() {
            AuditBmc::record(
                mm,
                "receive_messages",
                agent_name,
                Some(project_id),
                None,
                "ok",
            );
        }
        Ok(messages)
    }

    /// Number of unread (non-archived) messages in an inbox.
    pub fn unread_count(mm: &ModelManager, project_id: &str, agent_name: &str) -> Result<usize> {
        validate_identifier("project_id", project_id)?;
        validate_identifier("agent_name", agent_name)?;
        Ok(atomic::list_entries(&mm.root().inbox_dir(project_id, agent_name))?.len())
    }

    /// True once the inbox has at least one pending message.
    pub fn has_pending(mm: &ModelManager, project_id: &str, agent_name: &str) -> Result<bool> {
        Ok(Self::unread_count(mm, project_id, agent_name)? > 0)
    }

    /// `<iso8601-basic>-<uuid>.json`, lexicographically sorted by arrival.
    fn inbox_filename(timestamp: &DateTime<Utc>, message_id: &Uuid) -> String {
        format!(
            "{}-{}.json",
            timestamp.format("%Y%m%dT%H%M%S%.6fZ"),
            message_id
        )
    }

    fn check_payload(mm: &ModelManager, payload: &serde_json::Value) -> Result<()> {
        let limits = &mm.config().limits;
        let serialized = serde_json::to_string(payload)?;
        validate_payload_size(serialized.len(), limits.max_payload_bytes)?;
        // Plain-text payloads are a single string node; the walk is a no-op.
        validate_json_depth(payload, limits.max_json_depth)
    }

    /// Handoff message-type authority: contributors request, the
    /// coordinator answers. Any other role/type pairing is rejected.
    fn check_handoff_authority(sender: &Member, message_type: Option<&str>) -> Result<()> {
        let role_name = || match sender.role {
            Some(Role::Coordinator) => "coordinator".to_string(),
            Some(Role::Contributor) => "contributor".to_string(),
            None => "contributor".to_string(),
        };
        match message_type {
            Some(TYPE_HANDOFF) if sender.is_coordinator() => Err(Error::HandoffAuthority {
                role: role_name(),
                message_type: TYPE_HANDOFF.to_string(),
            }),
            Some(t @ (TYPE_HANDOFF_ACCEPTED | TYPE_HANDOFF_REJECTED))
                if !sender.is_coordinator() =>
            {
                Err(Error::HandoffAuthority {
                    role: role_name(),
                    message_type: t.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    fn require_member(
        ctx: &Ctx,
        mm: &ModelManager,
        project_id: &str,
        agent_name: &str,
    ) -> Result<Member> {
        if !crate::model::project::ProjectBmc::exists(mm, project_id)? {
            return Err(Error::ProjectNotFound(project_id.to_string()));
        }
        match MemberBmc::get(ctx, mm, project_id, agent_name) {
            Ok(member) => Ok(member),
            Err(Error::MemberNotFound(_)) => Err(Error::Forbidden(format!(
                "'{agent_name}' is not a member of project '{project_id}'"
            ))),
            Err(e) => Err(e),
        }
    }
}
