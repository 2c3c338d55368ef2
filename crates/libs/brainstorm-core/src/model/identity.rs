//! Session identity resolution and the per-client membership index.
//!
//! A client id identifies one agent session. It is either supplied through
//! `BRAINSTORM_CLIENT_ID` or derived deterministically from the session's
//! working directory, so the same checkout reclaims the same memberships
//! across restarts without any registration step.

use crate::error::{Error, Result};
use crate::model::ModelManager;
use crate::store::atomic;
use crate::store::dir_lock::{DirLock, LOCK_TIMEOUT};
use crate::utils::validation::validate_client_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Env var carrying an explicit client identity.
pub const CLIENT_ID_ENV: &str = "BRAINSTORM_CLIENT_ID";

/// Resolve the client id for a session.
///
/// - A non-empty env value of 1-256 chars is used verbatim.
/// - An overlong env value is rejected; an empty one falls back.
/// - Otherwise the id is `SHA-256(working_directory)` formatted
///   `aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee` from the first 32 hex chars.
pub fn resolve_client_id(env_value: Option<&str>, working_directory: &str) -> Result<String> {
    if let Some(value) = env_value {
        if !value.is_empty() {
            if value.len() > 256 {
                let head: String = value.chars().take(32).collect();
                return Err(Error::InvalidId {
                    field: "client_id",
                    provided: format!("{head}..."),
                });
            }
            validate_client_id(value)?;
            return Ok(value.to_string());
        }
    }
    Ok(derive_from_directory(working_directory))
}

fn derive_from_directory(working_directory: &str) -> String {
    let digest = Sha256::digest(working_directory.as_bytes());
    let hex = hex::encode(digest);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// Persistent record of a client identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientIdentity {
    pub client_id: String,
    pub first_seen: DateTime<Utc>,
}

/// One project membership held by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipEntry {
    pub project_id: String,
    pub agent_name: String,
    pub project_name: String,
}

pub struct ClientBmc;

impl ClientBmc {
    /// Create the identity record if it does not exist yet.
    pub fn ensure_identity(mm: &ModelManager, client_id: &str) -> Result<()> {
        validate_client_id(client_id)?;
        let path = mm.root().client_identity(client_id);
        if path.exists() {
            return Ok(());
        }
        let identity = ClientIdentity {
            client_id: client_id.to_string(),
            first_seen: Utc::now(),
        };
        match atomic::create_json_exclusive(&path, &identity) {
            Ok(()) => Ok(()),
            // Lost a race with another process doing the same thing.
            Err(Error::AlreadyExists(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Append a membership entry, deduplicating by (project_id, agent_name).
    pub async fn record_membership(
        mm: &ModelManager,
        client_id: &str,
        entry: MembershipEntry,
    ) -> Result<()> {
        Self::ensure_identity(mm, client_id)?;
        let dir = mm.root().client_dir(client_id);
        let lock = DirLock::for_dir(&dir);
        let _guard = lock.acquire(None, LOCK_TIMEOUT).await?;

        let path = mm.root().client_memberships(client_id);
        let mut memberships: Vec<MembershipEntry> = atomic::read_json_opt(&path)?.unwrap_or_default();
        match memberships
            .iter_mut()
            .find(|m| m.project_id == entry.project_id && m.agent_name == entry.agent_name)
        {
            Some(existing) => existing.project_name = entry.project_name,
            None => memberships.push(entry),
        }
        atomic::write_json_atomic(&path, &memberships)
    }

    /// Drop one membership entry. Missing entries are not an error.
    pub async fn remove_membership(
        mm: &ModelManager,
        client_id: &str,
        project_id: &str,
        agent_name: &str,
    ) -> Result<()> {
        let dir = mm.root().client_dir(client_id);
        if !dir.exists() {
            return Ok(());
        }
        let lock = DirLock::for_dir(&dir);
        let _guard = lock.acquire(None, LOCK_TIMEOUT).await?;

        let path = mm.root().client_memberships(client_id);
        let mut memberships: Vec<MembershipEntry> = atomic::read_json_opt(&path)?.unwrap_or_default();
        memberships.retain(|m| !(m.project_id == project_id && m.agent_name == agent_name));
        atomic::write_json_atomic(&path, &memberships)
    }

    /// All memberships recorded for a client.
    pub fn memberships(mm: &ModelManager, client_id: &str) -> Result<Vec<MembershipEntry>> {
        validate_client_id(client_id)?;
        let path = mm.root().client_memberships(client_id);
        Ok(atomic::read_json_opt(&path)?.unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_env_value_used_verbatim() {
        let id = resolve_client_id(Some("my-session-01"), "/work").expect("resolve");
        assert_eq!(id, "my-session-01");
    }

    #[test]
    fn test_empty_env_falls_back_to_directory_hash() {
        let from_empty = resolve_client_id(Some(""), "/work").expect("resolve");
        let from_none = resolve_client_id(None, "/work").expect("resolve");
        assert_eq!(from_empty, from_none);
    }

    #[test]
    fn test_overlong_env_rejected() {
        let long = "x".repeat(257);
        let err = resolve_client_id(Some(&long), "/work").unwrap_err();
        assert!(matches!(err, Error::InvalidId { .. }));
    }

    #[test]
    fn test_directory_hash_is_deterministic_and_shaped() {
        let a = resolve_client_id(None, "/home/user/project").expect("resolve");
        let b = resolve_client_id(None, "/home/user/project").expect("resolve");
        let c = resolve_client_id(None, "/home/user/other").expect("resolve");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let segments: Vec<&str> = a.split('-').collect();
        assert_eq!(
            segments.iter().map(|s| s.len()).collect::<Vec<_>>(),
            vec![8, 4, 4, 4, 12]
        );
    }
}
