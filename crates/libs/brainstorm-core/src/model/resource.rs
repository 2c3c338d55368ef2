//! Versioned shared resources with ACLs and optimistic concurrency.
//!
//! A resource is a manifest plus a payload: either inline content stored at
//! `payload/data`, or a pointer to a file inside the user's home directory
//! stored at `payload/ref`. Every write regenerates the ETag; concurrent
//! writers race on the per-resource lock and the loser's stale ETag fails
//! the update.

use crate::ctx::Ctx;
use crate::error::{Error, Result};
use crate::model::ModelManager;
use crate::model::audit::AuditBmc;
use crate::model::member::MemberBmc;
use crate::model::project::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, ProjectBmc};
use crate::store::atomic;
use crate::store::dir_lock::{DirLock, LOCK_TIMEOUT};
use crate::utils::path_guard;
use crate::utils::validation::{validate_identifier, validate_payload_size};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access control lists for one resource.
///
/// Deny-by-default is modeled structurally: a manifest either carries a
/// `Permissions` object or it carries none, and absent permissions always
/// deny. `"*"` in a list means "any member of the project".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permissions {
    pub read: Vec<String>,
    pub write: Vec<String>,
}

impl Permissions {
    fn allows(list: &[String], agent: &str) -> bool {
        list.iter().any(|entry| entry == "*" || entry == agent)
    }

    pub fn allows_read(&self, agent: &str) -> bool {
        Self::allows(&self.read, agent)
    }

    pub fn allows_write(&self, agent: &str) -> bool {
        Self::allows(&self.write, agent)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceManifest {
    pub resource_id: String,
    pub name: String,
    pub creator_agent: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Opaque 16-hex token, regenerated on every write.
    pub etag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
}

/// Payload input for [`ResourceBmc::store`].
#[derive(Debug, Clone)]
pub enum PayloadForStore {
    /// Inline content, stored verbatim at `payload/data`.
    Inline(String),
    /// Path to a file under the user's home, stored as a pointer at
    /// `payload/ref`.
    FileRef(String),
}

#[derive(Debug, Clone)]
pub struct ResourceForStore {
    pub project_id: String,
    pub resource_id: String,
    /// Display name; defaults to the resource id on create and to the
    /// current name on update.
    pub name: Option<String>,
    /// Required on updates; compared against the current manifest.
    pub etag: Option<String>,
    pub permissions: Option<Permissions>,
    pub mime_type: Option<String>,
    pub payload: Option<PayloadForStore>,
}

/// A resource read: the manifest plus the payload content, if any.
#[derive(Debug, Clone)]
pub struct ResourceRead {
    pub manifest: ResourceManifest,
    pub content: Option<String>,
}

fn fresh_etag() -> String {
    hex::encode(rand::random::<[u8; 8]>())
}

pub struct ResourceBmc;

impl ResourceBmc {
    /// Create or update a resource.
    ///
    /// Updates require the caller's ETag to match the manifest on disk and
    /// the actor to be in the write ACL. `creator_agent` is immutable, and
    /// only the creator may change permissions; anyone else's permission
    /// input is silently dropped. Storage-managed fields (`size_bytes`,
    /// `mime_type`, `source_path`) survive updates that omit a payload.
    pub async fn store(
        ctx: &Ctx,
        mm: &ModelManager,
        actor: &str,
        resource_s: ResourceForStore,
    ) -> Result<ResourceManifest> {
        validate_identifier("project_id", &resource_s.project_id)?;
        validate_identifier("resource_id", &resource_s.resource_id)?;
        validate_identifier("agent_name", actor)?;
        Self::require_member(ctx, mm, &resource_s.project_id, actor)?;

        let project_id = &resource_s.project_id;
        let resource_id = &resource_s.resource_id;
        let resource_dir = mm.root().resource_dir(project_id, resource_id);
        std::fs::create_dir_all(&resource_dir)?;

        let lock = DirLock::for_dir(&resource_dir);
        let _guard = lock.acquire(Some(actor.to_string()), LOCK_TIMEOUT).await?;

        let manifest_path = mm.root().resource_manifest(project_id, resource_id);
        let current = atomic::read_json_opt::<ResourceManifest>(&manifest_path)?;

        let now = Utc::now();
        let mut manifest = match current {
            Some(current) => {
                let provided = resource_s.etag.clone().unwrap_or_default();
                if provided != current.etag {
                    return Err(Error::EtagMismatch {
                        resource: resource_id.clone(),
                        current: current.etag,
                        provided,
                    });
                }

                let permissions = current
                    .permissions
                    .as_ref()
                    .ok_or_else(|| Error::NoPermissionsDefined(resource_id.clone()))?;
                if !permissions.allows_write(actor) {
                    return Err(Error::InsufficientWrite {
                        agent: actor.to_string(),
                        resource: resource_id.clone(),
                    });
                }

                // Only the creator may change the ACL; everyone else's
                // permissions input is silently ignored.
                let permissions = if actor == current.creator_agent {
                    resource_s.permissions.clone().or(current.permissions)
                } else {
                    current.permissions
                };

                ResourceManifest {
                    resource_id: resource_id.clone(),
                    name: resource_s.name.clone().unwrap_or(current.name),
                    creator_agent: current.creator_agent,
                    created_at: current.created_at,
                    updated_at: now,
                    etag: fresh_etag(),
                    permissions,
                    mime_type: resource_s.mime_type.clone().or(current.mime_type),
                    size_bytes: current.size_bytes,
                    source_path: current.source_path,
                }
            }
            None => ResourceManifest {
                resource_id: resource_id.clone(),
                name: resource_s.name.clone().unwrap_or_else(|| resource_id.clone()),
                creator_agent: actor.to_string(),
                created_at: now,
                updated_at: now,
                etag: fresh_etag(),
                // A brand-new resource with no caller ACL gets readable-by-
                // members, writable-by-creator; deny-by-default still governs
                // manifests found on disk without permissions.
                permissions: resource_s.permissions.clone().or_else(|| {
                    Some(Permissions {
                        read: vec!["*".to_string()],
                        write: vec![actor.to_string()],
                    })
                }),
                mime_type: resource_s.mime_type.clone(),
                size_bytes: None,
                source_path: None,
            },
        };

        match &resource_s.payload {
            Some(PayloadForStore::Inline(content)) => {
                validate_payload_size(content.len(), mm.config().limits.max_inline_bytes)?;
                atomic::write_bytes_atomic(
                    &mm.root().resource_payload_data(project_id, resource_id),
                    content.as_bytes(),
                )?;
                let _ = std::fs::remove_file(mm.root().resource_payload_ref(project_id, resource_id));
                manifest.size_bytes = Some(content.len() as u64);
                manifest.source_path = None;
            }
            Some(PayloadForStore::FileRef(raw_path)) => {
                let source =
                    path_guard::resolve_source_path(raw_path, mm.config().limits.max_payload_bytes)?;
                atomic::write_bytes_atomic(
                    &mm.root().resource_payload_ref(project_id, resource_id),
                    source.path.to_string_lossy().as_bytes(),
                )?;
                let _ =
                    std::fs::remove_file(mm.root().resource_payload_data(project_id, resource_id));
                manifest.size_bytes = Some(source.size_bytes);
                manifest.source_path = Some(source.path.to_string_lossy().to_string());
            }
            None => {}
        }

        atomic::write_json_atomic(&manifest_path, &manifest)?;
        drop(_guard);

        AuditBmc::record(
            mm,
            "store_resource",
            actor,
            Some(project_id.as_str()),
            Some(resource_id.as_str()),
            "ok",
        );
        Ok(manifest)
    }

    /// Read a resource: ACL check, then manifest plus payload content.
    ///
    /// File-referenced payloads are re-read from the referenced file, with
    /// the home-containment and size guards re-applied at read time.
    pub fn get(
        ctx: &Ctx,
        mm: &ModelManager,
        project_id: &str,
        resource_id: &str,
        actor: &str,
    ) -> Result<ResourceRead> {
        validate_identifier("project_id", project_id)?;
        validate_identifier("resource_id", resource_id)?;
        validate_identifier("agent_name", actor)?;
        Self::require_member(ctx, mm, project_id, actor)?;

        let manifest: ResourceManifest =
            atomic::read_json_opt(&mm.root().resource_manifest(project_id, resource_id))?
                .ok_or_else(|| Error::ResourceNotFound(resource_id.to_string()))?;

        let permissions = manifest
            .permissions
            .as_ref()
            .ok_or_else(|| Error::NoPermissionsDefined(resource_id.to_string()))?;
        if !permissions.allows_read(actor) {
            return Err(Error::InsufficientRead {
                agent: actor.to_string(),
                resource: resource_id.to_string(),
            });
        }

        let data_path = mm.root().resource_payload_data(project_id, resource_id);
        let ref_path = mm.root().resource_payload_ref(project_id, resource_id);
        let content = if data_path.exists() {
            Some(std::fs::read_to_string(&data_path)?)
        } else if ref_path.exists() {
            let pointer = std::fs::read_to_string(&ref_path)?;
            let source = path_guard::resolve_source_path(
                pointer.trim(),
                mm.config().limits.max_payload_bytes,
            )?;
            Some(std::fs::read_to_string(&source.path)?)
        } else {
            None
        };

        Ok(ResourceRead { manifest, content })
    }

    /// True once the resource manifest exists; used by long-poll waiters.
    pub fn exists(mm: &ModelManager, project_id: &str, resource_id: &str) -> Result<bool> {
        validate_identifier("project_id", project_id)?;
        validate_identifier("resource_id", resource_id)?;
        Ok(mm.root().resource_manifest(project_id, resource_id).exists())
    }

    /// List manifests the actor may read. Payloads are not loaded.
    pub fn list(
        ctx: &Ctx,
        mm: &ModelManager,
        project_id: &str,
        actor: &str,
        offset: usize,
        limit: Option<usize>,
    ) -> Result<Vec<ResourceManifest>> {
        validate_identifier("project_id", project_id)?;
        validate_identifier("agent_name", actor)?;
        Self::require_member(ctx, mm, project_id, actor)?;

        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
        let mut manifests = Vec::new();
        for resource_id in atomic::list_subdirs(&mm.root().resources_dir(project_id))? {
            let Some(manifest) = atomic::read_json_opt::<ResourceManifest>(
                &mm.root().resource_manifest(project_id, &resource_id),
            )?
            else {
                continue;
            };
            let readable = manifest
                .permissions
                .as_ref()
                .is_some_and(|p| p.allows_read(actor));
            if readable {
                manifests.push(manifest);
            }
        }
        Ok(manifests.into_iter().skip(offset).take(limit).collect())
    }

    fn require_member(ctx: &Ctx, mm: &ModelManager, project_id: &str, actor: &str) -> Result<()> {
        if !ProjectBmc::exists(mm, project_id)? {
            return Err(Error::ProjectNotFound(project_id.to_string()));
        }
        match MemberBmc::get(ctx, mm, project_id, actor) {
            Ok(_) => Ok(()),
            Err(Error::MemberNotFound(_)) => Err(Error::Forbidden(format!(
                "'{actor}' is not a member of project '{project_id}'"
            ))),
            Err(e) => Err(e),
        }
    }
}
