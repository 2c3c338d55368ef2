//! Resource tool implementations
//!
//! Handles versioned resource storage, reads, and listing.

use brainstorm_core::{
    ctx::Ctx,
    model::{
        ModelManager,
        resource::{PayloadForStore, Permissions, ResourceBmc, ResourceForStore},
    },
    store::longpoll::{self, WaitOutcome},
};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::errors::ErrorCode;
use super::helpers::{self, json_result, manifest_json, to_mcp};
use super::{GetResourceParams, ListResourcesParams, StoreResourceParams};

/// Create or update a resource.
///
/// `content` and `source_path` are mutually exclusive; exactly one is
/// required on create, either (or neither) on update.
pub async fn store_resource_impl(
    ctx: &Ctx,
    mm: &Arc<ModelManager>,
    params: StoreResourceParams,
) -> Result<CallToolResult, McpError> {
    let payload = match (params.content, params.source_path) {
        (Some(_), Some(_)) => {
            return Err(crate::mcp_err!(
                ErrorCode::InvalidId,
                "content and source_path are mutually exclusive",
                { "suggestion": "Pass inline content OR a home-relative file path, not both" }
            ));
        }
        (Some(content), None) => Some(PayloadForStore::Inline(content)),
        (None, Some(path)) => Some(PayloadForStore::FileRef(path)),
        (None, None) => None,
    };

    let manifest = ResourceBmc::store(
        ctx,
        mm,
        &params.agent_name,
        ResourceForStore {
            project_id: params.project_id,
            resource_id: params.resource_id,
            name: params.name,
            etag: params.etag,
            permissions: params.permissions.map(|p| Permissions {
                read: p.read,
                write: p.write,
            }),
            mime_type: params.mime_type,
            payload,
        },
    )
    .await
    .map_err(|e| to_mcp(mm, e))?;

    json_result(&serde_json::json!({
        "resource": manifest_json(&manifest),
    }))
}

/// ACL-checked read; optionally blocks until the resource exists.
pub async fn get_resource_impl(
    ctx: &Ctx,
    mm: &Arc<ModelManager>,
    cancel: CancellationToken,
    params: GetResourceParams,
) -> Result<CallToolResult, McpError> {
    let timeout_seconds = mm.config().effective_wait_timeout(params.timeout_seconds);

    if params.wait.unwrap_or(false)
        && !ResourceBmc::exists(mm, &params.project_id, &params.resource_id)
            .map_err(|e| to_mcp(mm, e))?
    {
        let project_id = params.project_id.clone();
        let resource_id = params.resource_id.clone();
        let poll_mm = Arc::clone(mm);
        let outcome = longpoll::wait_until(
            std::time::Duration::from_secs(timeout_seconds),
            &cancel,
            move || ResourceBmc::exists(&poll_mm, &project_id, &resource_id),
        )
        .await
        .map_err(|e| to_mcp(mm, e))?;
        if outcome != WaitOutcome::Satisfied {
            return helpers::wait_timeout_result("get_resource", timeout_seconds);
        }
    }

    let read = ResourceBmc::get(
        ctx,
        mm,
        &params.project_id,
        &params.resource_id,
        &params.agent_name,
    )
    .map_err(|e| to_mcp(mm, e))?;

    json_result(&serde_json::json!({
        "resource": manifest_json(&read.manifest),
        "content": read.content,
    }))
}

/// Manifests the caller may read; payloads are never loaded.
pub async fn list_resources_impl(
    ctx: &Ctx,
    mm: &Arc<ModelManager>,
    params: ListResourcesParams,
) -> Result<CallToolResult, McpError> {
    let manifests = ResourceBmc::list(
        ctx,
        mm,
        &params.project_id,
        &params.agent_name,
        params.offset.unwrap_or(0),
        params.limit,
    )
    .map_err(|e| to_mcp(mm, e))?;

    json_result(&serde_json::json!({
        "count": manifests.len(),
        "resources": manifests.iter().map(manifest_json).collect::<Vec<_>>(),
    }))
}
