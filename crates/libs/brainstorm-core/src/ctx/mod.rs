//! Request context carrying the caller's session identity.
//!
//! The [`Ctx`] struct identifies the client making a request. The client id
//! is derived deterministically from the environment or the working
//! directory (see [`crate::model::identity`]) and is used for membership
//! reclamation, creator checks, and audit logging.

/// Request context containing the caller's client id.
///
/// `Ctx` is passed to all BMC methods to identify the session making the
/// request. Identity is cooperative: there is no authentication beyond the
/// per-client session key.
///
/// # Examples
///
/// ```
/// use brainstorm_core::ctx::Ctx;
///
/// let ctx = Ctx::new("11111111-2222-3333-4444-555555555555");
/// assert_eq!(ctx.client_id(), "11111111-2222-3333-4444-555555555555");
/// ```
#[derive(Clone, Debug)]
pub struct Ctx {
    client_id: String,
}

impl Ctx {
    /// Creates a new context for a resolved client id.
    pub fn new(client_id: impl Into<String>) -> Self {
        Ctx {
            client_id: client_id.into(),
        }
    }

    /// Returns the client id associated with this context.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}
