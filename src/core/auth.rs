//! Authorization layer
//!
//! Identity itself is issued elsewhere (session or token service). This
//! module consumes it through [`AuthProvider`], turns it into an
//! [`AuthContext`] per request, and checks it against per-operation
//! [`AuthPolicy`] values:
//! - Public access
//! - Any authenticated user
//! - Admin access
//! - Admin or the owner of the record

use crate::core::error::{RentalError, RentalResult};
use axum::extract::{FromRequestParts, Request, State};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;

/// Header carrying the authenticated user id, set by the trusted gateway
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying comma-separated roles, set by the trusted gateway
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Authorization context extracted from a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthContext {
    /// Authenticated user
    User { user_id: Uuid, roles: Vec<String> },

    /// Administrator; still a user for ownership purposes
    Admin { admin_id: Uuid },

    /// No authentication (public access)
    Anonymous,
}

impl AuthContext {
    pub fn user(user_id: Uuid) -> Self {
        AuthContext::User {
            user_id,
            roles: Vec::new(),
        }
    }

    pub fn admin(admin_id: Uuid) -> Self {
        AuthContext::Admin { admin_id }
    }

    /// Check if context represents an admin
    pub fn is_admin(&self) -> bool {
        matches!(self, AuthContext::Admin { .. })
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, AuthContext::Anonymous)
    }

    /// Get user_id if available
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            AuthContext::User { user_id, .. } => Some(*user_id),
            AuthContext::Admin { admin_id } => Some(*admin_id),
            AuthContext::Anonymous => None,
        }
    }

    /// The caller's id, or `Unauthorized` for anonymous requests
    pub fn require_user(&self) -> RentalResult<Uuid> {
        self.user_id().ok_or(RentalError::Unauthorized)
    }
}

/// Which records a caller may see in a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    OwnedBy(Uuid),
}

/// Authorization policy for an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
    /// Public access (no auth required)
    Public,

    /// Any authenticated user
    Authenticated,

    /// Admin only
    AdminOnly,

    /// Admins, or the user that owns the record
    AdminOrOwner,
}

impl AuthPolicy {
    /// Check if auth context satisfies this policy for a record owned by `owner`
    pub fn check(&self, context: &AuthContext, owner: Option<Uuid>) -> bool {
        match self {
            AuthPolicy::Public => true,
            AuthPolicy::Authenticated => context.is_authenticated(),
            AuthPolicy::AdminOnly => context.is_admin(),
            AuthPolicy::AdminOrOwner => {
                context.is_admin() || (owner.is_some() && context.user_id() == owner)
            }
        }
    }

    /// Checks that need no record: run before any lookup so that callers
    /// lacking the role learn nothing about which ids exist
    pub fn precheck(&self, context: &AuthContext) -> RentalResult<()> {
        match self {
            AuthPolicy::Public => Ok(()),
            AuthPolicy::Authenticated | AuthPolicy::AdminOrOwner => {
                context.require_user().map(|_| ())
            }
            AuthPolicy::AdminOnly => Self::deny_unless(context, context.is_admin()),
        }
    }

    /// Full check against a concrete record
    pub fn authorize(&self, context: &AuthContext, owner: Option<Uuid>) -> RentalResult<()> {
        Self::deny_unless(context, self.check(context, owner))
    }

    /// Listing scope: everything, or only the caller's own records
    pub fn scope(&self, context: &AuthContext) -> RentalResult<Scope> {
        self.precheck(context)?;
        match (self, context) {
            (AuthPolicy::AdminOrOwner, AuthContext::User { user_id, .. }) => {
                Ok(Scope::OwnedBy(*user_id))
            }
            _ => Ok(Scope::All),
        }
    }

    fn deny_unless(context: &AuthContext, allowed: bool) -> RentalResult<()> {
        match (allowed, context) {
            (true, _) => Ok(()),
            (false, AuthContext::Anonymous) => Err(RentalError::Unauthorized),
            (false, _) => Err(RentalError::Forbidden),
        }
    }
}

/// Trait for auth providers
pub trait AuthProvider: Send + Sync {
    /// Extract auth context from request headers
    ///
    /// Absent credentials yield `Anonymous`; malformed credentials are an error.
    fn extract_context(&self, headers: &HeaderMap) -> RentalResult<AuthContext>;
}

/// Reads identity from `X-User-Id` / `X-User-Role` headers
///
/// Only suitable behind a gateway that strips these headers from client
/// traffic and sets them after authenticating the caller.
#[derive(Debug, Clone, Default)]
pub struct HeaderAuthProvider;

impl AuthProvider for HeaderAuthProvider {
    fn extract_context(&self, headers: &HeaderMap) -> RentalResult<AuthContext> {
        let Some(raw_id) = headers.get(USER_ID_HEADER) else {
            return Ok(AuthContext::Anonymous);
        };

        let user_id = raw_id
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .ok_or(RentalError::Unauthorized)?;

        let roles: Vec<String> = headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| {
                v.split(',')
                    .map(|r| r.trim().to_lowercase())
                    .filter(|r| !r.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        if roles.iter().any(|r| r == "admin") {
            Ok(AuthContext::Admin { admin_id: user_id })
        } else {
            Ok(AuthContext::User { user_id, roles })
        }
    }
}

/// Middleware resolving the caller once per request
///
/// The context is stored as a request extension and picked up by the
/// [`AuthContext`] extractor.
pub async fn authenticate(
    State(provider): State<Arc<dyn AuthProvider>>,
    mut req: Request,
    next: Next,
) -> Response {
    match provider.extract_context(req.headers()) {
        Ok(context) => {
            req.extensions_mut().insert(context);
            next.run(req).await
        }
        Err(err) => {
            tracing::warn!("rejected request with malformed credentials");
            err.into_response()
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .unwrap_or(AuthContext::Anonymous))
    }
}
