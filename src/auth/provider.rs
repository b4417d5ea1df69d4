use async_trait::async_trait;
use std::fmt;

use crate::models::{Role, ServiceResult};

/// Verified identity returned by the identity provider after a successful
/// credential exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderIdentity {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub is_anonymous: bool,
}

impl ProviderIdentity {
    /// Identity with just a uid, as minted for anonymous credentials.
    pub fn anonymous(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            display_name: None,
            photo_url: None,
            is_anonymous: true,
        }
    }
}

/// OAuth providers supported by the popup flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Github,
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OAuthProvider::Google => write!(f, "google"),
            OAuthProvider::Github => write!(f, "github"),
        }
    }
}

/// The supported credential-acquisition flows, dispatched through a single
/// [`SessionResolver::authenticate`](super::SessionResolver::authenticate)
/// entry point.
#[derive(Debug, Clone)]
pub enum CredentialFlow {
    /// Mint an ephemeral guest credential.
    Anonymous,
    /// Create a credential and a user record with the requested role.
    PasswordSignUp {
        email: String,
        password: String,
        role: Role,
    },
    /// Authenticate an existing credential; the stored role is untouched.
    PasswordSignIn { email: String, password: String },
    /// First phase of the email-link flow: remember the address and
    /// trigger out-of-band link issuance. Produces no session.
    EmailLinkRequest { email: String },
    /// Second phase: the confirmed address, or `None` to fall back to the
    /// pending marker from the request phase.
    EmailLinkComplete { email: Option<String> },
    /// Provider-mediated popup exchange. OAuth carries no role signal, so
    /// the role is supplied by the caller; `None` preserves whatever role
    /// the user record already has.
    OAuthPopup {
        provider: OAuthProvider,
        role: Option<Role>,
    },
}

/// Identity change pushed from the provider, outside any explicit
/// credential flow (token refresh on startup, remote revocation).
#[derive(Debug, Clone)]
pub enum IdentityEvent {
    SignedIn(ProviderIdentity),
    SignedOut,
}

/// External identity provider. Implementations wrap whatever auth service
/// the application embeds; the resolver only needs these exchanges.
///
/// Every method either resolves with a verified identity or fails with
/// [`ServiceError::CredentialRejected`](crate::models::ServiceError); the
/// resolver never retries a rejection.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_anonymously(&self) -> ServiceResult<ProviderIdentity>;

    async fn sign_up(&self, email: &str, password: &str) -> ServiceResult<ProviderIdentity>;

    async fn sign_in(&self, email: &str, password: &str) -> ServiceResult<ProviderIdentity>;

    /// Trigger out-of-band sign-in-link issuance for this address.
    async fn send_sign_in_link(&self, email: &str) -> ServiceResult<()>;

    /// Validate the link for this address and authenticate.
    async fn complete_link_sign_in(&self, email: &str) -> ServiceResult<ProviderIdentity>;

    async fn sign_in_with_popup(&self, provider: OAuthProvider)
        -> ServiceResult<ProviderIdentity>;

    async fn sign_out(&self) -> ServiceResult<()>;
}
