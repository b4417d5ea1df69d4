// Auth - identity provider seam and session resolution

pub mod provider;
pub mod resolver;

pub use provider::{CredentialFlow, IdentityEvent, IdentityProvider, OAuthProvider, ProviderIdentity};
pub use resolver::{SessionResolver, SessionSubscription};
