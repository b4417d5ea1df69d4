use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{info, instrument, warn};

use crate::models::{Role, ServiceError, ServiceResult, Session, User, UserPatch};
use crate::repositories::UserRepository;
use crate::stores::DocumentStore;

use super::provider::{CredentialFlow, IdentityEvent, IdentityProvider, ProviderIdentity};

const GUEST_NAME: &str = "Guest User";

type ListenerCallback = Arc<dyn Fn(Option<&Session>) + Send + Sync>;

struct Listener {
    id: u64,
    callback: ListenerCallback,
}

#[derive(Default)]
struct ResolverState {
    current: Option<Session>,
    pending_email: Option<String>,
    next_listener_id: u64,
    listeners: Vec<Listener>,
}

/// Turns provider identities into [`Session`]s and keeps subscribers
/// informed as the current session changes.
///
/// The resolver owns the only mutable session state in the crate. All
/// credential flows funnel through [`authenticate`](Self::authenticate);
/// identity changes pushed by the provider itself arrive through
/// [`resolve`](Self::resolve).
pub struct SessionResolver {
    provider: Arc<dyn IdentityProvider>,
    users: UserRepository,
    state: Mutex<ResolverState>,
}

impl SessionResolver {
    pub fn new(provider: Arc<dyn IdentityProvider>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            provider,
            users: UserRepository::new(store),
            state: Mutex::new(ResolverState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, ResolverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a credential flow to completion.
    ///
    /// Returns the resolved session, or `None` for flows that do not
    /// produce one ([`CredentialFlow::EmailLinkRequest`]). Credential
    /// failures surface as [`ServiceError::CredentialRejected`]; a store
    /// outage during resolution yields a degraded session instead of an
    /// error wherever the flow does not have to write.
    #[instrument(skip(self, flow))]
    pub async fn authenticate(&self, flow: CredentialFlow) -> ServiceResult<Option<Session>> {
        match flow {
            CredentialFlow::Anonymous => {
                let identity = self.provider.sign_in_anonymously().await?;
                let user = self
                    .users
                    .upsert(
                        &identity.uid,
                        UserPatch {
                            email: Some(String::new()),
                            name: Some(GUEST_NAME.to_string()),
                            role: Some(Role::Customer),
                            is_anonymous: Some(true),
                            ..Default::default()
                        },
                    )
                    .await?;
                info!(uid = %identity.uid, "anonymous session resolved");
                Ok(Some(self.publish_verified(identity, user)))
            }
            CredentialFlow::PasswordSignUp {
                email,
                password,
                role,
            } => {
                let identity = self.provider.sign_up(&email, &password).await?;
                let user = self
                    .users
                    .upsert(
                        &identity.uid,
                        UserPatch {
                            email: Some(email),
                            role: Some(role),
                            is_anonymous: Some(false),
                            ..Default::default()
                        },
                    )
                    .await?;
                info!(uid = %identity.uid, %role, "account created");
                Ok(Some(self.publish_verified(identity, user)))
            }
            CredentialFlow::PasswordSignIn { email, password } => {
                let identity = self.provider.sign_in(&email, &password).await?;
                Ok(Some(self.resolve_identity(identity).await))
            }
            CredentialFlow::EmailLinkRequest { email } => {
                self.provider.send_sign_in_link(&email).await?;
                self.state().pending_email = Some(email);
                Ok(None)
            }
            CredentialFlow::EmailLinkComplete { email } => {
                // The marker is only cleared once the provider accepts the
                // link; a rejected completion can be retried against it.
                let email = match email.or_else(|| self.state().pending_email.clone()) {
                    Some(email) => email,
                    None => {
                        return Err(ServiceError::CredentialRejected {
                            reason: "no email address available for link sign-in".to_string(),
                        })
                    }
                };
                let identity = self.provider.complete_link_sign_in(&email).await?;
                self.state().pending_email = None;
                let user = self
                    .users
                    .upsert(
                        &identity.uid,
                        UserPatch {
                            email: Some(email),
                            is_anonymous: Some(false),
                            ..Default::default()
                        },
                    )
                    .await?;
                Ok(Some(self.publish_verified(identity, user)))
            }
            CredentialFlow::OAuthPopup { provider, role } => {
                let identity = self.provider.sign_in_with_popup(provider).await?;
                // The role is only patched when the caller supplied one;
                // returning users keep whatever role they already have.
                let user = self
                    .users
                    .upsert(
                        &identity.uid,
                        UserPatch {
                            email: identity.email.clone(),
                            name: identity.display_name.clone(),
                            image: identity.photo_url.clone(),
                            role,
                            is_anonymous: Some(false),
                        },
                    )
                    .await?;
                info!(uid = %identity.uid, %provider, "oauth session resolved");
                Ok(Some(self.publish_verified(identity, user)))
            }
        }
    }

    /// Apply an identity change pushed from the provider.
    #[instrument(skip(self, event))]
    pub async fn resolve(&self, event: IdentityEvent) -> Option<Session> {
        match event {
            IdentityEvent::SignedIn(identity) => Some(self.resolve_identity(identity).await),
            IdentityEvent::SignedOut => {
                self.publish(None);
                None
            }
        }
    }

    /// Revoke the provider credential and drop the current session. The
    /// persisted user record stays behind.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> ServiceResult<()> {
        self.provider.sign_out().await?;
        self.publish(None);
        info!("signed out");
        Ok(())
    }

    pub fn current_session(&self) -> Option<Session> {
        self.state().current.clone()
    }

    /// Register a session observer. The callback fires immediately with
    /// the current session, then again on every change until the returned
    /// subscription is dropped.
    pub fn on_session_change<F>(self: &Arc<Self>, callback: F) -> SessionSubscription
    where
        F: Fn(Option<&Session>) + Send + Sync + 'static,
    {
        let callback: ListenerCallback = Arc::new(callback);
        let (id, current) = {
            let mut state = self.state();
            let id = state.next_listener_id;
            state.next_listener_id += 1;
            state.listeners.push(Listener {
                id,
                callback: Arc::clone(&callback),
            });
            (id, state.current.clone())
        };
        // Initial notification happens outside the lock so the callback is
        // free to call back into the resolver.
        callback(current.as_ref());
        SessionSubscription {
            resolver: Arc::downgrade(self),
            id,
        }
    }

    /// Resolve an identity against the user record, degrading rather than
    /// failing when the store is unreachable.
    async fn resolve_identity(&self, identity: ProviderIdentity) -> Session {
        let session = match self.users.get(&identity.uid).await {
            Ok(Some(user)) => verified_session(&identity, &user),
            Ok(None) => {
                // First resolution for this credential: create the record
                // from the identity profile.
                let patch = UserPatch {
                    email: identity.email.clone(),
                    name: identity.display_name.clone(),
                    image: identity.photo_url.clone(),
                    is_anonymous: Some(identity.is_anonymous),
                    ..Default::default()
                };
                match self.users.upsert(&identity.uid, patch).await {
                    Ok(user) => verified_session(&identity, &user),
                    Err(err) => {
                        warn!(uid = %identity.uid, %err, "user record unavailable, session degraded");
                        degraded_session(&identity)
                    }
                }
            }
            Err(err) => {
                warn!(uid = %identity.uid, %err, "user record unavailable, session degraded");
                degraded_session(&identity)
            }
        };
        self.publish(Some(session.clone()));
        session
    }

    fn publish_verified(&self, identity: ProviderIdentity, user: User) -> Session {
        let session = verified_session(&identity, &user);
        self.publish(Some(session.clone()));
        session
    }

    fn publish(&self, session: Option<Session>) {
        // Snapshot the callbacks and release the lock before invoking them:
        // a listener may unsubscribe (or otherwise re-enter the resolver)
        // from inside its callback.
        let (session, callbacks) = {
            let mut state = self.state();
            state.current = session;
            let callbacks: Vec<ListenerCallback> = state
                .listeners
                .iter()
                .map(|listener| Arc::clone(&listener.callback))
                .collect();
            (state.current.clone(), callbacks)
        };
        for callback in callbacks {
            callback(session.as_ref());
        }
    }

    fn unsubscribe(&self, id: u64) {
        self.state().listeners.retain(|l| l.id != id);
    }
}

fn verified_session(identity: &ProviderIdentity, user: &User) -> Session {
    Session {
        id: identity.uid.clone(),
        email: identity
            .email
            .clone()
            .or_else(|| (!user.email.is_empty()).then(|| user.email.clone())),
        display_name: identity
            .display_name
            .clone()
            .or_else(|| (!user.name.is_empty()).then(|| user.name.clone())),
        photo_url: identity
            .photo_url
            .clone()
            .or_else(|| (!user.image.is_empty()).then(|| user.image.clone())),
        is_anonymous: identity.is_anonymous || user.is_anonymous,
        role: user.role,
        degraded: false,
    }
}

fn degraded_session(identity: &ProviderIdentity) -> Session {
    Session {
        id: identity.uid.clone(),
        email: identity.email.clone(),
        display_name: identity.display_name.clone(),
        photo_url: identity.photo_url.clone(),
        is_anonymous: identity.is_anonymous,
        role: Role::Customer,
        degraded: true,
    }
}

/// Handle for a registered session observer; dropping it unregisters the
/// callback.
pub struct SessionSubscription {
    resolver: Weak<SessionResolver>,
    id: u64,
}

impl SessionSubscription {
    /// Unregister the callback now rather than at end of scope.
    pub fn unsubscribe(self) {}
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        if let Some(resolver) = self.resolver.upgrade() {
            resolver.unsubscribe(self.id);
        }
    }
}
