// Shared helpers for integration tests

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use canteen_rs::auth::{IdentityProvider, OAuthProvider, ProviderIdentity};
use canteen_rs::models::{ServiceError, ServiceResult, StoreError, StoreResult};
use canteen_rs::stores::{Collection, Document, DocumentStore, ListFilter};

/// Unique blob path so tests can run in parallel.
pub fn temp_blob_path() -> PathBuf {
    std::env::temp_dir().join(format!("canteen_it_{}.json", Uuid::new_v4()))
}

/// Deterministic in-memory identity provider.
///
/// Accounts are keyed by email; the uid assigned at sign-up is stable
/// across subsequent sign-ins, which is what the session/user-record
/// pairing relies on.
#[derive(Default)]
pub struct FakeIdentityProvider {
    accounts: Mutex<HashMap<String, Account>>,
    next_uid: AtomicU64,
}

struct Account {
    password: String,
    uid: String,
}

impl FakeIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn mint_uid(&self, kind: &str) -> String {
        let n = self.next_uid.fetch_add(1, Ordering::Relaxed);
        format!("{}_{}", kind, n)
    }

    fn rejected(reason: &str) -> ServiceError {
        ServiceError::CredentialRejected {
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn sign_in_anonymously(&self) -> ServiceResult<ProviderIdentity> {
        Ok(ProviderIdentity::anonymous(self.mint_uid("anon")))
    }

    async fn sign_up(&self, email: &str, password: &str) -> ServiceResult<ProviderIdentity> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(Self::rejected("email already registered"));
        }
        let uid = self.mint_uid("uid");
        accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                uid: uid.clone(),
            },
        );
        Ok(ProviderIdentity {
            uid,
            email: Some(email.to_string()),
            display_name: None,
            photo_url: None,
            is_anonymous: false,
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> ServiceResult<ProviderIdentity> {
        let accounts = self.accounts.lock().unwrap();
        let account = accounts
            .get(email)
            .ok_or_else(|| Self::rejected("unknown email"))?;
        if account.password != password {
            return Err(Self::rejected("wrong password"));
        }
        Ok(ProviderIdentity {
            uid: account.uid.clone(),
            email: Some(email.to_string()),
            display_name: None,
            photo_url: None,
            is_anonymous: false,
        })
    }

    async fn send_sign_in_link(&self, _email: &str) -> ServiceResult<()> {
        Ok(())
    }

    async fn complete_link_sign_in(&self, email: &str) -> ServiceResult<ProviderIdentity> {
        let mut accounts = self.accounts.lock().unwrap();
        let uid = match accounts.get(email) {
            Some(account) => account.uid.clone(),
            None => {
                let uid = self.mint_uid("uid");
                accounts.insert(
                    email.to_string(),
                    Account {
                        password: String::new(),
                        uid: uid.clone(),
                    },
                );
                uid
            }
        };
        Ok(ProviderIdentity {
            uid,
            email: Some(email.to_string()),
            display_name: None,
            photo_url: None,
            is_anonymous: false,
        })
    }

    async fn sign_in_with_popup(
        &self,
        _provider: OAuthProvider,
    ) -> ServiceResult<ProviderIdentity> {
        Ok(ProviderIdentity {
            uid: "oauth_user".to_string(),
            email: Some("oauth@example.com".to_string()),
            display_name: Some("OAuth User".to_string()),
            photo_url: None,
            is_anonymous: false,
        })
    }

    async fn sign_out(&self) -> ServiceResult<()> {
        Ok(())
    }
}

/// A backend that is always down.
pub struct FailingStore;

fn unavailable() -> StoreError {
    StoreError::Unavailable {
        message: "backend offline".to_string(),
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn get(&self, _collection: Collection, _id: &str) -> StoreResult<Option<Document>> {
        Err(unavailable())
    }

    async fn list(
        &self,
        _collection: Collection,
        _filter: Option<ListFilter>,
    ) -> StoreResult<Vec<Document>> {
        Err(unavailable())
    }

    async fn put(
        &self,
        _collection: Collection,
        _id: Option<String>,
        _doc: Document,
    ) -> StoreResult<String> {
        Err(unavailable())
    }

    async fn update(
        &self,
        _collection: Collection,
        _id: &str,
        _patch: Document,
    ) -> StoreResult<()> {
        Err(unavailable())
    }

    async fn delete(&self, _collection: Collection, _id: &str) -> StoreResult<()> {
        Err(unavailable())
    }

    fn generate_id(&self, collection: Collection) -> String {
        format!("{}_offline", collection.id_prefix())
    }
}
