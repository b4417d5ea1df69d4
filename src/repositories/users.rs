use std::sync::Arc;

use tracing::{info, instrument};

use crate::models::{ServiceResult, User, UserPatch};
use crate::stores::{Collection, DocumentStore};

use super::{from_document, to_document};

/// Access to persisted user records.
///
/// Records are keyed by the provider uid and never deleted; the only
/// mutations are role assignment and profile merges, both expressed as
/// patches through [`upsert`](Self::upsert).
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn DocumentStore>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> ServiceResult<Option<User>> {
        match self.store.get(Collection::Users, id).await? {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    /// Merge a patch into the record with this id, creating the record if
    /// absent. Fields missing from the patch are preserved; the role only
    /// changes when the patch carries one.
    #[instrument(skip(self, patch))]
    pub async fn upsert(&self, id: &str, patch: UserPatch) -> ServiceResult<User> {
        match self.store.get(Collection::Users, id).await? {
            Some(doc) => {
                let mut user: User = from_document(doc)?;
                user.apply(&patch);
                if !patch.is_empty() {
                    let patch_doc = to_document(&patch)?;
                    self.store
                        .update(Collection::Users, id, patch_doc)
                        .await?;
                }
                Ok(user)
            }
            None => {
                let mut user = User::new(id.to_string());
                user.apply(&patch);
                let doc = to_document(&user)?;
                self.store
                    .put(Collection::Users, Some(id.to_string()), doc)
                    .await?;
                info!("created user record");
                Ok(user)
            }
        }
    }
}
