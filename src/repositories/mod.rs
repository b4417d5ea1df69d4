// Repositories - entity invariants and authorization over a DocumentStore

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::models::{Role, ServiceError, ServiceResult, Session, StoreResult, User};
use crate::stores::{object_or_invalid, Collection, Document, DocumentStore};

pub mod menu;
pub mod orders;
pub mod users;

pub use menu::MenuRepository;
pub use orders::OrderRepository;
pub use users::UserRepository;

pub(crate) fn to_document<T: Serialize>(value: &T) -> StoreResult<Document> {
    object_or_invalid(serde_json::to_value(value)?)
}

pub(crate) fn from_document<T: DeserializeOwned>(doc: Document) -> StoreResult<T> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

/// Resolve the role a session may be authorized with.
///
/// A verified session's role was read from the user record at resolution
/// time and is trusted as-is. A degraded session's role is a display-only
/// fallback, so the user record is re-fetched; when that fetch fails too,
/// the caller gets `Unauthorized` rather than a role guess.
pub(crate) async fn verified_role(
    store: &dyn DocumentStore,
    session: &Session,
) -> ServiceResult<Role> {
    if session.is_verified() {
        return Ok(session.role);
    }
    match store.get(Collection::Users, &session.id).await {
        Ok(Some(doc)) => {
            let user: User = from_document(doc)?;
            Ok(user.role)
        }
        Ok(None) => Ok(Role::Customer),
        Err(_) => Err(ServiceError::Unauthorized {
            message: "session role could not be verified".to_string(),
        }),
    }
}

/// Reject non-staff sessions. Degraded sessions are re-verified first.
pub(crate) async fn ensure_staff(
    store: &dyn DocumentStore,
    session: &Session,
) -> ServiceResult<()> {
    let role = verified_role(store, session).await?;
    if role.is_staff() {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized {
            message: format!("requires staff role, session has {}", role),
        })
    }
}
