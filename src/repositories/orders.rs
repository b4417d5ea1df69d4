use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{info, instrument};

use crate::models::{
    Order, OrderDraft, OrderStatus, ServiceError, ServiceResult, Session,
};
use crate::stores::{Collection, DocumentStore, ListFilter};

use super::{from_document, to_document, verified_role};

/// Access to order records.
///
/// Visibility is enforced here rather than in callers: non-staff sessions
/// only ever see their own orders, and a degraded session's role is never
/// trusted for the staff check.
#[derive(Clone)]
pub struct OrderRepository {
    store: Arc<dyn DocumentStore>,
}

impl OrderRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Persist a draft as a fresh `pending` order, assigning id and
    /// timestamps. The draft's stated total must match the sum of its
    /// lines exactly.
    #[instrument(skip(self, draft), fields(user_id = %draft.user_id))]
    pub async fn create(&self, session: &Session, draft: OrderDraft) -> ServiceResult<Order> {
        if draft.user_id != session.id {
            // Placing an order for someone else is a staff operation.
            let role = verified_role(self.store.as_ref(), session).await?;
            if !role.is_staff() {
                return Err(ServiceError::Unauthorized {
                    message: "cannot create an order for another user".to_string(),
                });
            }
        }

        if draft.items.is_empty() {
            return Err(ServiceError::Validation {
                message: "order must contain at least one item".to_string(),
            });
        }
        for line in &draft.items {
            if line.quantity == 0 {
                return Err(ServiceError::Validation {
                    message: format!("item {} has zero quantity", line.item_id),
                });
            }
            if line.price.is_sign_negative() && !line.price.is_zero() {
                return Err(ServiceError::Validation {
                    message: format!("item {} has negative price", line.item_id),
                });
            }
        }

        let expected = draft.expected_total();
        if expected != draft.total_price {
            return Err(ServiceError::InvalidOrderTotal {
                expected,
                actual: draft.total_price,
            });
        }

        let now = Utc::now();
        let order = Order {
            id: self.store.generate_id(Collection::Orders),
            user_id: draft.user_id,
            items: draft.items,
            total_price: draft.total_price,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let doc = to_document(&order)?;
        self.store
            .put(Collection::Orders, Some(order.id.clone()), doc)
            .await?;

        info!(order_id = %order.id, "order created");
        Ok(order)
    }

    /// Fetch one order, applying the same visibility rule as `list`:
    /// orders of other users are absent for non-staff sessions.
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    pub async fn get(&self, session: &Session, id: &str) -> ServiceResult<Option<Order>> {
        let doc = match self.store.get(Collection::Orders, id).await? {
            Some(doc) => doc,
            None => return Ok(None),
        };
        let order: Order = from_document(doc)?;

        if order.user_id != session.id && !self.is_staff(session).await {
            return Ok(None);
        }
        Ok(Some(order))
    }

    /// List orders visible to this session: everything for verified staff,
    /// only the session's own orders for everyone else. The scoping happens
    /// here regardless of what the caller asked for.
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    pub async fn list(&self, session: &Session) -> ServiceResult<Vec<Order>> {
        let filter = if self.is_staff(session).await {
            None
        } else {
            Some(ListFilter::field_equals(
                "userId",
                Value::String(session.id.clone()),
            ))
        };

        let docs = self.store.list(Collection::Orders, filter).await?;
        docs.into_iter()
            .map(|doc| Ok(from_document(doc)?))
            .collect()
    }

    /// Advance an order along the status state machine, refreshing
    /// `updatedAt`. Illegal transitions fail without writing.
    #[instrument(skip(self))]
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> ServiceResult<Order> {
        let doc = self
            .store
            .get(Collection::Orders, id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        let mut order: Order = from_document(doc)?;

        if !order.status.can_transition_to(status) {
            return Err(ServiceError::InvalidStatusTransition {
                from: order.status,
                to: status,
            });
        }

        order.status = status;
        order.updated_at = Utc::now();

        #[derive(serde::Serialize)]
        #[serde(rename_all = "camelCase")]
        struct StatusPatch {
            status: OrderStatus,
            updated_at: chrono::DateTime<Utc>,
        }
        let patch = to_document(&StatusPatch {
            status,
            updated_at: order.updated_at,
        })?;
        self.store.update(Collection::Orders, id, patch).await?;

        info!(order_id = %id, status = %status, "order status updated");
        Ok(order)
    }

    /// Staff check that degrades to "not staff" instead of failing: list
    /// visibility falls back to own-orders-only when the role cannot be
    /// verified.
    async fn is_staff(&self, session: &Session) -> bool {
        verified_role(self.store.as_ref(), session)
            .await
            .map(|role| role.is_staff())
            .unwrap_or(false)
    }
}
