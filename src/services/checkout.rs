use tracing::{info, instrument};

use crate::models::{Cart, Order, OrderDraft, ServiceError, ServiceResult, Session};
use crate::repositories::OrderRepository;

/// Turns a cart into a persisted order.
///
/// The cart is the single source of truth for the draft: line items and
/// total are both derived from it, so a checkout can never fail the
/// total-consistency check. The cart is cleared only after the order is
/// durably stored; on any failure it is left untouched for retry.
#[derive(Clone)]
pub struct CheckoutService {
    orders: OrderRepository,
}

impl CheckoutService {
    pub fn new(orders: OrderRepository) -> Self {
        Self { orders }
    }

    #[instrument(skip(self, cart, session), fields(session_id = %session.id))]
    pub async fn checkout(&self, cart: &mut Cart, session: &Session) -> ServiceResult<Order> {
        if cart.is_empty() {
            return Err(ServiceError::EmptyCart);
        }

        let draft = OrderDraft {
            user_id: session.id.clone(),
            items: cart.to_order_lines(),
            total_price: cart.total_price(),
        };

        let order = self.orders.create(session, draft).await?;
        cart.clear();

        info!(order_id = %order.id, total = %order.total_price, "checkout complete");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MenuItem, Role};
    use crate::repositories::tests::session;
    use crate::stores::test_support::MockStore;
    use crate::stores::Collection;
    use mockall::predicate::{always, eq};
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::sync::Arc;

    fn menu_item(id: &str, name: &str, price: rust_decimal::Decimal) -> MenuItem {
        MenuItem {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            price,
            category: None,
            image: None,
            available: true,
            created_at: chrono::Utc::now(),
        }
    }

    fn service(store: MockStore) -> CheckoutService {
        CheckoutService::new(OrderRepository::new(Arc::new(store)))
    }

    #[tokio::test]
    async fn test_empty_cart_never_touches_store() {
        let store = MockStore::new();
        let service = service(store);

        let mut cart = Cart::default();
        let result = service
            .checkout(&mut cart, &session("u1", Role::Customer, false))
            .await;
        assert!(matches!(result, Err(ServiceError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_checkout_persists_and_clears_cart() {
        let mut store = MockStore::new();
        store
            .expect_generate_id()
            .returning(|_| "order_1".to_string());
        store
            .expect_put()
            .with(eq(Collection::Orders), eq(Some("order_1".to_string())), always())
            .times(1)
            .returning(|_, _, doc| {
                assert_eq!(doc.get("userId"), Some(&json!("u1")));
                assert_eq!(doc.get("status"), Some(&json!("pending")));
                Ok("order_1".to_string())
            });

        let service = service(store);
        let mut cart = Cart::default();
        cart.add(&menu_item("m1", "Dosa", dec!(50)));
        cart.add(&menu_item("m1", "Dosa", dec!(50)));
        cart.add(&menu_item("m2", "Tea", dec!(30)));

        let order = service
            .checkout(&mut cart, &session("u1", Role::Customer, false))
            .await
            .unwrap();

        assert_eq!(order.total_price, dec!(130));
        assert_eq!(order.user_id, "u1");
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_failed_checkout_leaves_cart_intact() {
        let mut store = MockStore::new();
        store
            .expect_generate_id()
            .returning(|_| "order_1".to_string());
        store.expect_put().returning(|_, _, _| {
            Err(crate::models::StoreError::Unavailable {
                message: "down".to_string(),
            })
        });

        let service = service(store);
        let mut cart = Cart::default();
        cart.add(&menu_item("m1", "Dosa", dec!(50)));

        let result = service
            .checkout(&mut cart, &session("u1", Role::Customer, false))
            .await;
        assert!(matches!(
            result,
            Err(ServiceError::BackendUnavailable { .. })
        ));
        assert!(!cart.is_empty());
        assert_eq!(cart.total_price(), dec!(50));
    }
}
