// Property-based tests for the cart engine and the order status machine

use proptest::prelude::*;
use rust_decimal::Decimal;

use canteen_rs::models::{Cart, OrderDraft, OrderStatus};

#[derive(Debug, Clone)]
enum CartOp {
    Add { item: u8, cents: u32, quantity: u8 },
    Remove { item: u8 },
    SetQuantity { item: u8, quantity: u8 },
    Clear,
}

fn cart_op() -> impl Strategy<Value = CartOp> {
    prop_oneof![
        4 => (0u8..5, 0u32..10_000, 0u8..10).prop_map(|(item, cents, quantity)| CartOp::Add {
            item,
            cents,
            quantity,
        }),
        2 => (0u8..5).prop_map(|item| CartOp::Remove { item }),
        2 => (0u8..5, 0u8..10).prop_map(|(item, quantity)| CartOp::SetQuantity { item, quantity }),
        1 => Just(CartOp::Clear),
    ]
}

fn apply(cart: &mut Cart, op: &CartOp) {
    match op {
        CartOp::Add {
            item,
            cents,
            quantity,
        } => cart.add_line(
            format!("m{}", item),
            format!("Item {}", item),
            Decimal::new(*cents as i64, 2),
            *quantity as u32,
        ),
        CartOp::Remove { item } => {
            cart.remove(&format!("m{}", item));
        }
        CartOp::SetQuantity { item, quantity } => {
            cart.set_quantity(&format!("m{}", item), *quantity as u32);
        }
        CartOp::Clear => cart.clear(),
    }
}

proptest! {
    /// Any sequence of cart operations leaves the cart consistent: no
    /// zero-quantity lines, no duplicate items, and totals that equal the
    /// sums over the lines.
    #[test]
    fn cart_stays_consistent(ops in proptest::collection::vec(cart_op(), 0..50)) {
        let mut cart = Cart::new();
        for op in &ops {
            apply(&mut cart, op);

            for line in cart.lines() {
                prop_assert!(line.quantity > 0);
            }
            let mut ids: Vec<_> = cart.lines().iter().map(|l| &l.item_id).collect();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), cart.lines().len());

            let expected_items: u32 = cart.lines().iter().map(|l| l.quantity).sum();
            prop_assert_eq!(cart.total_items(), expected_items);

            let expected_total: Decimal = cart
                .lines()
                .iter()
                .map(|l| l.unit_price * Decimal::from(l.quantity))
                .sum();
            prop_assert_eq!(cart.total_price(), expected_total);
        }
    }

    /// A draft built from a cart always passes the total-consistency
    /// check: the stated total equals the sum of its lines.
    #[test]
    fn draft_from_cart_has_consistent_total(ops in proptest::collection::vec(cart_op(), 0..50)) {
        let mut cart = Cart::new();
        for op in &ops {
            apply(&mut cart, op);
        }

        let draft = OrderDraft {
            user_id: "u1".to_string(),
            items: cart.to_order_lines(),
            total_price: cart.total_price(),
        };
        prop_assert_eq!(draft.expected_total(), draft.total_price);
    }
}

const STATUSES: [OrderStatus; 6] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Preparing,
    OrderStatus::Ready,
    OrderStatus::Completed,
    OrderStatus::Cancelled,
];

fn status() -> impl Strategy<Value = OrderStatus> {
    (0usize..STATUSES.len()).prop_map(|i| STATUSES[i])
}

proptest! {
    /// Completed is terminal, cancellation is allowed from every other
    /// state, and any non-cancel transition moves exactly one step along
    /// the fulfillment chain.
    #[test]
    fn status_machine_shape(from in status(), to in status()) {
        let allowed = from.can_transition_to(to);

        if from == OrderStatus::Completed {
            prop_assert!(!allowed);
        } else if to == OrderStatus::Cancelled {
            prop_assert!(allowed);
        } else if allowed {
            let chain = [
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                OrderStatus::Preparing,
                OrderStatus::Ready,
                OrderStatus::Completed,
            ];
            let from_pos = chain.iter().position(|s| *s == from);
            let to_pos = chain.iter().position(|s| *s == to);
            match (from_pos, to_pos) {
                (Some(f), Some(t)) => prop_assert_eq!(t, f + 1),
                _ => prop_assert!(false, "allowed transition outside the chain"),
            }
        }
    }
}
