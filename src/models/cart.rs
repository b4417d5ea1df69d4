use rust_decimal::Decimal;

use super::{MenuItem, OrderLine};

/// In-memory shopping cart. Never persisted; converted into an
/// [`OrderDraft`](super::OrderDraft) at checkout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

/// One selected menu item with its quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub item_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

impl Cart {
    /// Create a new empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of a menu item, incrementing the quantity if the item
    /// is already in the cart.
    pub fn add(&mut self, item: &MenuItem) {
        self.add_line(item.id.clone(), item.name.clone(), item.price, 1);
    }

    /// Add `quantity` units of an item, merging with an existing line.
    pub fn add_line(&mut self, item_id: String, name: String, unit_price: Decimal, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|line| line.item_id == item_id) {
            line.quantity += quantity;
        } else {
            self.lines.push(CartLine {
                item_id,
                name,
                unit_price,
                quantity,
            });
        }
    }

    /// Remove an item's line entirely. Returns whether a line was removed.
    pub fn remove(&mut self, item_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.item_id != item_id);
        self.lines.len() != before
    }

    /// Set the quantity of an item's line; a quantity of zero removes the
    /// line. Returns whether the cart contained the item.
    pub fn set_quantity(&mut self, item_id: &str, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(item_id);
        }
        if let Some(line) = self.lines.iter_mut().find(|line| line.item_id == item_id) {
            line.quantity = quantity;
            true
        } else {
            false
        }
    }

    /// Drop all lines.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn get(&self, item_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.item_id == item_id)
    }

    pub fn quantity_of(&self, item_id: &str) -> u32 {
        self.get(item_id).map(|line| line.quantity).unwrap_or(0)
    }

    /// Total number of units across all lines.
    pub fn total_items(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Sum of unit price * quantity over all lines.
    pub fn total_price(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Snapshot the cart as order lines.
    pub fn to_order_lines(&self) -> Vec<OrderLine> {
        self.lines
            .iter()
            .map(|line| OrderLine {
                item_id: line.item_id.clone(),
                name: line.name.clone(),
                quantity: line.quantity,
                price: line.unit_price,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn menu_item(id: &str, name: &str, price: Decimal) -> MenuItem {
        MenuItem {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            price,
            category: None,
            image: None,
            available: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_cart() {
        let cart = Cart::new();
        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.total_price(), dec!(0));
    }

    #[test]
    fn test_add_increments_existing_line() {
        let mut cart = Cart::new();
        let dosa = menu_item("m1", "Dosa", dec!(50));

        cart.add(&dosa);
        cart.add(&dosa);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.quantity_of("m1"), 2);
        assert_eq!(cart.total_price(), dec!(100));
    }

    #[test]
    fn test_totals_across_lines() {
        let mut cart = Cart::new();
        cart.add_line("m1".to_string(), "Dosa".to_string(), dec!(50), 2);
        cart.add_line("m2".to_string(), "Tea".to_string(), dec!(30), 1);

        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.total_price(), dec!(130));
    }

    #[test]
    fn test_set_quantity() {
        let mut cart = Cart::new();
        cart.add_line("m1".to_string(), "Dosa".to_string(), dec!(50), 2);

        assert!(cart.set_quantity("m1", 5));
        assert_eq!(cart.quantity_of("m1"), 5);

        assert!(!cart.set_quantity("missing", 1));
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let mut cart = Cart::new();
        cart.add_line("m1".to_string(), "Dosa".to_string(), dec!(50), 2);

        assert!(cart.set_quantity("m1", 0));
        assert!(cart.is_empty());
        assert_eq!(cart.quantity_of("m1"), 0);
    }

    #[test]
    fn test_remove() {
        let mut cart = Cart::new();
        cart.add_line("m1".to_string(), "Dosa".to_string(), dec!(50), 2);
        cart.add_line("m2".to_string(), "Tea".to_string(), dec!(30), 1);

        assert!(cart.remove("m1"));
        assert!(!cart.remove("m1"));
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add_line("m1".to_string(), "Dosa".to_string(), dec!(50), 2);
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_price(), dec!(0));
    }

    #[test]
    fn test_to_order_lines() {
        let mut cart = Cart::new();
        cart.add_line("m1".to_string(), "Dosa".to_string(), dec!(50), 2);

        let lines = cart.to_order_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].item_id, "m1");
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].price, dec!(50));
    }

    #[test]
    fn test_add_zero_quantity_is_noop() {
        let mut cart = Cart::new();
        cart.add_line("m1".to_string(), "Dosa".to_string(), dec!(50), 0);
        assert!(cart.is_empty());
    }
}
