//! Per-customer cart holding items of a single truck.

use bigdecimal::{BigDecimal, Zero};
use tracing::{debug, info};

use crate::catalog;
use crate::error::{OrderingError, OrderingResult};
use crate::models::{fits_money_column, round_money, CartEntry, CartLine, NewCartEntry};
use crate::store::OrderingStore;

#[derive(Clone, Debug, PartialEq)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub total: BigDecimal,
}

/// Outcome of [`add_item`]: whether an existing entry absorbed the quantity.
#[derive(Clone, Debug, PartialEq)]
pub enum CartAddition {
    Inserted(CartEntry),
    Merged(CartEntry),
}

impl CartAddition {
    pub fn entry(&self) -> &CartEntry {
        match self {
            CartAddition::Inserted(entry) | CartAddition::Merged(entry) => entry,
        }
    }

    pub fn into_entry(self) -> CartEntry {
        match self {
            CartAddition::Inserted(entry) | CartAddition::Merged(entry) => entry,
        }
    }
}

/// Σ(price × quantity), rounded to cents.
pub fn cart_total<'a>(entries: impl IntoIterator<Item = &'a CartEntry>) -> BigDecimal {
    let sum = entries
        .into_iter()
        .fold(BigDecimal::zero(), |sum, entry| {
            sum + &entry.price * BigDecimal::from(entry.quantity)
        });
    round_money(&sum)
}

pub fn add_item<S: OrderingStore>(
    store: &mut S,
    customer_id: i32,
    item_id: i32,
    quantity: i32,
) -> OrderingResult<CartAddition> {
    validate_quantity(quantity)?;

    store.transaction(|store| {
        store.lock_cart(customer_id)?;

        let (item, truck) = catalog::find_menu_item(store, item_id)?;
        if !item.status.is_available() {
            return Err(OrderingError::unavailable("Menu item is not available"));
        }
        if !truck.order_status.is_available() {
            return Err(OrderingError::unavailable(
                "This truck is not accepting orders at the moment",
            ));
        }

        if let Some(cart_truck_id) = store.cart_truck_id(customer_id)? {
            if cart_truck_id != truck.id {
                debug!(customer_id, cart_truck_id, truck_id = truck.id, "cart holds another truck");
                return Err(OrderingError::conflict(
                    "Cannot order from multiple trucks. Please clear your cart or complete your current order first.",
                ));
            }
        }

        let addition = match store.find_cart_entry_for_item(customer_id, item.id)? {
            Some(existing) => {
                let quantity = existing
                    .quantity
                    .checked_add(quantity)
                    .ok_or_else(|| OrderingError::invalid_input("Quantity is too large"))?;
                check_line_total(&item.price, quantity)?;
                CartAddition::Merged(store.update_cart_entry(
                    existing.id,
                    quantity,
                    Some(&item.price),
                )?)
            }
            None => {
                check_line_total(&item.price, quantity)?;
                CartAddition::Inserted(store.insert_cart_entry(&NewCartEntry {
                    user_id: customer_id,
                    item_id: item.id,
                    quantity,
                    price: item.price.clone(),
                })?)
            }
        };
        info!(
            customer_id,
            item_id,
            quantity = addition.entry().quantity,
            "cart entry saved"
        );
        Ok(addition)
    })
}

/// Overwrites the quantity; the price snapshot is kept.
pub fn update_quantity<S: OrderingStore>(
    store: &mut S,
    customer_id: i32,
    entry_id: i32,
    quantity: i32,
) -> OrderingResult<CartEntry> {
    validate_quantity(quantity)?;
    let entry = own_entry(store, customer_id, entry_id, "update")?;
    check_line_total(&entry.price, quantity)?;
    let entry = store.update_cart_entry(entry.id, quantity, None)?;
    info!(customer_id, entry_id, quantity, "cart entry quantity changed");
    Ok(entry)
}

pub fn remove_item<S: OrderingStore>(
    store: &mut S,
    customer_id: i32,
    entry_id: i32,
) -> OrderingResult<()> {
    let entry = own_entry(store, customer_id, entry_id, "remove")?;
    store.delete_cart_entry(entry.id)?;
    info!(customer_id, entry_id, "cart entry removed");
    Ok(())
}

pub fn view_cart<S: OrderingStore>(store: &mut S, customer_id: i32) -> OrderingResult<CartView> {
    let lines = store.cart_lines(customer_id)?;
    let total = cart_total(lines.iter().map(|line| &line.entry));
    Ok(CartView { lines, total })
}

fn validate_quantity(quantity: i32) -> OrderingResult<()> {
    if quantity <= 0 {
        return Err(OrderingError::invalid_input(
            "Quantity must be a positive integer",
        ));
    }
    Ok(())
}

/// Keeps price × quantity within what an order total can hold.
fn check_line_total(price: &BigDecimal, quantity: i32) -> OrderingResult<()> {
    if !fits_money_column(&(price * BigDecimal::from(quantity))) {
        return Err(OrderingError::invalid_input("Quantity is too large"));
    }
    Ok(())
}

fn own_entry<S: OrderingStore>(
    store: &mut S,
    customer_id: i32,
    entry_id: i32,
    action: &str,
) -> OrderingResult<CartEntry> {
    let entry = store
        .find_cart_entry(entry_id)?
        .ok_or_else(|| OrderingError::not_found("Cart item not found"))?;
    if entry.user_id != customer_id {
        return Err(OrderingError::forbidden(format!(
            "You can only {action} your own cart items"
        )));
    }
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::{fixture, rstest};

    use super::*;
    use crate::catalog::{add_menu_item, create_truck, update_menu_item, MenuItemDraft, TruckDraft};
    use crate::models::{Availability, MenuItem, MenuItemChanges, TruckChanges, UserRole};
    use crate::store::MemoryStore;

    struct Market {
        store: MemoryStore,
        customer_id: i32,
        owner_id: i32,
        tea: MenuItem,
        wrap: MenuItem,
        tacos: MenuItem,
    }

    fn item(store: &mut MemoryStore, owner_id: i32, name: &str, price: &str) -> MenuItem {
        add_menu_item(
            store,
            owner_id,
            MenuItemDraft {
                name: name.to_string(),
                description: None,
                price: BigDecimal::from_str(price).unwrap(),
                category: "menu".to_string(),
                status: None,
            },
        )
        .unwrap()
    }

    fn truck(store: &mut MemoryStore, owner_id: i32, name: &str) {
        create_truck(
            store,
            owner_id,
            TruckDraft {
                name: name.to_string(),
                ..TruckDraft::default()
            },
        )
        .unwrap();
    }

    #[fixture]
    fn market() -> Market {
        let mut store = MemoryStore::new();
        let customer = store.add_user("Mona", UserRole::Customer);
        let owner = store.add_user("Lina", UserRole::TruckOwner);
        let rival = store.add_user("Hany", UserRole::TruckOwner);
        truck(&mut store, owner.id, "Falafel Express");
        truck(&mut store, rival.id, "Taco Loco");
        let tea = item(&mut store, owner.id, "Tea", "1.50");
        let wrap = item(&mut store, owner.id, "Wrap", "6.00");
        let tacos = item(&mut store, rival.id, "Tacos", "8.00");
        Market {
            store,
            customer_id: customer.id,
            owner_id: owner.id,
            tea,
            wrap,
            tacos,
        }
    }

    #[rstest]
    fn adding_twice_sums_quantities(mut market: Market) {
        let first = add_item(&mut market.store, market.customer_id, market.tea.id, 2).unwrap();
        assert!(matches!(first, CartAddition::Inserted(_)));

        let second = add_item(&mut market.store, market.customer_id, market.tea.id, 3).unwrap();
        assert!(matches!(second, CartAddition::Merged(_)));
        assert_eq!(second.entry().quantity, 5);
        assert_eq!(market.store.cart_entries(market.customer_id).len(), 1);
    }

    #[rstest]
    fn items_of_another_truck_conflict(mut market: Market) {
        add_item(&mut market.store, market.customer_id, market.tea.id, 1).unwrap();

        let err = add_item(&mut market.store, market.customer_id, market.tacos.id, 1).unwrap_err();
        assert!(matches!(err, OrderingError::Conflict(_)));
        assert_eq!(market.store.cart_entries(market.customer_id).len(), 1);
    }

    #[rstest]
    #[case(0)]
    #[case(-1)]
    fn non_positive_quantity_is_rejected(mut market: Market, #[case] quantity: i32) {
        let err = add_item(&mut market.store, market.customer_id, market.tea.id, quantity)
            .unwrap_err();
        assert!(matches!(err, OrderingError::InvalidInput(_)));
    }

    #[rstest]
    fn merged_quantity_must_keep_line_total_in_range(mut market: Market) {
        add_item(&mut market.store, market.customer_id, market.wrap.id, 10_000_000).unwrap();

        let err = add_item(&mut market.store, market.customer_id, market.wrap.id, 10_000_000)
            .unwrap_err();
        assert!(matches!(err, OrderingError::InvalidInput(_)));
        assert_eq!(market.store.cart_entries(market.customer_id)[0].quantity, 10_000_000);
    }

    #[rstest]
    fn oversized_line_is_rejected(mut market: Market) {
        let err = add_item(&mut market.store, market.customer_id, market.wrap.id, 20_000_000)
            .unwrap_err();
        assert!(matches!(err, OrderingError::InvalidInput(_)));
        assert!(market.store.cart_entries(market.customer_id).is_empty());

        let entry = add_item(&mut market.store, market.customer_id, market.wrap.id, 1)
            .unwrap()
            .into_entry();
        let err = update_quantity(&mut market.store, market.customer_id, entry.id, 20_000_000)
            .unwrap_err();
        assert!(matches!(err, OrderingError::InvalidInput(_)));
    }

    #[rstest]
    fn missing_item_is_not_found(mut market: Market) {
        let err = add_item(&mut market.store, market.customer_id, 9_999, 1).unwrap_err();
        assert!(matches!(err, OrderingError::NotFound(_)));
    }

    #[rstest]
    fn unavailable_item_is_rejected(mut market: Market) {
        update_menu_item(
            &mut market.store,
            market.owner_id,
            market.tea.id,
            MenuItemChanges {
                status: Some(Availability::Unavailable),
                ..MenuItemChanges::default()
            },
        )
        .unwrap();

        let err = add_item(&mut market.store, market.customer_id, market.tea.id, 1).unwrap_err();
        assert!(matches!(err, OrderingError::Unavailable(_)));
    }

    #[rstest]
    fn closed_truck_is_rejected(mut market: Market) {
        market
            .store
            .update_truck(
                market.tea.truck_id,
                &TruckChanges {
                    order_status: Some(Availability::Unavailable),
                    ..TruckChanges::default()
                },
            )
            .unwrap();

        let err = add_item(&mut market.store, market.customer_id, market.tea.id, 1).unwrap_err();
        assert!(matches!(err, OrderingError::Unavailable(_)));
    }

    #[rstest]
    fn re_adding_refreshes_price_but_quantity_update_keeps_it(mut market: Market) {
        let entry = add_item(&mut market.store, market.customer_id, market.tea.id, 1)
            .unwrap()
            .into_entry();
        update_menu_item(
            &mut market.store,
            market.owner_id,
            market.tea.id,
            MenuItemChanges {
                price: Some(BigDecimal::from_str("2.00").unwrap()),
                ..MenuItemChanges::default()
            },
        )
        .unwrap();

        let updated =
            update_quantity(&mut market.store, market.customer_id, entry.id, 4).unwrap();
        assert_eq!(updated.price, BigDecimal::from_str("1.50").unwrap());

        let merged = add_item(&mut market.store, market.customer_id, market.tea.id, 1)
            .unwrap()
            .into_entry();
        assert_eq!(merged.quantity, 5);
        assert_eq!(merged.price, BigDecimal::from_str("2.00").unwrap());
    }

    #[rstest]
    fn strangers_cannot_touch_entries(mut market: Market) {
        let entry = add_item(&mut market.store, market.customer_id, market.tea.id, 1)
            .unwrap()
            .into_entry();
        let stranger = market.store.add_user("Ziad", UserRole::Customer);

        assert!(matches!(
            update_quantity(&mut market.store, stranger.id, entry.id, 2),
            Err(OrderingError::Forbidden(_))
        ));
        assert!(matches!(
            remove_item(&mut market.store, stranger.id, entry.id),
            Err(OrderingError::Forbidden(_))
        ));
        assert!(matches!(
            remove_item(&mut market.store, market.customer_id, 9_999),
            Err(OrderingError::NotFound(_))
        ));
    }

    #[rstest]
    fn view_lists_entries_with_total(mut market: Market) {
        add_item(&mut market.store, market.customer_id, market.wrap.id, 2).unwrap();
        add_item(&mut market.store, market.customer_id, market.tea.id, 3).unwrap();

        let cart = view_cart(&mut market.store, market.customer_id).unwrap();
        let names: Vec<&str> = cart.lines.iter().map(|line| line.item.name.as_str()).collect();
        assert_eq!(names, ["Wrap", "Tea"]);
        assert_eq!(cart.total, BigDecimal::from_str("16.50").unwrap());
        assert_eq!(cart.lines[0].truck.name, "Falafel Express");
    }

    #[rstest]
    fn removing_last_entry_frees_cart_for_other_truck(mut market: Market) {
        let entry = add_item(&mut market.store, market.customer_id, market.tea.id, 1)
            .unwrap()
            .into_entry();
        remove_item(&mut market.store, market.customer_id, entry.id).unwrap();

        add_item(&mut market.store, market.customer_id, market.tacos.id, 1).unwrap();
        let cart = view_cart(&mut market.store, market.customer_id).unwrap();
        assert_eq!(cart.total, BigDecimal::from_str("8.00").unwrap());
    }
}
