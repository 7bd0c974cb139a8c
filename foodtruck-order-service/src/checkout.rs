//! Turns a customer's cart into an order, atomically.
//!
//! The checks and arithmetic live in [`plan_order`], which is pure; the
//! writes happen in [`place_order`] inside one store transaction that holds
//! the customer's cart lock. Either the order, its items, the cleared cart
//! and the outbox event are all persisted, or nothing is.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use tracing::{debug, info};

use crate::cart::cart_total;
use crate::error::{OrderingError, OrderingResult};
use crate::events::OrderEventPublisher;
use crate::models::{fits_money_column, CartLine, NewOrder, NewOrderItem, Order, OrderLine, OrderStatus};
use crate::store::OrderingStore;

pub const PICKUP_LEAD_MINUTES: i64 = 30;

#[derive(Clone, Debug, PartialEq)]
pub struct PlacedOrder {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// Parses RFC 3339, or a naive `YYYY-MM-DDTHH:MM[:SS]` taken as UTC.
pub fn parse_pickup_time(value: &str) -> OrderingResult<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(value) {
        return Ok(time.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .into_iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| OrderingError::invalid_input("Invalid scheduled pickup time"))
}

/// Validates the cart and computes the order row, without touching the store.
pub fn plan_order(
    customer_id: i32,
    lines: &[CartLine],
    scheduled_pickup_time: Option<&str>,
    now: DateTime<Utc>,
) -> OrderingResult<NewOrder> {
    let Some(first) = lines.first() else {
        return Err(OrderingError::EmptyCart);
    };
    if lines.iter().any(|line| !line.item.status.is_available()) {
        return Err(OrderingError::ItemsUnavailable);
    }
    let truck = &first.truck;
    if !truck.order_status.is_available() {
        return Err(OrderingError::TruckNotAccepting);
    }

    let total_price = cart_total(lines.iter().map(|line| &line.entry));
    if !fits_money_column(&total_price) {
        return Err(OrderingError::invalid_input(
            "Order total exceeds the maximum allowed amount",
        ));
    }
    let estimated_earliest_pickup = now + Duration::minutes(PICKUP_LEAD_MINUTES);

    let scheduled_pickup_time = scheduled_pickup_time
        .filter(|value| !value.trim().is_empty())
        .map(parse_pickup_time)
        .transpose()?;
    if let Some(scheduled) = scheduled_pickup_time {
        if scheduled < estimated_earliest_pickup {
            return Err(OrderingError::ScheduleTooSoon);
        }
    }

    Ok(NewOrder {
        user_id: customer_id,
        truck_id: truck.id,
        order_status: OrderStatus::Pending,
        total_price,
        scheduled_pickup_time,
        estimated_earliest_pickup,
        created_at: now,
    })
}

pub fn place_order<S: OrderingStore>(
    store: &mut S,
    customer_id: i32,
    scheduled_pickup_time: Option<&str>,
    now: DateTime<Utc>,
) -> OrderingResult<PlacedOrder> {
    store.transaction(|store| {
        store.lock_cart(customer_id)?;

        let lines = store.cart_lines(customer_id)?;
        let new_order = plan_order(customer_id, &lines, scheduled_pickup_time, now)
            .inspect_err(|err| debug!(customer_id, %err, "order rejected"))?;

        let order = store.insert_order(&new_order)?;
        let items: Vec<NewOrderItem> = lines
            .iter()
            .map(|line| NewOrderItem {
                order_id: order.id,
                item_id: line.entry.item_id,
                quantity: line.entry.quantity,
                price: line.entry.price.clone(),
            })
            .collect();
        let items = store.insert_order_items(&items)?;
        store.clear_cart(customer_id)?;
        OrderEventPublisher::new(store).order_placed(&order, items.len())?;

        info!(
            order_id = order.id,
            customer_id,
            truck_id = order.truck_id,
            total_price = %order.total_price,
            "order placed"
        );

        let lines = items
            .into_iter()
            .zip(lines)
            .map(|(item, line)| OrderLine {
                item,
                menu_item: line.item,
            })
            .collect();
        Ok(PlacedOrder { order, lines })
    })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use chrono::TimeZone;
    use rstest::rstest;

    use super::*;
    use crate::models::{Availability, CartEntry, MenuItem, Truck};

    fn line(entry_id: i32, price: &str, quantity: i32) -> CartLine {
        let now = Utc::now();
        let price = BigDecimal::from_str(price).unwrap();
        CartLine {
            entry: CartEntry {
                id: entry_id,
                user_id: 1,
                item_id: entry_id,
                quantity,
                price: price.clone(),
            },
            item: MenuItem {
                id: entry_id,
                truck_id: 7,
                name: format!("Item {entry_id}"),
                description: None,
                price,
                category: "mains".to_string(),
                status: Availability::Available,
                created_at: now,
            },
            truck: Truck {
                id: 7,
                name: "Falafel Express".to_string(),
                logo: None,
                owner_id: 2,
                truck_status: Availability::Available,
                order_status: Availability::Available,
                created_at: now,
            },
        }
    }

    #[rstest]
    #[case("2026-05-01T12:30:00Z", (12, 30, 0))]
    #[case("2026-05-01T14:30:00+02:00", (12, 30, 0))]
    #[case("2026-05-01T12:30", (12, 30, 0))]
    #[case("2026-05-01T12:30:15", (12, 30, 15))]
    fn accepted_pickup_formats(#[case] value: &str, #[case] (h, m, s): (u32, u32, u32)) {
        let expected = Utc.with_ymd_and_hms(2026, 5, 1, h, m, s).unwrap();
        assert_eq!(parse_pickup_time(value).unwrap(), expected);
    }

    #[rstest]
    #[case("tomorrow")]
    #[case("2026-13-01T12:30")]
    #[case("12:30")]
    fn rejected_pickup_formats(#[case] value: &str) {
        assert!(matches!(
            parse_pickup_time(value),
            Err(OrderingError::InvalidInput(_))
        ));
    }

    #[test]
    fn empty_cart_plans_nothing() {
        assert!(matches!(
            plan_order(1, &[], None, Utc::now()),
            Err(OrderingError::EmptyCart)
        ));
    }

    #[test]
    fn total_beyond_the_column_is_rejected() {
        let lines = [line(1, "60.00", 1_000_000), line(2, "50.00", 1_000_000)];
        assert!(matches!(
            plan_order(1, &lines, None, Utc::now()),
            Err(OrderingError::InvalidInput(_))
        ));
    }

    #[test]
    fn largest_total_is_planned() {
        let lines = [line(1, "99999999.99", 1)];
        let order = plan_order(1, &lines, None, Utc::now()).unwrap();
        assert_eq!(order.total_price, BigDecimal::from_str("99999999.99").unwrap());
        assert_eq!(order.truck_id, 7);
    }
}
