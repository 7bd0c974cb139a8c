use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::models::{NewOutbox, Order, OrderStatus};
use crate::store::OrderingStore;
use crate::EVENT_CHANNEL;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OrderEvent {
    #[serde(rename_all = "camelCase")]
    OrderPlaced {
        order_id: i32,
        customer_id: i32,
        truck_id: i32,
        total_price: BigDecimal,
        item_count: usize,
        scheduled_pickup_time: Option<DateTime<Utc>>,
    },
    #[serde(rename_all = "camelCase")]
    OrderStatusChanged {
        order_id: i32,
        truck_id: i32,
        previous: OrderStatus,
        current: OrderStatus,
    },
}

impl OrderEvent {
    pub fn order_id(&self) -> i32 {
        match self {
            OrderEvent::OrderPlaced { order_id, .. }
            | OrderEvent::OrderStatusChanged { order_id, .. } => *order_id,
        }
    }
}

/// Writes order events into the outbox through the caller's transaction.
pub struct OrderEventPublisher<'a, S: OrderingStore> {
    store: &'a mut S,
}

impl<'a, S: OrderingStore> OrderEventPublisher<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    pub fn order_placed(&mut self, order: &Order, item_count: usize) -> StoreResult<()> {
        self.publish(OrderEvent::OrderPlaced {
            order_id: order.id,
            customer_id: order.user_id,
            truck_id: order.truck_id,
            total_price: order.total_price.clone(),
            item_count,
            scheduled_pickup_time: order.scheduled_pickup_time,
        })
    }

    pub fn order_status_changed(
        &mut self,
        order: &Order,
        previous: OrderStatus,
    ) -> StoreResult<()> {
        self.publish(OrderEvent::OrderStatusChanged {
            order_id: order.id,
            truck_id: order.truck_id,
            previous,
            current: order.order_status,
        })
    }

    fn publish(&mut self, event: OrderEvent) -> StoreResult<()> {
        let value = serde_json::to_vec(&event)?;
        self.store.append_outbox(&NewOutbox {
            topic: EVENT_CHANNEL.to_string(),
            key: event.order_id().to_string(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn status_change_is_keyed_by_order_and_tagged() {
        let mut store = MemoryStore::new();
        let now = Utc::now();
        let order = Order {
            id: 42,
            user_id: 1,
            truck_id: 7,
            order_status: OrderStatus::Ready,
            total_price: BigDecimal::from_str("12.50").unwrap(),
            scheduled_pickup_time: None,
            estimated_earliest_pickup: now,
            created_at: now,
        };

        OrderEventPublisher::new(&mut store)
            .order_status_changed(&order, OrderStatus::Preparing)
            .unwrap();

        let message = &store.outbox()[0];
        assert_eq!(message.topic, EVENT_CHANNEL);
        assert_eq!(message.key, "42");
        let payload: serde_json::Value = serde_json::from_slice(&message.value).unwrap();
        assert_eq!(payload["type"], "orderStatusChanged");
        assert_eq!(payload["previous"], "preparing");
        assert_eq!(payload["current"], "ready");
    }
}
