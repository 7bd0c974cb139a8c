//! Owner-driven order lifecycle.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, info};

use crate::error::{OrderingError, OrderingResult};
use crate::events::OrderEventPublisher;
use crate::models::{Order, OrderStatus, UnknownVariant};
use crate::store::OrderingStore;

/// How strictly status writes follow `pending → preparing → ready → completed`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum StatusPolicy {
    /// Any recognized status may be written at any time.
    #[default]
    Permissive,
    /// Only legal transitions are accepted. Re-writing the current status
    /// succeeds without a change.
    Strict,
}

impl StatusPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusPolicy::Permissive => "permissive",
            StatusPolicy::Strict => "strict",
        }
    }

    fn allows(&self, current: OrderStatus, next: OrderStatus) -> bool {
        match self {
            StatusPolicy::Permissive => true,
            StatusPolicy::Strict => current == next || current.can_transition_to(next),
        }
    }
}

impl fmt::Display for StatusPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusPolicy {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "permissive" => Ok(StatusPolicy::Permissive),
            "strict" => Ok(StatusPolicy::Strict),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

pub fn update_status<S: OrderingStore>(
    store: &mut S,
    owner_id: i32,
    order_id: i32,
    new_status: &str,
    policy: StatusPolicy,
) -> OrderingResult<Order> {
    let next = OrderStatus::from_str(new_status).map_err(|_| {
        OrderingError::invalid_input(format!(
            "Invalid order status. Must be one of: {}",
            OrderStatus::ALL.map(|status| status.as_str()).join(", ")
        ))
    })?;

    store.transaction(|store| {
        store.lock_order(order_id)?;
        let (order, truck) = store
            .find_order(order_id)?
            .ok_or_else(|| OrderingError::not_found("Order not found"))?;
        if truck.owner_id != owner_id {
            debug!(order_id, owner_id, "status update by non-owner");
            return Err(OrderingError::forbidden(
                "You can only update orders for your own truck",
            ));
        }

        let previous = order.order_status;
        if !policy.allows(previous, next) {
            return Err(OrderingError::invalid_input(format!(
                "Cannot change order status from {previous} to {next}"
            )));
        }
        if previous == next && policy == StatusPolicy::Strict {
            return Ok(order);
        }

        let order = store.update_order_status(order.id, next)?;
        OrderEventPublisher::new(store).order_status_changed(&order, previous)?;
        info!(order_id, %previous, current = %next, "order status changed");
        Ok(order)
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(OrderStatus::Pending, OrderStatus::Preparing, true)]
    #[case(OrderStatus::Preparing, OrderStatus::Ready, true)]
    #[case(OrderStatus::Ready, OrderStatus::Completed, true)]
    #[case(OrderStatus::Ready, OrderStatus::Cancelled, true)]
    #[case(OrderStatus::Ready, OrderStatus::Ready, true)]
    #[case(OrderStatus::Pending, OrderStatus::Completed, false)]
    #[case(OrderStatus::Completed, OrderStatus::Pending, false)]
    #[case(OrderStatus::Cancelled, OrderStatus::Cancelled, true)]
    #[case(OrderStatus::Completed, OrderStatus::Cancelled, false)]
    fn strict_transitions(
        #[case] current: OrderStatus,
        #[case] next: OrderStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(StatusPolicy::Strict.allows(current, next), allowed);
        assert!(StatusPolicy::Permissive.allows(current, next));
    }

    #[rstest]
    #[case("strict", StatusPolicy::Strict)]
    #[case("Permissive", StatusPolicy::Permissive)]
    fn policy_parses(#[case] value: &str, #[case] expected: StatusPolicy) {
        assert_eq!(value.parse::<StatusPolicy>().unwrap(), expected);
    }
}
