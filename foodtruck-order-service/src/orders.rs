use crate::catalog;
use crate::error::{OrderingError, OrderingResult};
use crate::identity::Principal;
use crate::models::{Order, OrderLine, Truck, User, UserRole};
use crate::store::OrderingStore;

#[derive(Clone, Debug, PartialEq)]
pub struct OrderDetails {
    pub order: Order,
    pub truck: Truck,
    pub lines: Vec<OrderLine>,
}

pub fn list_customer_orders<S: OrderingStore>(
    store: &mut S,
    customer_id: i32,
) -> OrderingResult<Vec<(Order, Truck)>> {
    Ok(store.list_orders_for_customer(customer_id)?)
}

/// Readable by the customer who placed the order and by the truck's owner.
pub fn order_details<S: OrderingStore>(
    store: &mut S,
    principal: &Principal,
    order_id: i32,
) -> OrderingResult<OrderDetails> {
    let (order, truck) = store
        .find_order(order_id)?
        .ok_or_else(|| OrderingError::not_found("Order not found"))?;

    let allowed = match principal.role {
        UserRole::Customer => order.user_id == principal.user_id,
        UserRole::TruckOwner => truck.owner_id == principal.user_id,
    };
    if !allowed {
        return Err(OrderingError::forbidden("You do not have access to this order"));
    }

    let lines = store.order_lines(order.id)?;
    Ok(OrderDetails {
        order,
        truck,
        lines,
    })
}

pub fn list_truck_orders<S: OrderingStore>(
    store: &mut S,
    owner_id: i32,
) -> OrderingResult<Vec<(Order, User)>> {
    let truck = catalog::find_owned_truck(store, owner_id)?;
    Ok(store.list_orders_for_truck(truck.id)?)
}
