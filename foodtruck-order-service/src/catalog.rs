//! Trucks and menu items: customer-facing reads and owner-side management.

use bigdecimal::{BigDecimal, Zero};
use tracing::{debug, info};

use crate::error::{OrderingError, OrderingResult};
use crate::models::{
    fits_money_column, round_money, Availability, MenuItem, MenuItemChanges, NewMenuItem,
    NewTruck, Truck, TruckChanges,
};
use crate::store::OrderingStore;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TruckDraft {
    pub name: String,
    pub logo: Option<String>,
    pub truck_status: Option<Availability>,
    pub order_status: Option<Availability>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MenuItemDraft {
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub category: String,
    pub status: Option<Availability>,
}

pub fn find_truck<S: OrderingStore>(store: &mut S, truck_id: i32) -> OrderingResult<Truck> {
    store
        .find_truck(truck_id)?
        .ok_or_else(|| OrderingError::not_found("Truck not found"))
}

pub fn list_visible_trucks<S: OrderingStore>(store: &mut S) -> OrderingResult<Vec<Truck>> {
    Ok(store.list_visible_trucks()?)
}

/// The item together with its truck, whose `order_status` decides whether the
/// item can be ordered right now.
pub fn find_menu_item<S: OrderingStore>(
    store: &mut S,
    item_id: i32,
) -> OrderingResult<(MenuItem, Truck)> {
    store
        .find_menu_item(item_id)?
        .ok_or_else(|| OrderingError::not_found("Menu item not found"))
}

pub fn list_menu_items<S: OrderingStore>(
    store: &mut S,
    truck_id: i32,
    category: Option<&str>,
) -> OrderingResult<Vec<MenuItem>> {
    let truck = find_truck(store, truck_id)?;
    Ok(store.list_menu_items(truck.id, category)?)
}

pub fn find_owned_truck<S: OrderingStore>(store: &mut S, owner_id: i32) -> OrderingResult<Truck> {
    store
        .find_truck_by_owner(owner_id)?
        .ok_or_else(|| OrderingError::not_found("No truck found for this owner"))
}

pub fn create_truck<S: OrderingStore>(
    store: &mut S,
    owner_id: i32,
    draft: TruckDraft,
) -> OrderingResult<Truck> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(OrderingError::invalid_input("Truck name is required"));
    }

    store.transaction(|store| {
        if store.find_truck_by_owner(owner_id)?.is_some() {
            return Err(OrderingError::conflict(
                "You already have a truck. Only one truck per owner is allowed.",
            ));
        }
        if store.find_truck_by_name(name)?.is_some() {
            return Err(OrderingError::conflict("Truck name already exists"));
        }

        let truck = store.insert_truck(&NewTruck {
            name: name.to_string(),
            logo: draft.logo,
            owner_id,
            truck_status: draft.truck_status.unwrap_or(Availability::Available),
            order_status: draft.order_status.unwrap_or(Availability::Available),
        })?;
        info!(truck_id = truck.id, owner_id, "truck created");
        Ok(truck)
    })
}

pub fn update_truck<S: OrderingStore>(
    store: &mut S,
    owner_id: i32,
    truck_id: i32,
    mut changes: TruckChanges,
) -> OrderingResult<Truck> {
    if let Some(name) = &changes.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(OrderingError::invalid_input("Truck name is required"));
        }
        changes.name = Some(name.to_string());
    }

    store.transaction(|store| {
        let truck = find_truck(store, truck_id)?;
        if truck.owner_id != owner_id {
            debug!(truck_id, owner_id, "truck update by non-owner");
            return Err(OrderingError::forbidden("You can only update your own truck"));
        }
        if let Some(name) = &changes.name {
            if let Some(other) = store.find_truck_by_name(name)? {
                if other.id != truck.id {
                    return Err(OrderingError::conflict("Truck name already exists"));
                }
            }
        }
        if changes.is_empty() {
            return Err(OrderingError::invalid_input("No fields to update"));
        }

        let truck = store.update_truck(truck.id, &changes)?;
        info!(truck_id, "truck updated");
        Ok(truck)
    })
}

pub fn list_own_menu<S: OrderingStore>(
    store: &mut S,
    owner_id: i32,
) -> OrderingResult<Vec<MenuItem>> {
    let truck = find_owned_truck(store, owner_id)?;
    Ok(store.list_menu_items(truck.id, None)?)
}

pub fn find_own_menu_item<S: OrderingStore>(
    store: &mut S,
    owner_id: i32,
    item_id: i32,
) -> OrderingResult<MenuItem> {
    let (item, truck) = find_menu_item(store, item_id)?;
    if truck.owner_id != owner_id {
        return Err(OrderingError::forbidden(
            "You can only view menu items from your own truck",
        ));
    }
    Ok(item)
}

pub fn add_menu_item<S: OrderingStore>(
    store: &mut S,
    owner_id: i32,
    draft: MenuItemDraft,
) -> OrderingResult<MenuItem> {
    let truck = store
        .find_truck_by_owner(owner_id)?
        .ok_or_else(|| OrderingError::not_found("You must create a truck before adding menu items"))?;

    let name = draft.name.trim();
    let category = draft.category.trim();
    if name.is_empty() || category.is_empty() {
        return Err(OrderingError::invalid_input(
            "Name, price, and category are required",
        ));
    }
    let price = positive_price(&draft.price)?;

    let item = store.insert_menu_item(&NewMenuItem {
        truck_id: truck.id,
        name: name.to_string(),
        description: draft.description,
        price,
        category: category.to_string(),
        status: draft.status.unwrap_or(Availability::Available),
    })?;
    info!(item_id = item.id, truck_id = truck.id, "menu item added");
    Ok(item)
}

pub fn update_menu_item<S: OrderingStore>(
    store: &mut S,
    owner_id: i32,
    item_id: i32,
    mut changes: MenuItemChanges,
) -> OrderingResult<MenuItem> {
    let (item, truck) = find_menu_item(store, item_id)?;
    if truck.owner_id != owner_id {
        return Err(OrderingError::forbidden(
            "You can only update menu items from your own truck",
        ));
    }
    for (field, value) in [("Name", &mut changes.name), ("Category", &mut changes.category)] {
        if let Some(text) = value {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(OrderingError::invalid_input(format!("{field} cannot be empty")));
            }
            *text = trimmed.to_string();
        }
    }
    if let Some(price) = &changes.price {
        changes.price = Some(positive_price(price)?);
    }
    if changes.is_empty() {
        return Err(OrderingError::invalid_input("No fields to update"));
    }

    let item = store.update_menu_item(item.id, &changes)?;
    info!(item_id, "menu item updated");
    Ok(item)
}

/// Removes an item; cart entries holding it go with it. Items that appear
/// on an order are kept and reported as a conflict.
pub fn delete_menu_item<S: OrderingStore>(
    store: &mut S,
    owner_id: i32,
    item_id: i32,
) -> OrderingResult<()> {
    let (item, truck) = find_menu_item(store, item_id)?;
    if truck.owner_id != owner_id {
        return Err(OrderingError::forbidden(
            "You can only delete menu items from your own truck",
        ));
    }

    store.delete_menu_item(item.id).map_err(|err| match err {
        crate::error::StoreError::Conflict(_) => OrderingError::conflict(
            "This menu item is part of existing orders and cannot be deleted",
        ),
        err => err.into(),
    })?;
    info!(item_id, "menu item deleted");
    Ok(())
}

fn positive_price(price: &BigDecimal) -> OrderingResult<BigDecimal> {
    let price = round_money(price);
    if price <= BigDecimal::zero() {
        return Err(OrderingError::invalid_input("Price must be a positive number"));
    }
    if !fits_money_column(&price) {
        return Err(OrderingError::invalid_input(
            "Price must be less than 100000000",
        ));
    }
    Ok(price)
}
