use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use clap::{builder::BoolishValueParser, ArgAction, Subcommand};
use counter_common::Cents;
use counter_engine::{db_types::MenuCategory, order_objects::OrderItemRequest};

#[derive(Debug, Subcommand)]
pub enum CounterCommand {
    /// Create the database if needed and bring its schema up to date
    Migrate,
    #[command(subcommand)]
    /// List or maintain the menu
    Menu(MenuCommand),
    #[command(subcommand)]
    /// Place, inspect and progress orders
    Order(OrderCommand),
    /// Show the live queue of orders waiting to be served
    Queue,
    /// Show the order statistics for a day
    Stats {
        /// The day to report on (YYYY-MM-DD). Defaults to today (UTC)
        #[arg(short = 'D', long = "day")]
        day: Option<NaiveDate>,
    },
    /// Show a customer's notifications
    Notifications {
        #[arg(required = true, index = 1)]
        customer_id: String,
        /// Only show unread notifications
        #[arg(short = 'u', long = "unread")]
        unread_only: bool,
        /// Mark all the customer's notifications as read after showing them
        #[arg(short = 'm', long = "mark-read")]
        mark_read: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum MenuCommand {
    /// List the menu
    List {
        /// Include items that are currently unavailable
        #[arg(short = 'a', long = "all")]
        all: bool,
    },
    /// Add an item to the menu
    Add {
        #[arg(required = true, index = 1)]
        name: String,
        /// One of starter, main, dessert, drink, set_menu
        #[arg(required = true, index = 2, value_parser = parse_category)]
        category: MenuCategory,
        /// The price, e.g. 12.50
        #[arg(required = true, index = 3)]
        price: Cents,
        #[arg(short = 'D', long = "description")]
        description: Option<String>,
        /// Add the item as unavailable
        #[arg(long = "unavailable")]
        unavailable: bool,
    },
    /// Take an item off the menu, or put it back on
    Availability {
        #[arg(required = true, index = 1)]
        id: i64,
        /// on or off
        #[arg(required = true, index = 2, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
        available: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum OrderCommand {
    /// Place a new order
    Place {
        /// The customer placing the order. Orders without a customer receive no notifications
        #[arg(short = 'c', long = "customer")]
        customer_id: Option<String>,
        /// A menu item, as ID or IDxQUANTITY (e.g. 4x2). Repeat for more items
        #[arg(short = 'i', long = "item", value_parser = parse_menu_item)]
        items: Vec<OrderItemRequest>,
        /// An item that is not on the menu, as NAME:QUANTITY:PRICE (e.g. "Birthday cake:1:25.00")
        #[arg(short = 'x', long = "extra", value_parser = parse_extra_item)]
        extras: Vec<OrderItemRequest>,
        /// The payment provider's reference for the customer's payment
        #[arg(short = 'p', long = "payment")]
        payment_reference: Option<String>,
        /// The customer paid cash
        #[arg(long = "cash")]
        cash: bool,
    },
    /// List orders
    List {
        #[arg(short = 'c', long = "customer")]
        customer_id: Option<String>,
        /// Only orders with this status. Repeat for more statuses
        #[arg(short = 's', long = "status")]
        statuses: Vec<String>,
        /// Only orders that are waiting in the queue
        #[arg(short = 'a', long = "active", conflicts_with = "statuses")]
        active: bool,
        #[arg(short = 'n', long = "limit")]
        limit: Option<i64>,
    },
    /// Show an order, its payment and its place in the queue
    Show {
        #[arg(required = true, index = 1)]
        order_number: i64,
    },
    /// Move an order to a new status: preparing, ready, customer_late, served or cancelled
    Advance {
        #[arg(required = true, index = 1)]
        order_number: i64,
        #[arg(required = true, index = 2)]
        status: String,
        /// Why the order was cancelled. Passed on to the customer
        #[arg(short = 'r', long = "reason")]
        reason: Option<String>,
    },
}

fn parse_category(s: &str) -> Result<MenuCategory> {
    MenuCategory::from_str(&s.trim().to_ascii_lowercase()).map_err(|e| anyhow!("{e}"))
}

/// Parses `ID` or `IDxQUANTITY`.
pub fn parse_menu_item(s: &str) -> Result<OrderItemRequest> {
    let (id, quantity) = match s.trim().split_once(['x', 'X']) {
        Some((id, quantity)) => (id, Some(quantity)),
        None => (s.trim(), None),
    };
    let id = id.trim().parse::<i64>().map_err(|e| anyhow!("'{id}' is not a menu item id. {e}"))?;
    let item = OrderItemRequest::catalog(id);
    match quantity {
        Some(q) => {
            let quantity = q.trim().parse::<i64>().map_err(|e| anyhow!("'{q}' is not a quantity. {e}"))?;
            Ok(item.with_quantity(quantity))
        },
        None => Ok(item),
    }
}

/// Parses `NAME:QUANTITY:PRICE`. The name may itself contain colons.
pub fn parse_extra_item(s: &str) -> Result<OrderItemRequest> {
    let mut parts = s.rsplitn(3, ':');
    let (price, quantity, name) = match (parts.next(), parts.next(), parts.next()) {
        (Some(price), Some(quantity), Some(name)) => (price, quantity, name),
        _ => return Err(anyhow!("'{s}' is not of the form NAME:QUANTITY:PRICE")),
    };
    let quantity = quantity.trim().parse::<i64>().map_err(|e| anyhow!("'{quantity}' is not a quantity. {e}"))?;
    let price = price.trim().parse::<Cents>().map_err(|e| anyhow!("'{price}' is not a price. {e}"))?;
    Ok(OrderItemRequest::manual(name.trim(), quantity, price))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn menu_items() {
        assert_eq!(parse_menu_item("4").unwrap(), OrderItemRequest::catalog(4));
        assert_eq!(parse_menu_item(" 4x3 ").unwrap(), OrderItemRequest::catalog(4).with_quantity(3));
        assert_eq!(parse_menu_item("12X2").unwrap(), OrderItemRequest::catalog(12).with_quantity(2));
        assert!(parse_menu_item("burger").is_err());
        assert!(parse_menu_item("4xlots").is_err());
    }

    #[test]
    fn extra_items() {
        let item = parse_extra_item("Birthday cake:1:25.00").unwrap();
        assert_eq!(item, OrderItemRequest::manual("Birthday cake", 1, Cents::from(2500)));
        let item = parse_extra_item("Menu: the works:2:9.5").unwrap();
        assert_eq!(item.name.as_deref(), Some("Menu: the works"));
        assert_eq!(item.quantity, Some(2));
        assert!(parse_extra_item("Cake:25.00").is_err());
        assert!(parse_extra_item("Cake:one:25.00").is_err());
    }

    #[test]
    fn categories() {
        assert_eq!(parse_category("Set_Menu").unwrap(), MenuCategory::SetMenu);
        assert!(parse_category("snack").is_err());
    }
}
