use thiserror::Error;

use crate::db_types::{MenuItem, NewMenuItem};

/// Read-only access to the menu. This is all the order flow needs to resolve line items.
#[allow(async_fn_in_trait)]
pub trait CatalogLookup {
    async fn fetch_menu_item(&self, id: i64) -> Result<Option<MenuItem>, CatalogError>;
}

/// Menu maintenance. Changes to the menu never affect orders that have already been placed, since line items carry
/// their own copy of the name and price.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement: CatalogLookup {
    async fn insert_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, CatalogError>;

    /// Returns the updated item, or `None` if there is no item with the given id.
    async fn set_menu_item_availability(&self, id: i64, available: bool) -> Result<Option<MenuItem>, CatalogError>;

    /// Returns the menu ordered by category, then name.
    async fn fetch_menu(&self, available_only: bool) -> Result<Vec<MenuItem>, CatalogError>;
}

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid menu item: {0}")]
    InvalidMenuItem(String),
    #[error("Menu item {0} does not exist")]
    MenuItemNotFound(i64),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}
