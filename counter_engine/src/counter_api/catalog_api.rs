use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{MenuItem, NewMenuItem},
    traits::{CatalogError, CatalogManagement},
};

/// `CatalogApi` maintains the menu that orders are placed against.
pub struct CatalogApi<B> {
    db: B,
}

impl<B> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi")
    }
}

impl<B> CatalogApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    /// Adds an item to the menu. The name may not be blank and the price must be positive.
    pub async fn add_menu_item(&self, mut item: NewMenuItem) -> Result<MenuItem, CatalogError> {
        item.name = item.name.trim().to_string();
        if item.name.is_empty() {
            return Err(CatalogError::InvalidMenuItem("The name of a menu item cannot be empty".into()));
        }
        if !item.price.is_positive() {
            return Err(CatalogError::InvalidMenuItem(format!("{} must have a positive price", item.name)));
        }
        item.description = item.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty());
        let item = self.db.insert_menu_item(item).await?;
        info!("📋️ {} ({}) added to the menu at {}", item.name, item.category, item.price);
        Ok(item)
    }

    /// Takes an item off the menu, or puts it back. Orders that were already placed are not affected.
    pub async fn set_availability(&self, id: i64, available: bool) -> Result<MenuItem, CatalogError> {
        let item = self.db.set_menu_item_availability(id, available).await?.ok_or(CatalogError::MenuItemNotFound(id))?;
        info!("📋️ {} is now {}", item.name, if available { "available" } else { "unavailable" });
        Ok(item)
    }

    /// The menu, ordered by category and then name.
    pub async fn menu(&self, available_only: bool) -> Result<Vec<MenuItem>, CatalogError> {
        self.db.fetch_menu(available_only).await
    }

    pub async fn menu_item(&self, id: i64) -> Result<MenuItem, CatalogError> {
        self.db.fetch_menu_item(id).await?.ok_or(CatalogError::MenuItemNotFound(id))
    }
}
