use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{MenuItem, NewMenuItem};

pub async fn insert_menu_item(item: NewMenuItem, conn: &mut SqliteConnection) -> Result<MenuItem, sqlx::Error> {
    let now = Utc::now();
    let item: MenuItem = sqlx::query_as(
        r#"
            INSERT INTO menu_items (name, description, category, price, available, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *;
        "#,
    )
    .bind(item.name)
    .bind(item.description)
    .bind(item.category)
    .bind(item.price)
    .bind(item.available)
    .bind(now)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Menu item {} ({}) added at {}", item.id, item.name, item.price);
    Ok(item)
}

pub async fn fetch_menu_item(id: i64, conn: &mut SqliteConnection) -> Result<Option<MenuItem>, sqlx::Error> {
    let item = sqlx::query_as("SELECT * FROM menu_items WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(item)
}

pub async fn set_availability(
    id: i64,
    available: bool,
    conn: &mut SqliteConnection,
) -> Result<Option<MenuItem>, sqlx::Error> {
    let item = sqlx::query_as("UPDATE menu_items SET available = $1, updated_at = $2 WHERE id = $3 RETURNING *")
        .bind(available)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(item)
}

pub async fn fetch_menu(available_only: bool, conn: &mut SqliteConnection) -> Result<Vec<MenuItem>, sqlx::Error> {
    let sql = if available_only {
        "SELECT * FROM menu_items WHERE available = 1 ORDER BY category, name"
    } else {
        "SELECT * FROM menu_items ORDER BY category, name"
    };
    let items = sqlx::query_as(sql).fetch_all(conn).await?;
    Ok(items)
}
