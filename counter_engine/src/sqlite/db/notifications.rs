use chrono::Utc;
use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{NewNotification, Notification};

pub async fn insert_notification(
    notification: NewNotification,
    conn: &mut SqliteConnection,
) -> Result<Notification, sqlx::Error> {
    let record: Notification = sqlx::query_as(
        r#"
            INSERT INTO notifications (order_id, customer_id, notification_type, message, is_read, created_at)
            VALUES ($1, $2, $3, $4, 0, $5)
            RETURNING *;
        "#,
    )
    .bind(notification.order_id)
    .bind(notification.customer_id)
    .bind(notification.notification_type)
    .bind(notification.message)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Notification {} ({}) stored for {}", record.id, record.notification_type, record.customer_id);
    Ok(record)
}

pub async fn fetch_for_customer(
    customer_id: &str,
    unread_only: bool,
    conn: &mut SqliteConnection,
) -> Result<Vec<Notification>, sqlx::Error> {
    let sql = if unread_only {
        "SELECT * FROM notifications WHERE customer_id = $1 AND is_read = 0 ORDER BY created_at DESC, id DESC"
    } else {
        "SELECT * FROM notifications WHERE customer_id = $1 ORDER BY created_at DESC, id DESC"
    };
    let notifications = sqlx::query_as(sql).bind(customer_id).fetch_all(conn).await?;
    Ok(notifications)
}

pub async fn fetch_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Notification>, sqlx::Error> {
    let notifications = sqlx::query_as("SELECT * FROM notifications WHERE order_id = $1 ORDER BY created_at ASC, id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(notifications)
}

pub async fn mark_read(id: i64, conn: &mut SqliteConnection) -> Result<Option<Notification>, sqlx::Error> {
    let notification =
        sqlx::query_as("UPDATE notifications SET is_read = 1 WHERE id = $1 RETURNING *").bind(id).fetch_optional(conn).await?;
    Ok(notification)
}

pub async fn mark_all_read(customer_id: &str, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE customer_id = $1 AND is_read = 0")
        .bind(customer_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn count_unread(customer_id: &str, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE customer_id = $1 AND is_read = 0")
        .bind(customer_id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}
