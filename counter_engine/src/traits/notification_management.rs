use thiserror::Error;

use crate::db_types::{NewNotification, Notification};

/// Storage for customer notifications. Notifications are written by the order flow and are only ever modified to mark
/// them as read.
#[allow(async_fn_in_trait)]
pub trait NotificationManagement {
    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, NotificationApiError>;

    /// Newest first.
    async fn fetch_notifications_for_customer(
        &self,
        customer_id: &str,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationApiError>;

    /// Oldest first, so that the result reads as the order's history.
    async fn fetch_notifications_for_order(&self, order_id: i64) -> Result<Vec<Notification>, NotificationApiError>;

    async fn mark_notification_read(&self, id: i64) -> Result<Option<Notification>, NotificationApiError>;

    /// Returns the number of notifications that changed.
    async fn mark_all_notifications_read(&self, customer_id: &str) -> Result<u64, NotificationApiError>;

    async fn count_unread_notifications(&self, customer_id: &str) -> Result<i64, NotificationApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum NotificationApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Notification {0} does not exist")]
    NotificationNotFound(i64),
}

impl From<sqlx::Error> for NotificationApiError {
    fn from(e: sqlx::Error) -> Self {
        NotificationApiError::DatabaseError(e.to_string())
    }
}
