use std::fmt::Debug;

use log::*;

use crate::{db_types::Notification, traits::{NotificationApiError, NotificationManagement}};

/// `NotificationApi` is the customer's inbox. Notifications are created by the order flow; customers can only read
/// them and mark them as read.
pub struct NotificationApi<B> {
    db: B,
}

impl<B> Debug for NotificationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NotificationApi")
    }
}

impl<B> NotificationApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> NotificationApi<B>
where B: NotificationManagement
{
    /// The customer's notifications, newest first.
    pub async fn notifications_for_customer(
        &self,
        customer_id: &str,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationApiError> {
        self.db.fetch_notifications_for_customer(customer_id, unread_only).await
    }

    /// The notifications sent for an order, oldest first.
    pub async fn notifications_for_order(&self, order_id: i64) -> Result<Vec<Notification>, NotificationApiError> {
        self.db.fetch_notifications_for_order(order_id).await
    }

    /// Marks the notification as read. Marking a notification that is already read is not an error.
    pub async fn mark_as_read(&self, id: i64) -> Result<Notification, NotificationApiError> {
        let notification =
            self.db.mark_notification_read(id).await?.ok_or(NotificationApiError::NotificationNotFound(id))?;
        trace!("📬️ Notification {id} marked as read");
        Ok(notification)
    }

    /// Returns the number of notifications that were unread before the call.
    pub async fn mark_all_as_read(&self, customer_id: &str) -> Result<u64, NotificationApiError> {
        let count = self.db.mark_all_notifications_read(customer_id).await?;
        debug!("📬️ {count} notifications for {customer_id} marked as read");
        Ok(count)
    }

    pub async fn unread_count(&self, customer_id: &str) -> Result<i64, NotificationApiError> {
        self.db.count_unread_notifications(customer_id).await
    }
}
