//! `SqliteDatabase` is the concrete storage backend of the counter engine.
//!
//! It uses SQLite and implements all the storage traits defined in the [`crate::traits`] module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{menu, new_pool, notifications, orders, payments};
use crate::{
    db_types::{
        MenuItem,
        NewMenuItem,
        NewNotification,
        NewOrder,
        NewPaymentRecord,
        Notification,
        Order,
        OrderStats,
        OrderStatusType,
        PaymentRecord,
        PaymentStatus,
    },
    order_objects::OrderQueryFilter,
    traits::{
        CatalogError,
        CatalogLookup,
        CatalogManagement,
        NotificationApiError,
        NotificationManagement,
        OrderManagement,
        OrderStoreError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. Migrations that have already been applied are skipped.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }
}

fn validate_new_order(order: &NewOrder) -> Result<(), OrderStoreError> {
    if order.items.is_empty() {
        return Err(OrderStoreError::InvalidOrder("An order must contain at least one item".into()));
    }
    if let Some(item) = order.items.iter().find(|i| i.quantity <= 0 || !i.unit_price.is_positive()) {
        return Err(OrderStoreError::InvalidOrder(format!(
            "Item '{}' must have a positive quantity and price. Got {} x {}",
            item.name, item.quantity, item.unit_price
        )));
    }
    Ok(())
}

impl OrderManagement for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order_with_payment(
        &self,
        order: NewOrder,
        payment: NewPaymentRecord,
    ) -> Result<Order, OrderStoreError> {
        validate_new_order(&order)?;
        let mut tx = self.pool.begin().await?;
        // The sequence update is the first statement, so the transaction takes the write lock straight away
        let order_number = orders::next_order_number(&mut tx).await?;
        let saved = orders::insert_order(order_number, &order, &mut tx).await?;
        let items = orders::insert_order_items(saved.id, &order.items, &mut tx).await?;
        let record = payments::insert_payment(saved.id, saved.total_price, payment, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Order #{order_number} committed with {} items, total {} and payment record {}",
            items.len(),
            saved.total_price,
            record.id
        );
        Ok(saved.with_items(items))
    }

    async fn next_order_number(&self) -> Result<i64, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let number = orders::next_order_number(&mut conn).await?;
        Ok(number)
    }

    async fn fetch_order(&self, id: i64) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_number(&self, order_number: i64) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(order_number, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn update_order_status(
        &self,
        id: i64,
        expected: OrderStatusType,
        new_status: OrderStatusType,
        reason: Option<String>,
    ) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::update_order_status(id, expected, new_status, reason, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_payment_for_order(&self, order_id: i64) -> Result<Option<PaymentRecord>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let record = payments::fetch_payment_for_order(order_id, &mut conn).await?;
        Ok(record)
    }

    async fn update_payment_status_for_order(
        &self,
        order_id: i64,
        status: PaymentStatus,
    ) -> Result<Option<PaymentRecord>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let record = payments::update_payment_status_for_order(order_id, status, &mut conn).await?;
        Ok(record)
    }

    async fn fetch_order_stats(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<OrderStats, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let stats = orders::order_stats(since, until, &mut conn).await?;
        Ok(stats)
    }
}

impl CatalogLookup for SqliteDatabase {
    async fn fetch_menu_item(&self, id: i64) -> Result<Option<MenuItem>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let item = menu::fetch_menu_item(id, &mut conn).await?;
        Ok(item)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn insert_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let item = menu::insert_menu_item(item, &mut conn).await?;
        Ok(item)
    }

    async fn set_menu_item_availability(&self, id: i64, available: bool) -> Result<Option<MenuItem>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let item = menu::set_availability(id, available, &mut conn).await?;
        Ok(item)
    }

    async fn fetch_menu(&self, available_only: bool) -> Result<Vec<MenuItem>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let items = menu::fetch_menu(available_only, &mut conn).await?;
        Ok(items)
    }
}

impl NotificationManagement for SqliteDatabase {
    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, NotificationApiError> {
        let mut conn = self.pool.acquire().await?;
        let notification = notifications::insert_notification(notification, &mut conn).await?;
        Ok(notification)
    }

    async fn fetch_notifications_for_customer(
        &self,
        customer_id: &str,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationApiError> {
        let mut conn = self.pool.acquire().await?;
        let result = notifications::fetch_for_customer(customer_id, unread_only, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_notifications_for_order(&self, order_id: i64) -> Result<Vec<Notification>, NotificationApiError> {
        let mut conn = self.pool.acquire().await?;
        let result = notifications::fetch_for_order(order_id, &mut conn).await?;
        Ok(result)
    }

    async fn mark_notification_read(&self, id: i64) -> Result<Option<Notification>, NotificationApiError> {
        let mut conn = self.pool.acquire().await?;
        let result = notifications::mark_read(id, &mut conn).await?;
        Ok(result)
    }

    async fn mark_all_notifications_read(&self, customer_id: &str) -> Result<u64, NotificationApiError> {
        let mut conn = self.pool.acquire().await?;
        let count = notifications::mark_all_read(customer_id, &mut conn).await?;
        Ok(count)
    }

    async fn count_unread_notifications(&self, customer_id: &str) -> Result<i64, NotificationApiError> {
        let mut conn = self.pool.acquire().await?;
        let count = notifications::count_unread(customer_id, &mut conn).await?;
        Ok(count)
    }
}

#[cfg(test)]
mod test {
    use counter_common::Cents;

    use super::*;
    use crate::{
        db_types::{NewOrderItem, NotificationType, PaymentMethod},
        test_utils::prepare_env::{prepare_test_env, random_db_path},
    };

    async fn new_db() -> SqliteDatabase {
        let url = random_db_path();
        prepare_test_env(&url).await;
        SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
    }

    fn burger_order(customer: Option<&str>) -> NewOrder {
        NewOrder::new(customer.map(String::from), vec![
            NewOrderItem::new("Burger", 2, Cents::from(1250)),
            NewOrderItem::new("Fries", 1, Cents::from(800)),
        ])
    }

    #[tokio::test]
    async fn order_creation_is_atomic_and_numbered() {
        let db = new_db().await;
        let payment = NewPaymentRecord::new(PaymentMethod::Card, Some("pi_1".into()));
        let order = db.insert_order_with_payment(burger_order(Some("alice")), payment).await.unwrap();
        assert_eq!(order.order_number, 1001);
        assert_eq!(order.status, OrderStatusType::Pending);
        assert_eq!(order.total_price, Cents::from(3300));
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].name, "Burger");
        assert_eq!(order.items[1].line_total(), Cents::from(800));

        let record = db.fetch_payment_for_order(order.id).await.unwrap().unwrap();
        assert_eq!(record.amount, Cents::from(3300));
        assert_eq!(record.status, PaymentStatus::Valid);
        assert_eq!(record.transaction_ref.as_deref(), Some("pi_1"));

        let payment = NewPaymentRecord::new(PaymentMethod::Cash, None);
        let second = db.insert_order_with_payment(burger_order(None), payment).await.unwrap();
        assert_eq!(second.order_number, 1002);
        assert_eq!(db.next_order_number().await.unwrap(), 1003);
    }

    #[tokio::test]
    async fn invalid_orders_consume_nothing() {
        let db = new_db().await;
        let payment = NewPaymentRecord::new(PaymentMethod::Card, None);
        let empty = NewOrder::new(None, vec![]);
        let err = db.insert_order_with_payment(empty, payment.clone()).await.unwrap_err();
        assert!(matches!(err, OrderStoreError::InvalidOrder(_)));
        let free = NewOrder::new(None, vec![NewOrderItem::new("Water", 1, Cents::from(0))]);
        let err = db.insert_order_with_payment(free, payment.clone()).await.unwrap_err();
        assert!(matches!(err, OrderStoreError::InvalidOrder(_)));

        let order = db.insert_order_with_payment(burger_order(None), payment).await.unwrap();
        assert_eq!(order.order_number, 1001);
        assert!(db.fetch_orders(OrderQueryFilter::default()).await.unwrap().len() == 1);
    }

    #[tokio::test]
    async fn status_updates_are_compare_and_set() {
        let db = new_db().await;
        let payment = NewPaymentRecord::new(PaymentMethod::Card, Some("pi_2".into()));
        let order = db.insert_order_with_payment(burger_order(None), payment).await.unwrap();
        use OrderStatusType::*;
        let updated = db.update_order_status(order.id, Pending, Preparing, None).await.unwrap().unwrap();
        assert_eq!(updated.status, Preparing);
        assert_eq!(updated.items.len(), 2);
        // The order is no longer pending, so a second update based on stale state does nothing
        assert!(db.update_order_status(order.id, Pending, Cancelled, Some("stale".into())).await.unwrap().is_none());
        assert!(db.update_order_status(9999, Pending, Preparing, None).await.unwrap().is_none());

        let cancelled =
            db.update_order_status(order.id, Preparing, Cancelled, Some("out of buns".into())).await.unwrap().unwrap();
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("out of buns"));
        assert!(cancelled.served_at.is_none());
    }

    #[tokio::test]
    async fn served_orders_record_service_time() {
        let db = new_db().await;
        let payment = NewPaymentRecord::new(PaymentMethod::Card, Some("pi_3".into()));
        let order = db.insert_order_with_payment(burger_order(None), payment).await.unwrap();
        use OrderStatusType::*;
        db.update_order_status(order.id, Pending, Preparing, None).await.unwrap().unwrap();
        db.update_order_status(order.id, Preparing, Ready, None).await.unwrap().unwrap();
        let served = db.update_order_status(order.id, Ready, Served, Some("ignored".into())).await.unwrap().unwrap();
        assert!(served.served_at.is_some());
        assert!(served.cancellation_reason.is_none());
    }

    #[tokio::test]
    async fn refunded_payments_are_final() {
        let db = new_db().await;
        let payment = NewPaymentRecord::new(PaymentMethod::Card, Some("pi_4".into()));
        let order = db.insert_order_with_payment(burger_order(None), payment).await.unwrap();
        let record = db.update_payment_status_for_order(order.id, PaymentStatus::Refunded).await.unwrap().unwrap();
        assert_eq!(record.status, PaymentStatus::Refunded);
        assert!(db.update_payment_status_for_order(order.id, PaymentStatus::Valid).await.unwrap().is_none());
        let record = db.fetch_payment_for_order(order.id).await.unwrap().unwrap();
        assert_eq!(record.status, PaymentStatus::Refunded);
    }

    #[tokio::test]
    async fn query_filters() {
        let db = new_db().await;
        for customer in ["alice", "bob", "alice"] {
            let payment = NewPaymentRecord::new(PaymentMethod::Cash, None);
            db.insert_order_with_payment(burger_order(Some(customer)), payment).await.unwrap();
        }
        let alice = db.fetch_orders(OrderQueryFilter::default().with_customer_id("alice")).await.unwrap();
        assert_eq!(alice.len(), 2);
        assert!(alice[0].order_number < alice[1].order_number);
        assert!(alice.iter().all(|o| o.items.len() == 2));

        let first = alice[0].id;
        db.update_order_status(first, OrderStatusType::Pending, OrderStatusType::Preparing, None).await.unwrap();
        let preparing =
            db.fetch_orders(OrderQueryFilter::default().with_status(OrderStatusType::Preparing)).await.unwrap();
        assert_eq!(preparing.len(), 1);
        assert_eq!(preparing[0].id, first);

        let by_number = db.fetch_order_by_number(1002).await.unwrap().unwrap();
        assert_eq!(by_number.customer_id.as_deref(), Some("bob"));
        let limited = db.fetch_orders(OrderQueryFilter::default().with_limit(1)).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn notifications_round_trip() {
        let db = new_db().await;
        let payment = NewPaymentRecord::new(PaymentMethod::Card, None);
        let order = db.insert_order_with_payment(burger_order(Some("carol")), payment).await.unwrap();
        let note = NewNotification::for_order(&order, NotificationType::OrderCreated).unwrap();
        let stored = db.insert_notification(note).await.unwrap();
        assert!(!stored.is_read);
        assert_eq!(db.count_unread_notifications("carol").await.unwrap(), 1);
        let read = db.mark_notification_read(stored.id).await.unwrap().unwrap();
        assert!(read.is_read);
        assert_eq!(db.count_unread_notifications("carol").await.unwrap(), 0);
        assert!(db.fetch_notifications_for_customer("carol", true).await.unwrap().is_empty());
        assert_eq!(db.fetch_notifications_for_order(order.id).await.unwrap().len(), 1);
    }
}
