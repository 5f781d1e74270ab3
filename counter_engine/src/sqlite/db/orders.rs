use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, NewOrderItem, Order, OrderItem, OrderStats, OrderStatusType},
    order_objects::OrderQueryFilter,
};

/// Atomically advances the order number sequence and returns the new value. Called inside the creation transaction,
/// the increment is rolled back along with everything else if the creation fails.
pub async fn next_order_number(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let number = sqlx::query_scalar::<_, i64>(
        "UPDATE order_sequence SET last_number = last_number + 1 WHERE id = 1 RETURNING last_number",
    )
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Reserved order number {number}");
    Ok(number)
}

/// Inserts the order row (without its items) using the given connection. This is not atomic. Embed this call inside
/// a transaction, and pass `&mut tx` as the connection argument.
pub async fn insert_order(
    order_number: i64,
    order: &NewOrder,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (order_number, customer_id, total_price, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *;
        "#,
    )
    .bind(order_number)
    .bind(order.customer_id.as_deref())
    .bind(order.total_price())
    .bind(OrderStatusType::Pending)
    .bind(order.created_at)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order #{} has been saved in the DB with id {}", order.order_number, order.id);
    Ok(order)
}

/// Inserts the line items for an order, preserving their order.
pub async fn insert_order_items(
    order_id: i64,
    items: &[NewOrderItem],
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, sqlx::Error> {
    let mut result = Vec::with_capacity(items.len());
    for item in items {
        let saved: OrderItem = sqlx::query_as(
            r#"
                INSERT INTO order_items (order_id, menu_item_id, name, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *;
            "#,
        )
        .bind(order_id)
        .bind(item.menu_item_id)
        .bind(item.name.as_str())
        .bind(item.quantity)
        .bind(item.unit_price)
        .fetch_one(&mut *conn)
        .await?;
        result.push(saved);
    }
    trace!("🗃️ {} line items saved for order {order_id}", result.len());
    Ok(result)
}

pub async fn fetch_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Fetches the line items of all the given orders in one query and attaches them.
async fn attach_items(orders: Vec<Order>, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    if orders.is_empty() {
        return Ok(orders);
    }
    let mut builder = QueryBuilder::new("SELECT * FROM order_items WHERE order_id IN (");
    let mut ids = builder.separated(", ");
    for order in &orders {
        ids.push_bind(order.id);
    }
    builder.push(") ORDER BY id ASC");
    let items = builder.build_query_as::<OrderItem>().fetch_all(conn).await?;
    let mut by_order = HashMap::<i64, Vec<OrderItem>>::new();
    for item in items {
        by_order.entry(item.order_id).or_default().push(item);
    }
    let orders = orders
        .into_iter()
        .map(|o| {
            let items = by_order.remove(&o.id).unwrap_or_default();
            o.with_items(items)
        })
        .collect();
    Ok(orders)
}

pub async fn fetch_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> =
        sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(&mut *conn).await?;
    match order {
        Some(order) => {
            let items = fetch_order_items(order.id, conn).await?;
            Ok(Some(order.with_items(items)))
        },
        None => Ok(None),
    }
}

pub async fn fetch_order_by_number(order_number: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as("SELECT * FROM orders WHERE order_number = $1")
        .bind(order_number)
        .fetch_optional(&mut *conn)
        .await?;
    match order {
        Some(order) => {
            let items = fetch_order_items(order.id, conn).await?;
            Ok(Some(order.with_items(items)))
        },
        None => Ok(None),
    }
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at` in ascending order, and then by order number.
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(customer_id) = query.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(customer_id);
    }
    if let Some(order_number) = query.order_number {
        where_clause.push("order_number = ");
        where_clause.push_bind_unseparated(order_number);
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at < ");
        where_clause.push_bind_unseparated(until);
    }
    if !query.statuses.is_empty() {
        where_clause.push("status IN (");
        for (i, status) in query.statuses.into_iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status);
        }
        where_clause.push_unseparated(")");
    }
    builder.push(" ORDER BY created_at ASC, order_number ASC");
    if let Some(limit) = query.limit {
        builder.push(" LIMIT ");
        builder.push_bind(limit);
    }

    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(&mut *conn).await?;
    trace!("🗃️ Result of search_orders: {:?}", orders.len());
    attach_items(orders, conn).await
}

/// Compare-and-set status update. The row is only touched if its status is still `expected`.
pub(crate) async fn update_order_status(
    id: i64,
    expected: OrderStatusType,
    new_status: OrderStatusType,
    reason: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let now = Utc::now();
    let served_at = (new_status == OrderStatusType::Served).then_some(now);
    let reason = reason.filter(|_| new_status == OrderStatusType::Cancelled);
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET
                status = $1,
                cancellation_reason = COALESCE($2, cancellation_reason),
                served_at = COALESCE($3, served_at),
                updated_at = $4
            WHERE id = $5 AND status = $6
            RETURNING *;
        "#,
    )
    .bind(new_status)
    .bind(reason)
    .bind(served_at)
    .bind(now)
    .bind(id)
    .bind(expected)
    .fetch_optional(&mut *conn)
    .await?;
    match order {
        Some(order) => {
            debug!("🗃️ Order #{} moved from {expected} to {new_status}", order.order_number);
            let items = fetch_order_items(order.id, conn).await?;
            Ok(Some(order.with_items(items)))
        },
        None => {
            debug!("🗃️ Order {id} was not in status {expected}. Status update to {new_status} skipped.");
            Ok(None)
        },
    }
}

pub async fn order_stats(
    since: DateTime<Utc>,
    until: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<OrderStats, sqlx::Error> {
    let stats = sqlx::query_as(
        r#"
            SELECT
                COUNT(*) AS total_orders,
                COALESCE(SUM(CASE WHEN status = 'cancelled' THEN 1 ELSE 0 END), 0) AS cancelled,
                COALESCE(SUM(CASE WHEN status = 'customer_late' THEN 1 ELSE 0 END), 0) AS customer_late,
                COALESCE(SUM(CASE WHEN status = 'ready' THEN 1 ELSE 0 END), 0) AS ready,
                COALESCE(SUM(CASE WHEN status = 'served' THEN 1 ELSE 0 END), 0) AS served,
                COALESCE(SUM(CASE WHEN status = 'cancelled' THEN total_price ELSE 0 END), 0) AS cancelled_value
            FROM orders
            WHERE created_at >= $1 AND created_at < $2
        "#,
    )
    .bind(since)
    .bind(until)
    .fetch_one(conn)
    .await?;
    Ok(stats)
}
