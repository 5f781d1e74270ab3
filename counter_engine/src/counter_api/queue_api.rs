use std::fmt::Debug;

use chrono::Duration;
use log::*;

use crate::{
    db_types::Order,
    order_objects::{OrderQueryFilter, QueueEntry, QueuePosition},
    traits::{OrderManagement, OrderStoreError},
};

/// Places the active orders in service order.
///
/// Orders that are not active (anything other than pending or preparing) are dropped. The rest are ordered by creation
/// time, oldest first, with ties broken by order number. Positions start at 1, and the estimated wait for an order is
/// its position multiplied by `service_time`.
pub fn sequence_orders(orders: Vec<Order>, service_time: Duration) -> Vec<QueueEntry> {
    let mut active = orders.into_iter().filter(|o| o.status.is_active()).collect::<Vec<_>>();
    active.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.order_number.cmp(&b.order_number)));
    active
        .into_iter()
        .enumerate()
        .map(|(i, order)| {
            let position = i + 1;
            let estimated_wait = service_time * i32::try_from(position).unwrap_or(i32::MAX);
            QueueEntry { order, position, estimated_wait }
        })
        .collect()
}

/// `QueueApi` computes the live queue. Positions are never stored: every call recomputes them from the active orders,
/// so a result can be stale by the time it is read, but it is never inconsistent with itself.
pub struct QueueApi<B> {
    db: B,
    service_time: Duration,
}

impl<B> Debug for QueueApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "QueueApi ({} min per order)", self.service_time.num_minutes())
    }
}

impl<B> QueueApi<B> {
    pub fn new(db: B, service_time: Duration) -> Self {
        Self { db, service_time }
    }

    pub fn service_time(&self) -> Duration {
        self.service_time
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> QueueApi<B>
where B: OrderManagement
{
    pub async fn compute_queue(&self) -> Result<Vec<QueueEntry>, OrderStoreError> {
        let orders = self.db.fetch_orders(OrderQueryFilter::active()).await?;
        let queue = sequence_orders(orders, self.service_time);
        trace!("🧾 Queue recomputed. {} orders waiting", queue.len());
        Ok(queue)
    }

    /// The order's current place in the queue, or `None` if it is not queued (or does not exist).
    pub async fn position_of(&self, order_id: i64) -> Result<Option<QueuePosition>, OrderStoreError> {
        let queue = self.compute_queue().await?;
        Ok(queue.iter().find(|e| e.order.id == order_id).map(QueueEntry::queue_position))
    }
}
