use std::fmt::Debug;

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use counter_common::Cents;
use log::*;

use crate::{
    config::FlowOptions,
    counter_api::{
        errors::{OrderFlowError, PaymentApiError},
        payment_api::{is_placeholder_reference, placeholder_reference, PaymentApi},
        queue_api::QueueApi,
    },
    db_types::{
        NewNotification,
        NewOrder,
        NewOrderItem,
        NewPaymentRecord,
        NotificationType,
        Order,
        OrderStats,
        OrderStatusType,
        PaymentMethod,
        PaymentRecord,
        PaymentStatus,
    },
    events::{EventProducers, OrderCreatedEvent, OrderUpdatedEvent, QueueUpdatedEvent, RefundFailedEvent},
    order_objects::{Compensation, NewOrderRequest, OrderItemRequest, OrderQueryFilter, StatusChange, TrackedOrder},
    traits::{CatalogLookup, NotificationManagement, OrderManagement, PaymentGateway},
};

/// `OrderFlowApi` is the order lifecycle engine. It takes orders at the counter, moves them through the kitchen, and
/// takes care of the consequences of each move: customer notifications, refunds, and live updates of the queue.
pub struct OrderFlowApi<B, G> {
    db: B,
    payments: PaymentApi<G>,
    producers: EventProducers,
    options: FlowOptions,
}

impl<B, G> Debug for OrderFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, G> OrderFlowApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers, options: FlowOptions) -> Self {
        Self { db, payments: PaymentApi::new(gateway), producers, options }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }

    pub fn payments(&self) -> &PaymentApi<G> {
        &self.payments
    }

    pub fn options(&self) -> &FlowOptions {
        &self.options
    }
}

impl<B, G> OrderFlowApi<B, G>
where
    B: OrderManagement + CatalogLookup + NotificationManagement,
    G: PaymentGateway,
{
    pub fn queue(&self) -> QueueApi<B> {
        QueueApi::new(self.db.clone(), self.options.service_time)
    }

    /// Places a new order.
    ///
    /// The request is checked in this order, and the first failure is returned:
    /// 1. There must be at least one item. Catalog items must exist and be available; manual items need a name,
    ///    quantity and unit price. Quantities and prices must be positive.
    /// 2. The payment reference must be present, and the payment provider must report the payment as succeeded. When
    ///    payment verification is skipped, neither check is made and a placeholder reference is recorded if none was
    ///    given.
    ///
    /// The order number, the order, its items and its payment record are then committed in a single transaction. After
    /// the commit, the customer (if known) is notified, `order:created` is published and the queue is republished.
    /// Failures in these follow-up steps are logged and do not affect the result.
    pub async fn create_order(&self, request: NewOrderRequest) -> Result<TrackedOrder, OrderFlowError> {
        let items = self.resolve_items(&request.items).await?;
        let transaction_ref = self.check_payment(request.payment_reference.as_deref()).await?;
        let customer_id = request.customer_id.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
        let new_order = NewOrder::new(customer_id, items);
        let payment = NewPaymentRecord::new(request.payment_method, Some(transaction_ref));
        let order = self.db.insert_order_with_payment(new_order, payment).await?;
        info!(
            "🔄️📦️ Order #{} placed with {} items for {}",
            order.order_number,
            order.items.len(),
            order.total_price
        );
        self.notify(&order, NotificationType::OrderCreated).await;
        self.producers.publish_order_created(OrderCreatedEvent::new(order.clone())).await;
        self.publish_queue().await;
        Ok(TrackedOrder { order, queue_position: None })
    }

    async fn resolve_items(&self, requests: &[OrderItemRequest]) -> Result<Vec<NewOrderItem>, OrderFlowError> {
        if requests.is_empty() {
            return Err(OrderFlowError::ValidationError("An order must contain at least one item".into()));
        }
        let mut items = Vec::with_capacity(requests.len());
        let mut total = Cents::default();
        for (i, request) in requests.iter().enumerate() {
            let line = i + 1;
            let item = match request.menu_item_id {
                Some(id) => {
                    let menu_item = self.db.fetch_menu_item(id).await?.ok_or(OrderFlowError::MenuItemNotFound(id))?;
                    if !menu_item.available {
                        return Err(OrderFlowError::ValidationError(format!(
                            "Item {line}: {} is not available right now",
                            menu_item.name
                        )));
                    }
                    NewOrderItem::from_menu_item(&menu_item, request.quantity.unwrap_or(1))
                },
                None => match (request.name.as_deref().map(str::trim), request.quantity, request.unit_price) {
                    (Some(name), Some(quantity), Some(price)) if !name.is_empty() => {
                        NewOrderItem::new(name, quantity, price)
                    },
                    _ => {
                        return Err(OrderFlowError::ValidationError(format!(
                            "Item {line}: give either a menu item id, or a name, quantity and unit price"
                        )))
                    },
                },
            };
            if item.quantity <= 0 {
                return Err(OrderFlowError::ValidationError(format!(
                    "Item {line}: quantity must be positive, not {}",
                    item.quantity
                )));
            }
            if !item.unit_price.is_positive() {
                return Err(OrderFlowError::ValidationError(format!(
                    "Item {line}: unit price must be positive, not {}",
                    item.unit_price
                )));
            }
            total = item.unit_price.checked_mul(item.quantity).and_then(|t| total.checked_add(t)).ok_or_else(|| {
                OrderFlowError::ValidationError(format!("Item {line}: the order total is too large to be charged"))
            })?;
            items.push(item);
        }
        trace!("🔄️📦️ {} line items resolved, totalling {total}", items.len());
        Ok(items)
    }

    /// Returns the transaction reference to record for the order.
    async fn check_payment(&self, reference: Option<&str>) -> Result<String, OrderFlowError> {
        let reference = reference.map(str::trim).filter(|r| !r.is_empty());
        if self.options.skip_payment_verification {
            let reference = reference.map(String::from).unwrap_or_else(placeholder_reference);
            warn!("🔄️💳️ Payment verification is disabled. Accepting order with reference {reference}");
            return Ok(reference);
        }
        let reference = reference
            .ok_or_else(|| OrderFlowError::ValidationError("A payment reference is required".into()))?;
        let verification = self.payments.verify(reference).await.map_err(|e| match e {
            PaymentApiError::PaymentVerificationFailed(s) | PaymentApiError::RefundFailed(s) => {
                OrderFlowError::PaymentVerificationFailed(s)
            },
        })?;
        if !verification.is_valid {
            info!("🔄️💳️ Order rejected. Payment {reference} has status {}", verification.status);
            return Err(OrderFlowError::PaymentNotVerified { status: verification.status });
        }
        Ok(reference.to_string())
    }

    /// Parses `target` as a status name (e.g. `ready` or `customer_late`) and moves the order to it.
    /// See [`Self::modify_status_for_order`].
    pub async fn transition_order(
        &self,
        order_id: i64,
        target: &str,
        reason: Option<String>,
    ) -> Result<StatusChange, OrderFlowError> {
        let status = target
            .trim()
            .parse::<OrderStatusType>()
            .map_err(|_| OrderFlowError::UnknownStatus(target.trim().to_string()))?;
        self.modify_status_for_order(order_id, status, reason).await
    }

    /// Moves an order to a new status.
    ///
    /// | From \ To     | Preparing | Ready | CustomerLate | Served | Cancelled |
    /// |---------------|-----------|-------|--------------|--------|-----------|
    /// | Pending       | ✓         |       |              |        | ✓ (1)     |
    /// | Preparing     |           | ✓     |              |        | ✓ (1)     |
    /// | Ready         |           |       | ✓            | ✓ (2)  | ✓ (1)     |
    /// | CustomerLate  |           |       |              | ✓ (2)  | ✓ (1)     |
    ///
    /// `Served` and `Cancelled` are final. Anything outside the table fails with `IllegalTransition` and changes
    /// nothing.
    ///
    /// The status is written with a compare-and-set against the status the change was validated against. If another
    /// request changed the order in the meantime, this one fails with `ConcurrentStatusChange` and changes nothing.
    ///
    /// After the status is written:
    /// * Customers with a known id receive the notification for the new status.
    /// * (1) The payment is refunded with the payment provider, unless it was paid in cash or has only a placeholder
    ///   reference. The payment record is marked as refunded whether or not the provider refund succeeds. A failed
    ///   refund is logged, raised as a [`RefundFailedEvent`] and reported as [`Compensation::RefundFailed`].
    /// * (2) The payment record is marked as valid.
    /// * `order:updated` is published, and if the queue was affected, so is `queue:updated`.
    ///
    /// Failures in these follow-up steps are logged and do not undo the status change.
    pub async fn modify_status_for_order(
        &self,
        order_id: i64,
        new_status: OrderStatusType,
        reason: Option<String>,
    ) -> Result<StatusChange, OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        let previous_status = order.status;
        if !previous_status.can_transition_to(new_status) {
            debug!("🔄️ Order #{} cannot move from {previous_status} to {new_status}", order.order_number);
            return Err(OrderFlowError::IllegalTransition {
                from: previous_status,
                to: new_status,
                allowed: previous_status.allowed_transitions().to_vec(),
            });
        }
        let reason = reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        let updated = match self.db.update_order_status(order_id, previous_status, new_status, reason).await? {
            Some(order) => order,
            None => {
                let current = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
                warn!(
                    "🔄️ Order #{} changed to {} while it was being moved from {previous_status} to {new_status}",
                    current.order_number, current.status
                );
                return Err(OrderFlowError::ConcurrentStatusChange {
                    expected: previous_status,
                    actual: current.status,
                });
            },
        };
        info!("🔄️ Order #{} moved from {previous_status} to {new_status}", updated.order_number);

        if let Some(notification_type) = NotificationType::for_status(new_status) {
            self.notify(&updated, notification_type).await;
        }
        let compensation = match new_status {
            OrderStatusType::Cancelled => self.refund_cancelled_order(&updated).await,
            OrderStatusType::Served => self.validate_payment(&updated).await,
            _ => Compensation::None,
        };
        self.producers.publish_order_updated(OrderUpdatedEvent::new(updated.clone(), previous_status)).await;
        if previous_status.is_active() || new_status.is_active() {
            self.publish_queue().await;
        }
        Ok(StatusChange { order: updated, previous_status, compensation })
    }

    async fn refund_cancelled_order(&self, order: &Order) -> Compensation {
        let payment = match self.db.fetch_payment_for_order(order.id).await {
            Ok(Some(payment)) => payment,
            Ok(None) => {
                warn!("🔄️💳️ Order #{} was cancelled, but it has no payment record", order.order_number);
                return Compensation::None;
            },
            Err(e) => {
                let reason = format!("Could not load the payment record. {e}");
                return self.refund_failed(order, "unknown".to_string(), reason).await;
            },
        };
        let provider_reference = match payment.method {
            PaymentMethod::Cash => None,
            PaymentMethod::Card => payment.transaction_ref.as_deref().filter(|r| !is_placeholder_reference(r)),
        };
        let compensation = match provider_reference {
            Some(reference) => match self.payments.refund(reference).await {
                Ok(receipt) => Compensation::Refunded { status: receipt.status },
                Err(e) => self.refund_failed(order, reference.to_string(), e.to_string()).await,
            },
            None => {
                debug!("🔄️💳️ Order #{} has no provider payment to refund", order.order_number);
                Compensation::RefundSkipped
            },
        };
        self.mark_payment(order, PaymentStatus::Refunded).await;
        compensation
    }

    async fn refund_failed(&self, order: &Order, reference: String, reason: String) -> Compensation {
        error!(
            "🔄️💳️ Order #{} was cancelled, but payment {reference} could not be refunded. {reason}. The payment is \
             marked as refunded locally; the refund must be issued manually.",
            order.order_number
        );
        let event = RefundFailedEvent {
            order_id: order.id,
            order_number: order.order_number,
            reference: reference.clone(),
            reason: reason.clone(),
        };
        self.producers.publish_refund_failed(event).await;
        Compensation::RefundFailed { reference, reason }
    }

    async fn validate_payment(&self, order: &Order) -> Compensation {
        match self.mark_payment(order, PaymentStatus::Valid).await {
            Some(_) => Compensation::PaymentValidated,
            None => Compensation::None,
        }
    }

    async fn mark_payment(&self, order: &Order, status: PaymentStatus) -> Option<PaymentRecord> {
        match self.db.update_payment_status_for_order(order.id, status).await {
            Ok(record) => record,
            Err(e) => {
                error!("🔄️💳️ Could not mark the payment for order #{} as {status}. {e}", order.order_number);
                None
            },
        }
    }

    async fn notify(&self, order: &Order, notification_type: NotificationType) {
        let Some(notification) = NewNotification::for_order(order, notification_type) else {
            trace!("🔄️ Order #{} is anonymous. No {notification_type} notification", order.order_number);
            return;
        };
        if let Err(e) = self.db.insert_notification(notification).await {
            error!("🔄️ Could not store the {notification_type} notification for order #{}. {e}", order.order_number);
        }
    }

    async fn publish_queue(&self) {
        match self.queue().compute_queue().await {
            Ok(queue) => self.producers.publish_queue_updated(QueueUpdatedEvent::new(queue)).await,
            Err(e) => error!("🔄️🧾 Could not recompute the queue. {e}"),
        }
    }

    pub async fn fetch_order(&self, order_id: i64) -> Result<Order, OrderFlowError> {
        self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))
    }

    pub async fn fetch_order_by_number(&self, order_number: i64) -> Result<Order, OrderFlowError> {
        self.db.fetch_order_by_number(order_number).await?.ok_or(OrderFlowError::OrderNotFound(order_number))
    }

    pub async fn fetch_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError> {
        let orders = self.db.fetch_orders(query).await?;
        Ok(orders)
    }

    pub async fn payment_for_order(&self, order_id: i64) -> Result<Option<PaymentRecord>, OrderFlowError> {
        let payment = self.db.fetch_payment_for_order(order_id).await?;
        Ok(payment)
    }

    /// The order, with its live place in the queue.
    pub async fn track_order(&self, order_id: i64) -> Result<TrackedOrder, OrderFlowError> {
        let order = self.fetch_order(order_id).await?;
        let queue_position =
            if order.status.is_active() { self.queue().position_of(order_id).await? } else { None };
        Ok(TrackedOrder { order, queue_position })
    }

    pub async fn order_stats(&self, since: DateTime<Utc>, until: DateTime<Utc>) -> Result<OrderStats, OrderFlowError> {
        if until <= since {
            return Err(OrderFlowError::ValidationError(format!("The period {since} to {until} is empty")));
        }
        let stats = self.db.fetch_order_stats(since, until).await?;
        Ok(stats)
    }

    /// Statistics for the orders created on the given (UTC) day.
    pub async fn order_stats_for_day(&self, day: NaiveDate) -> Result<OrderStats, OrderFlowError> {
        let invalid = || OrderFlowError::ValidationError(format!("{day} is not a valid day"));
        let start = day.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
        let end = day.checked_add_days(Days::new(1)).and_then(|d| d.and_hms_opt(0, 0, 0)).ok_or_else(invalid)?;
        self.order_stats(Utc.from_utc_datetime(&start), Utc.from_utc_datetime(&end)).await
    }
}
