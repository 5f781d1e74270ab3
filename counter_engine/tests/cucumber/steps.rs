use counter_engine::{
    db_types::{OrderStatusType, PaymentStatus},
    order_objects::{Compensation, NewOrderRequest, OrderItemRequest},
    CatalogManagement,
    NotificationApi,
    OrderFlowError,
};
use cucumber::{then, when};

use crate::cucumber::CounterWorld;

async fn place_order(world: &mut CounterWorld, customer: Option<String>, quantity: i64, item: String, reference: String) {
    let menu = world.api().db().fetch_menu(false).await.expect("Error fetching menu");
    let menu_item = menu.iter().find(|m| m.name == item).expect("Item is not on the menu");
    let mut request = NewOrderRequest::new(vec![OrderItemRequest::catalog(menu_item.id).with_quantity(quantity)]);
    if reference != "none" {
        request = request.with_payment_reference(reference);
    }
    if let Some(customer) = customer {
        request = request.for_customer(customer);
    }
    let result = world.api().create_order(request).await.map(|t| t.order);
    world.last_order = Some(result);
}

#[when(expr = "customer '{word}' orders {int} x {string} paying with [{word}]")]
async fn customer_order(world: &mut CounterWorld, customer: String, quantity: i64, item: String, reference: String) {
    place_order(world, Some(customer), quantity, item, reference).await;
}

#[when(expr = "an anonymous customer orders {int} x {string} paying with [{word}]")]
async fn anonymous_order(world: &mut CounterWorld, quantity: i64, item: String, reference: String) {
    place_order(world, None, quantity, item, reference).await;
}

#[when(expr = "order #{int} is moved to '{word}'")]
async fn move_order(world: &mut CounterWorld, order_number: i64, status: String) {
    let order = world.order_by_number(order_number).await;
    let result = world.api().transition_order(order.id, &status, None).await;
    world.last_change = Some(result);
}

#[when(expr = "order #{int} is cancelled because {string}")]
async fn cancel_order(world: &mut CounterWorld, order_number: i64, reason: String) {
    let order = world.order_by_number(order_number).await;
    let result = world.api().transition_order(order.id, "cancelled", Some(reason)).await;
    world.last_change = Some(result);
}

#[then(expr = "order #{int} was placed for {int} cents")]
async fn order_placed(world: &mut CounterWorld, order_number: i64, total: i64) {
    let order = match world.last_order.as_ref().expect("No order was placed") {
        Ok(order) => order,
        Err(e) => panic!("Order was not placed: {e}"),
    };
    assert_eq!(order.order_number, order_number);
    assert_eq!(order.total_price.value(), total);
}

#[then(expr = "the order is rejected because {string}")]
async fn order_rejected(world: &mut CounterWorld, reason: String) {
    match world.last_order.as_ref().expect("No order was placed") {
        Ok(order) => panic!("Order #{} was accepted", order.order_number),
        Err(e) => assert!(e.to_string().contains(&reason), "'{e}' does not mention '{reason}'"),
    }
}

#[then(expr = "order #{int} has status '{word}'")]
async fn check_status(world: &mut CounterWorld, order_number: i64, status: String) {
    let order = world.order_by_number(order_number).await;
    let expected = status.parse::<OrderStatusType>().expect("Not a valid status");
    assert_eq!(order.status, expected);
}

#[then(expr = "the status change fails with {string}")]
async fn status_change_failed(world: &mut CounterWorld, message: String) {
    match world.last_change.as_ref().expect("No status change was made") {
        Ok(change) => panic!("Status change to {} succeeded", change.order.status),
        Err(e) => assert!(e.to_string().contains(&message), "'{e}' does not mention '{message}'"),
    }
}

#[then(expr = "the refund result is '{word}'")]
async fn refund_result(world: &mut CounterWorld, result: String) {
    let change = match world.last_change.as_ref().expect("No status change was made") {
        Ok(change) => change,
        Err(e) => panic!("Status change failed: {e}"),
    };
    let actual = match &change.compensation {
        Compensation::None => "none",
        Compensation::PaymentValidated => "payment_validated",
        Compensation::RefundSkipped => "refund_skipped",
        Compensation::Refunded { .. } => "refunded",
        Compensation::RefundFailed { .. } => "refund_failed",
    };
    assert_eq!(actual, result);
}

#[then(expr = "the payment for order #{int} is '{word}'")]
async fn payment_status(world: &mut CounterWorld, order_number: i64, status: String) {
    let order = world.order_by_number(order_number).await;
    let payment = world.api().payment_for_order(order.id).await.unwrap().expect("No payment record");
    let expected = match status.as_str() {
        "pending" => PaymentStatus::Pending,
        "valid" => PaymentStatus::Valid,
        "failed" => PaymentStatus::Failed,
        "refunded" => PaymentStatus::Refunded,
        s => panic!("Unknown payment status {s}"),
    };
    assert_eq!(payment.status, expected);
}

#[then(expr = "customer '{word}' has {int} unread notification(s)")]
async fn unread_notifications(world: &mut CounterWorld, customer: String, count: i64) {
    let api = NotificationApi::new(world.api().db().clone());
    assert_eq!(api.unread_count(&customer).await.unwrap(), count);
}

#[then(expr = "the latest notification for '{word}' reads {string}")]
async fn latest_notification(world: &mut CounterWorld, customer: String, message: String) {
    let api = NotificationApi::new(world.api().db().clone());
    let inbox = api.notifications_for_customer(&customer, false).await.unwrap();
    let latest = inbox.first().expect("No notifications");
    assert_eq!(latest.message, message);
}

#[then(expr = "the queue holds orders {string}")]
async fn queue_holds(world: &mut CounterWorld, orders: String) {
    let queue = world.api().queue().compute_queue().await.unwrap();
    let actual = queue.iter().map(|e| format!("#{}", e.order.order_number)).collect::<Vec<_>>().join(", ");
    assert_eq!(actual, orders);
}

#[then(expr = "order #{int} is number {int} in the queue with a wait of {int} minutes")]
async fn queue_position(world: &mut CounterWorld, order_number: i64, position: usize, wait: i64) {
    let order = world.order_by_number(order_number).await;
    let tracked = world.api().track_order(order.id).await.unwrap();
    let pos = tracked.queue_position.expect("Order is not queued");
    assert_eq!(pos.position, position);
    assert_eq!(pos.estimated_wait.num_minutes(), wait);
}

#[then(expr = "order #{int} is not in the queue")]
async fn not_queued(world: &mut CounterWorld, order_number: i64) {
    let order = world.order_by_number(order_number).await;
    let tracked = world.api().track_order(order.id).await.unwrap();
    assert!(tracked.queue_position.is_none());
}

#[then(expr = "no order was stored")]
async fn nothing_stored(world: &mut CounterWorld) {
    let orders = world.api().fetch_orders(Default::default()).await.unwrap();
    assert!(orders.is_empty(), "{} orders found", orders.len());
    if let Some(Err(e)) = world.last_order.as_ref() {
        assert!(!matches!(e, OrderFlowError::DatabaseError(_)), "{e}");
    }
}
