use counter_engine::{
    events::EventProducers,
    order_objects::{NewOrderRequest, OrderItemRequest, OrderQueryFilter},
    FlowOptions,
};
use futures_util::future::join_all;
use log::*;

use crate::support::{mocks::paying_gateway, setup, tear_down};

mod support;

const NUM_ORDERS: usize = 25;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn burst_orders() {
    info!("🚀️ Starting order injection test");
    let (api, menu) = setup(paying_gateway(), EventProducers::default(), FlowOptions::default()).await;

    info!("🚀️ Injecting {NUM_ORDERS} orders");
    let requests = (0..NUM_ORDERS).map(|i| {
        let request = NewOrderRequest::new(vec![OrderItemRequest::catalog(menu.burger.id)])
            .for_customer(format!("customer{}", i % 5))
            .with_payment_reference(format!("pi_paid_burst_{i}"));
        api.create_order(request)
    });
    let results = join_all(requests).await;
    let mut numbers = results
        .into_iter()
        .enumerate()
        .map(|(i, r)| match r {
            Ok(tracked) => tracked.order.order_number,
            Err(e) => panic!("Error processing order {i}: {e}"),
        })
        .collect::<Vec<_>>();
    numbers.sort_unstable();
    let expected = (1001..1001 + NUM_ORDERS as i64).collect::<Vec<_>>();
    assert_eq!(numbers, expected, "Order numbers must be unique and gap-free");

    let orders = api.fetch_orders(OrderQueryFilter::default()).await.unwrap();
    assert_eq!(orders.len(), NUM_ORDERS);
    let queue = api.queue().compute_queue().await.unwrap();
    assert_eq!(queue.len(), NUM_ORDERS);
    assert!(queue.windows(2).all(|w| w[0].order.created_at <= w[1].order.created_at));
    tear_down(api).await;
    info!("🚀️ test complete");
}
