use counter_engine::{
    db_types::Order,
    events::EventProducers,
    order_objects::StatusChange,
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    traits::{GatewayError, GatewayPaymentStatus, GatewayRefund},
    FlowOptions,
    OrderFlowApi,
    OrderFlowError,
    SqliteDatabase,
};
use cucumber::World;
use log::*;

use crate::support::mocks::MockGateway;

#[derive(Default, Debug, World)]
pub struct CounterWorld {
    pub system: Option<CounterSystem>,
    pub last_order: Option<Result<Order, OrderFlowError>>,
    pub last_change: Option<Result<StatusChange, OrderFlowError>>,
}

#[derive(Debug)]
pub struct CounterSystem {
    pub api: OrderFlowApi<SqliteDatabase, MockGateway>,
}

impl CounterWorld {
    pub fn api(&self) -> &OrderFlowApi<SqliteDatabase, MockGateway> {
        &self.system.as_ref().expect("Counter not initialised").api
    }

    pub async fn order_by_number(&self, order_number: i64) -> Order {
        self.api().fetch_order_by_number(order_number).await.expect("Order does not exist")
    }
}

impl CounterSystem {
    pub async fn new(options: FlowOptions) -> Self {
        let url = random_db_path();
        create_database(&url).await;
        run_migrations(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
        debug!("🚀️ Created database: {url}");
        let api = OrderFlowApi::new(db, counter_gateway(), EventProducers::default(), options);
        Self { api }
    }
}

/// `pi_paid*` payments have succeeded and can be refunded. `pi_disputed*` payments have succeeded, but the provider
/// refuses to refund them. Everything else is unpaid.
fn counter_gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_verify_payment().returning(|reference| {
        if reference.starts_with("pi_paid") || reference.starts_with("pi_disputed") {
            Ok(GatewayPaymentStatus::new("succeeded", true))
        } else {
            Ok(GatewayPaymentStatus::new("requires_payment_method", false))
        }
    });
    gateway.expect_refund_payment().returning(|reference| {
        if reference.starts_with("pi_disputed") {
            Err(GatewayError::Rejected("charge is disputed".into()))
        } else {
            Ok(GatewayRefund::new("succeeded"))
        }
    });
    gateway
}
