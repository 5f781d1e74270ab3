use counter_common::Cents;
use counter_engine::{
    db_types::{MenuCategory, NewMenuItem},
    CatalogApi,
    FlowOptions,
};
use cucumber::given;

use crate::cucumber::{counter_world::CounterSystem, CounterWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut CounterWorld) {
    let system = CounterSystem::new(FlowOptions::default()).await;
    world.system = Some(system);
}

#[given("a fresh install with payment verification disabled")]
async fn fresh_database_without_payments(world: &mut CounterWorld) {
    let system = CounterSystem::new(FlowOptions::default().with_payment_verification_skipped()).await;
    world.system = Some(system);
}

#[given(expr = "the menu has {string} as a {word} for {int} cents")]
async fn add_menu_item(world: &mut CounterWorld, name: String, category: String, price: i64) {
    let category = category.parse::<MenuCategory>().expect("Not a valid menu category");
    let api = CatalogApi::new(world.api().db().clone());
    api.add_menu_item(NewMenuItem::new(name, category, Cents::from(price))).await.expect("Error adding menu item");
}
