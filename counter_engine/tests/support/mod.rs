#![allow(dead_code)]
pub mod mocks;

use counter_common::Cents;
use counter_engine::{
    db_types::{MenuCategory, MenuItem, NewMenuItem},
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    CatalogApi,
    FlowOptions,
    OrderFlowApi,
    OrderManagement,
    SqliteDatabase,
};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::support::mocks::MockGateway;

pub struct Menu {
    pub burger: MenuItem,
    pub fries: MenuItem,
    pub soda: MenuItem,
    /// Off the menu for today
    pub soup: MenuItem,
}

pub async fn new_database() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

pub async fn seed_menu(db: &SqliteDatabase) -> Menu {
    let api = CatalogApi::new(db.clone());
    let burger = api
        .add_menu_item(NewMenuItem::new("Burger", MenuCategory::Main, Cents::from(1250)))
        .await
        .expect("Error adding burger");
    let fries = api
        .add_menu_item(NewMenuItem::new("Fries", MenuCategory::Starter, Cents::from(450)))
        .await
        .expect("Error adding fries");
    let soda =
        api.add_menu_item(NewMenuItem::new("Soda", MenuCategory::Drink, Cents::from(300))).await.expect("Error adding soda");
    let soup = api
        .add_menu_item(NewMenuItem::new("Soup of the day", MenuCategory::Starter, Cents::from(700)).unavailable())
        .await
        .expect("Error adding soup");
    Menu { burger, fries, soda, soup }
}

pub async fn setup(
    gateway: MockGateway,
    producers: EventProducers,
    options: FlowOptions,
) -> (OrderFlowApi<SqliteDatabase, MockGateway>, Menu) {
    let db = new_database().await;
    let menu = seed_menu(&db).await;
    (OrderFlowApi::new(db, gateway, producers, options), menu)
}

pub async fn tear_down<G>(mut api: OrderFlowApi<SqliteDatabase, G>) {
    let url = api.db().url().to_string();
    if let Err(e) = api.db_mut().close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🚀️ Failed to remove database {url}: {e}");
    }
}
