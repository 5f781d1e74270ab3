use anyhow::{anyhow, Result};
use chrono::Utc;
use counter_engine::{
    db_types::{NewMenuItem, OrderStatusType, PaymentMethod},
    events::{EventHandlers, EventHooks, EventType},
    order_objects::{NewOrderRequest, OrderItemRequest, OrderQueryFilter},
    CatalogApi,
    EngineConfig,
    NotificationApi,
    OrderFlowApi,
    SqliteDatabase,
};
use futures_util::FutureExt;
use log::*;
use stripe_tools::StripeApi;
use tokio::task::JoinHandle;

use crate::{
    counter::command_def::{CounterCommand, MenuCommand, OrderCommand},
    formatting::{
        format_menu,
        format_notifications,
        format_order,
        format_orders,
        format_queue,
        format_stats,
        format_status_change,
    },
};

pub async fn handle_counter_command(command: CounterCommand, database_url: Option<String>) -> Result<()> {
    let mut config = EngineConfig::from_env_or_default();
    if let Some(url) = database_url {
        config.database_url = url;
    }
    use CounterCommand::*;
    match command {
        Migrate => migrate(&config).await,
        Menu(menu_command) => {
            let db = open_database(&config).await?;
            let api = CatalogApi::new(db);
            match menu_command {
                MenuCommand::List { all } => list_menu(&api, all).await,
                MenuCommand::Add { name, category, price, description, unavailable } => {
                    let mut item = NewMenuItem::new(name, category, price);
                    if let Some(description) = description {
                        item = item.with_description(description);
                    }
                    if unavailable {
                        item = item.unavailable();
                    }
                    let item = api.add_menu_item(item).await?;
                    println!("Added {} to the menu with id {}", item.name, item.id);
                    Ok(())
                },
                MenuCommand::Availability { id, available } => {
                    let item = api.set_availability(id, available).await?;
                    println!("{} is now {}", item.name, if item.available { "available" } else { "off the menu" });
                    Ok(())
                },
            }
        },
        Order(order_command) => {
            let counter = Counter::start(&config).await?;
            let result = handle_order_command(&counter.api, order_command).await;
            counter.shutdown().await;
            result
        },
        Queue => {
            let counter = Counter::start(&config).await?;
            let result = counter.api.queue().compute_queue().await;
            counter.shutdown().await;
            println!("{}", format_queue(&result?));
            Ok(())
        },
        Stats { day } => {
            let day = day.unwrap_or_else(|| Utc::now().date_naive());
            let counter = Counter::start(&config).await?;
            let result = counter.api.order_stats_for_day(day).await;
            counter.shutdown().await;
            println!("{}", format_stats(day, &result?)?);
            Ok(())
        },
        Notifications { customer_id, unread_only, mark_read } => {
            let db = open_database(&config).await?;
            let api = NotificationApi::new(db);
            let notifications = api.notifications_for_customer(&customer_id, unread_only).await?;
            println!("Notifications for {customer_id}");
            println!("{}", format_notifications(&notifications));
            if mark_read {
                let count = api.mark_all_as_read(&customer_id).await?;
                println!("{count} notifications marked as read");
            }
            Ok(())
        },
    }
}

async fn handle_order_command(api: &OrderFlowApi<SqliteDatabase, StripeApi>, command: OrderCommand) -> Result<()> {
    match command {
        OrderCommand::Place { customer_id, items, extras, payment_reference, cash } => {
            let items = items.into_iter().chain(extras).collect::<Vec<OrderItemRequest>>();
            let mut request = NewOrderRequest::new(items);
            request.customer_id = customer_id;
            request.payment_reference = payment_reference;
            if cash {
                request = request.with_payment_method(PaymentMethod::Cash);
            }
            let tracked = api.create_order(request).await?;
            let position = api.track_order(tracked.order.id).await?.queue_position;
            let mut s = format!("Order #{} placed\n", tracked.order.order_number);
            format_order(&tracked.order, None, position, &mut s)?;
            println!("{s}");
        },
        OrderCommand::List { customer_id, statuses, active, limit } => {
            let mut filter = if active { OrderQueryFilter::active() } else { OrderQueryFilter::default() };
            if let Some(customer_id) = customer_id {
                filter = filter.with_customer_id(customer_id);
            }
            for status in statuses {
                let status = status.parse::<OrderStatusType>().map_err(|e| anyhow!("{e}"))?;
                filter = filter.with_status(status);
            }
            if let Some(limit) = limit {
                filter = filter.with_limit(limit);
            }
            let orders = api.fetch_orders(filter).await?;
            println!("{}", format_orders(&orders));
        },
        OrderCommand::Show { order_number } => {
            let order = api.fetch_order_by_number(order_number).await?;
            let payment = api.payment_for_order(order.id).await?;
            let position = api.track_order(order.id).await?.queue_position;
            let mut s = String::new();
            format_order(&order, payment.as_ref(), position, &mut s)?;
            println!("{s}");
        },
        OrderCommand::Advance { order_number, status, reason } => {
            let order = api.fetch_order_by_number(order_number).await?;
            let change = api.transition_order(order.id, &status, reason).await?;
            println!("{}", format_status_change(&change));
        },
    }
    Ok(())
}

async fn migrate(config: &EngineConfig) -> Result<()> {
    let mut db = SqliteDatabase::new_with_url(&config.database_url, 1).await?;
    db.migrate().await?;
    db.close().await?;
    println!("The database at {} is up to date", config.database_url);
    Ok(())
}

async fn open_database(config: &EngineConfig) -> Result<SqliteDatabase> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections).await?;
    db.migrate().await?;
    Ok(db)
}

async fn list_menu(api: &CatalogApi<SqliteDatabase>, all: bool) -> Result<()> {
    let items = api.menu(!all).await?;
    println!("{}", format_menu(&items));
    Ok(())
}

/// The order flow, wired to the database, Stripe and the operator's event hooks.
struct Counter {
    api: OrderFlowApi<SqliteDatabase, StripeApi>,
    tasks: Vec<JoinHandle<()>>,
}

impl Counter {
    async fn start(config: &EngineConfig) -> Result<Self> {
        let db = open_database(config).await?;
        let stripe = StripeApi::new(config.stripe.clone())?;
        let handlers = EventHandlers::new(config.event_buffer_size, operator_hooks());
        let producers = handlers.producers();
        let tasks = handlers.start_handlers();
        let api = OrderFlowApi::new(db, stripe, producers, config.flow.clone());
        Ok(Self { api, tasks })
    }

    /// Closes the database and waits until every published event has been handled.
    async fn shutdown(self) {
        let Self { mut api, tasks } = self;
        if let Err(e) = api.db_mut().close().await {
            warn!("Could not close the database cleanly. {e}");
        }
        drop(api);
        for task in tasks {
            if let Err(e) = task.await {
                warn!("An event handler did not finish cleanly. {e}");
            }
        }
    }
}

fn operator_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_live_event(|ev: EventType| {
        let name = ev.name();
        match ev.payload() {
            Ok(payload) => info!("📡️ {name} {payload}"),
            Err(e) => warn!("📡️ {name} could not be serialized. {e}"),
        }
        async {}.boxed()
    });
    hooks.on_refund_failed(|ev| {
        eprintln!(
            "⚠️  Order #{} was cancelled but payment {} could not be refunded: {}",
            ev.order_number, ev.reference, ev.reason
        );
        async {}.boxed()
    });
    hooks
}
