use std::fmt::Write;

use anyhow::Result;
use chrono::NaiveDate;
use counter_engine::{
    db_types::{MenuItem, Notification, Order, OrderStats, PaymentRecord},
    order_objects::{Compensation, QueueEntry, QueuePosition, StatusChange},
};
use prettytable::{
    format::{LinePosition, LineSeparator, TableFormat},
    row,
    Table,
};

fn markdown_format() -> TableFormat {
    prettytable::format::FormatBuilder::new()
        .column_separator('|')
        .borders('|')
        .separator(LinePosition::Title, LineSeparator::new('-', '|', '|', '|'))
        .padding(1, 1)
        .build()
}

fn markdown_style(table: &mut Table) {
    table.set_format(markdown_format());
}

pub fn format_menu(items: &[MenuItem]) -> String {
    if items.is_empty() {
        return "The menu is empty".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row!["ID", "Category", "Name", "Price", "Available", "Description"]);
    items.iter().for_each(|item| {
        table.add_row(row![
            item.id,
            item.category.to_string(),
            item.name,
            r->item.price.to_string(),
            if item.available { "yes" } else { "no" },
            item.description.as_deref().unwrap_or_default()
        ]);
    });
    markdown_style(&mut table);
    format!("{table}\n")
}

pub fn format_orders(orders: &[Order]) -> String {
    if orders.is_empty() {
        return "No orders".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row!["Order #", "Customer", "Items", "Total", "Status", "Created At", "Updated At"]);
    orders.iter().for_each(|order| {
        let items = order.items.iter().map(|i| i.quantity).sum::<i64>();
        table.add_row(row![
            order.order_number,
            order.customer_id.as_deref().unwrap_or("-"),
            r->items,
            r->order.total_price.to_string(),
            order.status.to_string(),
            order.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            order.updated_at.format("%Y-%m-%d %H:%M:%S").to_string()
        ]);
    });
    markdown_style(&mut table);
    format!("{table}\n")
}

pub fn format_order(
    order: &Order,
    payment: Option<&PaymentRecord>,
    position: Option<QueuePosition>,
    f: &mut dyn Write,
) -> Result<()> {
    writeln!(f, "Order #{:<10} Created {}", order.order_number, order.created_at)?;
    writeln!(f, "Customer: {}", order.customer_id.as_deref().unwrap_or("anonymous"))?;
    writeln!(f, "[{:^15}]            Updated {}", order.status.to_string(), order.updated_at)?;
    if let Some(reason) = &order.cancellation_reason {
        writeln!(f, "Cancelled because: {reason}")?;
    }
    if let Some(served_at) = order.served_at {
        writeln!(f, "Served at: {served_at}")?;
    }
    if let Some(position) = position {
        writeln!(
            f,
            "Queue position: {} (about {} minutes)",
            position.position,
            position.estimated_wait.num_minutes()
        )?;
    }
    writeln!(f, "-----------------------------------------------------------------------------")?;
    for item in &order.items {
        writeln!(
            f,
            "{:>3} x {:<40} @ {:>9} = {:>10}",
            item.quantity,
            item.name,
            item.unit_price.to_string(),
            item.line_total().to_string()
        )?;
    }
    writeln!(f, "-----------------------------------------------------------------------------")?;
    writeln!(f, "Total: {:>10}", order.total_price.to_string())?;
    match payment {
        Some(p) => writeln!(
            f,
            "Payment: {} {} by {} [{}]",
            p.amount,
            p.status,
            p.method,
            p.transaction_ref.as_deref().unwrap_or("no reference")
        )?,
        None => writeln!(f, "Payment: no payment record")?,
    }
    writeln!(f, "-----------------------------------------------------------------------------\n")?;
    Ok(())
}

pub fn format_queue(queue: &[QueueEntry]) -> String {
    if queue.is_empty() {
        return "Nobody is waiting".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row!["Position", "Order #", "Customer", "Status", "Est. wait (min)", "Ordered at"]);
    queue.iter().for_each(|entry| {
        table.add_row(row![
            r->entry.position,
            entry.order.order_number,
            entry.order.customer_id.as_deref().unwrap_or("-"),
            entry.order.status.to_string(),
            r->entry.estimated_wait.num_minutes(),
            entry.order.created_at.format("%H:%M:%S").to_string()
        ]);
    });
    markdown_style(&mut table);
    format!("{table}\n")
}

pub fn format_stats(day: NaiveDate, stats: &OrderStats) -> Result<String> {
    let mut f = String::new();
    writeln!(f, "===============================================================================")?;
    writeln!(f, "Orders for {day}")?;
    writeln!(f, "===============================================================================")?;
    writeln!(f, "Total orders:     {:>6}", stats.total_orders)?;
    writeln!(f, "Served:           {:>6}", stats.served)?;
    writeln!(f, "At the pass:      {:>6}", stats.ready)?;
    writeln!(f, "Customer late:    {:>6}", stats.customer_late)?;
    writeln!(f, "Cancelled:        {:>6}", stats.cancelled)?;
    writeln!(f, "Lost revenue:     {:>9}", stats.cancelled_value.to_string())?;
    Ok(f)
}

pub fn format_notifications(notifications: &[Notification]) -> String {
    if notifications.is_empty() {
        return "No notifications".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row!["ID", "Order ID", "", "Message", "Sent At"]);
    notifications.iter().for_each(|n| {
        table.add_row(row![
            n.id,
            n.order_id,
            if n.is_read { " " } else { "*" },
            n.message,
            n.created_at.format("%Y-%m-%d %H:%M:%S").to_string()
        ]);
    });
    markdown_style(&mut table);
    format!("{table}\n")
}

pub fn format_status_change(change: &StatusChange) -> String {
    let summary =
        format!("Order #{} moved from {} to {}", change.order.order_number, change.previous_status, change.order.status);
    match &change.compensation {
        Compensation::None => summary,
        Compensation::PaymentValidated => format!("{summary}. Payment marked as valid."),
        Compensation::RefundSkipped => format!("{summary}. No provider payment to refund."),
        Compensation::Refunded { status } => format!("{summary}. Payment refunded ({status})."),
        Compensation::RefundFailed { reference, reason } => format!(
            "{summary}.\n⚠️  The refund for payment {reference} FAILED: {reason}\n⚠️  The payment is marked as refunded. \
             Issue the refund manually."
        ),
    }
}
