use thiserror::Error;

use crate::{
    db_types::OrderStatusType,
    traits::{CatalogError, NotificationApiError, OrderStoreError},
};

/// Renders a list of statuses for error messages.
fn status_list(statuses: &[OrderStatusType]) -> String {
    if statuses.is_empty() {
        "none (final status)".to_string()
    } else {
        statuses.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Invalid order request: {0}")]
    ValidationError(String),
    #[error("The payment has not completed. The payment provider reports '{status}'")]
    PaymentNotVerified { status: String },
    #[error("The payment could not be verified: {0}")]
    PaymentVerificationFailed(String),
    #[error("Unknown order status '{0}'. Valid statuses are: {}", status_list(&OrderStatusType::ALL))]
    UnknownStatus(String),
    #[error("Illegal status change: {from} → {to}. Allowed changes: {}", status_list(.allowed))]
    IllegalTransition { from: OrderStatusType, to: OrderStatusType, allowed: Vec<OrderStatusType> },
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Menu item {0} does not exist")]
    MenuItemNotFound(i64),
    #[error("The order status changed while it was being updated. Expected {expected}, but it is now {actual}")]
    ConcurrentStatusChange { expected: OrderStatusType, actual: OrderStatusType },
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl OrderFlowError {
    /// True for the errors that mean "the thing you asked about does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(self, OrderFlowError::OrderNotFound(_) | OrderFlowError::MenuItemNotFound(_))
    }
}

impl From<OrderStoreError> for OrderFlowError {
    fn from(e: OrderStoreError) -> Self {
        match e {
            OrderStoreError::InvalidOrder(s) => OrderFlowError::ValidationError(s),
            OrderStoreError::DatabaseError(s) => OrderFlowError::DatabaseError(s),
        }
    }
}

impl From<CatalogError> for OrderFlowError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::MenuItemNotFound(id) => OrderFlowError::MenuItemNotFound(id),
            CatalogError::InvalidMenuItem(s) => OrderFlowError::ValidationError(s),
            CatalogError::DatabaseError(s) => OrderFlowError::DatabaseError(s),
        }
    }
}

impl From<NotificationApiError> for OrderFlowError {
    fn from(e: NotificationApiError) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentApiError {
    #[error("Payment verification failed: {0}")]
    PaymentVerificationFailed(String),
    #[error("Refund failed: {0}")]
    RefundFailed(String),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn messages() {
        let e = OrderFlowError::UnknownStatus("delivered".into());
        assert_eq!(
            e.to_string(),
            "Unknown order status 'delivered'. Valid statuses are: pending, preparing, ready, customer_late, served, \
             cancelled"
        );
        let e = OrderFlowError::IllegalTransition {
            from: OrderStatusType::Pending,
            to: OrderStatusType::Ready,
            allowed: OrderStatusType::Pending.allowed_transitions().to_vec(),
        };
        assert_eq!(e.to_string(), "Illegal status change: pending → ready. Allowed changes: preparing, cancelled");
        let e = OrderFlowError::IllegalTransition {
            from: OrderStatusType::Served,
            to: OrderStatusType::Cancelled,
            allowed: vec![],
        };
        assert!(e.to_string().ends_with("none (final status)"));
        assert!(OrderFlowError::MenuItemNotFound(3).is_not_found());
        assert!(!OrderFlowError::ValidationError("x".into()).is_not_found());
    }
}
