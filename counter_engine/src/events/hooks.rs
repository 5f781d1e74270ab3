use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    EventHandler,
    EventProducer,
    EventType,
    Handler,
    OrderCreatedEvent,
    OrderUpdatedEvent,
    QueueUpdatedEvent,
    RefundFailedEvent,
};

type BoxedFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// The sending half of every registered hook. APIs hold a copy of this and publish into it.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_created_producer: Vec<EventProducer<OrderCreatedEvent>>,
    pub order_updated_producer: Vec<EventProducer<OrderUpdatedEvent>>,
    pub queue_updated_producer: Vec<EventProducer<QueueUpdatedEvent>>,
    pub refund_failed_producer: Vec<EventProducer<RefundFailedEvent>>,
    pub live_event_producer: Vec<EventProducer<EventType>>,
}

impl EventProducers {
    pub async fn publish_order_created(&self, event: OrderCreatedEvent) {
        for producer in &self.order_created_producer {
            producer.publish_event(event.clone()).await;
        }
        self.publish_live(EventType::from(event)).await;
    }

    pub async fn publish_order_updated(&self, event: OrderUpdatedEvent) {
        for producer in &self.order_updated_producer {
            producer.publish_event(event.clone()).await;
        }
        self.publish_live(EventType::from(event)).await;
    }

    pub async fn publish_queue_updated(&self, event: QueueUpdatedEvent) {
        for producer in &self.queue_updated_producer {
            producer.publish_event(event.clone()).await;
        }
        self.publish_live(EventType::from(event)).await;
    }

    pub async fn publish_refund_failed(&self, event: RefundFailedEvent) {
        for producer in &self.refund_failed_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    async fn publish_live(&self, event: EventType) {
        for producer in &self.live_event_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_order_created: Option<EventHandler<OrderCreatedEvent>>,
    pub on_order_updated: Option<EventHandler<OrderUpdatedEvent>>,
    pub on_queue_updated: Option<EventHandler<QueueUpdatedEvent>>,
    pub on_refund_failed: Option<EventHandler<RefundFailedEvent>>,
    pub on_live_event: Option<EventHandler<EventType>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_created = hooks.on_order_created.map(|f| EventHandler::new(buffer_size, f));
        let on_order_updated = hooks.on_order_updated.map(|f| EventHandler::new(buffer_size, f));
        let on_queue_updated = hooks.on_queue_updated.map(|f| EventHandler::new(buffer_size, f));
        let on_refund_failed = hooks.on_refund_failed.map(|f| EventHandler::new(buffer_size, f));
        let on_live_event = hooks.on_live_event.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_created, on_order_updated, on_queue_updated, on_refund_failed, on_live_event }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_created {
            result.order_created_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_updated {
            result.order_updated_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_queue_updated {
            result.queue_updated_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_refund_failed {
            result.refund_failed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_live_event {
            result.live_event_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns a task per registered hook and returns their join handles. Each task ends once every producer handed
    /// out by [`Self::producers`] has been dropped and its outstanding jobs are done.
    pub fn start_handlers(self) -> Vec<tokio::task::JoinHandle<()>> {
        let mut tasks = Vec::with_capacity(5);
        if let Some(handler) = self.on_order_created {
            tasks.push(tokio::spawn(handler.start_handler()));
        }
        if let Some(handler) = self.on_order_updated {
            tasks.push(tokio::spawn(handler.start_handler()));
        }
        if let Some(handler) = self.on_queue_updated {
            tasks.push(tokio::spawn(handler.start_handler()));
        }
        if let Some(handler) = self.on_refund_failed {
            tasks.push(tokio::spawn(handler.start_handler()));
        }
        if let Some(handler) = self.on_live_event {
            tasks.push(tokio::spawn(handler.start_handler()));
        }
        tasks
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_created: Option<Handler<OrderCreatedEvent>>,
    pub on_order_updated: Option<Handler<OrderUpdatedEvent>>,
    pub on_queue_updated: Option<Handler<QueueUpdatedEvent>>,
    pub on_refund_failed: Option<Handler<RefundFailedEvent>>,
    /// Receives every live-channel event (`order:created`, `order:updated`, `queue:updated`) on a single hook
    pub on_live_event: Option<Handler<EventType>>,
}

impl EventHooks {
    pub fn on_order_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderCreatedEvent) -> BoxedFuture) + Send + Sync + 'static {
        self.on_order_created = Some(Arc::new(f));
        self
    }

    pub fn on_order_updated<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderUpdatedEvent) -> BoxedFuture) + Send + Sync + 'static {
        self.on_order_updated = Some(Arc::new(f));
        self
    }

    pub fn on_queue_updated<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(QueueUpdatedEvent) -> BoxedFuture) + Send + Sync + 'static {
        self.on_queue_updated = Some(Arc::new(f));
        self
    }

    pub fn on_refund_failed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(RefundFailedEvent) -> BoxedFuture) + Send + Sync + 'static {
        self.on_refund_failed = Some(Arc::new(f));
        self
    }

    pub fn on_live_event<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(EventType) -> BoxedFuture) + Send + Sync + 'static {
        self.on_live_event = Some(Arc::new(f));
        self
    }
}
