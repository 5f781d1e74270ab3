//! Stateless pub-sub plumbing for domain events.
//!
//! Each [`EventHandler`] owns one mpsc channel and one async handler function. Producers are cheap clones of the
//! channel's sender. Handlers receive only the event itself and have no access to the engine's state.
use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use log::*;
use tokio::sync::{mpsc, Notify};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

/// Counts handler jobs that are still running, and wakes the shutdown path when the last one completes. The count
/// is released on drop, so a panicking handler cannot stall shutdown.
struct JobGuard {
    in_flight: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl JobGuard {
    fn new(in_flight: &Arc<AtomicUsize>, idle: &Arc<Notify>) -> Self {
        in_flight.fetch_add(1, Ordering::SeqCst);
        Self { in_flight: Arc::clone(in_flight), idle: Arc::clone(idle) }
    }
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_one();
        }
    }
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        Self { listener: receiver, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Runs until every producer has been dropped, then waits for outstanding handler jobs before returning.
    pub async fn start_handler(mut self) {
        debug!("📬️ Starting event handler");
        // Only producers may keep the channel open
        drop(self.sender);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let idle = Arc::new(Notify::new());
        while let Some(ev) = self.listener.recv().await {
            trace!("📬️ Handling event");
            let handler = Arc::clone(&self.handler);
            let guard = JobGuard::new(&in_flight, &idle);
            tokio::spawn(async move {
                (handler)(ev).await;
                drop(guard);
                trace!("📬️ Event handled");
            });
        }
        while in_flight.load(Ordering::SeqCst) > 0 {
            debug!("📬️ Waiting for {} event jobs to complete", in_flight.load(Ordering::SeqCst));
            idle.notified().await;
        }
        debug!("📬️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    /// Fire and forget. A closed channel is logged, never reported to the caller.
    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to send event: {e}");
        }
    }
}
