//! In-process topic exchange.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;
use tracing::debug;

use crate::{
    topic_matches, Acknowledge, Binding, Broker, Delivery, DeliveryStream, FabricError, Topology,
};

type Message = (String, Vec<u8>);

#[derive(Default)]
struct Inner {
    bindings: Vec<Binding>,
    queues: HashMap<String, VecDeque<Message>>,
}

#[derive(Default)]
struct Shared {
    inner: Mutex<Inner>,
    notify: Notify,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn requeue(&self, queue: &str, message: Message) {
        if let Some(q) = self.lock().queues.get_mut(queue) {
            q.push_front(message);
        }
        self.notify.notify_waiters();
    }
}

/// A broker living entirely in process memory.
///
/// Clones share the same exchange, so each clone stands in for a separate
/// connection. Deliveries dropped without being settled go back to the
/// front of their queue, the way a closed AMQP channel redelivers.
#[derive(Clone, Default)]
pub struct MemoryBroker {
    shared: Arc<Shared>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ready messages in `queue`, or `None` if it was never declared.
    pub fn queue_depth(&self, queue: &str) -> Option<usize> {
        self.shared.lock().queues.get(queue).map(VecDeque::len)
    }

    fn pop(&self, queue: &str) -> Result<Option<Message>, FabricError> {
        let mut inner = self.shared.lock();
        let q = inner
            .queues
            .get_mut(queue)
            .ok_or_else(|| FabricError::UnknownQueue(queue.to_string()))?;
        Ok(q.pop_front())
    }

    fn delivery(&self, queue: &str, message: Message, in_flight: Option<Arc<AtomicUsize>>) -> Delivery {
        let (routing_key, payload) = message;
        let acker = MemoryAcker {
            shared: self.shared.clone(),
            queue: queue.to_string(),
            message: Mutex::new(Some((routing_key.clone(), payload.clone()))),
            in_flight,
            settled: AtomicBool::new(false),
        };
        Delivery::new(routing_key, payload, Box::new(acker))
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn declare(&self, topology: &Topology) -> Result<(), FabricError> {
        let mut inner = self.shared.lock();
        for queue in topology.queues() {
            inner.queues.entry(queue.to_string()).or_default();
        }
        for binding in topology.bindings() {
            if !inner.bindings.contains(&binding) {
                inner.bindings.push(binding);
            }
        }
        Ok(())
    }

    async fn publish(&self, routing_key: &str, payload: &[u8]) -> Result<(), FabricError> {
        {
            let mut inner = self.shared.lock();
            let mut targets: Vec<String> = inner
                .bindings
                .iter()
                .filter(|b| topic_matches(&b.pattern, routing_key))
                .map(|b| b.queue.clone())
                .collect();
            // A queue bound under two matching patterns still gets one copy.
            targets.sort();
            targets.dedup();

            if targets.is_empty() {
                debug!(routing_key, "Unroutable message dropped");
            }

            for queue in targets {
                if let Some(q) = inner.queues.get_mut(&queue) {
                    q.push_back((routing_key.to_string(), payload.to_vec()));
                }
            }
        }
        self.shared.notify.notify_waiters();
        Ok(())
    }

    async fn consume(&self, queue: &str, prefetch: u16) -> Result<DeliveryStream, FabricError> {
        if self.queue_depth(queue).is_none() {
            return Err(FabricError::UnknownQueue(queue.to_string()));
        }

        let in_flight = Arc::new(AtomicUsize::new(0));
        let state = (self.clone(), queue.to_string(), in_flight);

        let stream = futures_util::stream::unfold(state, move |(broker, queue, in_flight)| async move {
            loop {
                let shared = broker.shared.clone();
                let notified = shared.notify.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();

                let has_capacity =
                    prefetch == 0 || in_flight.load(Ordering::SeqCst) < usize::from(prefetch);
                if has_capacity {
                    match broker.pop(&queue) {
                        Ok(Some(message)) => {
                            in_flight.fetch_add(1, Ordering::SeqCst);
                            let delivery = broker.delivery(&queue, message, Some(in_flight.clone()));
                            return Some((Ok(delivery), (broker, queue, in_flight)));
                        }
                        Ok(None) => {}
                        Err(e) => return Some((Err(e), (broker, queue, in_flight))),
                    }
                }

                notified.await;
            }
        });

        Ok(Box::pin(stream))
    }

    async fn get(&self, queue: &str) -> Result<Option<Delivery>, FabricError> {
        Ok(self
            .pop(queue)?
            .map(|message| self.delivery(queue, message, None)))
    }

    async fn purge(&self, queue: &str) -> Result<u32, FabricError> {
        let mut inner = self.shared.lock();
        let q = inner
            .queues
            .get_mut(queue)
            .ok_or_else(|| FabricError::UnknownQueue(queue.to_string()))?;
        let purged = q.len();
        q.clear();
        Ok(u32::try_from(purged).unwrap_or(u32::MAX))
    }
}

struct MemoryAcker {
    shared: Arc<Shared>,
    queue: String,
    message: Mutex<Option<Message>>,
    in_flight: Option<Arc<AtomicUsize>>,
    settled: AtomicBool,
}

impl MemoryAcker {
    /// Mark settled, releasing the prefetch slot. Returns the message if this
    /// call did the settling.
    fn settle(&self) -> Option<Message> {
        if self.settled.swap(true, Ordering::SeqCst) {
            return None;
        }
        if let Some(in_flight) = &self.in_flight {
            in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        let message = self
            .message
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.shared.notify.notify_waiters();
        message
    }
}

#[async_trait]
impl Acknowledge for MemoryAcker {
    async fn ack(&self) -> Result<(), FabricError> {
        self.settle().map(|_| ()).ok_or(FabricError::AlreadySettled)
    }

    async fn reject(&self, requeue: bool) -> Result<(), FabricError> {
        let message = self.settle().ok_or(FabricError::AlreadySettled)?;
        if requeue {
            self.shared.requeue(&self.queue, message);
        }
        Ok(())
    }
}

impl Drop for MemoryAcker {
    fn drop(&mut self) {
        if let Some(message) = self.settle() {
            debug!(queue = %self.queue, "Unsettled delivery requeued");
            self.shared.requeue(&self.queue, message);
        }
    }
}
