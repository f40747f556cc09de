//! Send one request and wait for one reply.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{publish_json, Broker, FabricError};

/// Where and how long to wait for a reply.
#[derive(Debug, Clone)]
pub struct ReplyWait {
    /// Queue replies are delivered to.
    pub reply_queue: String,

    /// Give up after this long.
    pub timeout: Duration,

    /// Delay between polls of an empty reply queue.
    pub poll_interval: Duration,
}

impl ReplyWait {
    pub fn new(reply_queue: impl Into<String>) -> Self {
        Self {
            reply_queue: reply_queue.into(),
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(500),
        }
    }

    /// Builder method to set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder method to set the poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Publish `request` under `request_key` and wait for the first decodable
/// reply on `wait.reply_queue`.
///
/// The reply queue is purged first so a reply left over from an earlier
/// round cannot satisfy this one. Replies that fail to decode are acked and
/// skipped.
pub async fn request_reply<B, Req, Rep>(
    broker: &B,
    request_key: &str,
    request: &Req,
    wait: &ReplyWait,
) -> Result<Rep, FabricError>
where
    B: Broker + ?Sized,
    Req: Serialize + Sync,
    Rep: DeserializeOwned,
{
    let stale = broker.purge(&wait.reply_queue).await?;
    if stale > 0 {
        info!(queue = %wait.reply_queue, stale, "Discarded stale replies");
    }

    publish_json(broker, request_key, request).await?;
    debug!(request_key, "Request published, waiting for reply");

    let deadline = Instant::now() + wait.timeout;
    loop {
        if let Some(delivery) = broker.get(&wait.reply_queue).await? {
            let decoded = delivery.decode::<Rep>();
            delivery.ack().await?;
            match decoded {
                Ok(reply) => return Ok(reply),
                Err(e) => warn!(queue = %wait.reply_queue, error = %e, "Malformed reply discarded"),
            }
            continue;
        }

        if Instant::now() >= deadline {
            return Err(FabricError::Timeout(wait.reply_queue.clone()));
        }
        tokio::time::sleep(wait.poll_interval).await;
    }
}
