//! Incoming-message poller.
//!
//! Periodically lists incoming messages and forwards the ones not seen before.
//! The retry policy configured by `AO_RETRY_LIMIT` lives here, on the caller
//! side; the client itself never retries.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::types::NodeType;
use crate::config::{AoConfig, ClaraConfig};
use crate::platform::{ClientError, SocialClient};

const DEFAULT_BATCH_SIZE: usize = 20;
const DEFAULT_SEEN_CAPACITY: usize = 1000;
/// `tokio::time::interval` rejects a zero period.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
    /// Messages requested per poll.
    pub batch_size: usize,
    /// Extra attempts after a transient failure.
    pub retry_limit: u32,
    /// How many delivered ids to remember for de-duplication.
    pub seen_capacity: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(crate::config::DEFAULT_POLL_INTERVAL_SECS),
            batch_size: DEFAULT_BATCH_SIZE,
            retry_limit: 0,
            seen_capacity: DEFAULT_SEEN_CAPACITY,
        }
    }
}

impl PollerConfig {
    pub fn from_ao_config(config: &AoConfig) -> Self {
        Self {
            interval: config.poll_interval().max(MIN_POLL_INTERVAL),
            retry_limit: config.retry_limit,
            ..Default::default()
        }
    }

    pub fn from_clara_config(config: &ClaraConfig) -> Self {
        Self {
            interval: config.poll_interval().max(MIN_POLL_INTERVAL),
            ..Default::default()
        }
    }
}

/// Bounded memory of delivered message ids.
#[derive(Debug)]
pub struct SeenIds {
    order: VecDeque<String>,
    ids: HashSet<String>,
    capacity: usize,
}

impl SeenIds {
    pub fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::new(),
            ids: HashSet::new(),
            capacity: capacity.max(1),
        }
    }

    /// Record `id`; returns false if it was already present.
    pub fn insert(&mut self, id: &str) -> bool {
        if self.ids.contains(id) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
        self.order.push_back(id.to_string());
        self.ids.insert(id.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

pub struct MessagePoller {
    client: Arc<dyn SocialClient>,
    config: PollerConfig,
}

impl MessagePoller {
    pub fn new(client: Arc<dyn SocialClient>, config: PollerConfig) -> Self {
        Self { client, config }
    }

    /// Start polling on a background task. Polling stops once the receiver is
    /// dropped.
    pub fn spawn(self) -> (mpsc::Receiver<NodeType>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(256);
        let handle = tokio::spawn(async move { self.run(tx).await });
        (rx, handle)
    }

    async fn run(self, tx: mpsc::Sender<NodeType>) {
        let mut seen = SeenIds::new(self.config.seen_capacity);
        let period = self.config.interval.max(MIN_POLL_INTERVAL);
        let mut ticker = tokio::time::interval(period);
        info!("Polling {} every {:?}", self.client.name(), period);

        loop {
            ticker.tick().await;
            match self.poll_once(&mut seen).await {
                Ok(messages) => {
                    for message in messages {
                        if tx.send(message).await.is_err() {
                            debug!("Poller receiver dropped");
                            return;
                        }
                    }
                }
                Err(e) => warn!("Polling {} failed: {}", self.client.name(), e),
            }
            if tx.is_closed() {
                debug!("Poller receiver dropped");
                return;
            }
        }
    }

    /// Fetch one batch and return unseen messages, oldest first.
    pub async fn poll_once(&self, seen: &mut SeenIds) -> Result<Vec<NodeType>, ClientError> {
        let batch = self.fetch_with_retry().await?;
        let mut fresh: Vec<NodeType> = batch
            .into_iter()
            .filter(|m| seen.insert(&m.id))
            .collect();
        fresh.reverse();
        if !fresh.is_empty() {
            debug!("{} new message(s) from {}", fresh.len(), self.client.name());
        }
        Ok(fresh)
    }

    async fn fetch_with_retry(&self) -> Result<Vec<NodeType>, ClientError> {
        let mut attempt = 0;
        loop {
            match self
                .client
                .fetch_incoming_messages(self.config.batch_size)
                .await
            {
                Ok(batch) => return Ok(batch),
                Err(e) if e.is_transient() && attempt < self.config.retry_limit => {
                    let delay = e.suggested_delay(attempt);
                    warn!(
                        "Transient error fetching messages (attempt {}/{}): {}. Retrying in {:?}",
                        attempt + 1,
                        self.config.retry_limit,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
