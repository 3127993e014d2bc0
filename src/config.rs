use std::net::SocketAddr;

/// Settings for how batch items are delivered.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Target channel. When unset, deliveries are dry runs.
    pub channel: Option<String>,
    /// Every `stars_every`-th item of a batch (first included) is sent free.
    /// Zero disables free items.
    pub stars_every: usize,
    /// Stars attached to every other item.
    pub stars: u32,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            channel: None,
            stars_every: 10,
            stars: 10,
        }
    }
}

impl DeliveryConfig {
    /// Check if a delivery channel is configured.
    pub fn is_configured(&self) -> bool {
        self.channel
            .as_deref()
            .map(|c| !c.trim().is_empty())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub listen_addr: SocketAddr,
    pub workers: usize,
    pub queue_capacity: usize,
    pub delivery: DeliveryConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            workers: 1,
            queue_capacity: 100,
            delivery: DeliveryConfig::default(),
        }
    }
}

impl RelayConfig {
    pub fn new(listen_addr: SocketAddr) -> Self {
        Self {
            listen_addr,
            ..Default::default()
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.delivery.channel = Some(channel.into());
        self
    }
}
