//! Delivery of media items to the messaging channel.
//!
//! The transport itself sits behind [`Deliver`]. This module provides the job
//! that calls it and two combinators: a dry run for unconfigured nodes and a
//! fallback from a rich send to a degraded one for oversized payloads.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::discovery::MediaItem;
use crate::error::Result;
use crate::scheduler::{Job, JobBase, JobId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("payload too large for {0}")]
    PayloadTooLarge(String),

    #[error("rejected by endpoint: {0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Sends one item to the external endpoint.
#[async_trait]
pub trait Deliver: Send + Sync {
    async fn deliver(
        &self,
        item: &MediaItem,
        stars: u32,
    ) -> std::result::Result<(), DeliveryError>;
}

#[async_trait]
impl<D: Deliver + ?Sized> Deliver for Arc<D> {
    async fn deliver(
        &self,
        item: &MediaItem,
        stars: u32,
    ) -> std::result::Result<(), DeliveryError> {
        (**self).deliver(item, stars).await
    }
}

/// Accepts every item without sending anything.
#[derive(Debug, Clone, Default)]
pub struct DryRunDelivery {
    channel: Option<String>,
}

impl DryRunDelivery {
    pub fn new(channel: Option<String>) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl Deliver for DryRunDelivery {
    async fn deliver(
        &self,
        item: &MediaItem,
        stars: u32,
    ) -> std::result::Result<(), DeliveryError> {
        tracing::info!(
            channel = self.channel.as_deref().unwrap_or("-"),
            item = %item.name,
            path = %item.path.display(),
            stars,
            "Dry run, item not sent"
        );
        Ok(())
    }
}

/// Tries `primary` and, when it reports the payload as too large, sends
/// through `secondary` instead.
#[derive(Debug, Clone)]
pub struct FallbackDelivery<P, S> {
    primary: P,
    secondary: S,
}

impl<P, S> FallbackDelivery<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl<P: Deliver, S: Deliver> Deliver for FallbackDelivery<P, S> {
    async fn deliver(
        &self,
        item: &MediaItem,
        stars: u32,
    ) -> std::result::Result<(), DeliveryError> {
        match self.primary.deliver(item, stars).await {
            Err(DeliveryError::PayloadTooLarge(reason)) => {
                tracing::warn!(
                    item = %item.name,
                    reason = %reason,
                    "Payload too large, using fallback"
                );
                self.secondary.deliver(item, stars).await
            }
            other => other,
        }
    }
}

/// Delivers one discovered item when executed.
pub struct DeliveryJob {
    pub base: JobBase,
    pub item: MediaItem,
    pub stars: u32,
    deliverer: Arc<dyn Deliver>,
}

impl std::fmt::Debug for DeliveryJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryJob")
            .field("base", &self.base)
            .field("item", &self.item)
            .field("stars", &self.stars)
            .finish_non_exhaustive()
    }
}

impl DeliveryJob {
    pub fn new(id: JobId, item: MediaItem, stars: u32, deliverer: Arc<dyn Deliver>) -> Self {
        Self {
            base: JobBase::new(id),
            item,
            stars,
            deliverer,
        }
    }
}

#[async_trait]
impl Job for DeliveryJob {
    fn id(&self) -> &JobId {
        &self.base.id
    }

    async fn execute(&self) -> Result<()> {
        tracing::info!(job_id = %self.base.id, item = %self.item.name, "Start processing file");
        self.deliverer.deliver(&self.item, self.stars).await?;
        Ok(())
    }
}
