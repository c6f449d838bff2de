//! Deferred Coordinate Enrichment
//!
//! Background worker that geocodes orders after they were written. Orders are
//! queued by id; the worker reloads each one, resolves its location and
//! stores the coordinate.

use crate::domain::entities::OrderId;
use crate::domain::error::StoreResult;
use crate::domain::ports::{GeoResolver, OrderRepository};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Sending half handed to the order service.
#[derive(Clone)]
pub struct EnrichmentQueue {
    tx: mpsc::UnboundedSender<OrderId>,
}

impl EnrichmentQueue {
    /// Queue an order for geocoding.
    ///
    /// Returns false when the worker has stopped.
    pub fn enqueue(&self, order_id: OrderId) -> bool {
        match self.tx.send(order_id) {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!("enrichment worker gone, order {} stays without coordinates", order_id);
                false
            }
        }
    }
}

/// Drains the queue one order at a time.
pub struct EnrichmentWorker {
    orders: Arc<dyn OrderRepository>,
    resolver: Arc<dyn GeoResolver>,
    rx: mpsc::UnboundedReceiver<OrderId>,
}

impl EnrichmentWorker {
    /// Create a worker and the queue that feeds it.
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        resolver: Arc<dyn GeoResolver>,
    ) -> (Self, EnrichmentQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                orders,
                resolver,
                rx,
            },
            EnrichmentQueue { tx },
        )
    }

    /// Run on the runtime until every queue handle is dropped.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        tracing::info!("enrichment worker started");

        while let Some(order_id) = self.rx.recv().await {
            if let Err(e) = self.enrich(order_id).await {
                tracing::warn!("enrichment of order {} failed: {}", order_id, e);
            }
        }

        tracing::info!("enrichment worker stopped");
    }

    /// Geocode one order.
    ///
    /// Returns true when a coordinate was stored. Orders that vanished, no
    /// longer need geocoding, or moved while resolving are skipped.
    pub async fn enrich(&self, order_id: OrderId) -> StoreResult<bool> {
        let Some(order) = self.orders.get_order(order_id).await? else {
            tracing::debug!("order {} vanished before enrichment", order_id);
            return Ok(false);
        };

        if !order.location.needs_geocoding() {
            return Ok(false);
        }

        let Some(coordinate) = self.resolver.resolve(&order.location.query()).await else {
            return Ok(false);
        };

        // the location may have been edited while the resolver ran
        if !self
            .orders
            .set_coordinate(order_id, &order.location, coordinate)
            .await?
        {
            tracing::debug!("order {} changed during enrichment, {} dropped", order_id, coordinate.key());
            return Ok(false);
        }

        tracing::info!("order {} enriched with {}", order_id, coordinate.key());
        Ok(true)
    }
}
