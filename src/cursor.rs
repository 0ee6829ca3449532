//! Time cursor
use std::sync::{Arc, RwLock};

use log::{debug, trace, warn};
use tokio::{sync::broadcast, task::JoinHandle};

use crate::prelude::{AvailabilityInterval, Epoch};

/// Point carried by a [HoverEvent]
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct HoverPoint {
    /// Hovered instant, if any
    pub time: Option<Epoch>,
}

/// Time hover notification, as delivered by the notification stream
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct HoverEvent {
    pub point: Option<HoverPoint>,
}

impl HoverEvent {
    /// Builds a [HoverEvent] carrying this [Epoch]
    pub fn at(t: Epoch) -> Self {
        Self {
            point: Some(HoverPoint { time: Some(t) }),
        }
    }

    /// Hovered instant, if any
    pub fn time(&self) -> Option<Epoch> {
        self.point.and_then(|point| point.time)
    }
}

/// [TimeCursor] is the single "current instant" used to sample the trajectory.
/// Clones share the same state: last writer wins.
#[derive(Debug, Clone, Default)]
pub struct TimeCursor {
    inner: Arc<RwLock<Option<Epoch>>>,
}

impl TimeCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current instant, None when no data is available
    pub fn current(&self) -> Option<Epoch> {
        *self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn set(&self, t: Option<Epoch>) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = t;
    }

    /// Moves the cursor to the trailing edge of `interval`, clears it when
    /// no interval is available.
    pub fn set_from_trailing_edge(&self, interval: Option<AvailabilityInterval>) {
        let t = interval.map(|interval| interval.stop);
        debug!("cursor: trailing edge {:?}", t);
        self.set(t);
    }

    /// Unconditionally moves the cursor to `t`, even outside
    /// of the current availability interval.
    pub fn set_from_notification(&self, t: Epoch) {
        trace!("cursor: notification {}", t);
        self.set(Some(t));
    }

    /// Clears the cursor
    pub fn clear(&self) {
        self.set(None);
    }

    /// Follows the hover notification stream until the returned
    /// [CursorSubscription] is dropped. Must be called within a tokio runtime.
    pub fn follow(&self, mut rx: broadcast::Receiver<HoverEvent>) -> CursorSubscription {
        let cursor = self.clone();

        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if let Some(t) = event.time() {
                            cursor.set_from_notification(t);
                        }
                    },
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("cursor: skipped {} hover notifications", n);
                    },
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("cursor: notification stream closed");
                        break;
                    },
                }
            }
        });

        CursorSubscription { handle }
    }
}

/// Scoped subscription to the hover notification stream.
/// Dropping it releases the subscription.
#[derive(Debug)]
pub struct CursorSubscription {
    handle: JoinHandle<()>,
}

impl CursorSubscription {
    /// True while the subscription is being served
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for CursorSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
