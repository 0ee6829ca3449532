//! Rotating to inertial frame composition
use std::sync::RwLock;

use async_trait::async_trait;
use log::error;

use nalgebra::UnitQuaternion;

use crate::prelude::{AvailabilityInterval, Epoch, Error};

mod almanac;
mod earth;

pub use almanac::AlmanacProvider;
pub use earth::EarthRotationModel;

/// Rotation from the rotating frame to the inertial frame, at a given [Epoch].
///
/// Convention: a vector expressed in the rotating frame `v_r` is expressed
/// in the inertial frame as `v_i = rotating_to_inertial * v_r`.
/// Attitudes compose the same way: `q_inertial = rotating_to_inertial * q_rotating`,
/// where `q_rotating` maps body vectors into the rotating frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RotationSnapshot {
    /// [Epoch] of this snapshot
    pub epoch: Epoch,
    /// Rotating to inertial frame rotation
    pub rotating_to_inertial: UnitQuaternion<f64>,
}

impl RotationSnapshot {
    pub fn new(epoch: Epoch, rotating_to_inertial: UnitQuaternion<f64>) -> Self {
        Self {
            epoch,
            rotating_to_inertial,
        }
    }

    /// Expresses a body to rotating frame attitude in the inertial frame.
    pub fn to_inertial(&self, attitude: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
        self.rotating_to_inertial * attitude
    }

    /// Expresses a body to inertial frame attitude back in the rotating frame.
    pub fn to_rotating(&self, attitude: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
        self.rotating_to_inertial.inverse() * attitude
    }
}

/// Any rotation model (Earth orientation, planetary constants..) should
/// implement [FrameRotationProvider] to contribute to trajectory building.
#[async_trait]
pub trait FrameRotationProvider: Send + Sync {
    /// Prepares the provider for queries within `interval`.
    /// This is where bulk data should be fetched or loaded, so the cost
    /// is amortized over the whole interpolation pass.
    async fn prime(&self, interval: AvailabilityInterval) -> Result<(), Error>;

    /// Returns the [RotationSnapshot] at requested [Epoch].
    /// Only valid once [Self::prime] completed for an interval containing `t`:
    /// implementations must return [Error::NotPrimed] otherwise.
    fn rotation_at(&self, t: Epoch) -> Result<RotationSnapshot, Error>;
}

/// Maximal number of primed intervals kept by [PrimedSpans]
pub const MAX_PRIMED_SPANS: usize = 8;

/// Bookkeeping of the intervals a provider has been primed for.
/// Only the [MAX_PRIMED_SPANS] most recent intervals are kept.
#[derive(Debug, Default)]
pub struct PrimedSpans {
    inner: RwLock<Vec<AvailabilityInterval>>,
}

impl PrimedSpans {
    /// Records a new primed interval
    pub fn insert(&self, interval: AvailabilityInterval) {
        let mut spans = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if !spans.iter().any(|span| span.covers(&interval)) {
            spans.retain(|span| !interval.covers(span));
            spans.push(interval);
            if spans.len() > MAX_PRIMED_SPANS {
                spans.remove(0);
            }
        }
    }

    /// True if `t` lies within a primed interval
    pub fn contains(&self, t: Epoch) -> bool {
        let spans = self.inner.read().unwrap_or_else(|e| e.into_inner());
        spans.iter().any(|span| span.contains(t))
    }

    /// Fails loudly when `t` was never primed for.
    pub fn check(&self, t: Epoch) -> Result<(), Error> {
        if self.contains(t) {
            Ok(())
        } else {
            error!("{} - rotation queried prior priming", t);
            Err(Error::NotPrimed(t))
        }
    }
}
