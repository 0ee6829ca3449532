mod pipeline;

pub use data::*;

use std::{sync::Once, time::Duration as StdDuration};

use async_trait::async_trait;
use log::LevelFilter;

use crate::prelude::{
    AvailabilityInterval, Epoch, Error, FrameRotationProvider, PrimedSpans, RotationSnapshot,
    UnitQuaternion,
};

static INIT: Once = Once::new();

pub fn init_logger() {
    INIT.call_once(|| {
        env_logger::builder()
            .is_test(true)
            .filter_level(LevelFilter::Debug)
            .init();
    });
}

/// Time invariant rotation, primed immediately
#[derive(Debug)]
pub struct ConstantRotation {
    pub rotation: UnitQuaternion<f64>,
    primed: PrimedSpans,
}

impl ConstantRotation {
    pub fn new(rotation: UnitQuaternion<f64>) -> Self {
        Self {
            rotation,
            primed: PrimedSpans::default(),
        }
    }
}

#[async_trait]
impl FrameRotationProvider for ConstantRotation {
    async fn prime(&self, interval: AvailabilityInterval) -> Result<(), Error> {
        self.primed.insert(interval);
        Ok(())
    }

    fn rotation_at(&self, t: Epoch) -> Result<RotationSnapshot, Error> {
        self.primed.check(t)?;
        Ok(RotationSnapshot::new(t, self.rotation))
    }
}

/// Identity rotation, each interval takes its own time to prime
pub struct DelayedProvider {
    delays: Vec<(AvailabilityInterval, StdDuration)>,
    primed: PrimedSpans,
}

impl DelayedProvider {
    pub fn new(delays: Vec<(AvailabilityInterval, StdDuration)>) -> Self {
        Self {
            delays,
            primed: PrimedSpans::default(),
        }
    }
}

#[async_trait]
impl FrameRotationProvider for DelayedProvider {
    async fn prime(&self, interval: AvailabilityInterval) -> Result<(), Error> {
        let delay = self
            .delays
            .iter()
            .find(|(i, _)| *i == interval)
            .map(|(_, delay)| *delay)
            .unwrap_or_default();

        tokio::time::sleep(delay).await;
        self.primed.insert(interval);
        Ok(())
    }

    fn rotation_at(&self, t: Epoch) -> Result<RotationSnapshot, Error> {
        self.primed.check(t)?;
        Ok(RotationSnapshot::new(t, UnitQuaternion::identity()))
    }
}

/// Provider whose priming always fails
pub struct FailingProvider;

#[async_trait]
impl FrameRotationProvider for FailingProvider {
    async fn prime(&self, interval: AvailabilityInterval) -> Result<(), Error> {
        Err(Error::PrimingFailed(interval, "data unavailable".to_string()))
    }

    fn rotation_at(&self, t: Epoch) -> Result<RotationSnapshot, Error> {
        Err(Error::NotPrimed(t))
    }
}
