//! Trajectory builder
use log::{debug, error};

use nalgebra::{UnitQuaternion, Vector3};

use crate::{
    frame::FrameRotationProvider,
    gate::ReadinessGate,
    interpolation::{OrientationInterpolant, PositionInterpolant},
    prelude::{AvailabilityInterval, Config, Epoch, Error, TelemetryFrame},
};

/// [Trajectory]: continuous time position (rotating frame) and
/// attitude (inertial frame) of the body.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    /// [AvailabilityInterval], including the trailing pad
    pub interval: AvailabilityInterval,
    /// Position, in rotating frame coordinates
    pub position: PositionInterpolant,
    /// Body attitude, in the inertial frame
    pub orientation: OrientationInterpolant,
}

impl Trajectory {
    /// Position at `t`
    pub fn position_at(&self, t: Epoch) -> Option<Vector3<f64>> {
        self.position.at(t)
    }

    /// Inertial attitude at `t`
    pub fn orientation_at(&self, t: Epoch) -> Option<UnitQuaternion<f64>> {
        self.orientation.at(t)
    }
}

/// [TrajectoryBuilder] turns one [TelemetryFrame] into a [Trajectory].
/// Every attitude sample is expressed in the inertial frame prior interpolation.
#[derive(Debug, Clone)]
pub struct TrajectoryBuilder {
    cfg: Config,
}

impl TrajectoryBuilder {
    pub fn new(cfg: &Config) -> Self {
        Self { cfg: cfg.clone() }
    }

    /// Builds a [Trajectory] from this [TelemetryFrame].
    /// ## Returns
    /// - Err([Error::NotReady]) if the gate is not ready: nothing is built.
    /// - Ok(None) if the frame does not contain a single sample.
    /// - Err on first malformed sample or frame resolution failure:
    ///   partial interpolants are never exposed.
    ///
    /// Samples lying outside the interval the gate is ready for are frame
    /// resolution failures, even if the provider was primed for them by
    /// a superseded request.
    pub fn build(
        &self,
        frame: &TelemetryFrame,
        gate: &ReadinessGate,
    ) -> Result<Option<Trajectory>, Error> {
        let Some(ready) = gate.ready_interval() else {
            debug!("trajectory build deferred: gate is not ready");
            return Err(Error::NotReady);
        };
        self.build_with(frame, gate.provider().as_ref(), ready)
    }

    fn build_with(
        &self,
        frame: &TelemetryFrame,
        provider: &dyn FrameRotationProvider,
        ready: AvailabilityInterval,
    ) -> Result<Option<Trajectory>, Error> {
        let samples = frame.samples();

        let Some(interval) = frame.interval() else {
            debug!("empty telemetry frame");
            return Ok(None);
        };

        let mut epochs: Vec<Epoch> = Vec::with_capacity(samples.len());
        let mut positions = Vec::with_capacity(samples.len());
        let mut attitudes = Vec::with_capacity(samples.len());

        for (i, sample) in samples.iter().enumerate() {
            let Some(attitude) = sample.unit_attitude() else {
                error!("{} - sample #{} is malformed", sample.epoch, i);
                return Err(Error::MalformedSample(i, sample.epoch));
            };

            if let Some(prev) = epochs.last() {
                if sample.epoch <= *prev {
                    error!("{} - sample #{} is not chronological", sample.epoch, i);
                    return Err(Error::UnorderedSamples(i, sample.epoch));
                }
            }

            if !ready.contains(sample.epoch) {
                error!("{} - sample #{} is out of {}", sample.epoch, i, ready);
                return Err(Error::FrameResolutionFailed(
                    sample.epoch,
                    format!("out of ready interval {}", ready),
                ));
            }

            let rotation = provider.rotation_at(sample.epoch).map_err(|e| match e {
                Error::FrameResolutionFailed(..) => e,
                e => Error::FrameResolutionFailed(sample.epoch, e.to_string()),
            })?;

            epochs.push(sample.epoch);
            positions.push(sample.position);
            attitudes.push(rotation.to_inertial(&attitude));
        }

        let pad = self.cfg.trailing_pad;

        let position = PositionInterpolant::new(
            &epochs,
            positions,
            self.cfg.interpolation,
            self.cfg.extrapolation,
        )
        .map(|p| p.with_trailing_pad(pad));

        let orientation = OrientationInterpolant::new(&epochs, attitudes, self.cfg.extrapolation)
            .map(|o| o.with_trailing_pad(pad));

        match (position, orientation) {
            (Some(position), Some(orientation)) => {
                debug!(
                    "trajectory: {} samples over {} ({} interpolation)",
                    epochs.len(),
                    interval,
                    position.method()
                );
                Ok(Some(Trajectory {
                    interval: interval.padded(pad),
                    position,
                    orientation,
                }))
            },
            _ => Ok(None),
        }
    }
}
