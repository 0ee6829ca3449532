use std::f64::consts::TAU;

use async_trait::async_trait;
use log::debug;

use nalgebra::{UnitQuaternion, Vector3};

use crate::{
    frame::{FrameRotationProvider, PrimedSpans, RotationSnapshot},
    prelude::{AvailabilityInterval, Epoch, Error},
};

/// Julian date of J2000 reference epoch
const J2000_JDE: f64 = 2_451_545.0;

/// Earth Rotation Angle at J2000 (in turns)
const ERA_J2000_TURNS: f64 = 0.779_057_273_264_0;

/// Earth Rotation Angle rate (in turns per UT1 day)
const ERA_RATE_TURNS_PER_DAY: f64 = 1.002_737_811_911_354_48;

/// [EarthRotationModel] only describes the Earth spin around its pole,
/// using the IERS Earth Rotation Angle and UT1 ≈ UTC.
/// Precession, nutation and polar motion are not modeled: use an
/// [AlmanacProvider](crate::prelude::AlmanacProvider) when accuracy matters.
#[derive(Debug, Default)]
pub struct EarthRotationModel {
    primed: PrimedSpans,
}

impl EarthRotationModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Earth Rotation Angle (in radians, within [0, 2π[)
    pub fn rotation_angle_rad(t: Epoch) -> f64 {
        let du = t.to_jde_utc_days() - J2000_JDE;
        let turns = ERA_J2000_TURNS + ERA_RATE_TURNS_PER_DAY * du;
        turns.rem_euclid(1.0) * TAU
    }
}

#[async_trait]
impl FrameRotationProvider for EarthRotationModel {
    async fn prime(&self, interval: AvailabilityInterval) -> Result<(), Error> {
        debug!("earth rotation model primed for {}", interval);
        self.primed.insert(interval);
        Ok(())
    }

    fn rotation_at(&self, t: Epoch) -> Result<RotationSnapshot, Error> {
        self.primed.check(t)?;
        let era = Self::rotation_angle_rad(t);
        let q = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), era);
        Ok(RotationSnapshot::new(t, q))
    }
}
