//! Telemetry ingestion
use itertools::izip;
use log::debug;

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::{
    prelude::{Epoch, Error},
    time::{availability_interval, AvailabilityInterval},
};

/// Number of columns of the upstream data source contract:
/// time (ms since UNIX epoch), position X/Y/Z, attitude W/X/Y/Z.
pub const TELEMETRY_COLUMNS: usize = 8;

/// Time stamped [Sample] expressed in the rotating frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sample {
    /// Sampling [Epoch]
    pub epoch: Epoch,
    /// Position, in rotating frame coordinates
    pub position: Vector3<f64>,
    /// Attitude of the body relative to the rotating frame.
    /// Components are kept raw, so they may be validated prior normalization.
    pub attitude: Quaternion<f64>,
}

impl Sample {
    /// Builds a new [Sample]
    pub fn new(epoch: Epoch, position: Vector3<f64>, attitude: Quaternion<f64>) -> Self {
        Self {
            epoch,
            position,
            attitude,
        }
    }

    /// True if all components are finite.
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
            && self.attitude.coords.iter().all(|v| v.is_finite())
    }

    /// Normalized attitude, None for null or non finite quaternions.
    pub fn unit_attitude(&self) -> Option<UnitQuaternion<f64>> {
        if !self.is_finite() {
            return None;
        }
        UnitQuaternion::try_new(self.attitude, f64::EPSILON)
    }
}

/// One telemetry refresh: a single trajectory, rebuilt entirely on each update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryFrame {
    samples: Vec<Sample>,
}

impl TelemetryFrame {
    /// Builds a [TelemetryFrame] from parallel columns.
    /// Column 0 is time, 1..=3 position X/Y/Z, 4..=7 attitude W/X/Y/Z.
    /// Trailing columns are ignored.
    pub fn from_columns(columns: &[Vec<f64>]) -> Result<Self, Error> {
        if columns.len() < TELEMETRY_COLUMNS {
            return Err(Error::MalformedTelemetry(format!(
                "expecting {} columns, got {}",
                TELEMETRY_COLUMNS,
                columns.len()
            )));
        }

        let len = columns[0].len();

        for (i, column) in columns.iter().take(TELEMETRY_COLUMNS).enumerate() {
            if column.len() != len {
                return Err(Error::MalformedTelemetry(format!(
                    "column #{} has {} values, time column has {}",
                    i,
                    column.len(),
                    len
                )));
            }
        }

        let samples = izip!(
            &columns[0],
            &columns[1],
            &columns[2],
            &columns[3],
            &columns[4],
            &columns[5],
            &columns[6],
            &columns[7],
        )
        .map(|(t, x, y, z, qw, qx, qy, qz)| {
            Sample::new(
                Epoch::from_unix_milliseconds(*t),
                Vector3::new(*x, *y, *z),
                Quaternion::new(*qw, *qx, *qy, *qz),
            )
        })
        .collect::<Vec<_>>();

        debug!("telemetry frame: {} samples", samples.len());
        Ok(Self { samples })
    }

    /// Builds a [TelemetryFrame] from already formed [Sample]s.
    pub fn from_samples(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Time column
    pub fn instants(&self) -> Vec<Epoch> {
        self.samples.iter().map(|s| s.epoch).collect()
    }

    /// [AvailabilityInterval] of this frame
    pub fn interval(&self) -> Option<AvailabilityInterval> {
        availability_interval(&self.instants())
    }
}
