use log::warn;

use crate::prelude::{Duration, Epoch};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Closed time interval `[start, stop]`, with `start <= stop`.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AvailabilityInterval {
    /// First available [Epoch]
    pub start: Epoch,
    /// Last available [Epoch]
    pub stop: Epoch,
}

impl std::fmt::Display for AvailabilityInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.stop)
    }
}

impl AvailabilityInterval {
    /// Builds a new [AvailabilityInterval]. Bounds are swapped if need be.
    pub fn new(start: Epoch, stop: Epoch) -> Self {
        if stop < start {
            Self {
                start: stop,
                stop: start,
            }
        } else {
            Self { start, stop }
        }
    }

    /// Derives the [AvailabilityInterval] from an ordered column of [Epoch]s:
    /// first and last instants. None when the column is empty.
    pub fn from_instants(instants: &[Epoch]) -> Option<Self> {
        let start = instants.first()?;
        let stop = instants.last()?;
        Some(Self {
            start: *start,
            stop: *stop,
        })
    }

    /// Returns a copy with `stop` extended by `pad`,
    /// to tolerate queries slightly past the last sample.
    pub fn padded(&self, pad: Duration) -> Self {
        Self {
            start: self.start,
            stop: self.stop + pad,
        }
    }

    /// True if `t` lies within this interval (bounds included).
    pub fn contains(&self, t: Epoch) -> bool {
        t >= self.start && t <= self.stop
    }

    /// True if `other` lies entirely within this interval.
    pub fn covers(&self, other: &Self) -> bool {
        self.contains(other.start) && self.contains(other.stop)
    }

    /// Interval span
    pub fn duration(&self) -> Duration {
        self.stop - self.start
    }
}

/// Computes the [AvailabilityInterval] of a telemetry time column.
pub fn availability_interval(instants: &[Epoch]) -> Option<AvailabilityInterval> {
    AvailabilityInterval::from_instants(instants)
}

/// Wall clock bounds selected by the user, from which we derive the
/// interval the frame rotation provider must be primed for.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeRange {
    pub from: Epoch,
    pub to: Epoch,
}

impl TimeRange {
    pub fn new(from: Epoch, to: Epoch) -> Self {
        Self { from, to }
    }

    /// Priming interval: `[from, to + pad]`.
    pub fn priming_interval(&self, pad: Duration) -> AvailabilityInterval {
        if self.to < self.from {
            warn!("reversed time range {} > {}", self.from, self.to);
        }
        AvailabilityInterval::new(self.from, self.to).padded(pad)
    }
}
