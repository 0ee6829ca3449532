#![doc = include_str!("../README.md")]
#![cfg_attr(docrs, feature(doc_cfg))]

// private modules
mod asset;
mod cfg;
mod cursor;
mod error;
mod frame;
mod gate;
mod interpolation;
mod pipeline;
mod telemetry;
mod time;
mod trajectory;

#[cfg(test)]
mod tests;

// prelude
pub mod prelude {
    pub use crate::asset::{resolve_asset, AssetResolver, AssetSource, ResourceHandle};
    pub use crate::cfg::{AccessToken, Config, Extrapolation, Interpolation};
    pub use crate::cursor::{CursorSubscription, HoverEvent, HoverPoint, TimeCursor};
    pub use crate::error::Error;
    pub use crate::frame::{
        AlmanacProvider, EarthRotationModel, FrameRotationProvider, PrimedSpans, RotationSnapshot,
    };
    pub use crate::gate::{PrimeTicket, Readiness, ReadinessGate};
    pub use crate::interpolation::{OrientationInterpolant, PositionInterpolant};
    pub use crate::pipeline::TrajectoryPipeline;
    pub use crate::telemetry::{Sample, TelemetryFrame, TELEMETRY_COLUMNS};
    pub use crate::time::{availability_interval, AvailabilityInterval, TimeRange};
    pub use crate::trajectory::{Trajectory, TrajectoryBuilder};
    // re-export
    pub use hifitime::{Duration, Epoch, TimeScale, Unit};
    pub use nalgebra::{Quaternion, UnitQuaternion, Vector3};
}
