use thiserror::Error;

use crate::prelude::{AvailabilityInterval, Epoch};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Telemetry columns do not follow the column contract:
    /// not enough columns, or columns of different lengths.
    #[error("malformed telemetry: {0}")]
    MalformedTelemetry(String),

    /// One sample carries non finite values (NaN, infinite) or a null quaternion.
    /// The whole build is rejected, previous trajectory remains in place.
    #[error("malformed sample #{0} at {1}")]
    MalformedSample(usize, Epoch),

    /// Sample instants must be strictly increasing.
    #[error("unordered samples: #{0} at {1} does not follow its predecessor")]
    UnorderedSamples(usize, Epoch),

    /// Frame rotation could not be resolved at this [Epoch].
    /// Aborts the ongoing trajectory build.
    #[error("frame resolution failed at {0}: {1}")]
    FrameResolutionFailed(Epoch, String),

    /// [FrameRotationProvider] was queried for an [Epoch] it was never primed for.
    /// This is a programming error.
    #[error("frame rotation provider is not primed for {0}")]
    NotPrimed(Epoch),

    /// [FrameRotationProvider] is not ready (yet) for the requested span.
    #[error("frame rotation provider is not ready")]
    NotReady,

    /// Priming of the [FrameRotationProvider] failed.
    #[error("priming failed for {0}: {1}")]
    PrimingFailed(AvailabilityInterval, String),

    /// Visual asset could not be resolved. Never fatal.
    #[error("asset resolution failed: {0}")]
    AssetResolutionFailed(String),

    /// A priming completion arrived for a superseded request.
    #[error("stale readiness (version #{0})")]
    StaleReadiness(u64),

    #[error("unknown interpolation method")]
    UnknownInterpolation,

    #[error("unknown extrapolation policy")]
    UnknownExtrapolation,
}
