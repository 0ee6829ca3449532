use crate::prelude::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Position interpolation method
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Interpolation {
    /// Piecewise linear interpolation. Continuous, but velocity
    /// is discontinuous at every sample.
    Linear,

    /// Cubic Hermite interpolation, tangents estimated by finite differences.
    /// Position and velocity are continuous, linear motion is reproduced exactly.
    #[default]
    Hermite,
}

impl std::fmt::Display for Interpolation {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Linear => write!(fmt, "linear"),
            Self::Hermite => write!(fmt, "hermite"),
        }
    }
}

impl std::str::FromStr for Interpolation {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linear" | "lerp" => Ok(Self::Linear),
            "hermite" | "cubic" => Ok(Self::Hermite),
            _ => Err(Error::UnknownInterpolation),
        }
    }
}

/// Behavior of the interpolants outside of the sample span
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Extrapolation {
    /// Hold first (last) value prior (past) the sample span
    #[default]
    Hold,
    /// Interpolants are undefined outside the sample span
    Reject,
}

impl std::fmt::Display for Extrapolation {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Hold => write!(fmt, "hold"),
            Self::Reject => write!(fmt, "reject"),
        }
    }
}

impl std::str::FromStr for Extrapolation {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hold" | "clamp" => Ok(Self::Hold),
            "reject" | "none" => Ok(Self::Reject),
            _ => Err(Error::UnknownExtrapolation),
        }
    }
}
