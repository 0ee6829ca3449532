#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use hifitime::Unit;

use crate::{asset::AssetSource, prelude::Duration};

mod interpolation;
pub use interpolation::{Extrapolation, Interpolation};

/// Access credential to the external services (frame rotation data, assets).
/// Explicitly threaded into each client: there is no process wide default.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: &str) -> Self {
        Self(token.to_string())
    }

    /// Raw credential
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccessToken(***)")
    }
}

fn default_trailing_pad() -> Duration {
    Duration::ZERO
}

fn default_priming_pad() -> Duration {
    1.0 * Unit::Day
}

fn default_follow_hover() -> bool {
    true
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Position [Interpolation] method
    #[cfg_attr(feature = "serde", serde(default))]
    pub interpolation: Interpolation,

    /// Interpolants behavior outside of the sample span
    #[cfg_attr(feature = "serde", serde(default))]
    pub extrapolation: Extrapolation,

    /// Pad added past the last sample, when deriving the availability interval.
    #[cfg_attr(feature = "serde", serde(default = "default_trailing_pad"))]
    pub trailing_pad: Duration,

    /// Pad added past the end of the selected time range, when priming
    /// the frame rotation provider.
    #[cfg_attr(feature = "serde", serde(default = "default_priming_pad"))]
    pub priming_pad: Duration,

    /// Follow time hover notifications. When disabled, the time cursor
    /// only follows the trailing edge of the data.
    #[cfg_attr(feature = "serde", serde(default = "default_follow_hover"))]
    pub follow_hover: bool,

    /// Optional visual asset
    #[cfg_attr(feature = "serde", serde(default))]
    pub asset: Option<AssetSource>,

    /// Access credential to the external services
    #[cfg_attr(feature = "serde", serde(default))]
    pub access_token: Option<AccessToken>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::default(),
            extrapolation: Extrapolation::default(),
            trailing_pad: default_trailing_pad(),
            priming_pad: default_priming_pad(),
            follow_hover: default_follow_hover(),
            asset: None,
            access_token: None,
        }
    }
}

impl Config {
    /// Copies and returns [Config] with desired [Interpolation] method
    pub fn with_interpolation(&self, interpolation: Interpolation) -> Self {
        let mut s = self.clone();
        s.interpolation = interpolation;
        s
    }

    /// Copies and returns [Config] with desired [Extrapolation] policy
    pub fn with_extrapolation(&self, extrapolation: Extrapolation) -> Self {
        let mut s = self.clone();
        s.extrapolation = extrapolation;
        s
    }

    /// Copies and returns [Config] with desired trailing pad
    pub fn with_trailing_pad(&self, pad: Duration) -> Self {
        let mut s = self.clone();
        s.trailing_pad = pad;
        s
    }

    /// Copies and returns [Config] with desired priming pad
    pub fn with_priming_pad(&self, pad: Duration) -> Self {
        let mut s = self.clone();
        s.priming_pad = pad;
        s
    }

    /// Copies and returns [Config] with hover following enabled or disabled
    pub fn with_follow_hover(&self, follow: bool) -> Self {
        let mut s = self.clone();
        s.follow_hover = follow;
        s
    }

    /// Copies and returns [Config] with desired [AssetSource]
    pub fn with_asset(&self, asset: AssetSource) -> Self {
        let mut s = self.clone();
        s.asset = Some(asset);
        s
    }

    /// Copies and returns [Config] with desired [AccessToken]
    pub fn with_access_token(&self, token: AccessToken) -> Self {
        let mut s = self.clone();
        s.access_token = Some(token);
        s
    }

    /// True if switching from `self` to `other` requires rebuilding
    /// the trajectory (interpolants must be regenerated).
    pub(crate) fn requires_rebuild(&self, other: &Self) -> bool {
        self.interpolation != other.interpolation
            || self.extrapolation != other.extrapolation
            || self.trailing_pad != other.trailing_pad
    }
}
