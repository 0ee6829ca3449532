//! Visual asset resolution
use async_trait::async_trait;
use log::{debug, error};

use crate::{cfg::AccessToken, prelude::Error};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Where the visual representation of the body comes from
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AssetSource {
    /// Raw URI, used as a resolved handle directly
    Uri(String),
    /// Asset identifier, to be resolved by an [AssetResolver]
    Id(u64),
}

/// Resolved visual asset
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceHandle {
    /// Resolved URI
    pub uri: String,
}

/// External asset service
#[async_trait]
pub trait AssetResolver: Send + Sync {
    /// Resolves an asset identifier into a [ResourceHandle].
    async fn resolve_by_id(&self, id: u64, token: &AccessToken) -> Result<ResourceHandle, Error>;
}

/// Resolves the [AssetSource]. Failures are logged and degrade to no asset.
pub async fn resolve_asset(
    source: &AssetSource,
    resolver: &dyn AssetResolver,
    token: Option<&AccessToken>,
) -> Option<ResourceHandle> {
    match source {
        AssetSource::Uri(uri) => Some(ResourceHandle { uri: uri.clone() }),
        AssetSource::Id(id) => {
            let Some(token) = token else {
                error!(
                    "{}",
                    Error::AssetResolutionFailed(format!("asset #{} requires an access token", id))
                );
                return None;
            };
            match resolver.resolve_by_id(*id, token).await {
                Ok(handle) => {
                    debug!("asset #{} resolved: {}", id, handle.uri);
                    Some(handle)
                },
                Err(e) => {
                    error!("asset #{} - {}", id, e);
                    None
                },
            }
        },
    }
}
