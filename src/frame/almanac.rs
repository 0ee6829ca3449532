use std::sync::RwLock;

use async_trait::async_trait;
use log::{debug, error, info};

use anise::{
    constants::frames::{EARTH_ITRF93, EARTH_J2000},
    prelude::Almanac,
};

use nalgebra::{Matrix3, Rotation3, UnitQuaternion};

use crate::{
    frame::{FrameRotationProvider, PrimedSpans, RotationSnapshot},
    prelude::{AvailabilityInterval, Epoch, Error},
};

/// [AlmanacProvider] resolves the `ITRF93` to `J2000` rotation with ANISE.
/// Priming loads the orientation kernels (high precision Earth BPC, PCK..)
/// from the configured paths, on a blocking task, once.
pub struct AlmanacProvider {
    /// Kernel files to load on first priming
    kernels: Vec<String>,
    /// Loaded [Almanac]
    almanac: RwLock<Option<Almanac>>,
    primed: PrimedSpans,
}

impl AlmanacProvider {
    /// Creates a new [AlmanacProvider] that will load the provided kernels
    /// on first priming.
    pub fn new(kernels: Vec<String>) -> Self {
        Self {
            kernels,
            almanac: RwLock::new(None),
            primed: PrimedSpans::default(),
        }
    }

    /// Creates a new [AlmanacProvider] from an already loaded [Almanac].
    pub fn from_almanac(almanac: Almanac) -> Self {
        Self {
            kernels: Vec::new(),
            almanac: RwLock::new(Some(almanac)),
            primed: PrimedSpans::default(),
        }
    }

    fn is_loaded(&self) -> bool {
        self.almanac
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    fn load(kernels: Vec<String>, interval: AvailabilityInterval) -> Result<Almanac, Error> {
        let mut almanac = Almanac::default();
        for kernel in kernels.iter() {
            almanac = almanac.load(kernel).map_err(|e| {
                error!("failed to load {}: {}", kernel, e);
                Error::PrimingFailed(interval, format!("{}: {}", kernel, e))
            })?;
            debug!("loaded {}", kernel);
        }
        Ok(almanac)
    }
}

#[async_trait]
impl FrameRotationProvider for AlmanacProvider {
    async fn prime(&self, interval: AvailabilityInterval) -> Result<(), Error> {
        if !self.is_loaded() {
            let kernels = self.kernels.clone();
            info!("loading {} orientation kernel(s)", kernels.len());

            let almanac = tokio::task::spawn_blocking(move || Self::load(kernels, interval))
                .await
                .map_err(|e| Error::PrimingFailed(interval, e.to_string()))??;

            *self.almanac.write().unwrap_or_else(|e| e.into_inner()) = Some(almanac);
        }

        self.primed.insert(interval);
        debug!("almanac primed for {}", interval);
        Ok(())
    }

    fn rotation_at(&self, t: Epoch) -> Result<RotationSnapshot, Error> {
        self.primed.check(t)?;

        let guard = self.almanac.read().unwrap_or_else(|e| e.into_inner());
        let almanac = guard.as_ref().ok_or(Error::NotPrimed(t))?;

        let dcm = almanac
            .rotate(EARTH_ITRF93, EARTH_J2000, t)
            .map_err(|e| Error::FrameResolutionFailed(t, e.to_string()))?;

        // DCM maps ITRF93 coordinates into J2000
        let matrix = Matrix3::from_fn(|i, j| dcm.rot_mat[(i, j)]);
        let rotation = Rotation3::from_matrix_unchecked(matrix);

        Ok(RotationSnapshot::new(
            t,
            UnitQuaternion::from_rotation_matrix(&rotation),
        ))
    }
}
