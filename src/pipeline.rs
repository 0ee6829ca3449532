//! State derivation pipeline
use std::sync::Arc;

use log::{debug, info, warn};

use nalgebra::{UnitQuaternion, Vector3};
use tokio::{sync::broadcast, task::JoinHandle};

use crate::{
    asset::{resolve_asset, AssetResolver, ResourceHandle},
    cursor::{CursorSubscription, HoverEvent, TimeCursor},
    frame::FrameRotationProvider,
    gate::{Readiness, ReadinessGate},
    prelude::{AvailabilityInterval, Config, Epoch, Error, TelemetryFrame, TimeRange},
    trajectory::{Trajectory, TrajectoryBuilder},
};

/// [TrajectoryPipeline] derives a queryable [Trajectory] from telemetry
/// refreshes, once the frame rotation provider is ready for the selected
/// time range. Everything it exposes is read only for the consumer.
pub struct TrajectoryPipeline {
    /// [Config] currently applied
    cfg: Config,
    gate: ReadinessGate,
    cursor: TimeCursor,
    /// Latest valid [Trajectory]
    trajectory: Option<Trajectory>,
    /// Latest [TelemetryFrame], kept for rebuilds
    frame: Option<TelemetryFrame>,
    /// Latest [TelemetryFrame] was never built: cursor moves to its trailing edge
    refreshed: bool,
    /// Bumped on every meaningful change: the consumer rebuilds its state
    generation: u64,
    subscription: Option<CursorSubscription>,
}

impl TrajectoryPipeline {
    /// Creates a new [TrajectoryPipeline]
    pub fn new(cfg: &Config, provider: Arc<dyn FrameRotationProvider>) -> Self {
        Self {
            cfg: cfg.clone(),
            gate: ReadinessGate::new(provider),
            cursor: TimeCursor::new(),
            trajectory: None,
            frame: None,
            refreshed: false,
            generation: 0,
            subscription: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Consumer generation counter
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn readiness(&self) -> Readiness {
        self.gate.readiness()
    }

    /// Selects a new [TimeRange]: primes the frame rotation provider for
    /// that range, padded. Returns the priming task, if a new one was required.
    pub fn set_time_range(&mut self, range: TimeRange) -> Option<JoinHandle<()>> {
        let interval = range.priming_interval(self.cfg.priming_pad);
        self.gate.request(interval)
    }

    /// Waits for the latest priming request to complete,
    /// then rebuilds from the latest telemetry.
    pub async fn wait_ready(&mut self) -> Result<AvailabilityInterval, Error> {
        let interval = self.gate.wait_ready().await?;
        if self.frame.is_some() {
            self.rebuild()?;
        }
        Ok(interval)
    }

    /// Ingests raw telemetry columns, see [TelemetryFrame::from_columns].
    pub fn ingest_columns(&mut self, columns: &[Vec<f64>]) -> Result<bool, Error> {
        let frame = TelemetryFrame::from_columns(columns).map_err(|e| {
            warn!("telemetry rejected: {}", e);
            e
        })?;
        self.ingest(frame)
    }

    /// Ingests a new [TelemetryFrame]. Returns true if the trajectory was rebuilt,
    /// false if the build is deferred until the gate opens.
    /// On failure, the previous trajectory remains in place.
    /// Once built, the cursor moves to the trailing edge of the new trajectory.
    pub fn ingest(&mut self, frame: TelemetryFrame) -> Result<bool, Error> {
        self.frame = Some(frame);
        self.refreshed = true;
        self.rebuild()
    }

    /// Rebuilds the trajectory from the latest telemetry.
    /// The cursor is left untouched, unless that telemetry was never built.
    pub fn rebuild(&mut self) -> Result<bool, Error> {
        let Some(frame) = &self.frame else {
            return Ok(false);
        };

        let builder = TrajectoryBuilder::new(&self.cfg);

        match builder.build(frame, &self.gate) {
            Ok(trajectory) => {
                if self.refreshed {
                    self.cursor
                        .set_from_trailing_edge(trajectory.as_ref().map(|t| t.interval));
                    self.refreshed = false;
                }
                self.trajectory = trajectory;
                self.generation += 1;
                Ok(true)
            },
            Err(Error::NotReady) => Ok(false),
            Err(e) => {
                warn!("trajectory build failed: {}", e);
                Err(e)
            },
        }
    }

    /// Applies a new [Config]. Returns true if it differs from the current one.
    pub fn reconfigure(&mut self, cfg: &Config) -> Result<bool, Error> {
        if *cfg == self.cfg {
            return Ok(false);
        }

        let rebuild = self.cfg.requires_rebuild(cfg);

        if !cfg.follow_hover && self.subscription.take().is_some() {
            debug!("hover notifications released");
        }

        self.cfg = cfg.clone();
        self.generation += 1;
        info!("reconfigured (generation #{})", self.generation);

        if rebuild {
            self.rebuild()?;
        }

        Ok(true)
    }

    /// Follows the hover notification stream, when enabled by [Config].
    /// Any previous subscription is released.
    pub fn follow(&mut self, rx: broadcast::Receiver<HoverEvent>) -> bool {
        self.subscription = None;
        if self.cfg.follow_hover {
            self.subscription = Some(self.cursor.follow(rx));
            true
        } else {
            debug!("hover notifications disabled");
            false
        }
    }

    /// Releases the hover notification subscription
    pub fn unfollow(&mut self) {
        self.subscription = None;
    }

    /// Applies a single hover notification, when enabled by [Config].
    pub fn on_hover(&self, event: &HoverEvent) {
        if self.cfg.follow_hover {
            if let Some(t) = event.time() {
                self.cursor.set_from_notification(t);
            }
        }
    }

    /// Resolves the configured visual asset, if any. Never fails.
    pub async fn resolve_asset(&self, resolver: &dyn AssetResolver) -> Option<ResourceHandle> {
        let source = self.cfg.asset.as_ref()?;
        resolve_asset(source, resolver, self.cfg.access_token.as_ref()).await
    }

    /// Latest valid [Trajectory]
    pub fn trajectory(&self) -> Option<&Trajectory> {
        self.trajectory.as_ref()
    }

    /// [AvailabilityInterval] of the latest valid [Trajectory]
    pub fn interval(&self) -> Option<AvailabilityInterval> {
        self.trajectory.as_ref().map(|t| t.interval)
    }

    pub fn position_at(&self, t: Epoch) -> Option<Vector3<f64>> {
        self.trajectory.as_ref()?.position_at(t)
    }

    pub fn orientation_at(&self, t: Epoch) -> Option<UnitQuaternion<f64>> {
        self.trajectory.as_ref()?.orientation_at(t)
    }

    /// Current instant
    pub fn cursor(&self) -> Option<Epoch> {
        self.cursor.current()
    }

    /// Samples the [Trajectory] at the current instant
    pub fn sample_at_cursor(&self) -> Option<(Epoch, Vector3<f64>, UnitQuaternion<f64>)> {
        let t = self.cursor.current()?;
        Some((t, self.position_at(t)?, self.orientation_at(t)?))
    }
}
