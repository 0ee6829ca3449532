//! Frame rotation readiness gate
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use log::{debug, error, info};
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    frame::FrameRotationProvider,
    prelude::{AvailabilityInterval, Error},
};

/// [ReadinessGate] state
#[derive(Debug, Clone, PartialEq)]
pub enum Readiness {
    /// No priming was ever requested
    NotPrimed,
    /// Priming is in progress for this interval
    Priming {
        interval: AvailabilityInterval,
        version: u64,
    },
    /// Provider is primed for this interval
    Ready {
        interval: AvailabilityInterval,
        version: u64,
    },
    /// Latest priming attempt failed. Consumers treat this like [Readiness::NotPrimed].
    Failed {
        interval: AvailabilityInterval,
        version: u64,
        reason: String,
    },
}

impl Readiness {
    /// Interval this state refers to
    pub fn interval(&self) -> Option<AvailabilityInterval> {
        match self {
            Self::NotPrimed => None,
            Self::Priming { interval, .. }
            | Self::Ready { interval, .. }
            | Self::Failed { interval, .. } => Some(*interval),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// One priming request. Its completion only applies if no
/// other request was issued in the meantime.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PrimeTicket {
    pub interval: AvailabilityInterval,
    pub version: u64,
}

/// [ReadinessGate] prevents frame composition from running before the
/// [FrameRotationProvider] was primed for the requested time span.
/// Latest request wins: completions of superseded requests are discarded.
#[derive(Clone)]
pub struct ReadinessGate {
    provider: Arc<dyn FrameRotationProvider>,
    version: Arc<AtomicU64>,
    state: Arc<watch::Sender<Readiness>>,
}

impl ReadinessGate {
    /// Creates a new [ReadinessGate] in [Readiness::NotPrimed] state.
    pub fn new(provider: Arc<dyn FrameRotationProvider>) -> Self {
        let (state, _) = watch::channel(Readiness::NotPrimed);
        Self {
            provider,
            version: Arc::new(AtomicU64::new(0)),
            state: Arc::new(state),
        }
    }

    /// [FrameRotationProvider] guarded by this gate
    pub fn provider(&self) -> &Arc<dyn FrameRotationProvider> {
        &self.provider
    }

    /// Current [Readiness]
    pub fn readiness(&self) -> Readiness {
        self.state.borrow().clone()
    }

    /// Returns the interval the provider is ready for, if any.
    pub fn ready_interval(&self) -> Option<AvailabilityInterval> {
        match &*self.state.borrow() {
            Readiness::Ready { interval, .. } => Some(*interval),
            _ => None,
        }
    }

    /// Subscribe to [Readiness] updates
    pub fn subscribe(&self) -> watch::Receiver<Readiness> {
        self.state.subscribe()
    }

    /// Registers a new priming request. Returns None when this interval is
    /// already priming or ready. Otherwise, any pending request is superseded.
    pub fn begin(&self, interval: AvailabilityInterval) -> Option<PrimeTicket> {
        let mut ticket = None;

        self.state.send_if_modified(|state| {
            match state {
                Readiness::Priming { interval: i, .. } | Readiness::Ready { interval: i, .. }
                    if *i == interval =>
                {
                    return false;
                },
                _ => {},
            }

            let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
            *state = Readiness::Priming { interval, version };
            ticket = Some(PrimeTicket { interval, version });
            true
        });

        if let Some(ticket) = ticket {
            debug!("priming #{} for {}", ticket.version, ticket.interval);
        }

        ticket
    }

    /// Applies the outcome of a priming request. Stale tickets are
    /// discarded with [Error::StaleReadiness] and leave the state untouched.
    pub fn complete(&self, ticket: PrimeTicket, result: Result<(), Error>) -> Result<(), Error> {
        let mut applied = false;

        self.state.send_if_modified(|state| {
            match state {
                Readiness::Priming { version, .. } if *version == ticket.version => {},
                _ => return false,
            }

            *state = match &result {
                Ok(()) => Readiness::Ready {
                    interval: ticket.interval,
                    version: ticket.version,
                },
                Err(e) => Readiness::Failed {
                    interval: ticket.interval,
                    version: ticket.version,
                    reason: e.to_string(),
                },
            };

            applied = true;
            true
        });

        if !applied {
            debug!("discarding stale priming #{}", ticket.version);
            return Err(Error::StaleReadiness(ticket.version));
        }

        match result {
            Ok(()) => {
                info!("frame rotation ready for {}", ticket.interval);
                Ok(())
            },
            Err(e) => {
                error!("priming #{} failed: {}", ticket.version, e);
                Err(e)
            },
        }
    }

    /// Requests priming for `interval` and spawns the priming task on
    /// the current tokio runtime. Returns None when no new task was required.
    pub fn request(&self, interval: AvailabilityInterval) -> Option<JoinHandle<()>> {
        let ticket = self.begin(interval)?;
        let gate = self.clone();

        Some(tokio::spawn(async move {
            let result = gate.provider.prime(ticket.interval).await;
            let _ = gate.complete(ticket, result);
        }))
    }

    /// Waits until the latest request is either ready or failed.
    /// Waits for a first request if none was issued yet.
    pub async fn wait_ready(&self) -> Result<AvailabilityInterval, Error> {
        let mut rx = self.subscribe();

        let state = rx
            .wait_for(|state| matches!(state, Readiness::Ready { .. } | Readiness::Failed { .. }))
            .await
            .map(|state| state.clone());

        match state {
            Ok(Readiness::Ready { interval, .. }) => Ok(interval),
            Ok(Readiness::Failed {
                interval, reason, ..
            }) => Err(Error::PrimingFailed(interval, reason)),
            _ => Err(Error::NotReady),
        }
    }
}
