//! Port allocator: one free host port for every service.
//!
//! Each service searches upward from `base + offset`. Services are resolved
//! one after another in topology order, and ports already handed out in the
//! same pass are skipped, so the resulting map never contains a collision.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use rand::Rng;

use berth_core::{PortMap, Service, Topology};

use crate::{PortProber, SynthError, DEFAULT_MAX_PROBE_ATTEMPTS};

/// Highest valid TCP port.
const MAX_PORT: u32 = 65_535;

/// Assigns free ports to a fixed topology using a [`PortProber`].
///
/// # Cancel Safety
/// Cancel safe. Nothing is reserved or bound; dropping the future simply
/// abandons the scan.
pub struct PortAllocator<P: PortProber> {
    prober: P,
    topology: Topology,
    max_attempts: u32,
}

impl<P: PortProber> PortAllocator<P> {
    /// Create an allocator with the default probe budget.
    #[must_use]
    pub fn new(prober: P, topology: Topology) -> Self {
        Self { prober, topology, max_attempts: DEFAULT_MAX_PROBE_ATTEMPTS }
    }

    /// Create an allocator with a custom per-service probe budget.
    ///
    /// A budget of zero is raised to one.
    #[must_use]
    pub fn with_max_attempts(prober: P, topology: Topology, max_attempts: u32) -> Self {
        Self { prober, topology, max_attempts: max_attempts.max(1) }
    }

    /// The topology this allocator resolves.
    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Returns `true` if nothing is listening on `port` right now.
    pub async fn is_port_free(&self, port: u16) -> bool {
        self.prober.is_port_free(port).await
    }

    /// Find the first free port at or above `start`, advancing by `step`.
    ///
    /// A `step` of zero is treated as one.
    ///
    /// # Errors
    /// Returns [`SynthError::PortExhausted`] if no free port turns up within
    /// the probe budget or before passing port 65535.
    pub async fn find_free_port(&self, start: u16, step: u16) -> Result<u16, SynthError> {
        self.scan(u32::from(start), step, &BTreeSet::new(), None).await
    }

    /// Assign a port to every service, searching from `base + offset`.
    ///
    /// Either every service gets a port or the whole pass fails.
    ///
    /// # Errors
    /// Returns [`SynthError::PortExhausted`] naming the first service that
    /// could not be placed.
    pub async fn allocate(&self, base: u16) -> Result<PortMap, SynthError> {
        let mut claimed = BTreeSet::new();
        let mut assignments = Vec::with_capacity(self.topology.len());

        for (service, offset) in self.topology.iter() {
            let start = u32::from(base) + u32::from(offset);
            let port = self.scan(start, 1, &claimed, Some(service)).await?;
            tracing::info!(service = %service, port, offset, "assigned port");
            claimed.insert(port);
            assignments.push((service, port));
        }

        Ok(PortMap::from_assignments(assignments)?)
    }

    /// Settle on a free base port at or above `start`, then allocate from it.
    ///
    /// Returns the base port actually used alongside the map.
    ///
    /// # Errors
    /// Returns [`SynthError::PortExhausted`] if no base or service port
    /// could be found.
    pub async fn allocate_from(&self, start: u16) -> Result<(u16, PortMap), SynthError> {
        let base = self.find_free_port(start, 1).await?;
        tracing::info!(start, base, "selected base port");
        let ports = self.allocate(base).await?;
        Ok((base, ports))
    }

    async fn scan(
        &self,
        start: u32,
        step: u16,
        claimed: &BTreeSet<u16>,
        service: Option<Service>,
    ) -> Result<u16, SynthError> {
        let step = u32::from(step.max(1));
        let mut candidate = start;
        let mut last = start.min(MAX_PORT);
        let mut attempts = 0u32;

        while attempts < self.max_attempts && candidate <= MAX_PORT {
            last = candidate;
            attempts += 1;
            let Ok(port) = u16::try_from(candidate) else {
                break;
            };
            if port != 0 && !claimed.contains(&port) && self.prober.is_port_free(port).await {
                return Ok(port);
            }
            tracing::debug!(port, service = ?service, "port unavailable, advancing");
            candidate += step;
        }

        tracing::warn!(service = ?service, start, last, attempts, "port search exhausted");
        Err(SynthError::PortExhausted { service, start, last, attempts })
    }
}

/// Draw a uniformly random starting port from `range`.
pub fn random_start<R: Rng + ?Sized>(rng: &mut R, range: &RangeInclusive<u16>) -> u16 {
    rng.gen_range(range.clone())
}
