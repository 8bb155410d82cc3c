use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::CoreError;
use crate::service::Service;

/// Concrete host ports assigned to each service of a topology.
///
/// Ports are pairwise distinct and non-zero; both are checked on
/// construction so a `PortMap` can never hold a collision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct PortMap(IndexMap<Service, u16>);

impl PortMap {
    /// Build a map from ordered `(service, port)` assignments.
    ///
    /// # Errors
    /// Returns [`CoreError::DuplicateService`] if a service appears twice,
    /// [`CoreError::DuplicatePort`] if two services share a port, or
    /// [`CoreError::ZeroPort`] if any port is 0.
    pub fn from_assignments(
        assignments: impl IntoIterator<Item = (Service, u16)>,
    ) -> Result<Self, CoreError> {
        let mut map: IndexMap<Service, u16> = IndexMap::new();
        for (service, port) in assignments {
            if port == 0 {
                return Err(CoreError::ZeroPort {
                    service: service.key().to_owned(),
                });
            }
            if let Some((other, _)) = map.iter().find(|&(_, &p)| p == port) {
                return Err(CoreError::DuplicatePort {
                    port,
                    first: other.key().to_owned(),
                    second: service.key().to_owned(),
                });
            }
            if map.insert(service, port).is_some() {
                return Err(CoreError::DuplicateService {
                    service: service.key().to_owned(),
                });
            }
        }
        Ok(Self(map))
    }

    /// Port assigned to `service`, if it is part of this map.
    #[must_use]
    pub fn get(&self, service: Service) -> Option<u16> {
        self.0.get(&service).copied()
    }

    /// Iterate assignments in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (Service, u16)> + '_ {
        self.0.iter().map(|(s, p)| (*s, *p))
    }

    /// Number of assigned services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing was assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PortMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (service, port)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{service}={port}")?;
        }
        Ok(())
    }
}
