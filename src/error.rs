//! Dispatch error type.
//!
//! Every mutating call on the engine returns one of these instead of
//! panicking. The only panic in the crate is the allocator's capacity
//! post-condition, which signals a bookkeeping bug rather than bad input.

use std::fmt;

use thiserror::Error;

use crate::catalog::{DriverId, PassengerId, SectorId};

/// An entity reference that failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRef {
    Driver(DriverId),
    Passenger(PassengerId),
    Sector(SectorId),
    Stop { driver: DriverId, passenger: PassengerId },
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Driver(id) => write!(f, "driver {id}"),
            EntityRef::Passenger(id) => write!(f, "passenger {id}"),
            EntityRef::Sector(id) => write!(f, "sector {id}"),
            EntityRef::Stop { driver, passenger } => {
                write!(f, "stop for passenger {passenger} on driver {driver}")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(
        "passenger {passenger} (sector {passenger_sector}) cannot ride with driver {driver} (sector {driver_sector})"
    )]
    SectorMismatch {
        passenger: PassengerId,
        passenger_sector: SectorId,
        driver: DriverId,
        driver_sector: SectorId,
    },

    #[error("driver {driver} is at capacity ({capacity} seats)")]
    CapacityExceeded { driver: DriverId, capacity: u32 },

    #[error("driver {0} has no route assigned")]
    NoRouteAssigned(DriverId),

    #[error("trip for driver {0} is not in progress")]
    RouteNotStarted(DriverId),

    #[error("trip for driver {0} is already in progress")]
    TripAlreadyInProgress(DriverId),

    #[error("trip for driver {driver} still has {remaining} unfinished stops")]
    StopsIncomplete { driver: DriverId, remaining: usize },

    #[error("unknown {0}")]
    UnknownEntity(EntityRef),

    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("no async runtime available to drive the simulation")]
    NoRuntime,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type DispatchResult<T> = Result<T, DispatchError>;
