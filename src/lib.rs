//! shuttle-dispatch
//!
//! Route dispatch and trip execution for a shuttle service: assigning
//! passengers to drivers under sector and capacity rules, building each
//! driver's stop sequence, running trips stop by stop, and simulating the
//! vehicle's position and arrival time.

pub mod allocator;
pub mod catalog;
pub mod clock;
pub mod command;
pub mod config;
pub mod error;
pub mod haversine;
pub mod polyline;
pub mod rest;
pub mod route;
pub mod session;
pub mod simulator;
pub mod snapshot;
pub mod source;
pub mod stats;
pub mod store;
pub mod ticker;
pub mod traits;
pub mod trip;

pub use catalog::{CatalogData, Destination, Driver, DriverId, Passenger, PassengerId, Sector, SectorCatalog, SectorId};
pub use error::{DispatchError, DispatchResult, EntityRef};
pub use session::DispatchSession;
