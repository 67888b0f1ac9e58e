//! Typed dispatcher actions.
//!
//! Every mutating operation of a [`crate::DispatchSession`] has a variant
//! here, so a UI or transport layer can hand the engine one value and get
//! one result back.

use serde::{Deserialize, Serialize};

use crate::allocator::AllocationReport;
use crate::catalog::{DriverId, PassengerId};
use crate::store::AssignOutcome;
use crate::trip::{EndMode, StopAction, StopStatus, Trip};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DispatchCommand {
    Assign { passenger: PassengerId, driver: DriverId },
    Unassign { passenger: PassengerId },
    AutoAssignAll,
    ClearAll,
    StartTrip { driver: DriverId },
    UpdateStop { driver: DriverId, passenger: PassengerId, stop_action: StopAction },
    EndTrip { driver: DriverId, mode: EndMode },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Assigned(AssignOutcome),
    Unassigned(Option<DriverId>),
    AutoAssigned(AllocationReport),
    Cleared(usize),
    TripStarted(Trip),
    StopUpdated(StopStatus),
    TripEnded(Trip),
}
