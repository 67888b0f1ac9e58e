//! Durable record of a session.
//!
//! Only the assignment mapping and per-trip stop state are kept; routes,
//! stats and positions are derived again from them.

use serde::{Deserialize, Serialize};

use crate::catalog::{DriverId, PassengerId};
use crate::trip::Trip;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub passenger: PassengerId,
    pub driver: DriverId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRecord {
    pub driver: DriverId,
    pub trip: Trip,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSnapshot {
    pub assignments: Vec<AssignmentRecord>,
    pub trips: Vec<TripRecord>,
}

impl DispatchSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }
}
