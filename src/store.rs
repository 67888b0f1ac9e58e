//! Passenger → driver assignment mapping.
//!
//! The store validates ids and the sector-match rule before every write.
//! It does not check capacity: that is the allocator's job, see
//! [`crate::allocator`].

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::catalog::{sort_by_precedence, DriverId, Passenger, PassengerId, SectorCatalog, SectorId};
use crate::error::{DispatchError, DispatchResult, EntityRef};

/// What an assignment write did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignOutcome {
    Created,
    Moved { from: DriverId },
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct AssignmentStore {
    catalog: Arc<SectorCatalog>,
    assignments: BTreeMap<PassengerId, DriverId>,
}

impl AssignmentStore {
    pub fn new(catalog: Arc<SectorCatalog>) -> Self {
        Self {
            catalog,
            assignments: BTreeMap::new(),
        }
    }

    pub fn catalog(&self) -> &SectorCatalog {
        &self.catalog
    }

    pub fn catalog_handle(&self) -> Arc<SectorCatalog> {
        Arc::clone(&self.catalog)
    }

    /// Record `passenger → driver`, replacing any earlier driver.
    ///
    /// Fails with `SectorMismatch` or `UnknownEntity` without touching the
    /// mapping.
    pub fn assign(&mut self, passenger_id: &PassengerId, driver_id: &DriverId) -> DispatchResult<AssignOutcome> {
        self.check_sector(passenger_id, driver_id)?;

        let outcome = match self.assignments.insert(passenger_id.clone(), driver_id.clone()) {
            None => AssignOutcome::Created,
            Some(previous) if &previous == driver_id => AssignOutcome::Unchanged,
            Some(previous) => AssignOutcome::Moved { from: previous },
        };
        debug!(passenger = %passenger_id, driver = %driver_id, ?outcome, "assigned");
        Ok(outcome)
    }

    /// Validate that the pair may be assigned. No side effects.
    pub fn check_sector(&self, passenger_id: &PassengerId, driver_id: &DriverId) -> DispatchResult<()> {
        let passenger = self.catalog.passenger(passenger_id)?;
        let driver = self.catalog.driver(driver_id)?;

        if passenger.sector != driver.sector {
            warn!(passenger = %passenger_id, driver = %driver_id, "sector mismatch");
            return Err(DispatchError::SectorMismatch {
                passenger: passenger_id.clone(),
                passenger_sector: passenger.sector.clone(),
                driver: driver_id.clone(),
                driver_sector: driver.sector.clone(),
            });
        }
        Ok(())
    }

    /// Remove the passenger's mapping. Returns the driver it was on, or
    /// `None` if the passenger was not assigned.
    pub fn unassign(&mut self, passenger_id: &PassengerId) -> DispatchResult<Option<DriverId>> {
        self.catalog.passenger(passenger_id)?;
        let previous = self.assignments.remove(passenger_id);
        if let Some(driver) = &previous {
            debug!(passenger = %passenger_id, driver = %driver, "unassigned");
        }
        Ok(previous)
    }

    /// Remove every mapping. Returns how many were removed.
    pub fn clear_all(&mut self) -> usize {
        let removed = self.assignments.len();
        self.assignments.clear();
        removed
    }

    pub fn driver_of(&self, passenger_id: &PassengerId) -> Option<&DriverId> {
        self.assignments.get(passenger_id)
    }

    pub fn is_assigned(&self, passenger_id: &PassengerId) -> bool {
        self.assignments.contains_key(passenger_id)
    }

    /// Number of passengers currently mapped to `driver_id`.
    ///
    /// This is the one counting function behind both the stats engine and
    /// the allocator's capacity check.
    pub fn occupancy(&self, driver_id: &DriverId) -> usize {
        self.assignments.values().filter(|d| *d == driver_id).count()
    }

    /// Passengers on `driver_id` in pickup order.
    pub fn assignments_for(&self, driver_id: &DriverId) -> DispatchResult<Vec<&Passenger>> {
        self.catalog.driver(driver_id)?;
        let mut passengers = Vec::new();
        for (passenger_id, driver) in &self.assignments {
            if driver == driver_id {
                passengers.push(self.catalog.passenger(passenger_id)?);
            }
        }
        sort_by_precedence(&mut passengers);
        Ok(passengers)
    }

    /// Unassigned passengers of `sector` in pickup order.
    pub fn unassigned_for(&self, sector: &SectorId) -> DispatchResult<Vec<&Passenger>> {
        if !self.catalog.has_sector(sector) {
            return Err(DispatchError::UnknownEntity(EntityRef::Sector(sector.clone())));
        }
        let mut passengers: Vec<&Passenger> = self
            .catalog
            .passengers_in(sector)
            .filter(|passenger| !self.is_assigned(&passenger.id))
            .collect();
        sort_by_precedence(&mut passengers);
        Ok(passengers)
    }

    /// All mappings, ordered by passenger id.
    pub fn iter(&self) -> impl Iterator<Item = (&PassengerId, &DriverId)> {
        self.assignments.iter()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}
