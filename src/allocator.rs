//! Capacity-checked assignment and the greedy auto-assign pass.

use tracing::{info, warn};

use crate::catalog::{Driver, DriverId, PassengerId, SectorId};
use crate::error::{DispatchError, DispatchResult};
use crate::store::{AssignOutcome, AssignmentStore};

/// Why a passenger is still unassigned after an auto-assign pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnassignedReason {
    /// Every driver of the passenger's sector is full.
    SectorSaturated,
    /// The passenger's sector has no drivers at all.
    NoDriverInSector,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnassignedPassenger {
    pub passenger_id: PassengerId,
    pub sector: SectorId,
    pub reason: UnassignedReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationReport {
    /// Pairs added by this pass, in the order they were made.
    pub assigned: Vec<(PassengerId, DriverId)>,
    /// Every passenger without a driver after the pass.
    pub unassigned: Vec<UnassignedPassenger>,
}

impl AllocationReport {
    /// Drivers that received at least one passenger in this pass.
    pub fn touched_drivers(&self) -> Vec<DriverId> {
        let mut drivers: Vec<DriverId> = self.assigned.iter().map(|(_, d)| d.clone()).collect();
        drivers.sort();
        drivers.dedup();
        drivers
    }
}

fn has_free_seat(store: &AssignmentStore, driver: &Driver) -> bool {
    store.occupancy(&driver.id) < driver.capacity as usize
}

/// Panics if `driver` is over capacity. Only called after a write the
/// allocator itself decided to make.
fn assert_within_capacity(store: &AssignmentStore, driver: &Driver) {
    let occupancy = store.occupancy(&driver.id);
    assert!(
        occupancy <= driver.capacity as usize,
        "allocator overfilled driver {}: {} of {} seats",
        driver.id,
        occupancy,
        driver.capacity
    );
}

/// Assign with a capacity check.
///
/// Re-assigning a passenger to the driver it is already on is a no-op and
/// never fails on capacity.
pub fn allocate(
    store: &mut AssignmentStore,
    passenger_id: &PassengerId,
    driver_id: &DriverId,
) -> DispatchResult<AssignOutcome> {
    store.check_sector(passenger_id, driver_id)?;
    if store.driver_of(passenger_id) == Some(driver_id) {
        return Ok(AssignOutcome::Unchanged);
    }

    let driver = store.catalog().driver(driver_id)?.clone();
    if !has_free_seat(store, &driver) {
        warn!(passenger = %passenger_id, driver = %driver_id, "driver full");
        return Err(DispatchError::CapacityExceeded {
            driver: driver_id.clone(),
            capacity: driver.capacity,
        });
    }

    let outcome = store.assign(passenger_id, driver_id)?;
    assert_within_capacity(store, &driver);
    Ok(outcome)
}

/// Greedily fill each driver's free seats from its sector's unassigned
/// passengers.
///
/// Drivers are visited in catalog order and passengers by precedence then
/// id. Existing assignments are kept and count against capacity. Running
/// it again once sectors are saturated changes nothing.
pub fn auto_assign_all(store: &mut AssignmentStore) -> DispatchResult<AllocationReport> {
    let catalog = store.catalog_handle();
    let mut report = AllocationReport::default();

    for driver in catalog.drivers() {
        if !has_free_seat(store, driver) {
            continue;
        }
        let candidates: Vec<PassengerId> = store
            .unassigned_for(&driver.sector)?
            .into_iter()
            .map(|passenger| passenger.id.clone())
            .collect();

        for passenger_id in candidates {
            if !has_free_seat(store, driver) {
                break;
            }
            store.assign(&passenger_id, &driver.id)?;
            assert_within_capacity(store, driver);
            report.assigned.push((passenger_id, driver.id.clone()));
        }
    }

    for sector in catalog.sectors() {
        let reason = if catalog.drivers_in(&sector.id).next().is_some() {
            UnassignedReason::SectorSaturated
        } else {
            UnassignedReason::NoDriverInSector
        };
        for passenger in store.unassigned_for(&sector.id)? {
            report.unassigned.push(UnassignedPassenger {
                passenger_id: passenger.id.clone(),
                sector: sector.id.clone(),
                reason,
            });
        }
    }

    info!(
        assigned = report.assigned.len(),
        unassigned = report.unassigned.len(),
        "auto-assign complete"
    );
    Ok(report)
}
