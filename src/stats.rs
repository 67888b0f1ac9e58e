//! Read-only occupancy projections of an [`AssignmentStore`].
//!
//! Nothing here is cached: every call rescans the store.

use serde::Serialize;

use crate::catalog::{DriverId, SectorId};
use crate::error::{DispatchError, DispatchResult, EntityRef};
use crate::store::AssignmentStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectorStats {
    pub sector: SectorId,
    pub total: usize,
    pub assigned: usize,
    pub unassigned: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverOccupancy {
    pub driver: DriverId,
    pub assigned: usize,
    pub capacity: u32,
}

impl DriverOccupancy {
    pub fn remaining(&self) -> usize {
        (self.capacity as usize).saturating_sub(self.assigned)
    }

    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }
}

/// Stats for every sector, in catalog order.
pub fn sector_stats(store: &AssignmentStore) -> Vec<SectorStats> {
    store
        .catalog()
        .sectors()
        .iter()
        .map(|sector| compute_sector(store, &sector.id))
        .collect()
}

pub fn sector_stats_for(store: &AssignmentStore, sector: &SectorId) -> DispatchResult<SectorStats> {
    if !store.catalog().has_sector(sector) {
        return Err(DispatchError::UnknownEntity(EntityRef::Sector(sector.clone())));
    }
    Ok(compute_sector(store, sector))
}

fn compute_sector(store: &AssignmentStore, sector: &SectorId) -> SectorStats {
    let (total, assigned) = store
        .catalog()
        .passengers_in(sector)
        .fold((0, 0), |(total, assigned), passenger| {
            (total + 1, assigned + usize::from(store.is_assigned(&passenger.id)))
        });
    SectorStats {
        sector: sector.clone(),
        total,
        assigned,
        unassigned: total - assigned,
    }
}

pub fn driver_occupancy(store: &AssignmentStore, driver_id: &DriverId) -> DispatchResult<DriverOccupancy> {
    let driver = store.catalog().driver(driver_id)?;
    Ok(DriverOccupancy {
        driver: driver.id.clone(),
        assigned: store.occupancy(driver_id),
        capacity: driver.capacity,
    })
}

/// Occupancy of every driver, in catalog order.
pub fn fleet_occupancy(store: &AssignmentStore) -> Vec<DriverOccupancy> {
    store
        .catalog()
        .drivers()
        .iter()
        .map(|driver| DriverOccupancy {
            driver: driver.id.clone(),
            assigned: store.occupancy(&driver.id),
            capacity: driver.capacity,
        })
        .collect()
}
