//! Test fixtures for shuttle-dispatch.
//!
//! Provides:
//! - named district locations for depots, pickups and the campus
//! - a catalog builder with sensible defaults

pub mod school_locations;

pub use school_locations::*;

use shuttle_dispatch::catalog::{CatalogData, Destination, Driver, Passenger, Sector, SectorCatalog};
use shuttle_dispatch::{DriverId, PassengerId, SectorId};

/// Builder for test catalogs. Sectors are declared on first use.
#[derive(Debug, Clone)]
pub struct CatalogBuilder {
    sectors: Vec<Sector>,
    drivers: Vec<Driver>,
    passengers: Vec<Passenger>,
    destination: Destination,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self {
            sectors: Vec::new(),
            drivers: Vec::new(),
            passengers: Vec::new(),
            destination: Destination {
                name: CAMPUS.name.to_string(),
                location: CAMPUS.coords(),
            },
        }
    }

    fn declare(&mut self, sector: &str) {
        if !self.sectors.iter().any(|s| s.id.as_str() == sector) {
            self.sectors.push(Sector {
                id: SectorId::new(sector),
                name: format!("Sector {sector}"),
            });
        }
    }

    pub fn sector(mut self, sector: &str) -> Self {
        self.declare(sector);
        self
    }

    pub fn driver(mut self, id: &str, sector: &str, capacity: u32) -> Self {
        self.declare(sector);
        let depot = DEPOTS[self.drivers.len() % DEPOTS.len()];
        self.drivers.push(Driver {
            id: DriverId::new(id),
            name: format!("Driver {id}"),
            vehicle: format!("Van {}", self.drivers.len() + 1),
            capacity,
            sector: SectorId::new(sector),
            allowed_areas: vec![depot.name.to_string()],
            start_location: depot.coords(),
            rating: Some(4.5),
        });
        self
    }

    pub fn passenger(mut self, id: &str, sector: &str, precedence: i32) -> Self {
        self.declare(sector);
        let pickups = all_pickups();
        let pickup = pickups[self.passengers.len() % pickups.len()];
        self.passengers.push(Passenger {
            id: PassengerId::new(id),
            name: format!("Student {id}"),
            home_area: pickup.name.to_string(),
            sector: SectorId::new(sector),
            pickup_location: pickup.coords(),
            stop_precedence: precedence,
            pickup_time: format!("07:{:02}", (precedence.rem_euclid(12)) * 5),
        });
        self
    }

    pub fn data(self) -> CatalogData {
        CatalogData {
            sectors: self.sectors,
            drivers: self.drivers,
            passengers: self.passengers,
            destination: self.destination,
        }
    }

    pub fn build(self) -> SectorCatalog {
        SectorCatalog::from_data(self.data()).expect("valid test catalog")
    }
}

pub fn pid(id: &str) -> PassengerId {
    PassengerId::new(id)
}

pub fn did(id: &str) -> DriverId {
    DriverId::new(id)
}

pub fn sid(id: &str) -> SectorId {
    SectorId::new(id)
}
