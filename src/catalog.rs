//! Static reference data for a dispatch session.
//!
//! A catalog holds the sectors, the drivers and passengers that belong to
//! them, and the single destination every route ends at. It is validated
//! once at load time and never mutated afterwards.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, DispatchResult, EntityRef};

/// Generate a string-backed identifier newtype.
macro_rules! string_id {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id! {
    /// Identifier of a geographic sector.
    SectorId
}

string_id! {
    /// Identifier of a driver (one vehicle).
    DriverId
}

string_id! {
    /// Identifier of a passenger.
    PassengerId
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sector {
    pub id: SectorId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub name: String,
    pub vehicle: String,
    /// Maximum simultaneous passengers.
    pub capacity: u32,
    pub sector: SectorId,
    /// Pickup areas this driver covers. Informational only.
    #[serde(default)]
    pub allowed_areas: Vec<String>,
    /// Start location (lat, lng).
    pub start_location: (f64, f64),
    #[serde(default)]
    pub rating: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passenger {
    pub id: PassengerId,
    pub name: String,
    pub home_area: String,
    pub sector: SectorId,
    /// Pickup location (lat, lng).
    pub pickup_location: (f64, f64),
    /// Orders pickups within one driver's route. Not unique.
    pub stop_precedence: i32,
    /// Scheduled pickup time label, e.g. "07:10".
    pub pickup_time: String,
}

/// The shared terminus of every route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub name: String,
    pub location: (f64, f64),
}

/// Raw catalog payload as delivered by a [`crate::traits::CatalogSource`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogData {
    pub sectors: Vec<Sector>,
    pub drivers: Vec<Driver>,
    pub passengers: Vec<Passenger>,
    pub destination: Destination,
}

/// Validated, indexed catalog.
#[derive(Debug, Clone)]
pub struct SectorCatalog {
    sectors: Vec<Sector>,
    drivers: Vec<Driver>,
    passengers: Vec<Passenger>,
    destination: Destination,
    driver_index: HashMap<DriverId, usize>,
    passenger_index: HashMap<PassengerId, usize>,
}

impl SectorCatalog {
    /// Validate and index raw catalog data.
    ///
    /// Rejects duplicate ids, zero-capacity drivers, and drivers or
    /// passengers that reference a sector the catalog does not declare.
    pub fn from_data(data: CatalogData) -> DispatchResult<Self> {
        let CatalogData {
            sectors,
            drivers,
            passengers,
            destination,
        } = data;

        let mut sector_ids = HashSet::new();
        for sector in &sectors {
            if !sector_ids.insert(sector.id.clone()) {
                return Err(DispatchError::InvalidCatalog(format!(
                    "duplicate sector {}",
                    sector.id
                )));
            }
        }

        let mut driver_index = HashMap::with_capacity(drivers.len());
        for (i, driver) in drivers.iter().enumerate() {
            if driver.capacity == 0 {
                return Err(DispatchError::InvalidCatalog(format!(
                    "driver {} has zero capacity",
                    driver.id
                )));
            }
            if !sector_ids.contains(&driver.sector) {
                return Err(DispatchError::InvalidCatalog(format!(
                    "driver {} references undeclared sector {}",
                    driver.id, driver.sector
                )));
            }
            if driver_index.insert(driver.id.clone(), i).is_some() {
                return Err(DispatchError::InvalidCatalog(format!(
                    "duplicate driver {}",
                    driver.id
                )));
            }
        }

        let mut passenger_index = HashMap::with_capacity(passengers.len());
        for (i, passenger) in passengers.iter().enumerate() {
            if !sector_ids.contains(&passenger.sector) {
                return Err(DispatchError::InvalidCatalog(format!(
                    "passenger {} references undeclared sector {}",
                    passenger.id, passenger.sector
                )));
            }
            if passenger_index.insert(passenger.id.clone(), i).is_some() {
                return Err(DispatchError::InvalidCatalog(format!(
                    "duplicate passenger {}",
                    passenger.id
                )));
            }
        }

        Ok(Self {
            sectors,
            drivers,
            passengers,
            destination,
            driver_index,
            passenger_index,
        })
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    /// Drivers in catalog order.
    pub fn drivers(&self) -> &[Driver] {
        &self.drivers
    }

    /// Passengers in catalog order.
    pub fn passengers(&self) -> &[Passenger] {
        &self.passengers
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn driver(&self, id: &DriverId) -> DispatchResult<&Driver> {
        self.driver_index
            .get(id)
            .map(|&i| &self.drivers[i])
            .ok_or_else(|| DispatchError::UnknownEntity(EntityRef::Driver(id.clone())))
    }

    pub fn passenger(&self, id: &PassengerId) -> DispatchResult<&Passenger> {
        self.passenger_index
            .get(id)
            .map(|&i| &self.passengers[i])
            .ok_or_else(|| DispatchError::UnknownEntity(EntityRef::Passenger(id.clone())))
    }

    pub fn has_sector(&self, id: &SectorId) -> bool {
        self.sectors.iter().any(|sector| &sector.id == id)
    }

    pub fn drivers_in<'a, 's>(&'a self, sector: &'s SectorId) -> impl Iterator<Item = &'a Driver> + use<'a, 's> {
        self.drivers.iter().filter(move |driver| &driver.sector == sector)
    }

    pub fn passengers_in<'a, 's>(
        &'a self,
        sector: &'s SectorId,
    ) -> impl Iterator<Item = &'a Passenger> + use<'a, 's> {
        self.passengers
            .iter()
            .filter(move |passenger| &passenger.sector == sector)
    }
}

/// Sort passengers into pickup order: precedence ascending, then id.
pub(crate) fn sort_by_precedence(passengers: &mut [&Passenger]) {
    passengers.sort_by(|a, b| {
        a.stop_precedence
            .cmp(&b.stop_precedence)
            .then_with(|| a.id.cmp(&b.id))
    });
}
