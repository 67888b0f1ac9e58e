//! Ordered stop sequences for drivers.
//!
//! A route is `Start → pickups by precedence → Destination`. A driver with
//! no passengers gets an empty route, not a Start/Destination pair.

use rayon::prelude::*;
use serde::Serialize;

use crate::catalog::{DriverId, PassengerId};
use crate::error::DispatchResult;
use crate::haversine;
use crate::polyline::Polyline;
use crate::store::AssignmentStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StopKind {
    Start,
    PassengerPickup { passenger: PassengerId },
    Destination,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStop {
    pub kind: StopKind,
    pub location: (f64, f64),
    /// Passenger name, "Start", or the destination name.
    pub label: String,
    /// Scheduled pickup time for pickups.
    pub scheduled_time: Option<String>,
}

impl RouteStop {
    pub fn passenger(&self) -> Option<&PassengerId> {
        match &self.kind {
            StopKind::PassengerPickup { passenger } => Some(passenger),
            StopKind::Start | StopKind::Destination => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub driver: DriverId,
    stops: Vec<RouteStop>,
    path: Polyline,
}

impl Route {
    pub fn empty(driver: DriverId) -> Self {
        Self {
            driver,
            stops: Vec::new(),
            path: Polyline::new(Vec::new()),
        }
    }

    pub fn stops(&self) -> &[RouteStop] {
        &self.stops
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Pickup stops only, in visiting order.
    pub fn pickups(&self) -> impl Iterator<Item = &RouteStop> {
        self.stops.iter().filter(|stop| stop.passenger().is_some())
    }

    pub fn pickup_count(&self) -> usize {
        self.pickups().count()
    }

    pub fn pickup(&self, index: usize) -> Option<&RouteStop> {
        self.pickups().nth(index)
    }

    pub fn passenger_ids(&self) -> Vec<PassengerId> {
        self.pickups().filter_map(|stop| stop.passenger().cloned()).collect()
    }

    pub fn path(&self) -> &Polyline {
        &self.path
    }

    pub fn length_km(&self) -> f64 {
        self.path.length_km()
    }

    /// Driving time over the whole path at `speed_kmh`.
    pub fn drive_minutes(&self, speed_kmh: f64) -> u32 {
        haversine::travel_minutes(self.length_km(), speed_kmh)
    }
}

/// Build the current route for `driver_id` from the store.
pub fn build_route(store: &AssignmentStore, driver_id: &DriverId) -> DispatchResult<Route> {
    let catalog = store.catalog();
    let driver = catalog.driver(driver_id)?;
    let passengers = store.assignments_for(driver_id)?;
    if passengers.is_empty() {
        return Ok(Route::empty(driver.id.clone()));
    }

    let destination = catalog.destination();
    let mut stops = Vec::with_capacity(passengers.len() + 2);
    stops.push(RouteStop {
        kind: StopKind::Start,
        location: driver.start_location,
        label: "Start".to_string(),
        scheduled_time: None,
    });
    stops.extend(passengers.iter().map(|passenger| RouteStop {
        kind: StopKind::PassengerPickup {
            passenger: passenger.id.clone(),
        },
        location: passenger.pickup_location,
        label: passenger.name.clone(),
        scheduled_time: Some(passenger.pickup_time.clone()),
    }));
    stops.push(RouteStop {
        kind: StopKind::Destination,
        location: destination.location,
        label: destination.name.clone(),
        scheduled_time: None,
    });

    let path = Polyline::new(stops.iter().map(|stop| stop.location).collect());
    Ok(Route {
        driver: driver.id.clone(),
        stops,
        path,
    })
}

/// Routes for every driver in catalog order. Drivers are built in parallel.
pub fn build_all_routes(store: &AssignmentStore) -> DispatchResult<Vec<Route>> {
    store
        .catalog()
        .drivers()
        .par_iter()
        .map(|driver| build_route(store, &driver.id))
        .collect()
}
