//! Per-driver trip lifecycle and stop state machine.
//!
//! A trip moves `NotStarted → InProgress → Ended`. Each pickup cycles
//! `Pending → PickedUp → Completed → Pending`; the last edge is a manual
//! undo that clears both timestamps. Stop transitions are only accepted
//! while the trip is in progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::{DriverId, PassengerId};
use crate::error::{DispatchError, DispatchResult, EntityRef};
use crate::route::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopStatus {
    Pending,
    PickedUp,
    Completed,
}

impl StopStatus {
    /// The status one confirmation moves to.
    pub fn next(self) -> Self {
        match self {
            StopStatus::Pending => StopStatus::PickedUp,
            StopStatus::PickedUp => StopStatus::Completed,
            StopStatus::Completed => StopStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripStatus {
    NotStarted,
    InProgress,
    Ended,
}

/// How a trip is being ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndMode {
    /// Every stop must be Completed.
    Normal,
    /// Ends regardless of unfinished stops.
    Forced,
}

/// A discrete confirmation on one stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopAction {
    Advance,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopState {
    pub passenger: PassengerId,
    pub status: StopStatus,
    pub pickup_at: Option<DateTime<Utc>>,
    pub dropoff_at: Option<DateTime<Utc>>,
}

impl StopState {
    fn pending(passenger: PassengerId) -> Self {
        Self {
            passenger,
            status: StopStatus::Pending,
            pickup_at: None,
            dropoff_at: None,
        }
    }

    fn reset(&mut self) {
        self.status = StopStatus::Pending;
        self.pickup_at = None;
        self.dropoff_at = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    /// Counts starts for this driver; 0 before the first one.
    pub sequence: u64,
    pub status: TripStatus,
    pub stops: Vec<StopState>,
    /// First pickup that is not Completed. `None` once every stop is done
    /// or the trip has ended.
    pub current_stop_index: Option<usize>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Trip {
    fn not_started(stops: Vec<StopState>) -> Self {
        Self {
            sequence: 0,
            status: TripStatus::NotStarted,
            stops,
            current_stop_index: None,
            started_at: None,
            ended_at: None,
        }
    }

    fn refresh_cursor(&mut self) {
        self.current_stop_index = self
            .stops
            .iter()
            .position(|stop| stop.status != StopStatus::Completed);
    }

    fn remaining(&self) -> usize {
        self.stops
            .iter()
            .filter(|stop| stop.status != StopStatus::Completed)
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TripProgress {
    pub total: usize,
    pub picked_up: usize,
    pub completed: usize,
}

/// Trip state for one driver, kept in step with the driver's route.
#[derive(Debug, Clone)]
pub struct TripExecution {
    driver: DriverId,
    route: Route,
    trip: Trip,
    trips_started: u64,
}

impl TripExecution {
    pub fn new(driver: DriverId) -> Self {
        Self {
            route: Route::empty(driver.clone()),
            driver,
            trip: Trip::not_started(Vec::new()),
            trips_started: 0,
        }
    }

    pub fn driver(&self) -> &DriverId {
        &self.driver
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn trip(&self) -> &Trip {
        &self.trip
    }

    pub fn status(&self) -> TripStatus {
        self.trip.status
    }

    pub fn is_in_progress(&self) -> bool {
        self.trip.status == TripStatus::InProgress
    }

    pub fn stop(&self, passenger: &PassengerId) -> Option<&StopState> {
        self.trip.stops.iter().find(|stop| &stop.passenger == passenger)
    }

    /// Replace the route after the driver's assignments changed.
    ///
    /// Outside a running trip the stops are rebuilt as Pending. During a
    /// running trip, stops of passengers still on the route keep their
    /// state, new passengers start Pending and removed ones are dropped.
    pub fn sync_route(&mut self, route: Route) {
        let stops = route
            .passenger_ids()
            .into_iter()
            .map(|passenger| {
                if self.is_in_progress() {
                    if let Some(existing) = self.stop(&passenger) {
                        return existing.clone();
                    }
                }
                StopState::pending(passenger)
            })
            .collect();

        self.route = route;
        self.trip.stops = stops;
        if self.is_in_progress() {
            self.trip.refresh_cursor();
        }
        debug!(driver = %self.driver, stops = self.trip.stops.len(), "route synced");
    }

    /// Begin a fresh trip over the current route.
    pub fn start(&mut self, now: DateTime<Utc>) -> DispatchResult<&Trip> {
        if self.is_in_progress() {
            return Err(DispatchError::TripAlreadyInProgress(self.driver.clone()));
        }
        if self.route.is_empty() {
            warn!(driver = %self.driver, "start refused: no route");
            return Err(DispatchError::NoRouteAssigned(self.driver.clone()));
        }

        self.trips_started += 1;
        let stops = self
            .route
            .passenger_ids()
            .into_iter()
            .map(StopState::pending)
            .collect();
        self.trip = Trip {
            sequence: self.trips_started,
            status: TripStatus::InProgress,
            stops,
            current_stop_index: Some(0),
            started_at: Some(now),
            ended_at: None,
        };
        info!(driver = %self.driver, trip = self.trips_started, stops = self.trip.stops.len(), "trip started");
        Ok(&self.trip)
    }

    /// Run one confirmation on the stop for `passenger`. `now` is only
    /// read by [`StopAction::Advance`].
    pub fn apply(&mut self, action: StopAction, passenger: &PassengerId, now: DateTime<Utc>) -> DispatchResult<StopStatus> {
        match action {
            StopAction::Advance => self.advance_stop(passenger, now),
            StopAction::Reset => self.reset_stop(passenger),
        }
    }

    pub fn advance_stop(&mut self, passenger: &PassengerId, now: DateTime<Utc>) -> DispatchResult<StopStatus> {
        let stop = self.running_stop(passenger)?;
        match stop.status.next() {
            StopStatus::PickedUp => {
                stop.status = StopStatus::PickedUp;
                stop.pickup_at = Some(now);
            }
            StopStatus::Completed => {
                stop.status = StopStatus::Completed;
                stop.dropoff_at = Some(now);
            }
            StopStatus::Pending => stop.reset(),
        }
        let status = stop.status;
        Ok(self.stop_updated(passenger, status))
    }

    /// Put the stop back to Pending and clear both timestamps.
    pub fn reset_stop(&mut self, passenger: &PassengerId) -> DispatchResult<StopStatus> {
        let stop = self.running_stop(passenger)?;
        stop.reset();
        let status = stop.status;
        Ok(self.stop_updated(passenger, status))
    }

    fn running_stop(&mut self, passenger: &PassengerId) -> DispatchResult<&mut StopState> {
        if !self.is_in_progress() {
            return Err(DispatchError::RouteNotStarted(self.driver.clone()));
        }
        let driver = &self.driver;
        self.trip
            .stops
            .iter_mut()
            .find(|stop| &stop.passenger == passenger)
            .ok_or_else(|| {
                DispatchError::UnknownEntity(EntityRef::Stop {
                    driver: driver.clone(),
                    passenger: passenger.clone(),
                })
            })
    }

    fn stop_updated(&mut self, passenger: &PassengerId, status: StopStatus) -> StopStatus {
        self.trip.refresh_cursor();
        debug!(driver = %self.driver, passenger = %passenger, ?status, "stop updated");
        status
    }

    /// End the running trip.
    ///
    /// `EndMode::Normal` requires every stop Completed; `EndMode::Forced`
    /// does not.
    pub fn end(&mut self, mode: EndMode, now: DateTime<Utc>) -> DispatchResult<&Trip> {
        if !self.is_in_progress() {
            return Err(DispatchError::RouteNotStarted(self.driver.clone()));
        }
        let remaining = self.trip.remaining();
        if mode == EndMode::Normal && remaining > 0 {
            return Err(DispatchError::StopsIncomplete {
                driver: self.driver.clone(),
                remaining,
            });
        }

        self.trip.status = TripStatus::Ended;
        self.trip.ended_at = Some(now);
        self.trip.current_stop_index = None;
        info!(driver = %self.driver, trip = self.trip.sequence, ?mode, remaining, "trip ended");
        Ok(&self.trip)
    }

    pub fn progress(&self) -> TripProgress {
        let count = |status| self.trip.stops.iter().filter(|s| s.status == status).count();
        TripProgress {
            total: self.trip.stops.len(),
            picked_up: count(StopStatus::PickedUp),
            completed: count(StopStatus::Completed),
        }
    }
}
