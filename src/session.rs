//! The dispatch session: one owner for a catalog, its assignments and the
//! per-driver trip state.
//!
//! Locking:
//! - the assignment store sits behind one mutex; every assignment mutation,
//!   including a whole auto-assign pass, runs under it;
//! - each driver has its own mutex around its trip and simulator, so a
//!   tick and a stop confirmation for the same driver never interleave
//!   while different drivers proceed independently;
//! - locks are taken store first, then driver, then the ticker map. The
//!   tick path takes only the driver lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::allocator::{self, AllocationReport};
use crate::catalog::{DriverId, Passenger, PassengerId, SectorCatalog, SectorId};
use crate::command::{CommandOutcome, DispatchCommand};
use crate::config::DispatchConfig;
use crate::error::{DispatchError, DispatchResult, EntityRef};
use crate::route::{self, Route};
use crate::simulator::{self, Eta, PositionSimulator, SimulatedPosition};
use crate::snapshot::{AssignmentRecord, DispatchSnapshot, TripRecord};
use crate::stats::{self, DriverOccupancy, SectorStats};
use crate::store::{AssignOutcome, AssignmentStore};
use crate::ticker::{spawn_ticker, TickFlow, TickerHandle};
use crate::traits::{CatalogSource, Clock};
use crate::trip::{EndMode, StopAction, StopStatus, Trip, TripExecution, TripProgress};

#[derive(Debug)]
struct DriverRuntime {
    start_location: (f64, f64),
    execution: TripExecution,
    simulator: PositionSimulator,
}

impl DriverRuntime {
    /// One simulator step. `None` when the trip is not running, in which
    /// case nothing is updated.
    fn tick(&mut self, now: DateTime<Utc>, config: &DispatchConfig) -> Option<SimulatedPosition> {
        if !self.execution.is_in_progress() {
            return None;
        }
        let started_at = self.execution.trip().started_at?;
        let elapsed = (now - started_at).to_std().unwrap_or_default();
        let position = self
            .simulator
            .tick(elapsed, self.execution.route(), self.start_location, config);
        Some(position.clone())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct DispatchSession {
    catalog: Arc<SectorCatalog>,
    config: DispatchConfig,
    clock: Arc<dyn Clock>,
    store: Mutex<AssignmentStore>,
    /// Fixed at construction: one entry per catalog driver.
    drivers: HashMap<DriverId, Arc<Mutex<DriverRuntime>>>,
    tickers: Mutex<HashMap<DriverId, TickerHandle>>,
}

impl DispatchSession {
    pub fn new(catalog: SectorCatalog, config: DispatchConfig, clock: Arc<dyn Clock>) -> DispatchResult<Self> {
        config.validate()?;
        let catalog = Arc::new(catalog);
        let drivers = catalog
            .drivers()
            .iter()
            .map(|driver| {
                let runtime = DriverRuntime {
                    start_location: driver.start_location,
                    execution: TripExecution::new(driver.id.clone()),
                    simulator: PositionSimulator::new(),
                };
                (driver.id.clone(), Arc::new(Mutex::new(runtime)))
            })
            .collect();

        info!(
            sectors = catalog.sectors().len(),
            drivers = catalog.drivers().len(),
            passengers = catalog.passengers().len(),
            "dispatch session created"
        );
        Ok(Self {
            store: Mutex::new(AssignmentStore::new(Arc::clone(&catalog))),
            catalog,
            config,
            clock,
            drivers,
            tickers: Mutex::new(HashMap::new()),
        })
    }

    /// Load and validate a catalog from `source`, then open a session on it.
    pub fn load<S: CatalogSource + ?Sized>(
        source: &S,
        config: DispatchConfig,
        clock: Arc<dyn Clock>,
    ) -> DispatchResult<Self> {
        let catalog = SectorCatalog::from_data(source.load_catalog()?)?;
        Self::new(catalog, config, clock)
    }

    pub fn catalog(&self) -> &SectorCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    fn runtime(&self, driver_id: &DriverId) -> DispatchResult<&Arc<Mutex<DriverRuntime>>> {
        self.drivers
            .get(driver_id)
            .ok_or_else(|| DispatchError::UnknownEntity(EntityRef::Driver(driver_id.clone())))
    }

    /// Rebuild and install the routes of `drivers` from `store`.
    fn refresh_routes(&self, store: &AssignmentStore, drivers: &[DriverId]) -> DispatchResult<()> {
        for driver_id in drivers {
            let route = route::build_route(store, driver_id)?;
            lock(self.runtime(driver_id)?).execution.sync_route(route);
        }
        Ok(())
    }

    fn all_driver_ids(&self) -> Vec<DriverId> {
        self.catalog.drivers().iter().map(|d| d.id.clone()).collect()
    }

    // ── Assignment ────────────────────────────────────────────────────────

    /// Capacity-checked manual assignment.
    pub fn assign(&self, passenger_id: &PassengerId, driver_id: &DriverId) -> DispatchResult<AssignOutcome> {
        let mut store = lock(&self.store);
        let outcome = allocator::allocate(&mut store, passenger_id, driver_id)?;
        match &outcome {
            AssignOutcome::Unchanged => {}
            AssignOutcome::Created => self.refresh_routes(&store, &[driver_id.clone()])?,
            AssignOutcome::Moved { from } => {
                self.refresh_routes(&store, &[from.clone(), driver_id.clone()])?
            }
        }
        Ok(outcome)
    }

    pub fn unassign(&self, passenger_id: &PassengerId) -> DispatchResult<Option<DriverId>> {
        let mut store = lock(&self.store);
        let previous = store.unassign(passenger_id)?;
        if let Some(driver_id) = &previous {
            self.refresh_routes(&store, &[driver_id.clone()])?;
        }
        Ok(previous)
    }

    pub fn auto_assign_all(&self) -> DispatchResult<AllocationReport> {
        let mut store = lock(&self.store);
        let report = allocator::auto_assign_all(&mut store)?;
        self.refresh_routes(&store, &report.touched_drivers())?;
        Ok(report)
    }

    pub fn clear_all(&self) -> DispatchResult<usize> {
        let mut store = lock(&self.store);
        let removed = store.clear_all();
        if removed > 0 {
            self.refresh_routes(&store, &self.all_driver_ids())?;
        }
        info!(removed, "assignments cleared");
        Ok(removed)
    }

    /// Re-apply a snapshot's assignment mapping.
    ///
    /// Every record goes through the capacity-checked allocator on a copy
    /// of the store; the live store is replaced only if all of them pass.
    pub fn restore_assignments(&self, snapshot: &DispatchSnapshot) -> DispatchResult<usize> {
        let mut store = lock(&self.store);
        let mut staged = store.clone();
        staged.clear_all();
        for record in &snapshot.assignments {
            allocator::allocate(&mut staged, &record.passenger, &record.driver)?;
        }
        *store = staged;
        self.refresh_routes(&store, &self.all_driver_ids())?;
        Ok(store.len())
    }

    pub fn driver_of(&self, passenger_id: &PassengerId) -> Option<DriverId> {
        lock(&self.store).driver_of(passenger_id).cloned()
    }

    pub fn assignments_for(&self, driver_id: &DriverId) -> DispatchResult<Vec<Passenger>> {
        let store = lock(&self.store);
        Ok(store.assignments_for(driver_id)?.into_iter().cloned().collect())
    }

    pub fn unassigned_for(&self, sector: &SectorId) -> DispatchResult<Vec<Passenger>> {
        let store = lock(&self.store);
        Ok(store.unassigned_for(sector)?.into_iter().cloned().collect())
    }

    // ── Stats ─────────────────────────────────────────────────────────────

    pub fn sector_stats(&self) -> Vec<SectorStats> {
        stats::sector_stats(&lock(&self.store))
    }

    pub fn sector_stats_for(&self, sector: &SectorId) -> DispatchResult<SectorStats> {
        stats::sector_stats_for(&lock(&self.store), sector)
    }

    pub fn driver_occupancy(&self, driver_id: &DriverId) -> DispatchResult<DriverOccupancy> {
        stats::driver_occupancy(&lock(&self.store), driver_id)
    }

    pub fn fleet_occupancy(&self) -> Vec<DriverOccupancy> {
        stats::fleet_occupancy(&lock(&self.store))
    }

    // ── Routes ────────────────────────────────────────────────────────────

    pub fn build_route(&self, driver_id: &DriverId) -> DispatchResult<Route> {
        route::build_route(&lock(&self.store), driver_id)
    }

    pub fn all_routes(&self) -> DispatchResult<Vec<Route>> {
        route::build_all_routes(&lock(&self.store))
    }

    // ── Trips ─────────────────────────────────────────────────────────────

    pub fn start_trip(&self, driver_id: &DriverId) -> DispatchResult<Trip> {
        let now = self.clock.now();
        let mut runtime = lock(self.runtime(driver_id)?);
        let trip = runtime.execution.start(now)?.clone();
        runtime.simulator.reset();
        Ok(trip)
    }

    pub fn update_stop(
        &self,
        driver_id: &DriverId,
        passenger_id: &PassengerId,
        action: StopAction,
    ) -> DispatchResult<StopStatus> {
        let now = self.clock.now();
        let mut runtime = lock(self.runtime(driver_id)?);
        runtime.execution.apply(action, passenger_id, now)
    }

    /// Confirm the next transition of a stop; a Completed stop goes back to
    /// Pending.
    pub fn advance_stop(&self, driver_id: &DriverId, passenger_id: &PassengerId) -> DispatchResult<StopStatus> {
        self.update_stop(driver_id, passenger_id, StopAction::Advance)
    }

    pub fn reset_stop(&self, driver_id: &DriverId, passenger_id: &PassengerId) -> DispatchResult<StopStatus> {
        self.update_stop(driver_id, passenger_id, StopAction::Reset)
    }

    /// End the driver's trip and stop its simulation ticker.
    pub fn end_trip(&self, driver_id: &DriverId, mode: EndMode) -> DispatchResult<Trip> {
        let now = self.clock.now();
        let trip = {
            let mut runtime = lock(self.runtime(driver_id)?);
            runtime.execution.end(mode, now)?.clone()
        };
        self.stop_simulation(driver_id);
        Ok(trip)
    }

    pub fn trip(&self, driver_id: &DriverId) -> DispatchResult<Trip> {
        Ok(lock(self.runtime(driver_id)?).execution.trip().clone())
    }

    pub fn trip_progress(&self, driver_id: &DriverId) -> DispatchResult<TripProgress> {
        Ok(lock(self.runtime(driver_id)?).execution.progress())
    }

    // ── Simulation ────────────────────────────────────────────────────────

    /// Run one simulator step for `driver_id` at the current clock time.
    ///
    /// Returns `None` without side effects when the trip is not running.
    pub fn tick(&self, driver_id: &DriverId) -> DispatchResult<Option<SimulatedPosition>> {
        let now = self.clock.now();
        Ok(lock(self.runtime(driver_id)?).tick(now, &self.config))
    }

    /// Simulated position; does not advance the simulator.
    pub fn current_position(&self, driver_id: &DriverId) -> DispatchResult<SimulatedPosition> {
        let runtime = lock(self.runtime(driver_id)?);
        let route = runtime.execution.route();
        let position = if runtime.execution.is_in_progress() {
            simulator::position_at(
                route,
                runtime.start_location,
                runtime.simulator.progress(),
                self.config.nominal_speed_kmh,
            )
        } else {
            simulator::idle_position(route, runtime.start_location, runtime.execution.status())
        };
        Ok(position)
    }

    pub fn estimated_arrival(&self, driver_id: &DriverId) -> DispatchResult<Eta> {
        let runtime = lock(self.runtime(driver_id)?);
        Ok(simulator::estimated_arrival(runtime.execution.route(), &self.config))
    }

    /// Start ticking the driver's simulator every `tick_interval_ms`.
    ///
    /// The trip must be running. Must be called from inside a tokio
    /// runtime. The ticker stops itself on the first tick that finds the
    /// trip no longer running. The driver lock is held until the handle is
    /// registered.
    pub fn spawn_simulation(&self, driver_id: &DriverId) -> DispatchResult<()> {
        let runtime = Arc::clone(self.runtime(driver_id)?);
        let guard = lock(&runtime);
        if !guard.execution.is_in_progress() {
            return Err(DispatchError::RouteNotStarted(driver_id.clone()));
        }

        let ticking = Arc::clone(&runtime);
        let clock = Arc::clone(&self.clock);
        let config = self.config.clone();
        let driver = driver_id.clone();
        let handle = spawn_ticker(self.config.tick_interval(), move |n| {
            match lock(&ticking).tick(clock.now(), &config) {
                Some(position) => {
                    debug!(driver = %driver, tick = n, progress = position.progress, "position tick");
                    TickFlow::Continue
                }
                None => TickFlow::Stop,
            }
        })?;

        let mut tickers = lock(&self.tickers);
        tickers.retain(|_, ticker| !ticker.is_finished());
        tickers.insert(driver_id.clone(), handle);
        drop(guard);
        Ok(())
    }

    /// Number of registered tickers that are still running.
    pub fn active_simulations(&self) -> usize {
        lock(&self.tickers)
            .values()
            .filter(|ticker| !ticker.is_finished())
            .count()
    }

    /// Cancel the driver's ticker. Returns whether one was running.
    pub fn stop_simulation(&self, driver_id: &DriverId) -> bool {
        match lock(&self.tickers).remove(driver_id) {
            Some(handle) => {
                let was_running = !handle.is_finished();
                handle.cancel();
                was_running
            }
            None => false,
        }
    }

    // ── Commands & snapshots ──────────────────────────────────────────────

    pub fn execute(&self, command: DispatchCommand) -> DispatchResult<CommandOutcome> {
        match command {
            DispatchCommand::Assign { passenger, driver } => {
                self.assign(&passenger, &driver).map(CommandOutcome::Assigned)
            }
            DispatchCommand::Unassign { passenger } => {
                self.unassign(&passenger).map(CommandOutcome::Unassigned)
            }
            DispatchCommand::AutoAssignAll => self.auto_assign_all().map(CommandOutcome::AutoAssigned),
            DispatchCommand::ClearAll => self.clear_all().map(CommandOutcome::Cleared),
            DispatchCommand::StartTrip { driver } => {
                self.start_trip(&driver).map(CommandOutcome::TripStarted)
            }
            DispatchCommand::UpdateStop { driver, passenger, stop_action } => self
                .update_stop(&driver, &passenger, stop_action)
                .map(CommandOutcome::StopUpdated),
            DispatchCommand::EndTrip { driver, mode } => {
                self.end_trip(&driver, mode).map(CommandOutcome::TripEnded)
            }
        }
    }

    pub fn snapshot(&self) -> DispatchSnapshot {
        let assignments = lock(&self.store)
            .iter()
            .map(|(passenger, driver)| AssignmentRecord {
                passenger: passenger.clone(),
                driver: driver.clone(),
            })
            .collect();

        let trips = self
            .catalog
            .drivers()
            .iter()
            .filter_map(|driver| {
                let trip = lock(self.drivers.get(&driver.id)?).execution.trip().clone();
                (trip.sequence > 0).then(|| TripRecord {
                    driver: driver.id.clone(),
                    trip,
                })
            })
            .collect();

        DispatchSnapshot { assignments, trips }
    }
}

impl std::fmt::Debug for DispatchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchSession")
            .field("drivers", &self.drivers.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
