//! Simulated vehicle position and arrival estimate.
//!
//! This is an approximation driven by assignment data, not telemetry. A
//! progress fraction grows with elapsed trip time, capped at 0.8 of the
//! nominal window, and selects which pickup the vehicle is heading to.

use std::fmt;
use std::time::Duration;

use chrono::TimeDelta;
use serde::Serialize;

use crate::config::DispatchConfig;
use crate::route::Route;
use crate::trip::TripStatus;

/// Upper bound of the progress fraction.
pub const MAX_PROGRESS: f64 = 0.8;

pub const WAITING_HEADING: &str = "Waiting for assignments";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulatedPosition {
    pub location: (f64, f64),
    pub heading: String,
    pub speed: String,
    pub progress: f64,
    /// Index into the route's pickups the vehicle is heading to.
    pub target_pickup: Option<usize>,
}

/// Progress fraction for `elapsed` within `window`, in `[0, MAX_PROGRESS]`.
pub fn progress_fraction(elapsed: Duration, window: Duration) -> f64 {
    if window.is_zero() {
        return MAX_PROGRESS;
    }
    (elapsed.as_secs_f64() / window.as_secs_f64()).clamp(0.0, MAX_PROGRESS)
}

/// Position for a running trip at `progress`.
///
/// Pickup index is `floor(progress × pickups)`. A route without pickups
/// parks the vehicle at `start_location`.
pub fn position_at(route: &Route, start_location: (f64, f64), progress: f64, speed_kmh: f64) -> SimulatedPosition {
    let speed = speed_label(speed_kmh);
    let pickups = route.pickup_count();
    if pickups == 0 {
        return SimulatedPosition {
            location: start_location,
            heading: WAITING_HEADING.to_string(),
            speed,
            progress,
            target_pickup: None,
        };
    }

    let index = ((progress * pickups as f64).floor() as usize).min(pickups - 1);
    match route.pickup(index) {
        Some(stop) => SimulatedPosition {
            location: stop.location,
            heading: format!("Heading to {}", stop.label),
            speed,
            progress,
            target_pickup: Some(index),
        },
        None => SimulatedPosition {
            location: start_location,
            heading: WAITING_HEADING.to_string(),
            speed,
            progress,
            target_pickup: None,
        },
    }
}

/// Position of a vehicle whose trip is not running.
pub fn idle_position(route: &Route, start_location: (f64, f64), status: TripStatus) -> SimulatedPosition {
    let (location, heading) = match (status, route.stops().last()) {
        (_, None) => (start_location, WAITING_HEADING.to_string()),
        (TripStatus::Ended, Some(terminus)) => (terminus.location, format!("Arrived at {}", terminus.label)),
        (TripStatus::NotStarted | TripStatus::InProgress, Some(_)) => {
            (start_location, "Waiting to depart".to_string())
        }
    };
    SimulatedPosition {
        location,
        heading,
        speed: speed_label(0.0),
        progress: 0.0,
        target_pickup: None,
    }
}

fn speed_label(speed_kmh: f64) -> String {
    format!("{:.0} km/h", speed_kmh)
}

/// Per-driver simulator state for one trip.
///
/// `tick` is a pure function of elapsed time and the previous progress, so
/// it can be driven by a real ticker or called directly.
#[derive(Debug, Clone, Default)]
pub struct PositionSimulator {
    progress: f64,
    last: Option<SimulatedPosition>,
}

impl PositionSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous trip.
    pub fn reset(&mut self) {
        self.progress = 0.0;
        self.last = None;
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn last(&self) -> Option<&SimulatedPosition> {
        self.last.as_ref()
    }

    /// Advance to `elapsed` since trip start. Progress never decreases.
    pub fn tick(
        &mut self,
        elapsed: Duration,
        route: &Route,
        start_location: (f64, f64),
        config: &DispatchConfig,
    ) -> &SimulatedPosition {
        self.progress = self.progress.max(progress_fraction(elapsed, config.tick_window()));
        self.last
            .insert(position_at(route, start_location, self.progress, config.nominal_speed_kmh))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Eta {
    NotAssigned,
    Arrival {
        /// Stop budget: pickups × `per_stop_minutes`.
        total_minutes: u32,
        /// Straight-line driving time over the route at the nominal speed.
        drive_minutes: u32,
        clock: String,
    },
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eta::NotAssigned => f.write_str("Not assigned"),
            Eta::Arrival { clock, .. } => f.write_str(clock),
        }
    }
}

/// `departure_time + pickups × per_stop_minutes`, as `HH:MM`.
///
/// The stop budget saturates instead of overflowing.
pub fn estimated_arrival(route: &Route, config: &DispatchConfig) -> Eta {
    let pickups = route.pickup_count();
    if pickups == 0 {
        return Eta::NotAssigned;
    }
    let total_minutes = u32::try_from(pickups)
        .unwrap_or(u32::MAX)
        .saturating_mul(config.per_stop_minutes);
    let (arrival, _) = config
        .departure_time
        .overflowing_add_signed(TimeDelta::minutes(i64::from(total_minutes)));
    Eta::Arrival {
        total_minutes,
        drive_minutes: route.drive_minutes(config.nominal_speed_kmh),
        clock: arrival.format("%H:%M").to_string(),
    }
}
