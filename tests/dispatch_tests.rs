//! Assignment, allocation, stats, routing and trip-state tests.

mod fixtures;

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use shuttle_dispatch::allocator::{allocate, auto_assign_all, UnassignedReason};
use shuttle_dispatch::clock::ManualClock;
use shuttle_dispatch::config::DispatchConfig;
use shuttle_dispatch::route::{build_route, StopKind};
use shuttle_dispatch::stats::{sector_stats_for, SectorStats};
use shuttle_dispatch::store::AssignmentStore;
use shuttle_dispatch::traits::Clock;
use shuttle_dispatch::trip::{StopStatus, TripStatus};
use shuttle_dispatch::{DispatchError, DispatchSession, SectorCatalog};

use fixtures::{did, pid, sid, CatalogBuilder};

// ============================================================================
// Helpers
// ============================================================================

fn store_for(catalog: SectorCatalog) -> AssignmentStore {
    AssignmentStore::new(Arc::new(catalog))
}

/// Three sectors, uneven fleets, more passengers than seats.
fn district() -> SectorCatalog {
    let mut builder = CatalogBuilder::new()
        .driver("n1", "north", 3)
        .driver("n2", "north", 2)
        .driver("s1", "south", 4)
        .driver("e1", "east", 1);
    for i in 0..30 {
        let sector = ["north", "south", "east"][i % 3];
        builder = builder.passenger(&format!("kid{i:02}"), sector, (i % 7) as i32);
    }
    builder.build()
}

fn assert_capacity_respected(store: &AssignmentStore) {
    for driver in store.catalog().drivers() {
        assert!(
            store.occupancy(&driver.id) <= driver.capacity as usize,
            "driver {} over capacity",
            driver.id
        );
    }
}

fn mapping(store: &AssignmentStore) -> Vec<(String, String)> {
    store
        .iter()
        .map(|(p, d)| (p.to_string(), d.to_string()))
        .collect()
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn scenario_a_auto_assign_saturates_driver() {
    let catalog = CatalogBuilder::new()
        .driver("D1", "S1", 2)
        .passenger("P1", "S1", 1)
        .passenger("P2", "S1", 2)
        .passenger("P3", "S1", 3)
        .build();
    let mut store = store_for(catalog);

    let report = auto_assign_all(&mut store).unwrap();

    assert_eq!(store.driver_of(&pid("P1")), Some(&did("D1")));
    assert_eq!(store.driver_of(&pid("P2")), Some(&did("D1")));
    assert_eq!(store.driver_of(&pid("P3")), None);
    assert_eq!(report.unassigned.len(), 1);
    assert_eq!(report.unassigned[0].passenger_id, pid("P3"));
    assert_eq!(report.unassigned[0].reason, UnassignedReason::SectorSaturated);

    assert_eq!(
        sector_stats_for(&store, &sid("S1")).unwrap(),
        SectorStats { sector: sid("S1"), total: 3, assigned: 2, unassigned: 1 }
    );
}

#[test]
fn scenario_b_sector_mismatch_has_no_side_effects() {
    let catalog = CatalogBuilder::new()
        .driver("D1", "S1", 4)
        .passenger("P9", "S2", 1)
        .build();
    let mut store = store_for(catalog);

    let err = store.assign(&pid("P9"), &did("D1")).unwrap_err();
    assert!(matches!(err, DispatchError::SectorMismatch { .. }));
    assert_eq!(store.driver_of(&pid("P9")), None);
    assert!(store.is_empty());

    let err = allocate(&mut store, &pid("P9"), &did("D1")).unwrap_err();
    assert!(matches!(err, DispatchError::SectorMismatch { .. }));
    assert!(store.is_empty());
}

#[test]
fn scenario_c_start_without_assignments() {
    let catalog = CatalogBuilder::new()
        .driver("D1", "S1", 2)
        .passenger("P1", "S1", 1)
        .build();
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let session = DispatchSession::new(catalog, DispatchConfig::default(), clock).unwrap();

    let err = session.start_trip(&did("D1")).unwrap_err();
    assert!(matches!(err, DispatchError::NoRouteAssigned(_)));
    assert_eq!(session.trip(&did("D1")).unwrap().status, TripStatus::NotStarted);
}

#[test]
fn scenario_d_stop_cycle_uses_injected_clock() {
    let catalog = CatalogBuilder::new()
        .driver("D1", "S1", 2)
        .passenger("P1", "S1", 1)
        .build();
    let start = Utc.with_ymd_and_hms(2026, 9, 1, 6, 55, 0).unwrap();
    let clock = Arc::new(ManualClock::new(start));
    let session = DispatchSession::new(catalog, DispatchConfig::default(), clock.clone()).unwrap();
    session.assign(&pid("P1"), &did("D1")).unwrap();
    session.start_trip(&did("D1")).unwrap();

    clock.advance(Duration::minutes(4));
    let picked_at = clock.now();
    assert_eq!(session.advance_stop(&did("D1"), &pid("P1")).unwrap(), StopStatus::PickedUp);
    let stop = session.trip(&did("D1")).unwrap().stops[0].clone();
    assert_eq!(stop.pickup_at, Some(picked_at));
    assert_eq!(stop.dropoff_at, None);

    clock.advance(Duration::minutes(11));
    let dropped_at = clock.now();
    assert_eq!(session.advance_stop(&did("D1"), &pid("P1")).unwrap(), StopStatus::Completed);
    let stop = session.trip(&did("D1")).unwrap().stops[0].clone();
    assert_eq!(stop.pickup_at, Some(picked_at));
    assert_eq!(stop.dropoff_at, Some(dropped_at));

    assert_eq!(session.advance_stop(&did("D1"), &pid("P1")).unwrap(), StopStatus::Pending);
    let stop = session.trip(&did("D1")).unwrap().stops[0].clone();
    assert_eq!(stop.pickup_at, None);
    assert_eq!(stop.dropoff_at, None);
}

// ============================================================================
// Randomized invariants
// ============================================================================

#[test]
fn every_accepted_assignment_matches_sectors() {
    let mut store = store_for(district());
    let mut rng = StdRng::seed_from_u64(7);
    let drivers: Vec<_> = store.catalog().drivers().to_vec();
    let passengers: Vec<_> = store.catalog().passengers().to_vec();

    for _ in 0..500 {
        let driver = &drivers[rng.gen_range(0..drivers.len())];
        let passenger = &passengers[rng.gen_range(0..passengers.len())];
        let before = store.driver_of(&passenger.id).cloned();

        match store.assign(&passenger.id, &driver.id) {
            Ok(_) => {
                assert_eq!(passenger.sector, driver.sector);
                assert_eq!(store.driver_of(&passenger.id), Some(&driver.id));
            }
            Err(DispatchError::SectorMismatch { .. }) => {
                assert_ne!(passenger.sector, driver.sector);
                assert_eq!(store.driver_of(&passenger.id).cloned(), before);
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
}

#[test]
fn allocator_never_exceeds_capacity() {
    let mut store = store_for(district());
    let mut rng = StdRng::seed_from_u64(42);
    let drivers: Vec<_> = store.catalog().drivers().iter().map(|d| d.id.clone()).collect();
    let passengers: Vec<_> = store.catalog().passengers().iter().map(|p| p.id.clone()).collect();

    for _ in 0..1_000 {
        match rng.gen_range(0..10) {
            0 => {
                auto_assign_all(&mut store).unwrap();
            }
            1..=2 => {
                let passenger = &passengers[rng.gen_range(0..passengers.len())];
                store.unassign(passenger).unwrap();
            }
            _ => {
                let passenger = &passengers[rng.gen_range(0..passengers.len())];
                let driver = &drivers[rng.gen_range(0..drivers.len())];
                match allocate(&mut store, passenger, driver) {
                    Ok(_)
                    | Err(DispatchError::SectorMismatch { .. })
                    | Err(DispatchError::CapacityExceeded { .. }) => {}
                    Err(other) => panic!("unexpected error: {other}"),
                }
            }
        }
        assert_capacity_respected(&store);
    }
}

#[test]
fn auto_assign_twice_equals_once() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..20 {
        let mut store = store_for(district());
        let passengers: Vec<_> = store.catalog().passengers().to_vec();
        let drivers: Vec<_> = store.catalog().drivers().to_vec();
        for _ in 0..rng.gen_range(0..6) {
            let passenger = &passengers[rng.gen_range(0..passengers.len())];
            let driver = &drivers[rng.gen_range(0..drivers.len())];
            let _ = allocate(&mut store, &passenger.id, &driver.id);
        }

        auto_assign_all(&mut store).unwrap();
        let once = mapping(&store);
        let second = auto_assign_all(&mut store).unwrap();
        assert!(second.assigned.is_empty());
        assert_eq!(mapping(&store), once);
    }
}

#[test]
fn leftover_passengers_are_all_reported() {
    let mut store = store_for(district());
    let report = auto_assign_all(&mut store).unwrap();

    // 10 north kids vs 5 seats, 10 south vs 4, 10 east vs 1.
    assert_eq!(store.len(), 10);
    assert_eq!(report.assigned.len(), 10);
    assert_eq!(report.unassigned.len(), 20);
    for leftover in &report.unassigned {
        assert!(!store.is_assigned(&leftover.passenger_id));
    }
}

// ============================================================================
// Routes
// ============================================================================

#[test]
fn route_follows_precedence_and_ends_at_campus() {
    let catalog = CatalogBuilder::new()
        .driver("D1", "S1", 5)
        .passenger("late", "S1", 9)
        .passenger("early", "S1", -2)
        .passenger("mid", "S1", 4)
        .build();
    let mut store = store_for(catalog);
    auto_assign_all(&mut store).unwrap();

    let route = build_route(&store, &did("D1")).unwrap();
    let kinds: Vec<&StopKind> = route.stops().iter().map(|s| &s.kind).collect();
    assert_eq!(kinds.first(), Some(&&StopKind::Start));
    assert_eq!(kinds.last(), Some(&&StopKind::Destination));
    assert_eq!(route.passenger_ids(), vec![pid("early"), pid("mid"), pid("late")]);
    assert_eq!(route.stops().last().unwrap().label, fixtures::CAMPUS.name);
    assert!(route.length_km() > 0.0);
    assert_eq!(route, build_route(&store, &did("D1")).unwrap());
}

#[test]
fn route_follows_store_mutations() {
    let catalog = CatalogBuilder::new()
        .driver("D1", "S1", 5)
        .driver("D2", "S1", 5)
        .passenger("a", "S1", 1)
        .passenger("b", "S1", 2)
        .build();
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let session = DispatchSession::new(catalog, DispatchConfig::default(), clock).unwrap();

    session.assign(&pid("a"), &did("D1")).unwrap();
    session.assign(&pid("b"), &did("D1")).unwrap();
    assert_eq!(session.estimated_arrival(&did("D1")).unwrap().to_string(), "07:10");

    session.assign(&pid("b"), &did("D2")).unwrap();
    assert_eq!(session.build_route(&did("D1")).unwrap().passenger_ids(), vec![pid("a")]);
    assert_eq!(session.estimated_arrival(&did("D1")).unwrap().to_string(), "07:05");
    assert_eq!(session.estimated_arrival(&did("D2")).unwrap().to_string(), "07:05");

    session.clear_all().unwrap();
    assert!(session.build_route(&did("D2")).unwrap().is_empty());
    assert_eq!(session.estimated_arrival(&did("D2")).unwrap().to_string(), "Not assigned");
}
