mod common;

use chrono::Duration;
use fleet_manager::gateway::{Collection, DocumentStore};
use fleet_manager::models::{TripHistory, VehicleStatus};
use fleet_manager::repositories::{DriverRepository, TripHistoryRepository, VehicleRepository};
use fleet_manager::utils::errors::AppError;
use std::sync::Arc;

use common::{driver, fleet, master, start_time, InterleavingStore};
use fleet_manager::controllers::LifecycleController;
use fleet_manager::utils::clock::Clock;

fn repos(store: &Arc<fleet_manager::gateway::MemoryStore>) -> (VehicleRepository, DriverRepository) {
    let store: Arc<dyn DocumentStore> = store.clone();
    (VehicleRepository::new(store.clone()), DriverRepository::new(store))
}

#[tokio::test]
async fn assign_sets_driver_destination_and_timestamp() {
    let f = fleet().await;
    let (vehicles, drivers) = repos(&f.store);

    let outcome = f
        .lifecycle
        .assign_vehicle(&master(), "V1", "d1", "  Warehouse B ")
        .await
        .unwrap();
    assert_eq!(outcome.from, VehicleStatus::Available);
    assert_eq!(outcome.to, VehicleStatus::Assigned);

    let v = vehicles.get("V1").await.unwrap();
    assert_eq!(v.status, VehicleStatus::Assigned);
    assert_eq!(v.driver_id.as_deref(), Some("d1"));
    assert_eq!(v.driver_name.as_deref(), Some("Diego Uno"));
    assert_eq!(v.destination.as_deref(), Some("Warehouse B"));
    assert_eq!(v.timestamps.assigned_at, Some(start_time()));
    assert!(v.is_consistent());

    let d = drivers.get("d1").await.unwrap();
    assert_eq!(d.current_vehicle_id.as_deref(), Some("V1"));
}

#[tokio::test]
async fn full_trip_records_history_once() {
    let f = fleet().await;
    let (vehicles, drivers) = repos(&f.store);
    let d1 = driver("d1");

    f.lifecycle
        .assign_vehicle(&master(), "V1", "d1", "Warehouse B")
        .await
        .unwrap();

    f.clock.advance(Duration::minutes(3));
    f.lifecycle.start_trip(&d1, "V1").await.unwrap();
    let v = vehicles.get("V1").await.unwrap();
    assert_eq!(v.status, VehicleStatus::InTransit);
    assert_eq!(v.timestamps.started_at, Some(start_time() + Duration::minutes(3)));
    assert!(v.is_consistent());
    assert_eq!(f.store.count(Collection::TripHistory).await, 0);

    f.clock.advance(Duration::minutes(30));
    f.lifecycle.start_return(&d1, "V1").await.unwrap();
    let v = vehicles.get("V1").await.unwrap();
    assert_eq!(v.status, VehicleStatus::Returning);
    assert!(v.timestamps.reached_destination_at.is_some());
    assert!(v.is_consistent());

    f.clock.advance(Duration::minutes(17));
    let outcome = f.lifecycle.complete_trip(&d1, "V1").await.unwrap();
    assert_eq!(outcome.to, VehicleStatus::Available);
    assert_eq!(outcome.duration_minutes, Some(47));

    let v = vehicles.get("V1").await.unwrap();
    assert_eq!(v.status, VehicleStatus::Available);
    assert_eq!(v.driver_id, None);
    assert_eq!(v.destination, None);
    assert_eq!(v.timestamps.started_at, None);
    assert_eq!(
        v.timestamps.returned_at,
        Some(start_time() + Duration::minutes(50))
    );
    assert!(v.is_consistent());

    let d = drivers.get("d1").await.unwrap();
    assert_eq!(d.current_vehicle_id, None);

    let store: Arc<dyn DocumentStore> = f.store.clone();
    let trips: Vec<TripHistory> = TripHistoryRepository::new(store)
        .list_by_vehicle("V1")
        .await
        .unwrap();
    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0].duration, 47);
    assert_eq!(trips[0].driver_id, "d1");
    assert_eq!(trips[0].destination, "Warehouse B");

    let again = f.lifecycle.complete_trip(&d1, "V1").await;
    assert!(matches!(again, Err(AppError::StateConflict(_))));
    assert_eq!(f.store.count(Collection::TripHistory).await, 1);
}

#[tokio::test]
async fn concurrent_start_trip_has_one_winner() {
    let f = fleet().await;
    let d1 = driver("d1");
    f.lifecycle
        .assign_vehicle(&master(), "V1", "d1", "Warehouse B")
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        f.lifecycle.start_trip(&d1, "V1"),
        f.lifecycle.start_trip(&d1, "V1")
    );

    let wins = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    assert!(
        matches!(a, Err(AppError::StateConflict(_))) || matches!(b, Err(AppError::StateConflict(_)))
    );
}

#[tokio::test]
async fn start_trip_race_is_decided_by_the_store() {
    let f = fleet().await;
    let d1 = driver("d1");
    f.lifecycle
        .assign_vehicle(&master(), "V1", "d1", "Warehouse B")
        .await
        .unwrap();

    // Ambas llamadas leen ASSIGNED antes de que ninguna escriba
    let store: Arc<dyn DocumentStore> =
        Arc::new(InterleavingStore::gated_reads(f.store.clone(), 2));
    let clock: Arc<dyn Clock> = f.clock.clone();
    let racing = LifecycleController::new(store, clock);

    let (a, b) = tokio::join!(racing.start_trip(&d1, "V1"), racing.start_trip(&d1, "V1"));

    let (winner, loser) = match (a, b) {
        (Ok(outcome), Err(e)) | (Err(e), Ok(outcome)) => (outcome, e),
        other => panic!("expected exactly one winner, got {:?}", other),
    };
    assert_eq!(winner.to, VehicleStatus::InTransit);
    match loser {
        AppError::StateConflict(msg) => assert!(msg.starts_with("Precondition failed"), "{}", msg),
        other => panic!("expected StateConflict, got {:?}", other),
    }

    let (vehicles, _) = repos(&f.store);
    let v = vehicles.get("V1").await.unwrap();
    assert_eq!(v.status, VehicleStatus::InTransit);
    assert!(v.is_consistent());
}

#[tokio::test]
async fn assigning_a_busy_vehicle_conflicts() {
    let f = fleet().await;
    f.lifecycle
        .assign_vehicle(&master(), "V1", "d1", "Warehouse B")
        .await
        .unwrap();

    let err = f
        .lifecycle
        .assign_vehicle(&master(), "V1", "d2", "Warehouse C")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::StateConflict(_)));

    // El conductor ya tiene vehículo
    let err = f
        .lifecycle
        .assign_vehicle(&master(), "V2", "d1", "Warehouse C")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::StateConflict(_)));
}

#[tokio::test]
async fn only_the_assigned_driver_moves_the_vehicle() {
    let f = fleet().await;
    f.lifecycle
        .assign_vehicle(&master(), "V1", "d1", "Warehouse B")
        .await
        .unwrap();

    let err = f.lifecycle.start_trip(&driver("d2"), "V1").await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = f
        .lifecycle
        .assign_vehicle(&driver("d2"), "V2", "d2", "Warehouse B")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn out_of_order_transitions_conflict() {
    let f = fleet().await;
    let d1 = driver("d1");

    let err = f.lifecycle.start_trip(&d1, "V1").await.unwrap_err();
    assert!(matches!(err, AppError::StateConflict(_)));

    f.lifecycle
        .assign_vehicle(&master(), "V1", "d1", "Warehouse B")
        .await
        .unwrap();
    let err = f.lifecycle.start_return(&d1, "V1").await.unwrap_err();
    assert!(matches!(err, AppError::StateConflict(_)));
    let err = f.lifecycle.complete_trip(&d1, "V1").await.unwrap_err();
    assert!(matches!(err, AppError::StateConflict(_)));

    let err = f.lifecycle.start_trip(&d1, "missing").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn fleet_subscription_sees_committed_transitions() {
    let f = fleet().await;
    let store: Arc<dyn DocumentStore> = f.store.clone();
    let mut sub = VehicleRepository::new(store)
        .subscribe(Some(VehicleStatus::Assigned), 10)
        .await
        .unwrap();

    let first = sub.next().await.unwrap();
    assert!(first.is_empty());

    f.lifecycle
        .assign_vehicle(&master(), "V1", "d1", "Warehouse B")
        .await
        .unwrap();

    let next = sub.next().await.unwrap();
    let assigned = next.into_models::<fleet_manager::models::Vehicle>().unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].id, "V1");
    sub.cancel();
}

#[tokio::test]
async fn assigned_drivers_leave_the_available_list() {
    let f = fleet().await;
    let (_, drivers) = repos(&f.store);

    let before: Vec<String> = drivers
        .list_available()
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(before.len(), 2);
    assert!(!before.contains(&"master".to_string()));

    f.lifecycle
        .assign_vehicle(&master(), "V1", "d1", "Warehouse B")
        .await
        .unwrap();

    let after = drivers.list_available().await.unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].id, "d2");
}
