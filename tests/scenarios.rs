//! End-to-end routing and tracking scenarios.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use u_fleet::config::{MonitorConfig, RoutingConfig, StoreConfig};
use u_fleet::dispatch::{Dispatcher, SolveRequest};
use u_fleet::distance::Haversine;
use u_fleet::error::{SolveError, TrackingError};
use u_fleet::models::{DemandRequest, DropReason, Location, Vehicle};
use u_fleet::network::NetworkBuilder;
use u_fleet::solver::RoutingSolver;
use u_fleet::store::{MemorySink, PlanStore};
use u_fleet::tracking::{TrackStatus, TrackingMonitor, VehicleState};

/// Metres per degree of latitude.
const M_PER_DEG: f64 = 111_194.93;

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_750_000_000 + secs, 0).expect("valid timestamp")
}

fn demand(id: &str, lat: f64, lon: f64, qty: u32, urgency: f64) -> DemandRequest {
    DemandRequest::new(Location::demand_node(id, lat, lon).expect("valid"), qty, urgency)
        .expect("valid")
}

fn depot() -> Location {
    Location::depot("dc", 0.0, 0.0).expect("valid")
}

fn solver() -> RoutingSolver {
    RoutingSolver::new(RoutingConfig::default().with_max_iterations(200))
}

#[test]
fn test_urgent_node_visited_first() {
    let demands = vec![demand("A", 0.0, 1.0, 50, 0.9), demand("B", 0.0, 2.0, 50, 0.1)];
    let network = NetworkBuilder::haversine()
        .build(&depot(), &demands, &[Vehicle::new(0, 100)])
        .expect("valid");
    let plan = solver().solve(&network).expect("solvable");

    assert_eq!(plan.routes().len(), 1);
    let route = &plan.routes()[0];
    assert_eq!(route.stop_ids(), vec!["A", "B"]);
    assert_eq!(route.load(), 100);
    assert!(plan.dropped().is_empty());

    let legs = route.legs();
    assert_eq!(legs.len(), 3);
    assert!(legs[0].from.is_depot());
    assert!(legs[2].to.is_depot());
    assert_eq!(legs[0].delivered_after, 50);
    assert_eq!(legs[1].delivered_after, 100);
}

#[test]
fn test_capacity_shortfall_drops_least_urgent() {
    let demands = vec![
        demand("a", 0.0, 0.1, 25, 0.9),
        demand("b", 0.1, 0.0, 25, 0.5),
        demand("c", 0.1, 0.1, 25, 0.1),
    ];
    let fleet = [Vehicle::new(0, 30), Vehicle::new(1, 30)];
    let network = NetworkBuilder::haversine()
        .build(&depot(), &demands, &fleet)
        .expect("valid");
    let plan = solver().solve(&network).expect("solvable");

    assert!(plan.is_partial());
    assert_eq!(plan.dropped().len(), 1);
    assert_eq!(plan.dropped()[0].location.id(), "c");
    assert_eq!(plan.dropped()[0].reason, DropReason::CapacityShortfall);

    assert_eq!(plan.routes().len(), 2);
    for route in plan.routes() {
        assert_eq!(route.num_stops(), 1);
        assert!(route.load() <= route.vehicle().capacity());
    }
    assert_eq!(plan.metrics().served_quantity, 50);
    assert_eq!(plan.metrics().dropped_quantity, 25);
}

#[test]
fn test_nothing_fits() {
    let demands = vec![demand("a", 0.0, 0.1, 40, 0.9)];
    let network = NetworkBuilder::haversine()
        .build(&depot(), &demands, &[Vehicle::new(0, 30)])
        .expect("valid");
    match solver().solve(&network) {
        Err(SolveError::NoFeasibleSolution { dropped }) => {
            assert_eq!(dropped.len(), 1);
            assert_eq!(dropped[0].reason, DropReason::Unservable);
        }
        other => panic!("expected NoFeasibleSolution, got {other:?}"),
    }
}

#[test]
fn test_same_input_same_plan() {
    let demands: Vec<DemandRequest> = (0..12)
        .map(|i| {
            let angle = i as f64 * 0.5;
            demand(
                &format!("s{i}"),
                0.2 * angle.sin(),
                0.2 * angle.cos(),
                5 + (i % 4) * 3,
                (i % 5) as f64 / 4.0,
            )
        })
        .collect();
    let fleet = [Vehicle::new(0, 40), Vehicle::new(1, 40), Vehicle::new(2, 40)];
    let network = NetworkBuilder::haversine()
        .build(&depot(), &demands, &fleet)
        .expect("valid");

    let first = solver().solve(&network).expect("solvable");
    let second = solver().solve(&network).expect("solvable");
    assert_eq!(first, second);
}

#[test]
fn test_higher_urgency_weight_never_delays_top_node() {
    let demands = vec![
        demand("L1", 0.0, 0.1, 10, 0.1),
        demand("L2", 0.0, 0.2, 10, 0.1),
        demand("H", 0.0, 0.3, 10, 1.0),
    ];
    let network = NetworkBuilder::haversine()
        .build(&depot(), &demands, &[Vehicle::new(0, 100)])
        .expect("valid");

    let mut last = usize::MAX;
    for alpha in [0.001, 0.1, 1.0, 5.0, 50.0] {
        let config = RoutingConfig::default()
            .with_max_iterations(200)
            .with_urgency_weight(alpha);
        let plan = RoutingSolver::new(config).solve(&network).expect("solvable");
        let position = plan
            .routes()
            .iter()
            .find_map(|r| r.position_of("H"))
            .expect("H is served");
        assert!(position <= last, "alpha {alpha}: H moved from {last} to {position}");
        last = position;
    }
    assert_eq!(last, 0);
}

#[tokio::test]
async fn test_dispatch_then_track_deviation() {
    let store = Arc::new(PlanStore::new(
        Arc::new(MemorySink::new()),
        StoreConfig::default(),
    ));
    let dispatcher = Dispatcher::new(
        NetworkBuilder::haversine(),
        RoutingConfig::default().with_max_iterations(100),
        Arc::clone(&store),
    );
    let request = SolveRequest::new(
        depot(),
        vec![demand("A", 0.0, 0.1, 10, 0.9), demand("B", 0.0, 0.2, 10, 0.1)],
        vec![Vehicle::new(0, 50)],
    );
    dispatcher.dispatch(request).await.expect("dispatched");

    let monitor = TrackingMonitor::new(MonitorConfig::default(), store.watch(), Arc::new(Haversine))
        .expect("valid config");

    // 2 km north of the first stop.
    let status = monitor
        .report_position(0, 2_000.0 / M_PER_DEG, 0.1, at(1))
        .await
        .expect("accepted");
    match status {
        TrackStatus::Deviated(event) => {
            assert!((event.off_route_m - 2_000.0).abs() < 5.0);
            assert_eq!(event.expected.id(), "A");
        }
        other => panic!("expected a deviation, got {other:?}"),
    }
    assert_eq!(monitor.vehicle_state(0), VehicleState::Deviated);

    // Exactly at the waypoint.
    let status = monitor
        .report_position(0, 0.0, 0.1, at(2))
        .await
        .expect("accepted");
    assert_eq!(status, TrackStatus::OnTrack { off_route_m: 0.0 });
    assert_eq!(monitor.vehicle_state(0), VehicleState::OnTrack);
    assert_eq!(
        monitor.next_waypoint(0).map(|l| l.id().to_string()),
        Some("B".to_string())
    );

    // An older fix is rejected and the cached position stays put.
    let cached = monitor.position(0);
    let err = monitor
        .report_position(0, 0.0, 0.15, at(0))
        .await
        .expect_err("stale");
    assert!(matches!(err, TrackingError::StaleUpdate { .. }));
    assert_eq!(monitor.position(0), cached);
}
