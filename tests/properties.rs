//! Randomized checks of the solver's capacity and coverage guarantees.

use std::collections::HashMap;

use proptest::prelude::*;
use u_fleet::config::RoutingConfig;
use u_fleet::error::SolveError;
use u_fleet::evaluation::validate_plan;
use u_fleet::models::{DemandRequest, DropReason, Location, Vehicle};
use u_fleet::network::NetworkBuilder;
use u_fleet::solver::RoutingSolver;

#[derive(Debug, Clone)]
struct Instance {
    demands: Vec<DemandRequest>,
    fleet: Vec<Vehicle>,
}

prop_compose! {
    fn demand_request(index: usize)
    (
        lat in -0.2f64..0.2,
        lon in -0.2f64..0.2,
        quantity in 1u32..40,
        urgency in 0.0f64..=1.0,
    ) -> DemandRequest {
        let location = Location::demand_node(format!("n{index}"), lat, lon).expect("in range");
        DemandRequest::new(location, quantity, urgency).expect("in range")
    }
}

fn demands() -> impl Strategy<Value = Vec<DemandRequest>> {
    (1usize..12).prop_flat_map(|n| (0..n).map(demand_request).collect::<Vec<_>>())
}

prop_compose! {
    fn instance()
    (
        demands in demands(),
        capacities in prop::collection::vec(10u32..60, 1..4),
    ) -> Instance {
        let fleet = capacities
            .into_iter()
            .enumerate()
            .map(|(id, capacity)| Vehicle::new(id, capacity))
            .collect();
        Instance { demands, fleet }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_routes_respect_capacity_and_serve_once(instance in instance()) {
        let depot = Location::depot("dc", 0.0, 0.0).expect("valid");
        let network = NetworkBuilder::haversine()
            .build(&depot, &instance.demands, &instance.fleet)
            .expect("valid instance");
        let solver = RoutingSolver::new(RoutingConfig::default().with_max_iterations(30));

        let max_capacity = instance.fleet.iter().map(|v| v.capacity()).max().unwrap_or(0);
        let plan = match solver.solve(&network) {
            Ok(plan) => plan,
            Err(SolveError::NoFeasibleSolution { dropped }) => {
                prop_assert!(instance.demands.iter().all(|d| d.quantity() > max_capacity));
                prop_assert!(dropped.iter().all(|d| d.reason == DropReason::Unservable));
                return Ok(());
            }
            Err(e) => return Err(TestCaseError::fail(format!("unexpected error: {e}"))),
        };

        for route in plan.routes() {
            prop_assert!(route.load() <= route.vehicle().capacity());
            prop_assert!(route.legs().first().is_some_and(|l| l.from.is_depot()));
            prop_assert!(route.legs().last().is_some_and(|l| l.to.is_depot()));
        }

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for route in plan.routes() {
            for id in route.stop_ids() {
                *seen.entry(id).or_default() += 1;
            }
        }
        for dropped in plan.dropped() {
            *seen.entry(dropped.location.id()).or_default() += 1;
        }
        for request in &instance.demands {
            prop_assert_eq!(seen.get(request.location().id()).copied(), Some(1));
        }
        prop_assert_eq!(seen.len(), instance.demands.len());
        prop_assert!(validate_plan(&plan, &network).is_empty());
    }
}
