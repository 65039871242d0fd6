use elevator_sim::{Backend, Config, EndCondition};
use rand::SeedableRng;
use rand_pcg::Pcg64;

fn backend(config: Config, seed: u64) -> Backend {
    Backend::initialize(config, Box::new(Pcg64::seed_from_u64(seed))).unwrap()
}

fn shuttle_config() -> Config {
    Config {
        floor_count: 3,
        elevator_count: 1,
        elevator_capacities: vec![4],
        spawn_rate: 0.0001,
        speed_floors_per_sec: 2.0,
        end_condition: EndCondition::Demo,
    }
}

/// S1: a single elevator picks up one passenger and delivers them,
/// clearing call buttons along the way and counting exactly two moves.
#[test]
fn s1_single_elevator_shuttle() {
    let mut backend = backend(shuttle_config(), 1);
    backend.insert_passenger(0, 2, 70);
    backend.set_indicators(0, true, false);
    assert!(backend.floor(0).up);

    // The elevator starts parked at the middle floor (floor 1 for a
    // 3-floor building), so it must be dispatched down to floor 0 first.
    backend.go_to_floor(0, 0);
    for _ in 0..600 {
        backend.tick(1.0 / 60.0);
        if backend.elevator(0).current_floor() == 0 && backend.elevator(0).pause > 0.0 {
            break;
        }
    }
    assert!(!backend.floor(0).up, "boarding clears floor 0's up button");

    backend.go_to_floor(0, 2);
    for _ in 0..600 {
        backend.tick(1.0 / 60.0);
        if backend.elevator(0).current_floor() == 2 && backend.elevator(0).pause > 0.0 {
            break;
        }
    }

    let stats = backend.get_stats();
    assert_eq!(stats.transported_count, 1);
    assert_eq!(stats.move_count, 2);
}

/// S2: capacity rejection — a single-slot elevator only ever carries one
/// of two passengers waiting at the same floor.
#[test]
fn s2_capacity_rejection() {
    let config = Config {
        floor_count: 2,
        elevator_count: 1,
        elevator_capacities: vec![1],
        spawn_rate: 0.0001,
        speed_floors_per_sec: 2.0,
        end_condition: EndCondition::Demo,
    };
    let mut backend = backend(config, 2);
    backend.insert_passenger(0, 1, 60);
    backend.insert_passenger(0, 1, 60);
    backend.set_indicators(0, true, false);

    // Elevator starts parked at the middle floor; dispatch it down to
    // floor 0 so boarding can settle.
    backend.go_to_floor(0, 0);
    for _ in 0..600 {
        backend.tick(1.0 / 60.0);
        if backend.elevator(0).current_floor() == 0 && backend.elevator(0).pause > 0.0 {
            break;
        }
    }

    let riding = backend
        .passengers()
        .iter()
        .filter(|p| p.state == elevator_sim::passenger::PassengerState::Riding)
        .count();
    assert!(riding <= 1, "a 1-capacity elevator can carry at most one passenger");
}

/// S3: the challenge ends by deadline when nobody is ever transported.
#[test]
fn s3_end_by_time() {
    let config = Config {
        floor_count: 3,
        elevator_count: 1,
        elevator_capacities: vec![4],
        spawn_rate: 1e-9,
        speed_floors_per_sec: 2.0,
        end_condition: EndCondition::TransportNWithinTime { n: 1, t: 0.5 },
    };
    let mut backend = backend(config, 3);
    for _ in 0..200 {
        backend.tick(1.0 / 60.0);
        if backend.is_challenge_ended() {
            break;
        }
    }
    assert!(backend.is_challenge_ended());
    assert_eq!(backend.get_stats().transported_count, 0, "nobody was ever dispatched");
}

/// S4: a passenger left waiting too long blows the max-wait bound as
/// soon as they are finally transported.
#[test]
fn s4_end_by_max_wait() {
    let config = Config {
        floor_count: 3,
        elevator_count: 1,
        elevator_capacities: vec![4],
        spawn_rate: 1e-9,
        speed_floors_per_sec: 2.0,
        end_condition: EndCondition::TransportNWithMaxWait { n: 10, w: 0.5 },
    };
    let mut backend = backend(config, 4);
    backend.insert_passenger(0, 2, 70);
    backend.set_indicators(0, true, false);
    for _ in 0..60 {
        backend.tick(1.0 / 60.0);
    }
    backend.go_to_floor(0, 0);
    for _ in 0..300 {
        backend.tick(1.0 / 60.0);
        if backend.is_challenge_ended() {
            break;
        }
    }
    assert!(backend.is_challenge_ended());
}

/// S5: a controller that panics never corrupts backend state — the
/// frame loop's fault isolation swallows it and the simulation keeps
/// running on the next tick.
#[tokio::test]
async fn s5_controller_fault_is_isolated() {
    use async_trait::async_trait;
    use elevator_sim::{Controller, ControllerError, ElevatorView, FloorView};

    struct PanickingController;

    #[async_trait]
    impl Controller for PanickingController {
        async fn tick(
            &mut self,
            _elevators: &mut [ElevatorView<'_>],
            _floors: &[FloorView],
            _dt: f64,
        ) -> Result<(), ControllerError> {
            panic!("boom");
        }
    }

    let mut backend = backend(shuttle_config(), 5);
    let mut controller = PanickingController;
    backend.call_user_code(&mut controller, 1.0 / 60.0).await;

    // The backend must still be in a consistent, tickable state.
    backend.tick(1.0 / 60.0);
    assert!(!backend.is_challenge_ended() || backend.get_stats().elapsed_time > 0.0);
}

/// S6: direction indicators gate which waiting passenger boards — a car
/// accepting only downward calls leaves an upward-bound waiter behind.
#[test]
fn s6_direction_indicators_filter_boarding() {
    let config = Config {
        floor_count: 3,
        elevator_count: 1,
        elevator_capacities: vec![4],
        spawn_rate: 0.0001,
        speed_floors_per_sec: 2.0,
        end_condition: EndCondition::Demo,
    };
    let mut backend = backend(config, 6);
    // Already starts parked at the middle floor (floor 1 for 3 floors),
    // so no dispatch is needed before passengers arrive there.
    assert_eq!(backend.elevator(0).current_floor(), 1);

    let up_passenger = backend.insert_passenger(1, 2, 70);
    let down_passenger = backend.insert_passenger(1, 0, 70);
    backend.set_indicators(0, false, true);

    for _ in 0..5 {
        backend.tick(1.0 / 60.0);
    }

    let up = backend.passengers().iter().find(|p| p.id == up_passenger).unwrap();
    let down = backend.passengers().iter().find(|p| p.id == down_passenger).unwrap();
    assert_eq!(up.state, elevator_sim::passenger::PassengerState::Waiting);
    assert_eq!(down.state, elevator_sim::passenger::PassengerState::Riding);
}
