use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rand::{Rng, RngCore, SeedableRng};

use crate::bridge::{Controller, ElevatorView, FloorView, invoke_tick};
use crate::challenge::{self, EndCondition};
use crate::config::Config;
use crate::elevator::Elevator;
use crate::error::ConfigurationError;
use crate::events::{
    ChallengeEndedPayload, Event, EventBus, PassengerSpawnedPayload, PassengersExchangedPayload,
    StateChangedPayload, UsercodeErrorPayload,
};
use crate::floor::{Direction, Floor};
use crate::passenger::{Passenger, PassengerId, PassengerState};
use crate::snapshot::{ElevatorSnapshot, PassengerSnapshot, StateSnapshot};
use crate::stats::Statistics;

/// Minimum wall-clock interval between `stats_changed` emissions. A
/// last-emit-was-longer-ago-than gate, not a windowed rate limiter.
const STATS_THROTTLE_INTERVAL: Duration = Duration::from_millis(1000 / 30);

/// Owns every entity in the simulated world: floors, elevators,
/// passengers, and statistics. The sole mutator of all of them.
pub struct Backend {
    config: Config,
    floors: Vec<Floor>,
    elevators: Vec<Elevator>,
    passengers: Vec<Passenger>,
    next_passenger_id: PassengerId,
    stats: Statistics,
    elapsed_since_spawn: f64,
    is_challenge_ended: bool,
    events: EventBus,
    rng: Box<dyn RngCore + Send>,
    last_stats_emit: Option<Instant>,
}

impl Backend {
    pub fn initialize(
        config: Config,
        rng: Box<dyn RngCore + Send>,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;

        let floors = (0..config.floor_count).map(Floor::new).collect();
        let elevators = (0..config.elevator_count)
            .map(|i| {
                Elevator::new(
                    i,
                    config.capacity_for(i),
                    config.floor_count,
                    config.speed_floors_per_sec,
                )
            })
            .collect();

        let elapsed_since_spawn = if config.spawn_rate > 0.0 {
            1.001 / config.spawn_rate
        } else {
            0.0
        };

        let mut events = EventBus::new();
        events.emit(Event::ChallengeInitialized);
        events.emit(Event::SimulationStarted);

        Ok(Backend {
            config,
            floors,
            elevators,
            passengers: Vec::new(),
            next_passenger_id: 0,
            stats: Statistics::new(),
            elapsed_since_spawn,
            is_challenge_ended: false,
            events,
            rng,
            last_stats_emit: None,
        })
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    pub fn is_challenge_ended(&self) -> bool {
        self.is_challenge_ended
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn elevator(&self, index: usize) -> &Elevator {
        &self.elevators[index]
    }

    pub fn floor(&self, level: usize) -> &Floor {
        &self.floors[level]
    }

    pub fn passengers(&self) -> &[Passenger] {
        &self.passengers
    }

    /// For tests and scripted scenarios: insert a passenger directly,
    /// bypassing the spawn policy, and press the appropriate call button.
    pub fn insert_passenger(
        &mut self,
        starting_floor: usize,
        destination_floor: usize,
        weight: u32,
    ) -> PassengerId {
        let id = self.next_passenger_id;
        self.next_passenger_id += 1;
        let passenger = Passenger::new(
            id,
            weight,
            starting_floor,
            destination_floor,
            self.stats.elapsed_time,
        );
        self.press_call_button(&passenger);
        self.passengers.push(passenger);
        id
    }

    pub fn set_indicators(&mut self, elevator_index: usize, up: bool, down: bool) {
        self.elevators[elevator_index].set_indicators(up, down);
    }

    pub fn go_to_floor(&mut self, elevator_index: usize, floor: i64) {
        let moves_before = self.elevators[elevator_index].moves;
        self.elevators[elevator_index].go_to_floor(floor);
        if self.elevators[elevator_index].moves != moves_before {
            self.stats.record_move();
        }
    }

    fn press_call_button(&mut self, passenger: &Passenger) {
        let dir = if passenger.destination_floor > passenger.starting_floor {
            Direction::Up
        } else {
            Direction::Down
        };
        self.floors[passenger.starting_floor].press_button(dir);
    }

    fn spawn_passenger(&mut self) {
        let origin = if self.rng.random_bool(0.5) {
            0
        } else {
            self.rng.random_range(0..self.config.floor_count)
        };

        let destination = if origin == 0 {
            self.rng.random_range(1..self.config.floor_count)
        } else if self.rng.random_range(0..11) == 0 {
            let step = self.rng.random_range(1..self.config.floor_count);
            (origin + step) % self.config.floor_count
        } else {
            0
        };

        let weight = self.rng.random_range(55..=100);

        let id = self.next_passenger_id;
        self.next_passenger_id += 1;
        let passenger = Passenger::new(id, weight, origin, destination, self.stats.elapsed_time);
        debug!(
            "passenger {} spawned at floor {} bound for floor {}",
            id, origin, destination
        );
        self.press_call_button(&passenger);
        self.events.emit(Event::PassengerSpawned(PassengerSpawnedPayload {
            passenger: passenger.clone(),
        }));
        self.passengers.push(passenger);
    }

    /// Advances the world by one fixed substep. Safe to call repeatedly
    /// on an ended challenge: it is a no-op once `is_challenge_ended`.
    pub fn tick(&mut self, dt: f64) {
        if self.is_challenge_ended {
            return;
        }

        // (A) accumulate elapsed time.
        self.stats.elapsed_time += dt;

        // (B) spawn policy.
        if self.config.spawn_rate > 0.0 {
            let spawn_period = 1.0 / self.config.spawn_rate;
            self.elapsed_since_spawn += dt;
            while self.elapsed_since_spawn > spawn_period {
                self.elapsed_since_spawn -= spawn_period;
                self.spawn_passenger();
            }
        }

        // (C) advance each elevator in index order; settle arrivals.
        for index in 0..self.elevators.len() {
            let arrived_or_paused = self.elevators[index].tick(dt);
            if arrived_or_paused {
                self.settle_arrival(index);
            }
        }

        // (D) drop exited passengers from the world.
        self.passengers.retain(|p| p.state != PassengerState::Exited);

        self.stats.refresh_rate();

        // (E) state_changed fires every tick.
        self.events.emit(Event::StateChanged(StateChangedPayload {
            dt,
            is_challenge_ended: self.is_challenge_ended,
        }));

        // (F) evaluate end condition.
        match challenge::evaluate(self.config.end_condition, &self.stats) {
            Some(succeeded) => {
                self.is_challenge_ended = true;
                info!(
                    "challenge ended: succeeded={} after {:.2}s, {} transported",
                    succeeded, self.stats.elapsed_time, self.stats.transported_count
                );
                self.events
                    .emit(Event::ChallengeEnded(ChallengeEndedPayload { succeeded }));
            }
            None => self.maybe_emit_stats(),
        }

        self.debug_assert_invariants();
    }

    fn maybe_emit_stats(&mut self) {
        let now = Instant::now();
        let should_emit = match self.last_stats_emit {
            None => true,
            Some(last) => now.duration_since(last) >= STATS_THROTTLE_INTERVAL,
        };
        if should_emit {
            self.last_stats_emit = Some(now);
            self.events.emit(Event::StatsChanged(self.stats));
        }
    }

    /// The deterministic exit-then-board-then-clear sequence run when an
    /// elevator's `tick` reports it is paused or has just arrived.
    /// Idempotent: calling this again before the elevator moves on does
    /// nothing further once exits/boards/clears are already settled.
    fn settle_arrival(&mut self, elevator_index: usize) {
        let floor_index = self.elevators[elevator_index].current_floor();
        let up_accepting =
            self.elevators[elevator_index].going_up_indicator && self.floors[floor_index].up;
        let down_accepting =
            self.elevators[elevator_index].going_down_indicator && self.floors[floor_index].down;

        // Exits first.
        let exiting_ids: Vec<PassengerId> = self.passengers
            .iter()
            .filter(|p| {
                p.state == PassengerState::Riding
                    && p.elevator_index == Some(elevator_index)
                    && p.should_exit_at(floor_index)
            })
            .map(|p| p.id)
            .collect();

        let mut exited_snapshots = Vec::new();
        for id in &exiting_ids {
            self.elevators[elevator_index]
                .remove_passenger(*id)
                .expect("passenger id present in elevator slots must be removable");
            let passenger = self
                .passengers
                .iter_mut()
                .find(|p| p.id == *id)
                .expect("exiting passenger must still be in the world");
            let wait_time = passenger.wait_time(self.stats.elapsed_time);
            passenger
                .exit_elevator(self.stats.elapsed_time)
                .expect("passenger filtered as Riding must be able to exit");
            self.stats.record_transport(wait_time);
            exited_snapshots.push(passenger.clone());
        }
        if !exited_snapshots.is_empty() {
            debug!(
                "elevator {} at floor {}: {} passenger(s) exited",
                elevator_index,
                floor_index,
                exited_snapshots.len()
            );
            self.events.emit(Event::PassengersExited(PassengersExchangedPayload {
                floor: floor_index,
                passengers: exited_snapshots,
            }));
        }

        // Boards.
        let boarding_ids: Vec<PassengerId> = self.passengers
            .iter()
            .filter(|p| {
                p.state == PassengerState::Waiting
                    && p.current_floor(None) == floor_index
                    && ((p.destination_floor > floor_index && up_accepting)
                        || (p.destination_floor < floor_index && down_accepting))
            })
            .map(|p| p.id)
            .collect();

        let mut boarded_snapshots = Vec::new();
        for id in boarding_ids {
            if self.elevators[elevator_index].is_full() {
                break;
            }
            let destination_floor = self
                .passengers
                .iter()
                .find(|p| p.id == id)
                .expect("boarding passenger must still be in the world")
                .destination_floor;
            let Some(slot) = self.elevators[elevator_index].add_passenger(
                id,
                destination_floor,
                &mut self.rng,
            ) else {
                break;
            };
            let passenger = self
                .passengers
                .iter_mut()
                .find(|p| p.id == id)
                .expect("boarding passenger must still be in the world");
            passenger
                .enter_elevator(elevator_index, slot)
                .expect("passenger filtered as Waiting must be able to board");
            boarded_snapshots.push(passenger.clone());
        }
        if !boarded_snapshots.is_empty() {
            debug!(
                "elevator {} at floor {}: {} passenger(s) boarded",
                elevator_index,
                floor_index,
                boarded_snapshots.len()
            );
            self.events.emit(Event::PassengersBoarded(PassengersExchangedPayload {
                floor: floor_index,
                passengers: boarded_snapshots,
            }));
        }

        // Clear floor buttons once nobody remains wanting that direction.
        if up_accepting
            && !self.passengers.iter().any(|p| {
                p.state == PassengerState::Waiting
                    && p.current_floor(None) == floor_index
                    && p.destination_floor > floor_index
            })
        {
            self.floors[floor_index].clear_button(Direction::Up);
        }
        if down_accepting
            && !self.passengers.iter().any(|p| {
                p.state == PassengerState::Waiting
                    && p.current_floor(None) == floor_index
                    && p.destination_floor < floor_index
            })
        {
            self.floors[floor_index].clear_button(Direction::Down);
        }
    }

    /// Invokes the controller through the bridge for this tick. Any
    /// controller fault (returned error or panic) is caught here, never
    /// propagated into the backend's own state.
    pub async fn call_user_code(&mut self, controller: &mut dyn Controller, dt: f64) {
        if self.is_challenge_ended {
            return;
        }

        let weights: Vec<u32> = self.passengers.iter().map(|p| p.weight).collect();
        let ids: Vec<PassengerId> = self.passengers.iter().map(|p| p.id).collect();
        let weight_of = |id: PassengerId| -> u32 {
            ids.iter()
                .position(|&pid| pid == id)
                .map(|i| weights[i])
                .unwrap_or(0)
        };

        let mut elevator_views: Vec<ElevatorView<'_>> = self
            .elevators
            .iter_mut()
            .map(|e| {
                let percent_full = e.percent_full(weight_of);
                ElevatorView::new(e, percent_full)
            })
            .collect();
        let floor_views: Vec<FloorView> = self.floors.iter().map(FloorView::new).collect();

        if let Err(err) = invoke_tick(controller, &mut elevator_views, &floor_views, dt).await {
            warn!("controller error: {}", err);
            self.events.emit(Event::UsercodeError(UsercodeErrorPayload {
                message: err.to_string(),
            }));
        }
        drop(elevator_views);

        // ElevatorView::go_to_floor mutates elevators directly; reconcile
        // the aggregate move count against each elevator's own counter.
        let total_moves: u64 = self.elevators.iter().map(|e| e.moves).sum();
        if total_moves > self.stats.move_count {
            self.stats.move_count = total_moves;
        }
    }

    pub fn get_state(&self) -> StateSnapshot {
        let weight_of = |id: PassengerId| -> u32 {
            self.passengers
                .iter()
                .find(|p| p.id == id)
                .map(|p| p.weight)
                .unwrap_or(0)
        };

        StateSnapshot {
            floors: self.floors.iter().map(Into::into).collect(),
            elevators: self
                .elevators
                .iter()
                .map(|e| ElevatorSnapshot::from_elevator(e, weight_of))
                .collect(),
            passengers: self
                .passengers
                .iter()
                .map(|p| {
                    let riding_floor = p
                        .elevator_index
                        .map(|idx| self.elevators[idx].current_floor());
                    PassengerSnapshot::from_passenger(p, riding_floor)
                })
                .collect(),
            stats: self.stats,
            is_challenge_ended: self.is_challenge_ended,
            dt: 0.0,
        }
    }

    pub fn get_stats(&self) -> Statistics {
        self.stats
    }

    pub fn cleanup(&mut self) {
        self.events.emit(Event::Cleanup);
    }

    fn debug_assert_invariants(&self) {
        if !cfg!(debug_assertions) {
            return;
        }
        for elevator in &self.elevators {
            debug_assert!(elevator.position >= 0.0 && elevator.position <= (self.config.floor_count - 1) as f64);
            debug_assert!(elevator.velocity.abs() <= elevator.max_speed + 1e-6);
            if elevator.pause > 0.0 {
                debug_assert_eq!(elevator.velocity, 0.0);
            }
        }
        let riding_in_elevators: usize = self.elevators.iter().map(Elevator::occupied_count).sum();
        let riding_passengers = self
            .passengers
            .iter()
            .filter(|p| p.state == PassengerState::Riding)
            .count();
        debug_assert_eq!(riding_in_elevators, riding_passengers);

        for passenger in &self.passengers {
            match passenger.state {
                PassengerState::Riding => debug_assert!(
                    passenger.elevator_index.is_some() && passenger.slot_in_elevator.is_some()
                ),
                _ => debug_assert!(
                    passenger.elevator_index.is_none() && passenger.slot_in_elevator.is_none()
                ),
            }
        }
    }
}

/// Convenience constructor for production use: seeds the RNG from OS
/// entropy rather than a fixed seed.
pub fn initialize_with_os_rng(config: Config) -> Result<Backend, ConfigurationError> {
    Backend::initialize(config, Box::new(rand::rngs::StdRng::from_os_rng()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::EndCondition;
    use rand_pcg::Pcg64;

    fn backend(config: Config) -> Backend {
        Backend::initialize(config, Box::new(Pcg64::seed_from_u64(42))).unwrap()
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

    /// S1: single-elevator shuttle.
    #[test]
    fn s1_single_elevator_shuttle() {
        let mut backend = backend(shuttle_config());
        backend.insert_passenger(0, 2, 70);
        backend.set_indicators(0, true, false);
        assert!(backend.floor(0).up);

        // The elevator starts parked at the middle floor (floor 1 for a
        // 3-floor building), so it must be dispatched down to floor 0
        // before boarding can settle.
        backend.go_to_floor(0, 0);
        for _ in 0..600 {
            backend.tick(1.0 / 60.0);
            if backend.elevator(0).current_floor() == 0 && backend.elevator(0).pause > 0.0 {
                break;
            }
        }
        assert!(!backend.floor(0).up, "boarding must clear floor 0's up button");
        assert_eq!(
            backend.passengers()[0].state,
            PassengerState::Riding,
            "passenger should have boarded at floor 0"
        );

        backend.go_to_floor(0, 2);
        for _ in 0..600 {
            backend.tick(1.0 / 60.0);
            if backend.elevator(0).current_floor() == 2 && backend.elevator(0).pause > 0.0 {
                break;
            }
        }

        assert_eq!(backend.stats().transported_count, 1);
        assert_eq!(backend.stats().move_count, 2);
        assert_eq!(backend.stats().avg_wait_time, backend.stats().max_wait_time);
    }

    /// S2: capacity rejection — only one of two passengers boards.
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
        let mut backend = backend(config);
        backend.insert_passenger(0, 1, 60);
        backend.insert_passenger(0, 1, 60);
        backend.set_indicators(0, true, false);

        // Elevator starts parked at the middle floor; drive it down to
        // floor 0, which settles boarding as part of the arrival tick.
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
            .filter(|p| p.state == PassengerState::Riding)
            .count();
        assert_eq!(riding, 1, "only one passenger should fit in a 1-capacity elevator");
        assert!(backend.floor(0).up, "button stays set while someone is still waiting");
    }

    /// S3: end by time, no passengers ever served.
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
        let mut backend = backend(config);
        let mut ended_count = 0;
        for _ in 0..200 {
            backend.tick(1.0 / 60.0);
            if backend.is_challenge_ended() {
                ended_count += 1;
            }
        }
        assert!(backend.is_challenge_ended());
        // tick() is a no-op once ended, so is_challenge_ended stays true
        // for every remaining call but the transition only happens once.
        assert!(ended_count >= 1);
    }

    /// S4: end by max wait — a passenger left waiting too long before
    /// pickup blows the bound as soon as they're finally transported.
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
        let mut backend = backend(config);
        backend.insert_passenger(0, 2, 70);
        backend.set_indicators(0, true, false);
        // Let the passenger sit past the wait bound before dispatching.
        for _ in 0..60 {
            backend.tick(1.0 / 60.0);
        }
        backend.go_to_floor(0, 0);
        for _ in 0..180 {
            backend.tick(1.0 / 60.0);
            if backend.is_challenge_ended() {
                break;
            }
        }
        assert!(backend.is_challenge_ended());
    }

    /// S6: direction indicators gate which waiting passenger boards.
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
        let mut backend = backend(config);
        // Elevator already starts parked at the middle floor (floor 1 for
        // a 3-floor building), so no dispatch is needed to get it there.
        assert_eq!(backend.elevator(0).current_floor(), 1);

        let up_passenger = backend.insert_passenger(1, 2, 70);
        let down_passenger = backend.insert_passenger(1, 0, 70);
        backend.set_indicators(0, false, true);

        backend.settle_arrival(0);

        let up = backend.passengers().iter().find(|p| p.id == up_passenger).unwrap();
        let down = backend.passengers().iter().find(|p| p.id == down_passenger).unwrap();
        assert_eq!(up.state, PassengerState::Waiting, "up-wanting passenger must not board");
        assert_eq!(down.state, PassengerState::Riding, "down-wanting passenger should board");
        assert!(!backend.floor(1).down, "down button clears once its only waiter boards");
        assert!(backend.floor(1).up, "up button stays set since nobody accepted it");
    }

    #[test]
    fn challenge_end_is_sticky() {
        let config = Config {
            floor_count: 3,
            elevator_count: 1,
            elevator_capacities: vec![4],
            spawn_rate: 1e-9,
            speed_floors_per_sec: 2.0,
            end_condition: EndCondition::TransportNWithinTime { n: 1, t: 0.1 },
        };
        let mut backend = backend(config);
        for _ in 0..20 {
            backend.tick(1.0 / 60.0);
        }
        assert!(backend.is_challenge_ended());
        let stats_before = backend.get_stats();
        backend.tick(1.0 / 60.0);
        backend.tick(1.0 / 60.0);
        assert_eq!(backend.get_stats(), stats_before, "ticking after the end must be a no-op");
    }
}
