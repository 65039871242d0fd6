use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::passenger::PassengerId;

/// Floors/s^2, scaled down from the source's `2.1 * floorHeight` figure.
pub const ACCELERATION: f64 = 1.1;
/// Floors/s^2.
pub const DECELERATION: f64 = 1.6;
/// Seconds the elevator sits with doors notionally open after arriving.
pub const DOOR_PAUSE: f64 = 1.2;
/// Snap-to-floor tolerance, in floors.
pub const ARRIVAL_THRESHOLD: f64 = 0.01;
pub const STOPPING_DISTANCE_MARGIN: f64 = 1.05;
pub const DECELERATION_CORRECTION: f64 = 1.1;
pub const ACCEL_DISTANCE_FACTOR: f64 = 5.0;

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// A single elevator car. Owned exclusively by the backend. `slots` holds
/// passenger *ids*, never references, so the passenger <-> elevator
/// relationship has one owner (the backend's passenger list) and one
/// lookup key (here).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Elevator {
    pub index: usize,
    pub capacity: usize,
    pub max_speed: f64,
    floor_count: usize,

    pub position: f64,
    pub destination: usize,
    pub velocity: f64,
    pub pause: f64,
    pub moves: u64,

    pub buttons: Vec<bool>,
    pub slots: Vec<Option<PassengerId>>,

    pub going_up_indicator: bool,
    pub going_down_indicator: bool,
}

impl Elevator {
    /// New cars start parked at the middle floor, matching the
    /// convention the source simulator used for its initial elevator
    /// placement.
    pub fn new(index: usize, capacity: usize, floor_count: usize, max_speed: f64) -> Self {
        let starting_floor = floor_count / 2;
        Elevator {
            index,
            capacity,
            max_speed,
            floor_count,
            position: starting_floor as f64,
            destination: starting_floor,
            velocity: 0.0,
            pause: 0.0,
            moves: 0,
            buttons: vec![false; floor_count],
            slots: vec![None; capacity],
            going_up_indicator: true,
            going_down_indicator: true,
        }
    }

    pub fn current_floor(&self) -> usize {
        self.position.floor().max(0.0) as usize
    }

    pub fn direction(&self) -> f64 {
        sign(self.destination as f64 - self.position)
    }

    pub fn is_moving(&self) -> bool {
        self.direction() != 0.0
    }

    pub fn distance_to_destination(&self) -> f64 {
        (self.destination as f64 - self.position).abs()
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(|s| s.is_some())
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn percent_full(&self, weight_of: impl Fn(PassengerId) -> u32) -> f64 {
        let total_weight: u32 = self.slots.iter().flatten().map(|&id| weight_of(id)).sum();
        total_weight as f64 / (self.capacity as f64 * 100.0)
    }

    pub fn set_indicators(&mut self, up: bool, down: bool) {
        self.going_up_indicator = up;
        self.going_down_indicator = down;
    }

    /// Clamp `n` into range and, if it actually changes the destination,
    /// bump `moves`. Never starts motion directly — that's a consequence
    /// of `tick`.
    pub fn go_to_floor(&mut self, n: i64) {
        let clamped = n.clamp(0, self.floor_count as i64 - 1) as usize;
        if clamped != self.destination {
            self.destination = clamped;
            self.moves += 1;
        }
    }

    /// Places `passenger_id` in a free slot chosen at random among the
    /// free slots, presses its destination button, and returns the slot
    /// index. Returns `None` if the elevator is full.
    pub fn add_passenger(
        &mut self,
        passenger_id: PassengerId,
        destination_floor: usize,
        rng: &mut impl Rng,
    ) -> Option<usize> {
        let free: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| if s.is_none() { Some(i) } else { None })
            .collect();
        if free.is_empty() {
            return None;
        }
        let chosen = free[rng.random_range(0..free.len())];
        self.slots[chosen] = Some(passenger_id);
        self.buttons[destination_floor] = true;
        Some(chosen)
    }

    /// Empties the slot holding `passenger_id`. Errs if the passenger
    /// isn't aboard this elevator.
    pub fn remove_passenger(&mut self, passenger_id: PassengerId) -> Result<usize, ()> {
        let slot = self
            .slots
            .iter()
            .position(|s| *s == Some(passenger_id))
            .ok_or(())?;
        self.slots[slot] = None;
        Ok(slot)
    }

    /// Advances the car by one fixed substep. Returns `true` iff the
    /// elevator is paused or just arrived (doors effectively open).
    ///
    /// Note the one-step lag: `position` advances using the velocity
    /// computed on the *previous* call, and the velocity computed here is
    /// only consumed on the *next* call. This mirrors the source exactly
    /// and is intentional — see DESIGN.md.
    pub fn tick(&mut self, dt: f64) -> bool {
        self.pause = (self.pause - dt).max(0.0);
        if !self.is_moving() || self.pause > 0.0 {
            return true;
        }

        self.position += self.velocity * dt;

        if self.distance_to_destination() < ARRIVAL_THRESHOLD {
            self.position = self.destination as f64;
            self.velocity = 0.0;
            self.buttons[self.current_floor()] = false;
            self.pause = DOOR_PAUSE;
            return true;
        }

        let target_direction = self.direction();
        let distance = self.distance_to_destination();

        let new_velocity = if self.velocity == 0.0 {
            target_direction * (distance * ACCEL_DISTANCE_FACTOR).min(ACCELERATION) * dt
        } else if sign(self.velocity) != target_direction {
            let braked = self.velocity - sign(self.velocity) * DECELERATION * dt;
            if sign(braked) != sign(self.velocity) {
                0.0
            } else {
                braked
            }
        } else {
            let stopping_distance = self.velocity * self.velocity / (2.0 * DECELERATION);
            if stopping_distance * STOPPING_DISTANCE_MARGIN < distance {
                self.velocity
                    + target_direction * (distance * ACCEL_DISTANCE_FACTOR).min(ACCELERATION) * dt
            } else {
                let decel_amount =
                    (DECELERATION * DECELERATION_CORRECTION).min(self.velocity * self.velocity / (2.0 * distance));
                self.velocity - sign(self.velocity) * decel_amount * dt
            }
        };

        self.velocity = new_velocity.clamp(-self.max_speed, self.max_speed);
        false
    }
}
