use serde::Serialize;

use crate::elevator::Elevator;
use crate::floor::Floor;
use crate::passenger::{Passenger, PassengerId};
use crate::stats::Statistics;

#[derive(Debug, Clone, Serialize)]
pub struct FloorSnapshot {
    pub level: usize,
    pub up: bool,
    pub down: bool,
}

impl From<&Floor> for FloorSnapshot {
    fn from(floor: &Floor) -> Self {
        FloorSnapshot {
            level: floor.level,
            up: floor.up,
            down: floor.down,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ElevatorSlotSnapshot {
    pub passenger_id: PassengerId,
    pub slot: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ElevatorSnapshot {
    pub index: usize,
    pub position: f64,
    pub current_floor: usize,
    pub destination_floor: Option<usize>,
    pub velocity: f64,
    pub buttons: Vec<bool>,
    pub passengers: Vec<ElevatorSlotSnapshot>,
    pub going_up_indicator: bool,
    pub going_down_indicator: bool,
    pub capacity: usize,
    pub percent_full: f64,
    pub moves: u64,
}

impl ElevatorSnapshot {
    pub fn from_elevator(elevator: &Elevator, weight_of: impl Fn(PassengerId) -> u32) -> Self {
        ElevatorSnapshot {
            index: elevator.index,
            position: elevator.position,
            current_floor: elevator.current_floor(),
            destination_floor: elevator.is_moving().then_some(elevator.destination),
            velocity: elevator.velocity,
            buttons: elevator.buttons.clone(),
            passengers: elevator
                .slots
                .iter()
                .enumerate()
                .filter_map(|(slot, id)| {
                    id.map(|passenger_id| ElevatorSlotSnapshot { passenger_id, slot })
                })
                .collect(),
            going_up_indicator: elevator.going_up_indicator,
            going_down_indicator: elevator.going_down_indicator,
            capacity: elevator.capacity,
            percent_full: elevator.percent_full(weight_of),
            moves: elevator.moves,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PassengerSnapshot {
    pub id: PassengerId,
    pub weight: u32,
    pub starting_floor: usize,
    pub destination_floor: usize,
    pub current_floor: usize,
    pub state: crate::passenger::PassengerState,
    pub elevator_index: Option<usize>,
    pub slot_in_elevator: Option<usize>,
}

impl PassengerSnapshot {
    pub fn from_passenger(passenger: &Passenger, riding_floor: Option<usize>) -> Self {
        PassengerSnapshot {
            id: passenger.id,
            weight: passenger.weight,
            starting_floor: passenger.starting_floor,
            destination_floor: passenger.destination_floor,
            current_floor: passenger.current_floor(riding_floor),
            state: passenger.state,
            elevator_index: passenger.elevator_index,
            slot_in_elevator: passenger.slot_in_elevator,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub floors: Vec<FloorSnapshot>,
    pub elevators: Vec<ElevatorSnapshot>,
    pub passengers: Vec<PassengerSnapshot>,
    pub stats: Statistics,
    pub is_challenge_ended: bool,
    pub dt: f64,
}
