use serde::{Deserialize, Serialize};

pub type PassengerId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassengerState {
    Waiting,
    Riding,
    Exited,
}

#[derive(Debug, PartialEq, Eq)]
pub enum TransitionError {
    AlreadyRiding,
    NotRiding,
}

/// A single passenger moving through the building. Owned exclusively by
/// the backend; while `Riding` the backend's elevator lookup also keys
/// on this id, but the passenger itself never holds a reference back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passenger {
    pub id: PassengerId,
    pub weight: u32,
    pub starting_floor: usize,
    pub destination_floor: usize,
    pub state: PassengerState,
    pub elevator_index: Option<usize>,
    pub slot_in_elevator: Option<usize>,
    pub spawn_timestamp: f64,
    pub transported_timestamp: Option<f64>,
}

impl Passenger {
    pub fn new(
        id: PassengerId,
        weight: u32,
        starting_floor: usize,
        destination_floor: usize,
        spawn_timestamp: f64,
    ) -> Self {
        debug_assert_ne!(
            starting_floor, destination_floor,
            "a passenger's destination must differ from its origin"
        );
        Passenger {
            id,
            weight,
            starting_floor,
            destination_floor,
            state: PassengerState::Waiting,
            elevator_index: None,
            slot_in_elevator: None,
            spawn_timestamp,
            transported_timestamp: None,
        }
    }

    pub fn should_exit_at(&self, floor: usize) -> bool {
        self.destination_floor == floor
    }

    /// Derived current floor: while riding, the caller must supply the
    /// elevator's integer floor; otherwise it's always the origin.
    pub fn current_floor(&self, riding_floor: Option<usize>) -> usize {
        match self.state {
            PassengerState::Riding => riding_floor.unwrap_or(self.starting_floor),
            _ => self.starting_floor,
        }
    }

    pub fn enter_elevator(
        &mut self,
        elevator_index: usize,
        slot: usize,
    ) -> Result<(), TransitionError> {
        if self.state == PassengerState::Riding {
            return Err(TransitionError::AlreadyRiding);
        }
        self.state = PassengerState::Riding;
        self.elevator_index = Some(elevator_index);
        self.slot_in_elevator = Some(slot);
        Ok(())
    }

    pub fn exit_elevator(&mut self, now: f64) -> Result<(), TransitionError> {
        if self.state != PassengerState::Riding {
            return Err(TransitionError::NotRiding);
        }
        self.state = PassengerState::Exited;
        self.elevator_index = None;
        self.slot_in_elevator = None;
        self.transported_timestamp = Some(now);
        Ok(())
    }

    pub fn wait_time(&self, now: f64) -> f64 {
        self.transported_timestamp.unwrap_or(now) - self.spawn_timestamp
    }
}
