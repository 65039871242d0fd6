use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;

use crate::elevator::Elevator;
use crate::error::ControllerError;
use crate::floor::Floor;

/// A read-mostly view of one elevator, handed to the controller fresh
/// each tick. The only mutating operation is [`ElevatorView::go_to_floor`],
/// which proxies straight through to the owned [`Elevator`]. Valid only
/// for the duration of the controller call.
pub struct ElevatorView<'a> {
    elevator: &'a mut Elevator,
    pub current_floor: usize,
    pub destination_floor: Option<usize>,
    pub pressed_floor_buttons: Vec<usize>,
    pub percent_full: f64,
    pub going_up_indicator: bool,
    pub going_down_indicator: bool,
}

impl<'a> ElevatorView<'a> {
    pub fn new(elevator: &'a mut Elevator, percent_full: f64) -> Self {
        let current_floor = elevator.current_floor();
        let destination_floor = if elevator.is_moving() {
            Some(elevator.destination)
        } else {
            None
        };
        let pressed_floor_buttons = elevator
            .buttons
            .iter()
            .enumerate()
            .filter_map(|(i, &pressed)| pressed.then_some(i))
            .collect();
        ElevatorView {
            going_up_indicator: elevator.going_up_indicator,
            going_down_indicator: elevator.going_down_indicator,
            elevator,
            current_floor,
            destination_floor,
            pressed_floor_buttons,
            percent_full,
        }
    }

    /// Sole mutating action available to a controller. Non-integer
    /// inputs are the caller's responsibility to round; out-of-range
    /// values are silently clamped by [`Elevator::go_to_floor`].
    pub fn go_to_floor(&mut self, floor: i64) {
        self.elevator.go_to_floor(floor);
    }
}

/// A read-only view of one floor's call buttons.
#[derive(Debug, Clone, Copy)]
pub struct FloorView {
    pub level: usize,
    pub up: bool,
    pub down: bool,
}

impl FloorView {
    pub fn new(floor: &Floor) -> Self {
        FloorView {
            level: floor.level,
            up: floor.up,
            down: floor.down,
        }
    }
}

/// The controller ABI: user-supplied logic invoked once per tick. Models
/// `spec.md` §9's "polymorphism over runtimes" design note — every
/// embedded-language runtime implements this same trait.
#[async_trait]
pub trait Controller: Send {
    /// Optional hook called once before the first tick.
    async fn start(&mut self) {}

    async fn tick(
        &mut self,
        elevators: &mut [ElevatorView<'_>],
        floors: &[FloorView],
        dt: f64,
    ) -> Result<(), ControllerError>;
}

/// Invokes `controller.tick(..)`, catching both a returned `Err` and a
/// Rust-level panic so a faulty controller can never leave the backend
/// mid-mutation or take the frame loop down with it.
pub async fn invoke_tick(
    controller: &mut dyn Controller,
    elevators: &mut [ElevatorView<'_>],
    floors: &[FloorView],
    dt: f64,
) -> Result<(), ControllerError> {
    let future = AssertUnwindSafe(controller.tick(elevators, floors, dt)).catch_unwind();
    match future.await {
        Ok(result) => result,
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "controller panicked with a non-string payload".to_string());
            Err(ControllerError::Panicked(message))
        }
    }
}
