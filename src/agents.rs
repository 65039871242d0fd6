//! Reference controllers used by the demo binaries and as a baseline for
//! comparison. None of these are meant to be competitive; they exist to
//! exercise the [`crate::bridge::Controller`] ABI end to end.

use async_trait::async_trait;

use crate::bridge::{Controller, ElevatorView, FloorView};
use crate::error::ControllerError;

/// Never dispatches an elevator. Every car sits wherever it started.
pub struct NoopController;

#[async_trait]
impl Controller for NoopController {
    async fn tick(
        &mut self,
        _elevators: &mut [ElevatorView<'_>],
        _floors: &[FloorView],
        _dt: f64,
    ) -> Result<(), ControllerError> {
        Ok(())
    }
}

/// Dispatches each idle elevator to the nearest floor with outstanding
/// demand: either a button it already has pressed for a boarded
/// passenger, or a hall call nobody is currently headed toward. Elevators
/// already underway are left alone until they arrive.
pub struct NearestCarAgent;

fn nearest_target(current_floor: usize, candidates: impl Iterator<Item = usize>) -> Option<usize> {
    candidates.min_by_key(|&floor| (floor as isize - current_floor as isize).unsigned_abs())
}

#[async_trait]
impl Controller for NearestCarAgent {
    async fn tick(
        &mut self,
        elevators: &mut [ElevatorView<'_>],
        floors: &[FloorView],
        _dt: f64,
    ) -> Result<(), ControllerError> {
        let hall_calls: Vec<usize> = floors
            .iter()
            .filter(|f| f.up || f.down)
            .map(|f| f.level)
            .collect();

        for elevator in elevators.iter_mut() {
            if elevator.destination_floor.is_some() {
                continue;
            }

            let own_demand = elevator.pressed_floor_buttons.iter().copied();
            let target = nearest_target(elevator.current_floor, own_demand)
                .or_else(|| nearest_target(elevator.current_floor, hall_calls.iter().copied()));

            if let Some(floor) = target {
                elevator.go_to_floor(floor as i64);
            }
        }
        Ok(())
    }
}
