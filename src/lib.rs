pub mod agents;
pub mod backend;
pub mod bridge;
pub mod challenge;
pub mod config;
pub mod elevator;
pub mod error;
pub mod events;
pub mod floor;
pub mod frame_loop;
pub mod passenger;
pub mod snapshot;
pub mod stats;

pub use backend::Backend;
pub use bridge::{Controller, ElevatorView, FloorView};
pub use challenge::EndCondition;
pub use config::Config;
pub use elevator::Elevator;
pub use error::{ConfigurationError, ControllerError};
pub use floor::Floor;
pub use frame_loop::FrameLoop;
pub use passenger::Passenger;
pub use snapshot::StateSnapshot;
pub use stats::Statistics;

use rand::SeedableRng;
use rand_pcg::Pcg64;
use wasm_bindgen::prelude::*;

/// JS-facing handle over a [`Backend`], seeded deterministically so a
/// browser host can reproduce a run byte-for-byte given the same seed.
/// Mirrors the shape of the wasm bindings this crate's ancestor exposed,
/// but over the continuous-time entity model rather than a turn grid.
#[wasm_bindgen]
pub struct SimulationState {
    backend: Backend,
}

#[wasm_bindgen]
impl SimulationState {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, seed: u64) -> Result<SimulationState, String> {
        let config: Config = serde_json::from_str(config_json).map_err(|e| e.to_string())?;
        let backend = Backend::initialize(config, Box::new(Pcg64::seed_from_u64(seed)))
            .map_err(|e| e.to_string())?;
        Ok(SimulationState { backend })
    }

    /// Advances the world by one fixed substep without invoking any
    /// controller. JS hosts that drive their own agent call
    /// [`SimulationState::set_elevator_destination`] between ticks.
    #[wasm_bindgen]
    pub fn tick(&mut self, dt: f64) {
        self.backend.tick(dt);
    }

    #[wasm_bindgen]
    pub fn set_elevator_destination(&mut self, elevator_index: usize, floor: i64) {
        self.backend.go_to_floor(elevator_index, floor);
    }

    #[wasm_bindgen]
    pub fn set_elevator_indicators(&mut self, elevator_index: usize, up: bool, down: bool) {
        self.backend.set_indicators(elevator_index, up, down);
    }

    #[wasm_bindgen]
    pub fn state_json(&self) -> Result<JsValue, String> {
        serde_wasm_bindgen::to_value(&self.backend.get_state()).map_err(|e| e.to_string())
    }

    #[wasm_bindgen]
    pub fn stats_json(&self) -> Result<JsValue, String> {
        serde_wasm_bindgen::to_value(&self.backend.get_stats()).map_err(|e| e.to_string())
    }

    #[wasm_bindgen(getter)]
    pub fn is_challenge_ended(&self) -> bool {
        self.backend.is_challenge_ended()
    }
}
