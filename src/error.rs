use thiserror::Error;

/// Raised by [`crate::backend::Backend::initialize`] when the supplied
/// configuration can't produce a runnable world. The backend refuses to
/// run rather than clamp these into something plausible.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("floor_count must be >= 2, got {0}")]
    TooFewFloors(usize),
    #[error("elevator_count must be >= 1, got {0}")]
    TooFewElevators(usize),
    #[error("elevator capacities must all be > 0")]
    ZeroCapacity,
    #[error("spawn_rate must be > 0.0")]
    NonPositiveSpawnRate,
}

/// Surfaces a controller-side failure to the bridge/frame loop. Never
/// raised by the backend itself; the backend keeps running regardless.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("controller returned an error: {0}")]
    Raised(String),
    #[error("controller panicked: {0}")]
    Panicked(String),
}
