use serde::{Deserialize, Serialize};

use crate::stats::Statistics;

/// A challenge-termination condition, consulted against [`Statistics`]
/// once per tick by [`evaluate`]. Pure data; carries no behavior itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EndCondition {
    TransportNWithinTime { n: u64, t: f64 },
    TransportNWithMaxWait { n: u64, w: f64 },
    TransportNWithinTimeAndMaxWait { n: u64, t: f64, w: f64 },
    TransportNWithinMoves { n: u64, m: u64 },
    Demo,
}

/// `None` means "not decided yet"; `Some(true)`/`Some(false)` are sticky
/// once returned by the caller (the backend stops asking once it sees a
/// `Some`).
pub fn evaluate(condition: EndCondition, stats: &Statistics) -> Option<bool> {
    match condition {
        EndCondition::TransportNWithinTime { n, t } => {
            if stats.transported_count >= n && stats.elapsed_time <= t {
                Some(true)
            } else if stats.elapsed_time > t && stats.transported_count < n {
                Some(false)
            } else {
                None
            }
        }
        EndCondition::TransportNWithMaxWait { n, w } => {
            if stats.max_wait_time > w {
                Some(false)
            } else if stats.transported_count >= n && stats.max_wait_time <= w {
                Some(true)
            } else {
                None
            }
        }
        EndCondition::TransportNWithinTimeAndMaxWait { n, t, w } => {
            let time = evaluate(EndCondition::TransportNWithinTime { n, t }, stats);
            let wait = evaluate(EndCondition::TransportNWithMaxWait { n, w }, stats);
            match (time, wait) {
                (Some(true), Some(true)) => Some(true),
                (Some(false), _) | (_, Some(false)) => Some(false),
                _ => None,
            }
        }
        EndCondition::TransportNWithinMoves { n, m } => {
            if stats.transported_count >= n && stats.move_count <= m {
                Some(true)
            } else if stats.move_count > m && stats.transported_count < n {
                Some(false)
            } else {
                None
            }
        }
        EndCondition::Demo => None,
    }
}
