use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use crate::passenger::Passenger;
use crate::stats::Statistics;

/// A single token that can revoke every subscription registered against
/// it, in one call. Cloning shares the same underlying flag.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StateChangedPayload {
    pub dt: f64,
    pub is_challenge_ended: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PassengerSpawnedPayload {
    pub passenger: Passenger,
}

#[derive(Debug, Clone, Serialize)]
pub struct PassengersExchangedPayload {
    pub floor: usize,
    pub passengers: Vec<Passenger>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChallengeEndedPayload {
    pub succeeded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsercodeErrorPayload {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimescaleChangedPayload {
    pub scale: f64,
}

/// One event variant per wire name in `spec.md` §4.5. Each carries its
/// own typed payload; there is no generic/untyped event.
#[derive(Debug, Clone, Serialize)]
pub enum Event {
    StateChanged(StateChangedPayload),
    StatsChanged(Statistics),
    PassengerSpawned(PassengerSpawnedPayload),
    PassengersBoarded(PassengersExchangedPayload),
    PassengersExited(PassengersExchangedPayload),
    ChallengeEnded(ChallengeEndedPayload),
    ChallengeInitialized,
    SimulationStarted,
    TimescaleChanged(TimescaleChangedPayload),
    Cleanup,
    UsercodeError(UsercodeErrorPayload),
}

type Subscriber = Box<dyn FnMut(&Event) + Send>;

/// A standalone publish/subscribe channel. No entity "is" an emitter;
/// the backend and frame loop emit on behalf of the entities they own.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<(CancellationToken, Subscriber)>,
}

impl EventBus {
    pub fn new() -> Self {
        EventBus::default()
    }

    /// Registers `callback` under `token`. Cancelling `token` (via
    /// [`CancellationToken::cancel`]) silently drops the subscription on
    /// its next would-be delivery; there is no separate unsubscribe call.
    pub fn subscribe(&mut self, token: CancellationToken, callback: Subscriber) {
        self.subscribers.push((token, callback));
    }

    pub fn emit(&mut self, event: Event) {
        self.subscribers.retain(|(token, _)| !token.is_cancelled());
        for (_, callback) in self.subscribers.iter_mut() {
            callback(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn subscribers_receive_emitted_events() {
        let received = Arc::new(Mutex::new(0));
        let mut bus = EventBus::new();
        let token = CancellationToken::new();
        let received_clone = received.clone();
        bus.subscribe(
            token,
            Box::new(move |_event| {
                *received_clone.lock().unwrap() += 1;
            }),
        );
        bus.emit(Event::SimulationStarted);
        bus.emit(Event::Cleanup);
        assert_eq!(*received.lock().unwrap(), 2);
    }

    #[test]
    fn cancelling_token_revokes_all_its_subscriptions_at_once() {
        let received = Arc::new(Mutex::new(0));
        let mut bus = EventBus::new();
        let token = CancellationToken::new();

        for _ in 0..3 {
            let received_clone = received.clone();
            bus.subscribe(
                token.clone(),
                Box::new(move |_event| {
                    *received_clone.lock().unwrap() += 1;
                }),
            );
        }

        bus.emit(Event::SimulationStarted);
        assert_eq!(*received.lock().unwrap(), 3);

        token.cancel();
        bus.emit(Event::SimulationStarted);
        assert_eq!(*received.lock().unwrap(), 3, "cancelled subscribers must not fire again");
    }
}
