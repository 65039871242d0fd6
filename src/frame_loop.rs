use std::time::Instant;

use log::debug;

use crate::backend::Backend;
use crate::bridge::Controller;

/// Smallest substep the backend's physics ever integrates over. The
/// frame loop may owe the backend several of these per call to [`step`]
/// if real time moved further than this in one wall-clock frame.
pub const FIXED_DT: f64 = 1.0 / 60.0;

/// Lets an embedder observe the time scale currently in effect, e.g. to
/// reflect it in a UI. Kept separate from [`FrameLoop`] itself so tests
/// can substitute a no-op sink instead of wiring up a real one.
pub trait TimeScaleSink {
    fn on_time_scale_changed(&mut self, scale: f64);
}

/// A sink that drops every notification. The default when nothing else
/// is wired up.
#[derive(Default)]
pub struct NullTimeScaleSink;

impl TimeScaleSink for NullTimeScaleSink {
    fn on_time_scale_changed(&mut self, _scale: f64) {}
}

/// Drives a [`Backend`] and a [`Controller`] forward in wall-clock time.
/// The controller is invoked exactly once per call to [`step`], with the
/// scaled delta it's owed; the backend is then advanced in as many
/// `FIXED_DT` substeps as that same scaled time covers, capped at
/// `dt_max * 3 * time_scale` to bound the work any single call can do
/// after e.g. the host process was suspended.
pub struct FrameLoop {
    pub time_scale: f64,
    pub is_paused: bool,
    pub dt_max: f64,
    last_tick: Option<Instant>,
    carry: f64,
}

impl FrameLoop {
    pub fn new() -> Self {
        FrameLoop {
            time_scale: 1.0,
            is_paused: false,
            dt_max: FIXED_DT,
            last_tick: None,
            carry: 0.0,
        }
    }

    pub fn set_time_scale(&mut self, scale: f64, sink: &mut impl TimeScaleSink) {
        self.time_scale = scale.max(0.0);
        sink.on_time_scale_changed(self.time_scale);
    }

    pub fn pause(&mut self) {
        self.is_paused = true;
    }

    pub fn resume(&mut self) {
        self.is_paused = false;
        // Avoid a burst of substeps accounting for time spent paused.
        self.last_tick = None;
    }

    /// Advances real time by whatever has elapsed since the previous
    /// call, invoking `controller` once and then stepping `backend`
    /// forward in fixed substeps until the owed time is exhausted or the
    /// challenge ends. Returns the number of substeps actually applied.
    pub async fn step(&mut self, backend: &mut Backend, controller: &mut dyn Controller) -> u32 {
        let now = Instant::now();
        let wall_dt = match self.last_tick {
            Some(last) => now.duration_since(last).as_secs_f64(),
            None => FIXED_DT,
        };
        self.last_tick = Some(now);

        if self.is_paused || backend.is_challenge_ended() {
            return 0;
        }

        let scaled_dt = (wall_dt * self.time_scale).min(self.dt_max * 3.0 * self.time_scale);
        backend.call_user_code(controller, scaled_dt).await;

        self.carry += scaled_dt;
        let mut substeps = 0;
        while self.carry >= FIXED_DT && !backend.is_challenge_ended() {
            backend.tick(FIXED_DT);
            self.carry -= FIXED_DT;
            substeps += 1;
        }
        if backend.is_challenge_ended() {
            self.carry = 0.0;
            backend.cleanup();
            debug!("frame loop observed challenge end, {} substep(s) this call", substeps);
        }
        substeps
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        FrameLoop::new()
    }
}
