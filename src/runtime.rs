//! Async driver for the timed parts of the simulator.
//!
//! [`SimulatorHandle`] shares one [`Simulator`] behind a mutex and owns the two
//! background tasks that run on timers:
//!
//! - the recording ticker, sampling the pose every `recording_interval_ms`;
//! - the playback loop, applying one frame, sleeping its duration, and finally
//!   restoring IK after a short grace delay.
//!
//! Each task gets its own `CancellationToken`. The mutex is only ever held
//! inside [`SimulatorHandle::with`], never across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::SimulatorConfig;
use crate::simulator::Simulator;

#[derive(Clone)]
pub struct SimulatorHandle {
    sim: Arc<Mutex<Simulator>>,
    recording: Arc<Mutex<Option<CancellationToken>>>,
    playback: Arc<Mutex<Option<CancellationToken>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cancel and forget the token in `slot`, if any.
fn cancel_slot(slot: &Mutex<Option<CancellationToken>>) {
    if let Some(token) = lock(slot).take() {
        token.cancel();
    }
}

impl SimulatorHandle {
    pub fn new(sim: Simulator) -> Self {
        Self {
            sim: Arc::new(Mutex::new(sim)),
            recording: Arc::new(Mutex::new(None)),
            playback: Arc::new(Mutex::new(None)),
        }
    }

    pub fn from_config(config: SimulatorConfig) -> Self {
        Self::new(Simulator::new(config))
    }

    /// Run `f` with exclusive access to the simulator.
    pub fn with<R>(&self, f: impl FnOnce(&mut Simulator) -> R) -> R {
        f(&mut lock(&*self.sim))
    }

    // -----------------------------------------------------------------------
    // Recording
    // -----------------------------------------------------------------------

    /// Start or resume recording and spawn the sampling ticker.
    ///
    /// Returns false if a recording is already running.
    pub fn start_recording(&self) -> bool {
        let now = Instant::now();
        let (started, period) = self.with(|sim| {
            (
                sim.start_recording(now.into_std()),
                sim.config().recording_interval(),
            )
        });
        if !started {
            return false;
        }

        let cancel = CancellationToken::new();
        if let Some(old) = lock(&*self.recording).replace(cancel.clone()) {
            old.cancel();
        }

        let sim = Arc::clone(&self.sim);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(now + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    tick = ticker.tick() => {
                        let mut sim = lock(&*sim);
                        if cancel.is_cancelled() {
                            break;
                        }
                        sim.record_tick(tick.into_std());
                    }
                }
            }
            tracing::debug!("Recording ticker stopped");
        });
        true
    }

    pub fn pause_recording(&self) -> bool {
        cancel_slot(&self.recording);
        self.with(Simulator::pause_recording)
    }

    /// Stop recording and return the exported text, if anything was captured.
    pub fn stop_recording(&self) -> Option<String> {
        cancel_slot(&self.recording);
        self.with(Simulator::stop_recording)
    }

    // -----------------------------------------------------------------------
    // Playback
    // -----------------------------------------------------------------------

    /// Load `text` and play it in the background.
    ///
    /// Any playback already running is cancelled first. Returns `None` when the
    /// text holds no frames; otherwise the task handle, which completes once IK
    /// has been restored (or the playback was cancelled).
    pub fn play_sequence(&self, text: &str) -> Option<JoinHandle<()>> {
        cancel_slot(&self.playback);
        let started = self.with(|sim| sim.load_sequence(text) > 0 && sim.begin_playback());
        if !started {
            return None;
        }
        Some(self.spawn_playback())
    }

    /// Replay the sequence already loaded.
    pub fn replay(&self) -> Option<JoinHandle<()>> {
        cancel_slot(&self.playback);
        self.with(|sim| {
            sim.cancel_playback();
            sim.begin_playback()
        })
        .then(|| self.spawn_playback())
    }

    fn spawn_playback(&self) -> JoinHandle<()> {
        let cancel = CancellationToken::new();
        *lock(&*self.playback) = Some(cancel.clone());

        let sim = Arc::clone(&self.sim);
        let grace = self.with(|sim| sim.config().playback_grace());
        tokio::spawn(async move {
            loop {
                let step = {
                    let mut sim = lock(&*sim);
                    if cancel.is_cancelled() {
                        return;
                    }
                    sim.playback_step()
                };
                let Some(step) = step else { break };
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(step.wait) => {}
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(grace) => {}
            }

            let mut sim = lock(&*sim);
            if !cancel.is_cancelled() {
                sim.finish_playback();
            }
        })
    }

    /// Cancel a running playback and restore the IK flag it saved.
    pub fn stop_playback(&self) {
        cancel_slot(&self.playback);
        self.with(Simulator::cancel_playback);
    }
}
