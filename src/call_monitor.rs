//! Polls the call state and runs a bridging session for every active call.
//!
//! Everything happens on one thread: while a session runs the poller is
//! blocked inside it, so polling and bridging never overlap.

use std::thread;
use std::time::Duration;

use crate::audio::PcmBackend;
use crate::bridge::{self, BridgeSettings, SessionEnd};
use crate::call_state::{CallState, CallStateSource};

/// Blocking sleep, injectable so tests can observe delays.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    /// A ring was seen; the next answered call waits for the line to settle.
    WaitingAfterRing,
    Bridging,
}

#[derive(Debug, Clone, Copy)]
pub struct MonitorTiming {
    pub poll_interval: Duration,
    pub settle_delay: Duration,
}

pub struct CallMonitor<S, B, Z> {
    source: S,
    backend: B,
    sleeper: Z,
    settings: BridgeSettings,
    timing: MonitorTiming,
    ring_seen: bool,
    state: MonitorState,
}

impl<S: CallStateSource, B: PcmBackend, Z: Sleeper> CallMonitor<S, B, Z> {
    pub fn new(
        source: S,
        backend: B,
        sleeper: Z,
        settings: BridgeSettings,
        timing: MonitorTiming,
    ) -> Self {
        Self {
            source,
            backend,
            sleeper,
            settings,
            timing,
            ring_seen: false,
            state: MonitorState::Idle,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Poll forever. There is no shutdown path; the process is killed.
    pub fn run(&mut self) -> ! {
        log::info!(
            "Waiting for calls ({:?}), polling every {:?}",
            self.state(),
            self.timing.poll_interval
        );
        loop {
            self.poll_once();
            self.sleeper.sleep(self.timing.poll_interval);
        }
    }

    /// Query the call state once and act on it. An active call blocks here
    /// until its bridging session ends.
    pub fn poll_once(&mut self) -> MonitorState {
        match self.source.query() {
            Ok(CallState::InCall) => {
                if self.ring_seen {
                    log::info!(
                        "Call answered, waiting {:?} for the line to settle",
                        self.timing.settle_delay
                    );
                    self.sleeper.sleep(self.timing.settle_delay);
                    self.ring_seen = false;
                }
                self.bridge_call();
            }
            Ok(CallState::Ringing) => {
                self.ring_seen = true;
                self.set_state(MonitorState::WaitingAfterRing);
            }
            Ok(CallState::NoCall) => {
                log::debug!("No call");
                self.set_state(self.resting_state());
            }
            Err(e) => log::warn!("Skipping poll: {}", e),
        }
        self.state
    }

    fn bridge_call(&mut self) {
        self.set_state(MonitorState::Bridging);
        let report = bridge::bridge_call(&mut self.backend, &mut self.source, &self.settings);

        match &report.end {
            SessionEnd::CallEnded(state) => log::info!(
                "Call bridged for {} periods, ended with {:?}",
                report.periods,
                state
            ),
            SessionEnd::CallStateUnavailable => log::warn!(
                "Call state unavailable after {} periods, session closed",
                report.periods
            ),
            SessionEnd::Failed(e) => log::error!(
                "Bridging session failed after {} periods on {}",
                report.periods,
                e.endpoint()
            ),
        }
        self.set_state(self.resting_state());
    }

    fn resting_state(&self) -> MonitorState {
        if self.ring_seen {
            MonitorState::WaitingAfterRing
        } else {
            MonitorState::Idle
        }
    }

    fn set_state(&mut self, state: MonitorState) {
        if self.state != state {
            log::info!("Call monitor: {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }
}
