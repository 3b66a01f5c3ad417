//! One call's worth of duplex audio between the codec and the modem.
//!
//! Each iteration moves one buffer in each direction:
//! codec capture -> modem playback, and modem capture -> glitch filter ->
//! codec playback. After every iteration the call state is checked again so
//! bridging stops as soon as the call ends.

use crate::audio::{AudioFormat, EndpointRole, EndpointSet, PcmBackend, Topology, sample_filter};
use crate::call_state::{CallState, CallStateSource};
use crate::error::BridgeError;

/// Fixed parameters every session is started with.
#[derive(Debug, Clone, Copy)]
pub struct BridgeSettings {
    pub topology: Topology,
    pub format: AudioFormat,
    /// Consecutive failed call-state checks tolerated mid-call
    pub max_query_failures: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The call state stopped reporting an active call.
    CallEnded(CallState),
    /// The call state could not be read for too many iterations in a row.
    CallStateUnavailable,
    Failed(BridgeError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    /// Iterations that moved audio both ways
    pub periods: u64,
    pub end: SessionEnd,
}

pub struct BridgingSession {
    endpoints: EndpointSet,
    max_query_failures: u32,
}

impl BridgingSession {
    pub fn open(backend: &mut dyn PcmBackend, settings: &BridgeSettings) -> Result<Self, BridgeError> {
        let endpoints = EndpointSet::open_all(backend, settings.topology, settings.format)?;
        debug_assert!(endpoints.is_open());

        let modem_bytes = endpoints
            .get(EndpointRole::ModemCapture)
            .map(|e| e.buffer().len())
            .unwrap_or(0);
        log::info!(
            "Capturing sample: {} ch, {} hz, {} bit, size {} bytes",
            settings.format.channels,
            settings.format.rate,
            settings.format.bits(),
            modem_bytes,
        );

        Ok(Self {
            endpoints,
            max_query_failures: settings.max_query_failures,
        })
    }

    /// Bridge audio until the call ends or a device fails, then close every
    /// endpoint.
    pub fn run(mut self, call_state: &mut dyn CallStateSource) -> SessionReport {
        let mut periods = 0;
        let mut query_failures = 0;

        let end = loop {
            if let Err(e) = self.transfer_period() {
                log::error!("{}", e);
                break SessionEnd::Failed(e);
            }
            periods += 1;

            match call_state.query() {
                Ok(CallState::InCall) => query_failures = 0,
                Ok(state) => break SessionEnd::CallEnded(state),
                Err(e) => {
                    query_failures += 1;
                    log::warn!(
                        "{} ({}/{}), keeping the call bridged",
                        e,
                        query_failures,
                        self.max_query_failures
                    );
                    if query_failures >= self.max_query_failures {
                        break SessionEnd::CallStateUnavailable;
                    }
                }
            }
        };

        self.endpoints.close_all();
        SessionReport { periods, end }
    }

    fn transfer_period(&mut self) -> Result<(), BridgeError> {
        self.endpoints.read_period(EndpointRole::CodecCapture)?;
        self.endpoints.read_period(EndpointRole::ModemCapture)?;

        self.endpoints
            .forward(EndpointRole::CodecCapture, EndpointRole::ModemPlayback)?;

        sample_filter::suppress_glitches(self.endpoints.buffer_mut(EndpointRole::ModemCapture)?);
        self.endpoints
            .forward(EndpointRole::ModemCapture, EndpointRole::CodecPlayback)
    }
}

/// Open a session and bridge until it ends. An open failure moves no audio.
pub fn bridge_call(
    backend: &mut dyn PcmBackend,
    call_state: &mut dyn CallStateSource,
    settings: &BridgeSettings,
) -> SessionReport {
    match BridgingSession::open(backend, settings) {
        Ok(session) => session.run(call_state),
        Err(e) => SessionReport {
            periods: 0,
            end: SessionEnd::Failed(e),
        },
    }
}
