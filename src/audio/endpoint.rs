//! The four PCM endpoints of a bridging session and their lifecycle.
//!
//! Endpoints are opened in a fixed order and either all of them end up open
//! or none do: a failure part way through closes whatever was opened so far
//! before the error is returned.

use std::fmt;

use super::device::{PcmBackend, PcmStream};
use super::format::{AudioFormat, StreamDirection};
use crate::error::{BridgeError, IoOp};

/// Which side of the call an endpoint carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointRole {
    CodecCapture,
    ModemPlayback,
    ModemCapture,
    CodecPlayback,
}

impl EndpointRole {
    /// Open (and close) order used for every session.
    pub const OPEN_ORDER: [EndpointRole; 4] = [
        EndpointRole::CodecCapture,
        EndpointRole::ModemPlayback,
        EndpointRole::ModemCapture,
        EndpointRole::CodecPlayback,
    ];

    pub fn direction(self) -> StreamDirection {
        match self {
            EndpointRole::CodecCapture | EndpointRole::ModemCapture => StreamDirection::Capture,
            EndpointRole::ModemPlayback | EndpointRole::CodecPlayback => StreamDirection::Playback,
        }
    }

    pub fn is_modem(self) -> bool {
        matches!(self, EndpointRole::ModemPlayback | EndpointRole::ModemCapture)
    }
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EndpointRole::CodecCapture => "codec-capture",
            EndpointRole::ModemPlayback => "modem-playback",
            EndpointRole::ModemCapture => "modem-capture",
            EndpointRole::CodecPlayback => "codec-playback",
        };
        f.write_str(name)
    }
}

/// Sound card numbers of the two audio paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    pub codec_card: u32,
    pub modem_card: u32,
}

impl Topology {
    pub fn card_for(&self, role: EndpointRole) -> u32 {
        if role.is_modem() {
            self.modem_card
        } else {
            self.codec_card
        }
    }
}

/// Identity of an endpoint, used in logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointId {
    pub role: EndpointRole,
    pub card: u32,
    pub device: u32,
}

impl EndpointId {
    pub fn new(role: EndpointRole, topology: &Topology, format: &AudioFormat) -> Self {
        Self {
            role,
            card: topology.card_for(role),
            device: format.device,
        }
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (card {}, device {})", self.role, self.card, self.device)
    }
}

/// One open PCM stream plus, for capture endpoints, the buffer it reads into.
pub struct Endpoint {
    id: EndpointId,
    stream: Option<Box<dyn PcmStream>>,
    buffer: Vec<u8>,
}

impl Endpoint {
    fn open(
        backend: &mut dyn PcmBackend,
        id: EndpointId,
        format: &AudioFormat,
    ) -> Result<Self, BridgeError> {
        let stream = backend
            .open(id.card, id.device, id.role.direction(), format)
            .map_err(|e| BridgeError::EndpointOpen {
                endpoint: id,
                reason: format!("{:#}", e),
            })?;

        // The stream is dropped, and so closed, on the early return.
        if !stream.is_ready() {
            return Err(BridgeError::EndpointOpen {
                endpoint: id,
                reason: "device not ready".to_string(),
            });
        }

        log::debug!("Opened {}", id);
        Ok(Self {
            id,
            stream: Some(stream),
            buffer: Vec::new(),
        })
    }

    /// Size the transfer buffer from the stream's negotiated buffer size.
    fn allocate_buffer(&mut self) -> Result<(), BridgeError> {
        let bytes = self
            .stream
            .as_ref()
            .map(|s| s.buffer_size_bytes())
            .unwrap_or(0);
        let failed = BridgeError::Allocation {
            endpoint: self.id,
            bytes,
        };
        if bytes == 0 {
            return Err(failed);
        }

        let mut buffer = Vec::new();
        buffer.try_reserve_exact(bytes).map_err(|_| failed)?;
        buffer.resize(bytes, 0);
        self.buffer = buffer;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// Block until the whole buffer has been filled from the stream.
    pub fn read_period(&mut self) -> Result<(), BridgeError> {
        let id = self.id;
        let stream = self.stream.as_mut().ok_or_else(|| closed(id, IoOp::Read))?;
        stream.read(&mut self.buffer).map_err(|e| BridgeError::Io {
            endpoint: id,
            op: IoOp::Read,
            reason: format!("{:#}", e),
        })
    }

    /// Block until all of `data` has been queued on the stream.
    pub fn write(&mut self, data: &[u8]) -> Result<(), BridgeError> {
        let id = self.id;
        let stream = self.stream.as_mut().ok_or_else(|| closed(id, IoOp::Write))?;
        stream.write(data).map_err(|e| BridgeError::Io {
            endpoint: id,
            op: IoOp::Write,
            reason: format!("{:#}", e),
        })
    }

    /// Close the stream and release the buffer. A second call is a no-op.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            self.buffer = Vec::new();
            log::debug!("Closed {}", self.id);
        }
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        self.close();
    }
}

fn closed(endpoint: EndpointId, op: IoOp) -> BridgeError {
    BridgeError::Io {
        endpoint,
        op,
        reason: "endpoint is closed".to_string(),
    }
}

/// The codec and modem endpoints of one call, in open order.
pub struct EndpointSet {
    topology: Topology,
    format: AudioFormat,
    endpoints: Vec<Endpoint>,
}

impl EndpointSet {
    /// Open all four endpoints and size the capture buffers.
    ///
    /// On any failure every endpoint opened so far is closed before the
    /// error is returned.
    pub fn open_all(
        backend: &mut dyn PcmBackend,
        topology: Topology,
        format: AudioFormat,
    ) -> Result<Self, BridgeError> {
        let mut set = Self {
            topology,
            format,
            endpoints: Vec::with_capacity(EndpointRole::OPEN_ORDER.len()),
        };

        if let Err(e) = set.populate(backend) {
            log::error!("{}", e);
            set.close_all();
            return Err(e);
        }
        Ok(set)
    }

    fn populate(&mut self, backend: &mut dyn PcmBackend) -> Result<(), BridgeError> {
        for role in EndpointRole::OPEN_ORDER {
            let id = EndpointId::new(role, &self.topology, &self.format);
            let endpoint = Endpoint::open(backend, id, &self.format)?;
            self.endpoints.push(endpoint);
        }

        for endpoint in &mut self.endpoints {
            if endpoint.id.role.direction() == StreamDirection::Capture {
                endpoint.allocate_buffer()?;
            }
        }
        Ok(())
    }

    /// Close every endpoint in the set. Safe to call repeatedly and on a
    /// partially opened set.
    pub fn close_all(&mut self) {
        for endpoint in &mut self.endpoints {
            endpoint.close();
        }
    }

    pub fn is_open(&self) -> bool {
        self.endpoints.len() == EndpointRole::OPEN_ORDER.len()
            && self.endpoints.iter().all(Endpoint::is_open)
    }

    pub fn get(&self, role: EndpointRole) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.id.role == role)
    }

    pub fn read_period(&mut self, role: EndpointRole) -> Result<(), BridgeError> {
        let index = self.index_of(role, IoOp::Read)?;
        self.endpoints[index].read_period()
    }

    pub fn buffer_mut(&mut self, role: EndpointRole) -> Result<&mut [u8], BridgeError> {
        let index = self.index_of(role, IoOp::Read)?;
        Ok(self.endpoints[index].buffer_mut())
    }

    /// Write the buffer of the `from` endpoint to the `to` endpoint.
    pub fn forward(&mut self, from: EndpointRole, to: EndpointRole) -> Result<(), BridgeError> {
        let src = self.index_of(from, IoOp::Read)?;
        let dst = self.index_of(to, IoOp::Write)?;
        assert_ne!(src, dst, "cannot forward an endpoint to itself");

        let (source, sink) = if src < dst {
            let (head, tail) = self.endpoints.split_at_mut(dst);
            (&head[src], &mut tail[0])
        } else {
            let (head, tail) = self.endpoints.split_at_mut(src);
            (&tail[0], &mut head[dst])
        };
        sink.write(source.buffer())
    }

    fn index_of(&self, role: EndpointRole, op: IoOp) -> Result<usize, BridgeError> {
        self.endpoints
            .iter()
            .position(|e| e.id.role == role && e.is_open())
            .ok_or_else(|| closed(EndpointId::new(role, &self.topology, &self.format), op))
    }
}
