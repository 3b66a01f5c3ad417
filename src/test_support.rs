//! Scripted stand-ins for the audio stack, the call-state query and sleeping.
//!
//! Every double appends to one shared journal so tests can assert on the
//! exact interleaving of polls, sleeps and PCM operations.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Result, bail};

use crate::audio::{AudioFormat, PcmBackend, PcmStream, SampleEncoding, StreamDirection, Topology};
use crate::call_monitor::Sleeper;
use crate::call_state::{CallState, CallStateError, CallStateSource};

/// A stream is identified by its card and direction.
pub type StreamKey = (u32, StreamDirection);

pub fn codec(direction: StreamDirection) -> StreamKey {
    (0, direction)
}

pub fn modem(direction: StreamDirection) -> StreamKey {
    (1, direction)
}

pub fn test_topology() -> Topology {
    Topology {
        codec_card: 0,
        modem_card: 1,
    }
}

pub fn test_format() -> AudioFormat {
    AudioFormat {
        device: 0,
        channels: 2,
        rate: 8000,
        period_size: 3072,
        period_count: 2,
        encoding: SampleEncoding::S16Le,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Open(StreamKey),
    OpenFailed(StreamKey),
    Close(StreamKey),
    Read(StreamKey),
    Write(StreamKey, Vec<u8>),
    Query,
    Sleep(Duration),
}

#[derive(Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<Event>>>);

impl Journal {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }
}

pub struct MockBackend {
    journal: Journal,
    opens: usize,
    /// 1-based open attempt that returns an error
    pub fail_open_at: Option<usize>,
    /// 1-based open attempt whose stream reports not ready
    pub not_ready_at: Option<usize>,
    pub buffer_bytes: HashMap<StreamKey, usize>,
    pub fail_read: Option<StreamKey>,
    pub fail_write: Option<StreamKey>,
    capture: HashMap<StreamKey, VecDeque<Vec<u8>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::with_journal(Journal::default())
    }

    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal,
            opens: 0,
            fail_open_at: None,
            not_ready_at: None,
            buffer_bytes: HashMap::new(),
            fail_read: None,
            fail_write: None,
            capture: HashMap::new(),
        }
    }

    /// Queue one period of audio for a capture stream.
    pub fn push_capture(&mut self, key: StreamKey, data: Vec<u8>) {
        self.capture.entry(key).or_default().push_back(data);
    }

    pub fn journal(&self) -> Vec<Event> {
        self.journal.events()
    }

    pub fn opened(&self) -> Vec<StreamKey> {
        self.journal()
            .into_iter()
            .filter_map(|e| match e {
                Event::Open(key) => Some(key),
                _ => None,
            })
            .collect()
    }

    pub fn closed(&self) -> Vec<StreamKey> {
        self.journal()
            .into_iter()
            .filter_map(|e| match e {
                Event::Close(key) => Some(key),
                _ => None,
            })
            .collect()
    }

    pub fn written(&self, key: StreamKey) -> Vec<Vec<u8>> {
        self.journal()
            .into_iter()
            .filter_map(|e| match e {
                Event::Write(k, data) if k == key => Some(data),
                _ => None,
            })
            .collect()
    }
}

impl PcmBackend for MockBackend {
    fn open(
        &mut self,
        card: u32,
        _device: u32,
        direction: StreamDirection,
        format: &AudioFormat,
    ) -> Result<Box<dyn PcmStream>> {
        self.opens += 1;
        let key = (card, direction);
        if self.fail_open_at == Some(self.opens) {
            self.journal.push(Event::OpenFailed(key));
            bail!("scripted open failure on card {}", card);
        }

        self.journal.push(Event::Open(key));
        Ok(Box::new(MockStream {
            key,
            journal: self.journal.clone(),
            ready: self.not_ready_at != Some(self.opens),
            buffer_bytes: self
                .buffer_bytes
                .get(&key)
                .copied()
                .unwrap_or_else(|| format.frames_to_bytes(4)),
            fail_read: self.fail_read == Some(key),
            fail_write: self.fail_write == Some(key),
            capture: self.capture.remove(&key).unwrap_or_default(),
        }))
    }
}

struct MockStream {
    key: StreamKey,
    journal: Journal,
    ready: bool,
    buffer_bytes: usize,
    fail_read: bool,
    fail_write: bool,
    capture: VecDeque<Vec<u8>>,
}

impl PcmStream for MockStream {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn buffer_size_bytes(&self) -> usize {
        self.buffer_bytes
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        self.journal.push(Event::Read(self.key));
        if self.fail_read {
            bail!("scripted read failure");
        }
        match self.capture.pop_front() {
            Some(data) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
            }
            None => buf.fill(self.key.0 as u8 + 1),
        }
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.journal.push(Event::Write(self.key, buf.to_vec()));
        if self.fail_write {
            bail!("scripted write failure");
        }
        Ok(())
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        self.journal.push(Event::Close(self.key));
    }
}

/// Replays a fixed sequence of query results, then reports no call.
pub struct ScriptedCallState {
    journal: Journal,
    script: VecDeque<Result<CallState, CallStateError>>,
}

impl ScriptedCallState {
    pub fn new(journal: Journal, script: Vec<Result<CallState, CallStateError>>) -> Self {
        Self {
            journal,
            script: script.into(),
        }
    }

    pub fn states(journal: Journal, states: &[CallState]) -> Self {
        Self::new(journal, states.iter().copied().map(Ok).collect())
    }
}

impl CallStateSource for ScriptedCallState {
    fn query(&mut self) -> Result<CallState, CallStateError> {
        self.journal.push(Event::Query);
        self.script.pop_front().unwrap_or(Ok(CallState::NoCall))
    }
}

pub struct RecordingSleeper {
    journal: Journal,
}

impl RecordingSleeper {
    pub fn new(journal: Journal) -> Self {
        Self { journal }
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&mut self, duration: Duration) {
        self.journal.push(Event::Sleep(duration));
    }
}
