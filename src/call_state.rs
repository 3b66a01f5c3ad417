//! Telephony call state, as reported by the platform.

use std::process::{Command, Stdio};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    NoCall,
    Ringing,
    InCall,
}

impl CallState {
    /// Map a telephony registry `mCallState` code.
    pub fn from_code(code: i64) -> Result<Self, CallStateError> {
        match code {
            0 => Ok(CallState::NoCall),
            1 => Ok(CallState::Ringing),
            2 => Ok(CallState::InCall),
            other => Err(CallStateError::UnknownCode(other)),
        }
    }
}

/// A failed query. Never mistaken for any [`CallState`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallStateError {
    #[error("call state query failed: {0}")]
    Command(String),

    #[error("no mCallState in query output {0:?}")]
    Parse(String),

    #[error("unknown call state code {0}")]
    UnknownCode(i64),
}

pub trait CallStateSource {
    fn query(&mut self) -> Result<CallState, CallStateError>;
}

/// Queries the Android telephony registry through a shell pipeline.
pub struct DumpsysCallState {
    command: &'static str,
}

impl DumpsysCallState {
    pub fn new(command: &'static str) -> Self {
        Self { command }
    }
}

impl CallStateSource for DumpsysCallState {
    fn query(&mut self) -> Result<CallState, CallStateError> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(self.command)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| CallStateError::Command(format!("failed to spawn sh: {}", e)))?;

        parse_call_state(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse the first `mCallState=<n>` line of a registry dump.
///
/// Whitespace is ignored and anything after the leading integer is dropped,
/// so both `mCallState=2` and `  mCallState = 2 ` are accepted.
pub fn parse_call_state(output: &str) -> Result<CallState, CallStateError> {
    const KEY: &str = "mCallState=";

    for line in output.lines() {
        let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
        let Some(value) = compact.strip_prefix(KEY) else {
            continue;
        };

        let end = value
            .char_indices()
            .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
            .map(|(i, _)| i)
            .unwrap_or(value.len());
        let code: i64 = value[..end]
            .parse()
            .map_err(|_| CallStateError::Parse(line.to_string()))?;
        return CallState::from_code(code);
    }

    Err(CallStateError::Parse(output.trim().to_string()))
}
