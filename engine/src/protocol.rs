//! Wire format between the scheduler and a `repsq worker` child.
//!
//! One JSON object per line in each direction: the parent writes a single
//! [`WorkerRequest`] to the child's stdin and reads a single [`WorkerReply`]
//! from its stdout. Big integers travel as decimal strings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use repsq_core::{ComputeOptions, ComputeRequest, decode, encode};
use repsq_types::{Base, ComputeMode, ComputeResult, InputError, JobId};

pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRequest {
    pub protocol: u32,
    pub job_id: JobId,
    pub base: Base,
    /// Canonical MSB-first digits.
    pub digits: String,
    pub mode: ComputeMode,
    pub options: ComputeOptions,
}

impl WorkerRequest {
    #[must_use]
    pub fn new(job_id: JobId, request: &ComputeRequest) -> Self {
        Self {
            protocol: PROTOCOL_VERSION,
            job_id,
            base: request.root.base(),
            digits: encode(&request.root),
            mode: request.mode,
            options: request.options,
        }
    }

    /// Check the version and re-validate the digits.
    pub fn into_compute_request(self) -> Result<ComputeRequest, WorkerError> {
        if self.protocol != PROTOCOL_VERSION {
            return Err(WorkerError::ProtocolMismatch {
                expected: PROTOCOL_VERSION,
                found: self.protocol,
            });
        }
        let root = decode(&self.digits, self.base)?;
        Ok(ComputeRequest::new(root, self.mode).with_options(self.options))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum WorkerReply {
    Completed {
        job_id: JobId,
        result: Box<ComputeResult>,
    },
    Failed {
        /// Absent when the request could not be parsed far enough to read it.
        job_id: Option<JobId>,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("worker io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed worker message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("worker protocol mismatch: expected {expected}, found {found}")]
    ProtocolMismatch { expected: u32, found: u32 },
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("input closed before a request arrived")]
    NoRequest,
    #[error("worker closed its output without replying")]
    NoReply,
    #[error("worker replied for {found} while running {expected}")]
    WrongJob { expected: JobId, found: JobId },
}

/// Serialize `message` as one newline-terminated JSON line.
pub fn encode_line<T: Serialize>(message: &T) -> Result<String, WorkerError> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

pub fn decode_line<'a, T: Deserialize<'a>>(line: &'a str) -> Result<T, WorkerError> {
    Ok(serde_json::from_str(line.trim_end())?)
}
