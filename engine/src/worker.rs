//! The child side of the subprocess execution context.

use std::io::{BufRead, Write};

use repsq_core::{NeverInterrupt, compute};

use crate::protocol::{WorkerError, WorkerReply, WorkerRequest, decode_line, encode_line};

/// Read one request from `input`, compute it, write one reply to `output`.
///
/// Request problems (bad JSON, version mismatch, invalid digits) are answered
/// with a `Failed` reply; only IO failures surface as `Err`. Runs without an
/// interrupt checkpoint: the parent terminates a worker by killing it.
pub fn serve<R, W>(mut input: R, mut output: W) -> Result<(), WorkerError>
where
    R: BufRead,
    W: Write,
{
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(WorkerError::NoRequest);
    }

    let reply = handle_line(&line);
    if let WorkerReply::Failed { job_id, message } = &reply {
        tracing::warn!(job_id = ?job_id, reason = %message, "Worker request failed");
    }

    output.write_all(encode_line(&reply)?.as_bytes())?;
    output.flush()?;
    Ok(())
}

fn handle_line(line: &str) -> WorkerReply {
    let request: WorkerRequest = match decode_line(line) {
        Ok(request) => request,
        Err(err) => {
            return WorkerReply::Failed {
                job_id: None,
                message: err.to_string(),
            };
        }
    };

    let job_id = request.job_id;
    let compute_request = match request.into_compute_request() {
        Ok(compute_request) => compute_request,
        Err(err) => {
            return WorkerReply::Failed {
                job_id: Some(job_id),
                message: err.to_string(),
            };
        }
    };

    tracing::debug!(
        job_id = %job_id,
        base = compute_request.root.base().get(),
        digits = compute_request.root.digit_count(),
        "Worker computing"
    );
    match compute(&compute_request, &NeverInterrupt) {
        Ok(result) => WorkerReply::Completed {
            job_id,
            result: Box::new(result),
        },
        Err(err) => WorkerReply::Failed {
            job_id: Some(job_id),
            message: err.to_string(),
        },
    }
}
