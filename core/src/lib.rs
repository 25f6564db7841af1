//! Squaring engine for repsq.
//!
//! Everything here is synchronous and free of IO. The pieces compose as:
//!
//! ```text
//! codec::decode -> repunit fast path ----------------------------+
//!               \-> convolution::self_convolve -> carry::normalize -> palindrome::classify -> ComputeResult
//!               \-> preview::preview_square (declared inexact) --+
//! ```
//!
//! [`compute`] wires them together; [`digest`] fingerprints exact results.

pub mod carry;
pub mod codec;
mod compute;
pub mod convolution;
pub mod digest;
mod export;
pub mod palindrome;
pub mod preview;
pub mod repunit;

pub use carry::{DEFAULT_TRACE_MAX_BYTES, TraceRequest};
pub use codec::{decode, decode_with_radix, encode};
pub use compute::{ComputeError, ComputeOptions, ComputeRequest, compute};
pub use convolution::{CHECKPOINT_INTERVAL, Checkpoint, Interrupted, NeverInterrupt};
pub use digest::{DETERMINISM_SCHEMA, DeterminismInput, compute_digest};
pub use export::export_payload;
pub use preview::PreviewLimits;
pub use repunit::{RepunitClassification, classify_repunit, is_repunit};

pub use repsq_types::{
    Base, CarryTrace, CarryTraceEntry, ComputeMode, ComputePath, ComputeResult, DigitSequence,
    ExportPayload, InputError, PalindromeVerdict, RawCoefficients, Timing,
};
