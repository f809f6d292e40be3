//! Fatal channel for a broken no-local-signing guarantee.
//!
//! The verifier strips every signing step from its request pipeline and
//! then checks that the pipeline really produced no `Authorization` header.
//! If it did, some step signed the request with the verifier's own
//! credentials and any "verified" identity would be the verifier's, not the
//! caller's. That is a defect in a dependency, not bad input, so it is never
//! reported through a `Result`.
//!
//! [`halt`] unwinds with an [`IntegrityViolation`] payload. Release builds
//! set `panic = "abort"`, which turns it into a process abort.

use std::fmt;

/// The verifier pipeline re-introduced a signature after signing was removed.
///
/// This type intentionally does not implement [`std::error::Error`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityViolation {
    pipeline: Vec<String>,
}

impl IntegrityViolation {
    /// Records the step names installed when the violation was observed.
    pub fn new(pipeline: Vec<String>) -> Self {
        Self { pipeline }
    }

    /// Step names installed when the violation was observed.
    pub fn pipeline(&self) -> &[String] {
        &self.pipeline
    }
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`Authorization` header is set despite removing every signing step from the pipeline \
             (installed steps: [{}]); refusing to send a request signed with local credentials",
            self.pipeline.join(", ")
        )
    }
}

/// Stops the verifying process.
///
/// Logs the violation and unwinds with it as the panic payload.
pub fn halt(violation: IntegrityViolation) -> ! {
    tracing::error!(pipeline = ?violation.pipeline, "{violation}");
    std::panic::panic_any(violation)
}
