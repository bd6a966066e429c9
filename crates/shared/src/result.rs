//! Result helpers for shared error handling.

use crate::errors::ErrorEnvelope;

/// Shared result type used across the workspace.
pub type Result<T, E = ErrorEnvelope> = std::result::Result<T, E>;

/// Extension helpers mirroring common `Result` combinators.
pub trait ResultExt<T, E> {
    /// Map the success value, preserving the error.
    fn map_ok<U, F>(self, op: F) -> Result<U, E>
    where
        F: FnOnce(T) -> U;

    /// Map the error value, preserving the success.
    fn map_err_with<F, E2>(self, op: F) -> Result<T, E2>
    where
        F: FnOnce(E) -> E2;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn map_ok<U, F>(self, op: F) -> Result<U, E>
    where
        F: FnOnce(T) -> U,
    {
        self.map(op)
    }

    fn map_err_with<F, E2>(self, op: F) -> Result<T, E2>
    where
        F: FnOnce(E) -> E2,
    {
        self.map_err(op)
    }
}
