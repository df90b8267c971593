// SPDX-License-Identifier: MIT

//! Grounded on `oj`'s own `ExitError` (`cli/src/exit_error.rs`):
//! commands return this instead of calling `std::process::exit`
//! directly, so `main` is the single place that terminates the process.

use std::fmt;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    /// A daemon RPC failed or the daemon isn't reachable: exit code 1,
    /// matching every other command-level failure.
    pub fn from_client(err: crate::client::ClientError) -> Self {
        Self::new(1, err.to_string())
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

impl From<crate::client::ClientError> for ExitError {
    fn from(err: crate::client::ClientError) -> Self {
        Self::from_client(err)
    }
}
