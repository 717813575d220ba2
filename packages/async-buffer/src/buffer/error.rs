// buffer error types.

use std::{
    error::Error,
    fmt::{self, Debug, Display, Formatter},
};
use thiserror::Error;


// ==== base error types ====


/// Error for trying to put into a buffer which has closed
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[error("buffer is closed")]
pub struct ClosedError;

/// Error for using a buffer whose worker tasks were dropped before it closed
///
/// This occurs if the tokio runtime the buffer was built on shuts down while the buffer is still
/// open.
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[error("runtime running the buffer's workers shut down")]
pub struct RuntimeShutdownError;

/// Error for attempting to get from a buffer with no or limited blocking, and the operation not
/// completing immediately or by the specified deadline
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[error("operation would block")]
pub struct WouldBlockError;

/// Error for building a buffer without a tokio runtime to spawn its workers on
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[error("no tokio runtime to spawn buffer workers on")]
pub struct NoRuntimeError;


// ==== compound error types ====


/// Reason a value could not be put into a buffer
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum PutErrorCause {
    /// The buffer has closed
    #[error(transparent)]
    Closed(#[from] ClosedError),
    /// The buffer's workers are gone
    #[error(transparent)]
    RuntimeShutdown(#[from] RuntimeShutdownError),
}

/// Error for trying to put into a buffer
///
/// Carries the value back to the caller.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PutError<T> {
    /// The value that could not be put
    pub value: T,
    /// The reason the value could not be put
    pub cause: PutErrorCause,
}

impl<T> Display for PutError<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "failed to put value: {}", self.cause)
    }
}

impl<T: Debug> Error for PutError<T> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.cause)
    }
}

/// Error for trying to get from a buffer with no or limited blocking
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum TryGetError {
    /// The buffer's workers are gone
    #[error(transparent)]
    Terminal(#[from] RuntimeShutdownError),
    /// The operation could not be resolved immediately or by the specified deadline
    #[error(transparent)]
    WouldBlock(#[from] WouldBlockError),
}
