use std::io;

use thiserror::Error;

/// Errors reported by lifecycle operations of the runtime.
///
/// Posting work never produces an `Error`: a rejected post is reported by
/// the `bool` returned from the task runner.
#[derive(Debug, Error)]
pub enum Error {
    /// The operating system refused to create a worker thread.
    #[error("failed to spawn worker thread `{name}`")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },

    /// `start()` was called on a thread or pool that is already running.
    #[error("`{0}` is already running")]
    AlreadyRunning(String),

    /// A pool cannot be started again once it has been stopped.
    #[error("thread pool has been stopped and cannot be restarted")]
    PoolStopped,

    #[error("runtime is already initialized")]
    AlreadyInitialized,

    #[error("runtime is not initialized")]
    NotInitialized,

    #[error("runtime is already deinitialized")]
    AlreadyDeinitialized,

    /// The global `tracing` subscriber could not be installed.
    #[error("failed to install log subscriber: {0}")]
    Subscriber(String),
}

/// Shorthand for results whose error type is [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
