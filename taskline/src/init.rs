//! Process-wide initialization and teardown.
//!
//! [`initialize`] and [`deinitialize`] each succeed exactly once per
//! process, in that order. `#[taskline::main]` calls both around `main`.
//!
//! Initialization optionally installs a global `tracing` subscriber: a
//! `fmt` layer filtered by an [`EnvFilter`], where `RUST_LOG` takes
//! precedence over [`InitOptions::log_filter`].

use crate::error::{Error, Result};

use std::sync::atomic::{AtomicU8, Ordering};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const UNINITIALIZED: u8 = 0;
const INITIALIZED: u8 = 1;
const DEINITIALIZED: u8 = 2;

static STATE: AtomicU8 = AtomicU8::new(UNINITIALIZED);

/// Options for [`initialize`].
#[derive(Debug, Clone)]
pub struct InitOptions {
    install_subscriber: bool,
    log_filter: String,
}

impl InitOptions {
    /// Installs a subscriber logging at `info` unless `RUST_LOG` says
    /// otherwise.
    pub fn new() -> Self {
        Self {
            install_subscriber: true,
            log_filter: "info".to_owned(),
        }
    }

    /// Whether to install the global `tracing` subscriber.
    ///
    /// Disable it when the application installs its own.
    pub fn install_subscriber(mut self, install: bool) -> Self {
        self.install_subscriber = install;
        self
    }

    /// Default filter directive, used when `RUST_LOG` is unset.
    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }
}

impl Default for InitOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Initializes the process.
///
/// # Errors
///
/// - [`Error::AlreadyInitialized`] on any call after the first,
/// - [`Error::Subscriber`] if the filter directive is invalid or another
///   global subscriber is already installed. The process is then left
///   uninitialized.
pub fn initialize(options: InitOptions) -> Result<()> {
    STATE
        .compare_exchange(UNINITIALIZED, INITIALIZED, Ordering::AcqRel, Ordering::Acquire)
        .map_err(|_| Error::AlreadyInitialized)?;

    if options.install_subscriber {
        if let Err(err) = install_subscriber(&options.log_filter) {
            STATE.store(UNINITIALIZED, Ordering::Release);
            return Err(err);
        }
    }

    tracing::debug!("taskline initialized");
    Ok(())
}

/// Tears the process down.
///
/// # Errors
///
/// - [`Error::NotInitialized`] if [`initialize`] never succeeded,
/// - [`Error::AlreadyDeinitialized`] on any call after the first.
pub fn deinitialize() -> Result<()> {
    match STATE.compare_exchange(INITIALIZED, DEINITIALIZED, Ordering::AcqRel, Ordering::Acquire) {
        Ok(_) => {
            tracing::debug!("taskline deinitialized");
            Ok(())
        }
        Err(UNINITIALIZED) => Err(Error::NotInitialized),
        Err(_) => Err(Error::AlreadyDeinitialized),
    }
}

fn install_subscriber(default_filter: &str) -> Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(default_filter),
    }
    .map_err(|err| Error::Subscriber(err.to_string()))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .try_init()
        .map_err(|err| Error::Subscriber(err.to_string()))
}
