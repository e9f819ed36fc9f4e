//! Connection establishment with retry on "not ready yet" failures.
//!
//! A client process routinely starts before its server has created the
//! listening endpoint. [`Dialer::dial`] polls the endpoint at a fixed
//! interval until it accepts, and returns every other failure immediately.

use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::error::{Result, TransportError};
use crate::name::{ChannelName, Endpoint};

/// Default pause between connection attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Connect strategy for one transport flavor.
pub trait Connector {
    /// The stream produced by a successful connect.
    type Stream;

    /// Make a single connection attempt.
    fn connect(&self, endpoint: &Endpoint) -> std::io::Result<Self::Stream>;
}

/// Time source and delay primitive used between attempts.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// The connect strategy for the build target.
#[cfg(unix)]
pub type SystemConnector = crate::uds::UnixSocketConnector;

/// The connect strategy for the build target.
#[cfg(windows)]
pub type SystemConnector = crate::pipe::NamedPipeConnector;

/// How long and how often to retry an endpoint that is not ready.
///
/// The default retries every 100 ms with no attempt limit and no deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause between attempts.
    pub interval: Duration,
    /// Total attempts allowed, including the first. `None` means unbounded.
    pub max_attempts: Option<u32>,
    /// Give up once this much time has passed since the first attempt.
    pub deadline: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_RETRY_INTERVAL,
            max_attempts: None,
            deadline: None,
        }
    }
}

impl RetryPolicy {
    /// Unbounded retries at `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts.max(1));
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Decide what follows a failed connect attempt.
    ///
    /// Returns the pause before the next attempt, or the error that ends the
    /// dial: non-retryable failures, an exhausted attempt budget, or a pause
    /// that would run past the deadline.
    pub(crate) fn after_failure(
        &self,
        endpoint: &Endpoint,
        attempts: u32,
        elapsed: Duration,
        err: std::io::Error,
    ) -> Result<Duration> {
        if !is_retryable(&err) {
            return Err(TransportError::Connect {
                endpoint: endpoint.clone(),
                source: err,
            });
        }

        if self.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(TransportError::RetriesExhausted {
                endpoint: endpoint.clone(),
                attempts,
                source: err,
            });
        }

        if let Some(deadline) = self.deadline {
            let overruns = elapsed
                .checked_add(self.interval)
                .is_none_or(|resume| resume > deadline);
            if overruns {
                return Err(TransportError::DeadlineElapsed {
                    endpoint: endpoint.clone(),
                    elapsed,
                    attempts,
                });
            }
        }

        trace!(
            %endpoint,
            attempts,
            interval = ?self.interval,
            error = %err,
            "endpoint not ready; retrying"
        );
        Ok(self.interval)
    }
}

/// Cancellation flag shared between a dialing thread and its owner.
#[derive(Debug, Clone, Default)]
pub struct DialCancel(Arc<AtomicBool>);

impl DialCancel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the dial to stop before its next attempt.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Whether a failed connect means "the server is not listening yet".
///
/// `NotFound` (no socket file, no pipe) and `ConnectionRefused` (socket file
/// without a listener) are retryable, as is `ERROR_PIPE_BUSY` on Windows.
pub fn is_retryable(err: &std::io::Error) -> bool {
    match err.kind() {
        ErrorKind::NotFound | ErrorKind::ConnectionRefused => true,
        _ => is_pipe_busy(err),
    }
}

#[cfg(windows)]
fn is_pipe_busy(err: &std::io::Error) -> bool {
    err.raw_os_error() == Some(windows_sys::Win32::Foundation::ERROR_PIPE_BUSY as i32)
}

#[cfg(not(windows))]
fn is_pipe_busy(_err: &std::io::Error) -> bool {
    false
}

/// Dials endpoints, retrying while they are not ready.
#[derive(Debug, Clone)]
pub struct Dialer<K = SystemConnector, C = SystemClock> {
    connector: K,
    clock: C,
    policy: RetryPolicy,
    cancel: Option<DialCancel>,
}

impl Dialer {
    /// A dialer for the build target's transport and the wall clock.
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_parts(SystemConnector::default(), SystemClock, policy)
    }
}

impl Default for Dialer {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl<K: Connector, C: Clock> Dialer<K, C> {
    /// A dialer with explicit connect strategy and clock.
    pub fn with_parts(connector: K, clock: C, policy: RetryPolicy) -> Self {
        Self {
            connector,
            clock,
            policy,
            cancel: None,
        }
    }

    /// Attach a cancellation flag checked before every attempt.
    pub fn with_cancel(mut self, cancel: DialCancel) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn connector(&self) -> &K {
        &self.connector
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Connect to `endpoint`, blocking until it accepts or fails for good.
    pub fn dial(&self, endpoint: &Endpoint) -> Result<K::Stream> {
        let started = self.clock.now();
        let mut attempts = 0u32;

        loop {
            if self.cancel.as_ref().is_some_and(DialCancel::is_cancelled) {
                debug!(%endpoint, attempts, "dial cancelled");
                return Err(TransportError::Cancelled {
                    endpoint: endpoint.clone(),
                    attempts,
                });
            }

            attempts = attempts.saturating_add(1);
            let err = match self.connector.connect(endpoint) {
                Ok(stream) => {
                    debug!(%endpoint, attempts, "endpoint connected");
                    return Ok(stream);
                }
                Err(err) => err,
            };

            let elapsed = self.clock.now().saturating_duration_since(started);
            let pause = self.policy.after_failure(endpoint, attempts, elapsed, err)?;
            self.clock.sleep(pause);
        }
    }
}

/// Resolve `name` for the build target and dial it with `policy`.
pub fn dial(name: &ChannelName, policy: &RetryPolicy) -> Result<crate::traits::IpcStream> {
    let endpoint = Endpoint::resolve(name)?;
    Dialer::new(policy.clone()).dial(&endpoint)
}
