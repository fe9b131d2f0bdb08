//! Invocation boundary between the gate and whatever it protects.
//!
//! The gate only ever sees a no-argument call returning an [`Outcome`].
//! The in-process [`DegradingEndpoint`](crate::endpoint::DegradingEndpoint),
//! an HTTP client, or a test closure can all sit behind it.

use futures_util::future::BoxFuture;
use std::future::Future;

/// Result of a single invocation of a remote operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The operation answered. `observed_delay_ms` is the latency the
    /// operation reports for this call.
    Success { payload: T, observed_delay_ms: u64 },
    /// The operation refused the call because it is overloaded.
    Locked,
    /// The caller's deadline passed before an answer arrived.
    Timeout,
    /// Any other failure (transport, unexpected status, panic).
    Error(String),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// Short label used in logs and event descriptions.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success { .. } => "success",
            Outcome::Locked => "locked",
            Outcome::Timeout => "timeout",
            Outcome::Error(_) => "error",
        }
    }
}

/// A no-argument, asynchronous operation guarded by a gate.
///
/// The returned future is `'static` so the gate can keep it running in the
/// background after abandoning it at the deadline.
pub trait RemoteOperation<T>: Send + Sync + 'static {
    fn invoke(&self) -> BoxFuture<'static, Outcome<T>>;
}

/// Adapter turning a closure into a [`RemoteOperation`].
#[derive(Clone)]
pub struct FnOperation<F> {
    f: F,
}

/// Wrap a closure returning a future of [`Outcome`].
///
/// ```
/// use flaky_gate::resilience::{operation_fn, Outcome, RemoteOperation};
///
/// let op = operation_fn(|| async { Outcome::Success { payload: "pong", observed_delay_ms: 0 } });
/// let _future = op.invoke();
/// ```
pub fn operation_fn<F>(f: F) -> FnOperation<F> {
    FnOperation { f }
}

impl<T, F, Fut> RemoteOperation<T> for FnOperation<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome<T>> + Send + 'static,
{
    fn invoke(&self) -> BoxFuture<'static, Outcome<T>> {
        Box::pin((self.f)())
    }
}
