//! Timeout enforcement.
//!
//! # Responsibilities
//! - Race a wrapped call against the gate's call deadline
//! - Stop waiting once the deadline passes
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - The call runs on its own task; at the deadline the task is detached,
//!   not aborted, and whatever it eventually returns is dropped
//! - Timeout is reported as `Outcome::Timeout`, distinct from other errors

use futures_util::future::BoxFuture;
use std::time::Duration;
use tokio::time;

use crate::resilience::operation::Outcome;

/// Run `call` with a deadline.
pub async fn call_with_deadline<T>(call: BoxFuture<'static, Outcome<T>>, deadline: Duration) -> Outcome<T>
where
    T: Send + 'static,
{
    let task = tokio::spawn(call);
    match time::timeout(deadline, task).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(join_error)) => Outcome::Error(format!("operation task failed: {join_error}")),
        // Dropping the JoinHandle detaches the task.
        Err(_elapsed) => Outcome::Timeout,
    }
}
