//! Submission Handles
//!
//! A [`Job`] is what travels through a worker's channel; the matching
//! [`OperationHandle`] is what the submitter keeps. Both share one state word so the
//! submitter can cancel a job that has not started yet.

use crate::error::{ClusterError, Result};
use crate::operation::OperationResponse;

use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

const QUEUED: u8 = 0;
const RUNNING: u8 = 1;
const CANCELLED: u8 = 2;

pub(crate) type Work = Box<dyn FnOnce() -> Result<OperationResponse> + Send + 'static>;

pub(crate) struct Job {
    partition_id: u32,
    state: Arc<AtomicU8>,
    work: Work,
    reply: oneshot::Sender<Result<OperationResponse>>,
}

impl Job {
    pub(crate) fn new(partition_id: u32, work: Work) -> (Job, OperationHandle) {
        let state = Arc::new(AtomicU8::new(QUEUED));
        let (reply, rx) = oneshot::channel();

        let job = Job {
            partition_id,
            state: state.clone(),
            work,
            reply,
        };
        let handle = OperationHandle {
            partition_id,
            state,
            rx,
        };
        (job, handle)
    }

    pub(crate) fn partition_id(&self) -> u32 {
        self.partition_id
    }

    /// Claims the job for execution. Fails if it was cancelled while queued, in which
    /// case the submitter is told so and the job is consumed.
    pub(crate) fn begin(self) -> Option<Job> {
        match self
            .state
            .compare_exchange(QUEUED, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => Some(self),
            Err(_) => {
                tracing::debug!("Skipping cancelled operation on partition {}", self.partition_id);
                let _ = self.reply.send(Err(ClusterError::Cancelled));
                None
            }
        }
    }

    /// Runs the work and reports the outcome. A panic becomes the job's failure.
    pub(crate) fn run(self) {
        let Job {
            partition_id,
            work,
            reply,
            ..
        } = self;

        let result = match catch_unwind(AssertUnwindSafe(work)) {
            Ok(result) => result,
            Err(panic) => Err(ClusterError::OperationFailed(format!(
                "operation panicked: {}",
                panic_message(panic.as_ref())
            ))),
        };

        if let Err(e) = &result {
            tracing::error!("Operation on partition {} failed: {}", partition_id, e);
        }

        // The submitter may have dropped its handle; nothing to report to then.
        let _ = reply.send(result);
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Completion handle for a submitted operation. Await it for the operation's result.
#[derive(Debug)]
pub struct OperationHandle {
    partition_id: u32,
    state: Arc<AtomicU8>,
    rx: oneshot::Receiver<Result<OperationResponse>>,
}

impl OperationHandle {
    pub fn partition_id(&self) -> u32 {
        self.partition_id
    }

    /// Prevents execution if the operation has not started yet. Returns whether the
    /// cancellation took effect; the handle then resolves to `Cancelled`.
    pub fn cancel(&self) -> bool {
        self.state
            .compare_exchange(QUEUED, CANCELLED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::SeqCst) == CANCELLED
    }
}

impl Future for OperationHandle {
    type Output = Result<OperationResponse>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) if this.is_cancelled() => Poll::Ready(Err(ClusterError::Cancelled)),
            Poll::Ready(Err(_)) => Poll::Ready(Err(ClusterError::OperationFailed(
                "worker dropped the operation".to_string(),
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}
