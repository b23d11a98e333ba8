// Dispatch Signal

use crate::domain::{DispatchReceipt, TaskId, TaskState};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Completion signal returned by `AsyncQueue::submit`
///
/// Resolves once the task has been dispatched (started), never with the
/// task's own result. Dropping it does not affect the task.
#[derive(Debug)]
pub struct Dispatch {
    rx: oneshot::Receiver<()>,
    receipt: DispatchReceipt,
}

impl Dispatch {
    /// Receipt for this submission, available before dispatch
    pub fn receipt(&self) -> DispatchReceipt {
        self.receipt
    }

    pub fn id(&self) -> TaskId {
        self.receipt.id
    }

    pub(crate) fn into_waiting(mut self) -> Self {
        self.receipt.state_at_submit = TaskState::Waiting;
        self
    }
}

impl Future for Dispatch {
    type Output = DispatchReceipt;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // A closed channel means the runtime dropped the worker before it
        // started; the submission still counts as dispatched.
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(_) => Poll::Ready(self.receipt),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Dispatch sender, fired by the worker as it starts the task
#[derive(Debug)]
pub(crate) struct DispatchSender {
    tx: oneshot::Sender<()>,
}

impl DispatchSender {
    /// Signal that the task has started
    pub(crate) fn dispatched(self) {
        let _ = self.tx.send(());
    }
}

/// Create a dispatch channel
pub(crate) fn dispatch_channel(id: TaskId, state_at_submit: TaskState) -> (DispatchSender, Dispatch) {
    let (tx, rx) = oneshot::channel();
    (
        DispatchSender { tx },
        Dispatch {
            rx,
            receipt: DispatchReceipt { id, state_at_submit },
        },
    )
}
