//! Tokio utility.

use std::future::Future;
use tokio::{
    runtime::Handle,
    task::AbortHandle,
};


/// Handle to a worker task that aborts the task if dropped.
pub(crate) struct AbortOnDrop(AbortHandle);

impl AbortOnDrop {
    /// Spawn a worker task on the given runtime and wrap with self.
    pub(crate) fn spawn_on<F>(handle: &Handle, f: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        AbortOnDrop(handle.spawn(f).abort_handle())
    }

    /// Whether the task has exited, either by returning or by being aborted.
    pub(crate) fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}
