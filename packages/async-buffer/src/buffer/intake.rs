// intake coordinator task.

use super::core::Shared;
use std::sync::Arc;
use tokio::sync::mpsc::{
    self,
    error::TrySendError,
};


// receive values from the intake input and push them into the store until the input closes.
//
// after each push, a pulse is put into the availability signal. the signal has capacity 1, and if
// it is full, the pulse already in it is enough: the dispatcher re-checks the store after taking
// it. so this never waits on the dispatcher.
//
// returning drops `signal`, which tells the dispatcher that no more values will be pushed.
pub(crate) async fn run<T>(
    shared: Arc<Shared<T>>,
    mut input: mpsc::UnboundedReceiver<T>,
    signal: mpsc::Sender<()>,
) {
    trace!("intake coordinator started");
    while let Some(elem) = input.recv().await {
        shared.store.push(elem);
        match signal.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => (),
            Err(TrySendError::Closed(())) => {
                // dispatcher only exits early if its output channel is gone
                trace!("availability signal closed, intake coordinator exiting");
                return;
            }
        }
    }
    debug!("intake input closed, intake coordinator exiting");
}
