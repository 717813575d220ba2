// output dispatcher task.

use super::core::Shared;
use std::sync::Arc;
use tokio::sync::mpsc;


// pull values from the store and send them into the output channel, oldest first.
//
// the loop has two modes:
//
// - normal: pull the front of the store and send it. if the store is empty, wait for a pulse on
//   the availability signal instead of spinning.
// - drain: once the availability signal closes, the intake coordinator has exited and nothing
//   more will be pushed. send whatever remains, then exit.
//
// the store lock is released by `pull` before sending, so the intake coordinator is never blocked
// behind a waiting consumer. returning drops `output`, which is what makes consumers see the
// buffer as finished once they have received everything sent before.
pub(crate) async fn run<T>(
    shared: Arc<Shared<T>>,
    mut signal: mpsc::Receiver<()>,
    output: mpsc::Sender<T>,
) {
    trace!("output dispatcher started");
    loop {
        shared.count_dispatch_iter();
        if let Some(elem) = shared.store.pull() {
            if output.send(elem).await.is_err() {
                trace!("output channel dropped, output dispatcher exiting");
                return;
            }
        } else if signal.recv().await.is_none() {
            break;
        }
    }

    debug!(remaining = shared.store.len(), "availability signal closed, draining store");
    while let Some(elem) = shared.store.pull() {
        if output.send(elem).await.is_err() {
            trace!("output channel dropped while draining, output dispatcher exiting");
            return;
        }
    }
    debug!("store drained, output dispatcher exiting");
}
