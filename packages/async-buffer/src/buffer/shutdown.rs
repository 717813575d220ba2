// shutdown coordinator task.

use super::{
    cancel::CancelToken,
    core::Shared,
};
use std::sync::Arc;


// wait for cancellation, then for every admitted value to be received, then close the buffer.
//
// the outstanding count may rise again between observing zero and acquiring the intake guard, in
// which case `try_close` refuses and this goes back to waiting.
pub(crate) async fn run<T>(shared: Arc<Shared<T>>, cancel: CancelToken) {
    trace!("shutdown coordinator started");
    cancel.cancelled().await;
    debug!(outstanding = shared.outstanding(), "cancelled, waiting for outstanding values");

    let mut outstanding = shared.subscribe_outstanding();
    loop {
        let sender_gone = outstanding.wait_for(|&n| n == 0).await.is_err();
        if sender_gone {
            // unreachable while this task holds `shared`
            return;
        }
        if shared.try_close() {
            break;
        }
        trace!("value admitted during shutdown, waiting again");
    }
    debug!("buffer closed");
}
