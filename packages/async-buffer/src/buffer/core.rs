// shared state of a buffer, and the operations on it which must stay consistent with each other.

use super::{
    error::{ClosedError, PutErrorCause, RuntimeShutdownError},
    store::Store,
};
use std::sync::{
    atomic::{
        Ordering::Relaxed,
        AtomicU64,
    },
    PoisonError,
    RwLock,
};
use tokio::sync::{mpsc, watch};


// state shared between the buffer handles and the worker tasks.
//
// holds no handles to the worker tasks themselves, so the tasks holding an Arc to this do not keep
// themselves alive.
pub(crate) struct Shared<T> {
    // values taken in by the intake coordinator and not yet pulled by the dispatcher.
    pub(crate) store: Store<T>,

    // sender half of the intake input.
    //
    // - put read-locks it, and while locked, increments outstanding and sends.
    // - the shutdown coordinator write-locks it, and while locked, checks that outstanding is zero
    //   before taking the sender. this is what closes the intake input.
    // - once taken, never put back.
    intake: RwLock<Option<mpsc::UnboundedSender<T>>>,

    // number of values admitted and not yet received by a consumer.
    outstanding: watch::Sender<usize>,

    // begins false. becomes true, exactly once, when the intake input is closed, which only
    // happens while outstanding is zero.
    closed: watch::Sender<bool>,

    // number of iterations of the dispatcher loop.
    dispatch_iters: AtomicU64,
}

impl<T> Shared<T> {
    // construct in the open state, along with the receiver half of the intake input.
    pub(crate) fn new() -> (Self, mpsc::UnboundedReceiver<T>) {
        let (intake_send, intake_recv) = mpsc::unbounded_channel();
        let shared = Shared {
            store: Store::new(),
            intake: RwLock::new(Some(intake_send)),
            outstanding: watch::Sender::new(0),
            closed: watch::Sender::new(false),
            dispatch_iters: AtomicU64::new(0),
        };
        (shared, intake_recv)
    }

    // increment outstanding and send elem into the intake input, unless the intake input is
    // closed.
    //
    // on failure, outstanding is left as it was and elem is returned.
    pub(crate) fn admit(&self, elem: T) -> Result<(), (PutErrorCause, T)> {
        let intake = self.intake.read().unwrap_or_else(PoisonError::into_inner);
        let Some(intake) = intake.as_ref() else {
            return Err((ClosedError.into(), elem));
        };
        self.outstanding.send_modify(|n| *n += 1);
        intake.send(elem).map_err(|mpsc::error::SendError(elem)| {
            // the intake coordinator is gone without the input being closed, which only happens
            // if its runtime shut down.
            self.outstanding.send_modify(|n| *n -= 1);
            (RuntimeShutdownError.into(), elem)
        })
    }

    // record that a consumer received a value.
    pub(crate) fn delivered(&self) {
        self.outstanding.send_modify(|n| {
            debug_assert!(*n > 0, "outstanding underflow (internal bug)");
            *n -= 1;
        });
    }

    // close the intake input and enter the closed state, if outstanding is zero.
    //
    // returns whether the buffer is now closed.
    pub(crate) fn try_close(&self) -> bool {
        let mut intake = self.intake.write().unwrap_or_else(PoisonError::into_inner);
        if *self.outstanding.borrow() != 0 {
            return false;
        }
        let Some(intake_send) = intake.take() else { return true };
        // consumers treat the output channel closing as finished only if this is already set, so
        // it must be set before dropping the sender starts the cascade down the pipeline.
        self.closed.send_replace(true);
        drop(intake_send);
        true
    }

    pub(crate) fn outstanding(&self) -> usize {
        *self.outstanding.borrow()
    }

    pub(crate) fn subscribe_outstanding(&self) -> watch::Receiver<usize> {
        self.outstanding.subscribe()
    }

    pub(crate) fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    pub(crate) fn subscribe_closed(&self) -> watch::Receiver<bool> {
        self.closed.subscribe()
    }

    pub(crate) fn count_dispatch_iter(&self) {
        self.dispatch_iters.fetch_add(1, Relaxed);
    }

    #[cfg(test)]
    pub(crate) fn dispatch_iters(&self) -> u64 {
        self.dispatch_iters.load(Relaxed)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admit_counts_outstanding() {
        let (shared, mut intake) = Shared::new();
        shared.admit(1).unwrap();
        shared.admit(2).unwrap();
        assert_eq!(shared.outstanding(), 2);
        assert_eq!(intake.try_recv().unwrap(), 1);
        assert_eq!(intake.try_recv().unwrap(), 2);
        shared.delivered();
        assert_eq!(shared.outstanding(), 1);
    }

    #[test]
    fn close_waits_for_outstanding() {
        let (shared, mut intake) = Shared::new();
        shared.admit("a").unwrap();
        assert!(!shared.try_close());
        assert!(!shared.is_closed());

        shared.delivered();
        assert!(shared.try_close());
        assert!(shared.is_closed());
        // idempotent
        assert!(shared.try_close());

        // intake input is closed once the buffered value is taken
        assert_eq!(intake.try_recv().unwrap(), "a");
        assert!(matches!(
            intake.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected),
        ));
    }

    #[test]
    fn admit_after_close_returns_elem() {
        let (shared, _intake) = Shared::<u8>::new();
        assert!(shared.try_close());
        let (cause, elem) = shared.admit(7).unwrap_err();
        assert_eq!(cause, PutErrorCause::Closed(ClosedError));
        assert_eq!(elem, 7);
        assert_eq!(shared.outstanding(), 0);
    }

    #[test]
    fn admit_without_intake_coordinator() {
        let (shared, intake) = Shared::<u8>::new();
        drop(intake);
        let (cause, elem) = shared.admit(7).unwrap_err();
        assert_eq!(cause, PutErrorCause::RuntimeShutdown(RuntimeShutdownError));
        assert_eq!(elem, 7);
        assert_eq!(shared.outstanding(), 0);
        assert!(!shared.is_closed());
    }
}
