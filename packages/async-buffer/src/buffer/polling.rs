// internal future polling system, for blocking on a get from threads that aren't async.
//
// design based on pollster crate, but with a deadline and a non-blocking mode.

use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Condvar, Mutex, PoisonError},
    task::{Context, Poll, Wake, Waker},
    time::Instant,
};


// timeout for blocking on a future.
#[derive(Debug, Copy, Clone)]
pub(crate) enum Timeout {
    // never time out.
    Never,
    // time out at the given deadline.
    At(Instant),
    // time out if the future cannot be resolved without blocking.
    NonBlocking,
}

// poll the future until it resolves, or until the timeout is reached, in which case return none.
//
// the future is left unresolved on timeout and may be polled again later.
pub(crate) fn poll<F>(fut: &mut F, timeout: Timeout) -> Option<F::Output>
where
    F: Future + Unpin,
{
    let signal = Arc::new(Signal {
        state: Mutex::new(State::Empty),
        cond: Condvar::new(),
    });
    let waker = Waker::from(Arc::clone(&signal));
    let mut cx = Context::from_waker(&waker);

    loop {
        // return if ready
        if let Poll::Ready(output) = Pin::new(&mut *fut).poll(&mut cx) {
            return Some(output);
        }

        // otherwise, block until notification or timeout
        let mut lock = signal.lock();

        // if a notification is already present, skip to the next loop iteration so as to release
        // the lock and try polling again without blocking.
        if matches!(*lock, State::Notified) {
            *lock = State::Empty;
            continue;
        }

        // otherwise, actually block until notification or timeout
        debug_assert!(matches!(*lock, State::Empty));
        *lock = State::Waiting;
        match timeout {
            // block on mutex + condvar indefinitely
            Timeout::Never =>
                while matches!(*lock, State::Waiting) {
                    lock = signal.cond.wait(lock).unwrap_or_else(PoisonError::into_inner);
                },

            // block on mutex + condvar until deadline, at which point return none
            Timeout::At(deadline) =>
                while matches!(*lock, State::Waiting) {
                    let Some(duration) = deadline.checked_duration_since(Instant::now())
                        else { return None };
                    let (lock2, wait_result) = signal.cond
                        .wait_timeout(lock, duration)
                        .unwrap_or_else(PoisonError::into_inner);
                    lock = lock2;
                    if wait_result.timed_out() && matches!(*lock, State::Waiting) {
                        return None;
                    }
                },

            // dont block on mutex + condvar, return none instead
            Timeout::NonBlocking => return None,
        }
        *lock = State::Empty;
    }
}

// synchronization signal state
enum State {
    Empty,
    Waiting,
    Notified,
}

// synchronization signal, woken through the waker it backs
struct Signal {
    state: Mutex<State>,
    cond: Condvar,
}

impl Signal {
    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Wake for Signal {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        let mut lock = self.lock();
        match *lock {
            State::Notified => (),
            State::Empty => {
                *lock = State::Notified;
            }
            State::Waiting => {
                *lock = State::Empty;
                self.cond.notify_one();
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        future::{pending, ready},
        thread,
        time::Duration,
    };
    use tokio::sync::oneshot;

    #[test]
    fn ready_future_resolves_in_every_mode() {
        assert_eq!(poll(&mut ready(1), Timeout::NonBlocking), Some(1));
        assert_eq!(poll(&mut ready(2), Timeout::Never), Some(2));
        assert_eq!(poll(&mut ready(3), Timeout::At(Instant::now())), Some(3));
    }

    #[test]
    fn pending_future_times_out() {
        let mut fut = pending::<()>();
        assert_eq!(poll(&mut fut, Timeout::NonBlocking), None);
        let start = Instant::now();
        assert_eq!(poll(&mut fut, Timeout::At(start + Duration::from_millis(20))), None);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn woken_from_other_thread() {
        let (send, mut recv) = oneshot::channel();
        let join = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            send.send(5).unwrap();
        });
        assert_eq!(poll(&mut recv, Timeout::Never), Some(Ok(5)));
        join.join().unwrap();
    }
}
