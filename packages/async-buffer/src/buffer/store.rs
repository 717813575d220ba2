// shared store part of the buffer.

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
};


// exclusively locked queue of values which have been taken in but not yet dispatched.
//
// the intake coordinator is the only pusher and the output dispatcher is the only puller. the lock
// is held for a single push or pull and never across an await point.
pub(crate) struct Store<T> {
    elems: Mutex<VecDeque<T>>,
}

impl<T> Store<T> {
    // construct empty.
    pub(crate) fn new() -> Self {
        Store {
            elems: Mutex::new(VecDeque::new()),
        }
    }

    // append to the back.
    pub(crate) fn push(&self, elem: T) {
        self.lock().push_back(elem);
    }

    // remove from the front, if non-empty.
    pub(crate) fn pull(&self) -> Option<T> {
        self.lock().pop_front()
    }

    // number of values currently stored.
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    // a panic while locked can only happen inside a single VecDeque operation, which leaves the
    // queue consistent, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.elems.lock().unwrap_or_else(PoisonError::into_inner)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::Arc,
        thread,
    };

    #[test]
    fn fifo_order() {
        let store = Store::new();
        assert_eq!(store.pull(), None::<u32>);
        for i in 0..10 {
            store.push(i);
        }
        assert_eq!(store.len(), 10);
        for i in 0..5 {
            assert_eq!(store.pull(), Some(i));
        }
        store.push(10);
        for i in 5..=10 {
            assert_eq!(store.pull(), Some(i));
        }
        assert_eq!(store.pull(), None);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn concurrent_push_and_pull() {
        let store = Arc::new(Store::new());

        let pushers = (0..4u64)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..1000 {
                        store.push(t * 1000 + i);
                    }
                })
            })
            .collect::<Vec<_>>();

        let puller = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut pulled = Vec::new();
                while pulled.len() < 4000 {
                    match store.pull() {
                        Some(elem) => pulled.push(elem),
                        None => thread::yield_now(),
                    }
                }
                pulled
            })
        };

        for pusher in pushers {
            pusher.join().unwrap();
        }
        let pulled = puller.join().unwrap();

        // each pusher's values come out in the order it pushed them
        for t in 0..4 {
            let own = pulled.iter().copied().filter(|&e| e / 1000 == t).collect::<Vec<_>>();
            assert_eq!(own, (t * 1000..(t + 1) * 1000).collect::<Vec<_>>());
        }
        assert_eq!(store.pull(), None);
    }
}
